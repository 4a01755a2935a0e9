//! Wikilink recognition.
//!
//! Links are found in two passes. The fuzzy pass matches `[[` with `]]` and
//! records the operands on either side of the first `|`. The finalising pass
//! then decides what kind of link each match is, which requires knowing where
//! templates are, and templates in turn cannot be found without knowing where
//! links are.

use super::{Error, MAX_NESTING, Span, index_map::IndexMap, skip::SkipRanges};
use crate::title::{Namespace, Title, TitleResolver};
use serde::Serialize;

/// A matched `[[…]]` pair, before classification.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FuzzyWikilink {
    /// The text before the first `|`.
    pub left: String,
    /// The text after the first `|`, if there is one.
    pub right: Option<String>,
    /// The resolved target title.
    pub title: Option<Title>,
    /// The target as written.
    pub raw_title: String,
    /// The source text of the whole link.
    pub text: String,
    /// Whether the link has a `|`.
    pub piped: bool,
    /// The byte range of the link.
    pub span: Span,
    /// The byte range of the right operand.
    pub right_span: Option<Span>,
    /// Whether the link is inside a skip range.
    pub skip: bool,
}

/// A classified wikilink.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Wikilink {
    /// A link to a page.
    Normal {
        /// The matched link.
        base: FuzzyWikilink,
        /// The text shown for the link.
        display: String,
    },
    /// An embedded file.
    ///
    /// ```wikitext
    /// [[File:Example.png|thumb|300px|Caption]]
    /// ```
    File {
        /// The matched link.
        base: FuzzyWikilink,
        /// The `|`-separated file options, verbatim.
        params: Vec<String>,
    },
    /// A link whose target is not a valid title.
    Raw {
        /// The matched link.
        base: FuzzyWikilink,
    },
}

impl Wikilink {
    /// The underlying matched link.
    pub fn base(&self) -> &FuzzyWikilink {
        match self {
            Self::Normal { base, .. } | Self::File { base, .. } | Self::Raw { base } => base,
        }
    }

    /// The byte range of the link.
    pub fn span(&self) -> Span {
        self.base().span
    }

    /// The resolved target title.
    pub fn title(&self) -> Option<&Title> {
        self.base().title.as_ref()
    }

    /// Whether the link is inside a skip range.
    pub fn skip(&self) -> bool {
        self.base().skip
    }
}

/// A `[[` which has not yet been closed.
#[derive(Debug)]
struct OpenLink {
    /// The position of the `[[`.
    start: usize,
    /// The position of the first top-level `|`.
    pipe: Option<usize>,
}

/// Fuzzy wikilink scanner state.
struct Scanner<'a> {
    /// The source text.
    source: &'a str,
    /// Constructs to step over.
    map: &'a IndexMap,
    /// Skip ranges, used to flag links.
    skip: &'a SkipRanges,
    /// Title resolver.
    resolver: &'a dyn TitleResolver,
    /// Matched links, in order of completion.
    links: Vec<FuzzyWikilink>,
}

impl Scanner<'_> {
    /// Scans `range` for links. Unclosed `[[` at the end of the range are
    /// discarded.
    fn scan(&mut self, range: Span, depth: usize) -> Result<(), Error> {
        if depth > MAX_NESTING {
            log::warn!("wikilink nesting exceeds {MAX_NESTING} at {}", range.start);
            return Err(Error::NestingTooDeep {
                kind: "wikilink",
                offset: range.start,
                limit: MAX_NESTING,
            });
        }

        let source = self.source;
        let bytes = source.as_bytes();
        let mut stack = Vec::<OpenLink>::new();
        let mut pos = range.start;

        while pos < range.end {
            if let Some(entry) = self.map.at(pos, range.end).copied() {
                if let Some(inner) = entry.inner
                    && source[inner.into_range()].contains("[[")
                {
                    self.scan(inner, depth + 1)?;
                }
                pos = entry.end;
                continue;
            }

            let pair = pos + 1 < range.end;
            match bytes[pos] {
                b'[' if pair && bytes[pos + 1] == b'[' => {
                    let run = bytes[pos..range.end].iter().take_while(|&&b| b == b'[').count();
                    stack.push(OpenLink {
                        start: pos + run - 2,
                        pipe: None,
                    });
                    pos += run;
                }
                b']' if pair && bytes[pos + 1] == b']' && !stack.is_empty() => {
                    if let Some(open) = stack.pop() {
                        self.finish(open, pos + 2);
                    }
                    pos += 2;
                }
                b'|' => {
                    if let Some(open) = stack.last_mut()
                        && open.pipe.is_none()
                    {
                        open.pipe = Some(pos);
                    }
                    pos += 1;
                }
                _ => pos += 1,
            }
        }

        if !stack.is_empty() {
            log::trace!("discarding {} unclosed wikilinks", stack.len());
        }

        Ok(())
    }

    /// Records a link which ends at `end`.
    fn finish(&mut self, open: OpenLink, end: usize) {
        let span = Span::new(open.start, end);
        let body_start = open.start + 2;
        let body_end = end - 2;
        let left_end = open.pipe.unwrap_or(body_end);
        let left = &self.source[body_start..left_end];
        let right_span = open.pipe.map(|pipe| Span::new(pipe + 1, body_end));

        self.links.push(FuzzyWikilink {
            left: left.to_string(),
            right: right_span.map(|span| self.source[span.into_range()].to_string()),
            title: self.resolver.resolve(left, Namespace::MAIN),
            raw_title: left.to_string(),
            text: self.source[span.into_range()].to_string(),
            piped: open.pipe.is_some(),
            span,
            right_span,
            skip: self.skip.contains(span),
        });
    }
}

/// Matches every `[[…]]` pair in `source`, stepping over the constructs in
/// `map`.
///
/// The result is sorted by start offset.
pub fn parse_fuzzy(
    source: &str,
    map: &IndexMap,
    skip: &SkipRanges,
    resolver: &dyn TitleResolver,
) -> Result<Vec<FuzzyWikilink>, Error> {
    let mut scanner = Scanner {
        source,
        map,
        skip,
        resolver,
        links: Vec::new(),
    };
    scanner.scan(Span::new(0, source.len()), 0)?;
    let mut links = scanner.links;
    links.sort_by_key(|link| link.span.start);
    log::debug!("matched {} wikilinks", links.len());
    Ok(links)
}

/// Splits a file link’s options at every `|` which is not part of a
/// construct in `map`.
fn split_options(source: &str, range: Span, map: &IndexMap) -> Vec<String> {
    let bytes = source.as_bytes();
    let mut options = Vec::new();
    let mut start = range.start;
    let mut pos = range.start;
    while pos < range.end {
        if let Some(entry) = map.at(pos, range.end) {
            pos = entry.end;
        } else if bytes[pos] == b'|' {
            options.push(source[start..pos].to_string());
            pos += 1;
            start = pos;
        } else {
            pos += 1;
        }
    }
    options.push(source[start..range.end].to_string());
    options
}

/// Classifies matched links.
///
/// `map` should contain every construct which may hide a `|` inside a file
/// link’s options.
pub fn finalize(source: &str, links: &[FuzzyWikilink], map: &IndexMap) -> Vec<Wikilink> {
    links
        .iter()
        .map(|link| {
            let base = link.clone();
            match &link.title {
                None => Wikilink::Raw { base },
                Some(title) if title.namespace_id() == Namespace::FILE && !title.had_leading_colon() => {
                    let params = link
                        .right_span
                        .map(|range| split_options(source, range, map))
                        .unwrap_or_default();
                    Wikilink::File { base, params }
                }
                Some(_) => Wikilink::Normal {
                    display: link.right.clone().unwrap_or_else(|| link.left.clone()),
                    base,
                },
            }
        })
        .collect()
}
