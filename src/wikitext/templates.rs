//! Template and parser function recognition.
//!
//! Templates are found with a stack of unmatched `{{`: each `}}` closes the
//! most recent one. Braces left open at the end of a range are literal text.
//! Nest levels are assigned afterwards from the spans of the closed
//! expressions, so unclosed braces never count as an enclosing template.

use super::{Configuration, Error, MAX_NESTING, Span, index_map::IndexMap, skip::SkipRanges};
use crate::title::{Namespace, Title, TitleResolver};
use regex::Regex;
use serde::Serialize;
use std::{collections::HashSet, sync::LazyLock};

/// Matches an HTML comment, which may be unterminated.
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").unwrap());

/// Prefixes which request substitution instead of transclusion.
const MODIFIERS: [&str; 2] = ["subst:", "safesubst:"];

/// What a double-brace expression calls.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateKind {
    /// A transclusion of another page.
    Template {
        /// The page being transcluded.
        title: Title,
    },
    /// A parser function or variable.
    ParserFunction {
        /// The hook name as written.
        hook: String,
        /// The lowercased hook name.
        canonical: String,
    },
    /// Something which is neither, usually because the name is generated by
    /// another expression or is otherwise not a valid title.
    Raw,
}

/// A template argument, as written.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TemplateParamRaw {
    /// The trimmed key, or a generated numeric key for unnamed arguments.
    pub key: String,
    /// The value. Trimmed for named arguments; for unnamed arguments only
    /// trailing newlines are removed.
    pub value: String,
    /// The source text of the argument, without the leading `|`.
    pub text: String,
    /// Whether the argument had no `key=` part.
    pub unnamed: bool,
    /// The byte range of the argument, without the leading `|`.
    pub span: Span,
}

/// A `{{…}}` expression.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TemplateNode {
    /// What the expression calls.
    pub kind: TemplateKind,
    /// The substitution prefix, if one was given.
    pub modifier: Option<String>,
    /// The name part of the expression as written.
    pub raw_title: String,
    /// The source text of the whole expression.
    pub text: String,
    /// The arguments, in source order.
    pub params: Vec<TemplateParamRaw>,
    /// The byte range of the expression.
    pub span: Span,
    /// The byte range between the first `|` and the closing braces.
    pub args_span: Option<Span>,
    /// The number of other templates which enclose this one.
    pub nest_level: usize,
    /// Whether the expression is inside a skip range.
    pub skip: bool,
}

impl TemplateNode {
    /// The transcluded page, if this is a template.
    pub fn title(&self) -> Option<&Title> {
        match &self.kind {
            TemplateKind::Template { title } => Some(title),
            _ => None,
        }
    }

    /// Returns true if this is a parser function or variable.
    pub fn is_parser_function(&self) -> bool {
        matches!(self.kind, TemplateKind::ParserFunction { .. })
    }

    /// Returns the first argument with the given key.
    pub fn param(&self, key: &str) -> Option<&TemplateParamRaw> {
        self.params.iter().find(|param| param.key == key)
    }
}

/// A `|`-delimited part of an expression.
#[derive(Debug)]
struct Fragment {
    /// The start of the fragment, after any `|`.
    start: usize,
    /// The position of the first top-level `=`.
    eq: Option<usize>,
    /// The end of the fragment.
    end: usize,
}

impl Fragment {
    /// Creates a new fragment starting at `start`.
    fn new(start: usize) -> Self {
        Self {
            start,
            eq: None,
            end: start,
        }
    }
}

/// An expression which has not yet been closed.
#[derive(Debug)]
struct OpenTemplate {
    /// The position of the opening `{{`.
    start: usize,
    /// The name fragment followed by any argument fragments.
    fragments: Vec<Fragment>,
}

impl OpenTemplate {
    /// Opens an expression at `start`.
    fn new(start: usize) -> Self {
        Self {
            start,
            fragments: vec![Fragment::new(start + 2)],
        }
    }
}

/// Template scanner state.
struct Scanner<'a> {
    /// The source text.
    source: &'a str,
    /// The parser configuration.
    config: &'a Configuration,
    /// Title resolver.
    resolver: &'a dyn TitleResolver,
    /// Constructs to step over.
    map: &'a IndexMap,
    /// Skip ranges, used to flag expressions.
    skip: &'a SkipRanges,
    /// Recognised expressions, in order of completion.
    nodes: Vec<TemplateNode>,
}

impl Scanner<'_> {
    /// Scans `range` for expressions. `depth` counts the index map entries
    /// this scan has descended into.
    fn scan(&mut self, range: Span, depth: usize) -> Result<(), Error> {
        if depth > MAX_NESTING {
            log::warn!("template nesting exceeds {MAX_NESTING} at {}", range.start);
            return Err(Error::NestingTooDeep {
                kind: "template",
                offset: range.start,
                limit: MAX_NESTING,
            });
        }

        let source = self.source;
        let bytes = source.as_bytes();
        let mut stack = Vec::<OpenTemplate>::new();
        let mut pos = range.start;

        while pos < range.end {
            if let Some(entry) = self.map.at(pos, range.end).copied() {
                if let Some(inner) = entry.inner
                    && source[inner.into_range()].contains("{{")
                {
                    self.scan(inner, depth + 1)?;
                }
                pos = entry.end;
                continue;
            }

            let next = if pos + 1 < range.end { bytes[pos + 1] } else { 0 };
            match (bytes[pos], next) {
                (b'{', b'{') => {
                    stack.push(OpenTemplate::new(pos));
                    pos += 2;
                }
                (b'}', b'}') if !stack.is_empty() => {
                    if let Some(template) = stack.pop() {
                        self.finish(template, pos);
                    }
                    pos += 2;
                }
                (b'|', _) => {
                    if let Some(template) = stack.last_mut()
                        && let Some(last) = template.fragments.last_mut()
                    {
                        last.end = pos;
                        template.fragments.push(Fragment::new(pos + 1));
                    }
                    pos += 1;
                }
                (b'=', _) => {
                    if let Some(template) = stack.last_mut()
                        && template.fragments.len() > 1
                        && let Some(last) = template.fragments.last_mut()
                        && last.eq.is_none()
                    {
                        last.eq = Some(pos);
                    }
                    pos += 1;
                }
                _ => pos += 1,
            }
        }

        if let Some(outermost) = stack.first() {
            log::trace!("{} unclosed templates from {}", stack.len(), outermost.start);
        }

        Ok(())
    }

    /// Records an expression whose closing braces start at `close`.
    fn finish(&mut self, mut template: OpenTemplate, close: usize) {
        if let Some(last) = template.fragments.last_mut() {
            last.end = close;
        }

        let span = Span::new(template.start, close + 2);
        let mut fragments = template.fragments.into_iter();
        let name = fragments
            .next()
            .map_or("", |fragment| &self.source[fragment.start..fragment.end]);
        let params = self.params(fragments);
        let args_span = params.first().map(|first| Span::new(first.span.start, close));
        let (kind, modifier) = self.classify(name, !params.is_empty());

        self.nodes.push(TemplateNode {
            kind,
            modifier,
            raw_title: name.to_string(),
            text: self.source[span.into_range()].to_string(),
            params,
            span,
            args_span,
            nest_level: 0,
            skip: self.skip.contains(span),
        });
    }

    /// Converts argument fragments into parameters.
    fn params(&self, fragments: impl Iterator<Item = Fragment>) -> Vec<TemplateParamRaw> {
        let mut keys = HashSet::new();
        let mut params = Vec::new();
        for fragment in fragments {
            let span = Span::new(fragment.start, fragment.end);
            let text = &self.source[span.into_range()];
            let param = if let Some(eq) = fragment.eq {
                TemplateParamRaw {
                    key: self.source[fragment.start..eq].trim().to_string(),
                    value: self.source[eq + 1..fragment.end].trim().to_string(),
                    text: text.to_string(),
                    unnamed: false,
                    span,
                }
            } else {
                let key = (1_usize..)
                    .map(|index| index.to_string())
                    .find(|key| !keys.contains(key))
                    .unwrap_or_default();
                TemplateParamRaw {
                    key,
                    value: text.trim_end_matches('\n').to_string(),
                    text: text.to_string(),
                    unnamed: true,
                    span,
                }
            };
            keys.insert(param.key.clone());
            params.push(param);
        }
        params
    }

    /// Classifies an expression by its name.
    fn classify(&self, raw: &str, has_args: bool) -> (TemplateKind, Option<String>) {
        let cleaned = COMMENT.replace_all(raw, "");
        let mut name = cleaned.trim();

        let mut modifier = None;
        for prefix in MODIFIERS {
            if name.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix)) {
                modifier = Some(name[..prefix.len()].to_string());
                name = name[prefix.len()..].trim_start();
                break;
            }
        }

        if name.is_empty() || name.contains('\n') {
            return (TemplateKind::Raw, modifier);
        }

        if let Some((hook, canonical)) = self.config.function_hook(name, has_args) {
            let kind = TemplateKind::ParserFunction {
                hook: hook.to_string(),
                canonical,
            };
            return (kind, modifier);
        }

        let namespace = if name.starts_with(':') {
            Namespace::MAIN
        } else {
            Namespace::TEMPLATE
        };
        let kind = match self.resolver.resolve(name, namespace) {
            Some(title) if !title.is_external() => TemplateKind::Template { title },
            _ => TemplateKind::Raw,
        };
        (kind, modifier)
    }
}

/// Finds every template and parser function in `source`, at every nesting
/// depth, stepping over the constructs in `map`.
///
/// The result is sorted by start offset.
pub fn parse(
    source: &str,
    config: &Configuration,
    resolver: &dyn TitleResolver,
    map: &IndexMap,
    skip: &SkipRanges,
) -> Result<Vec<TemplateNode>, Error> {
    let mut scanner = Scanner {
        source,
        config,
        resolver,
        map,
        skip,
        nodes: Vec::new(),
    };
    scanner.scan(Span::new(0, source.len()), 0)?;
    let mut nodes = scanner.nodes;
    nodes.sort_by(|a, b| a.span.start.cmp(&b.span.start).then(b.span.end.cmp(&a.span.end)));
    assign_nest_levels(&mut nodes)?;
    log::debug!("found {} templates", nodes.len());
    Ok(nodes)
}

/// Sets the nest level of each expression to the number of expressions which
/// enclose it. `nodes` must be sorted by start offset, outer first.
fn assign_nest_levels(nodes: &mut [TemplateNode]) -> Result<(), Error> {
    let mut enclosing = Vec::<usize>::new();
    for node in nodes {
        while enclosing.last().is_some_and(|&end| end <= node.span.start) {
            enclosing.pop();
        }
        if enclosing.len() > MAX_NESTING {
            log::warn!("template nesting exceeds {MAX_NESTING} at {}", node.span.start);
            return Err(Error::NestingTooDeep {
                kind: "template",
                offset: node.span.start,
                limit: MAX_NESTING,
            });
        }
        node.nest_level = enclosing.len();
        enclosing.push(node.span.end);
    }
    Ok(())
}
