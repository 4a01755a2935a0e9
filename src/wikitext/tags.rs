//! HTML-like tag recognition.
//!
//! Wikitext tolerates unbalanced markup, so tags are matched with a stack
//! instead of a grammar: an end tag closes the nearest open tag with the same
//! name, and every tag opened after that one is implicitly closed at the same
//! position.

use super::{Configuration, Span, config::VOID_TAGS, skip::TagNames};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use unicase::UniCase;

/// The synthetic tag name used for HTML comments.
pub const COMMENT: &str = "!--";

/// Matches an HTML start tag at the start of the haystack.
static START_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z][^\t\n\x0c\r />]*)(?:[\t\n\x0c\r /][^>]*)?>").unwrap()
});

/// Matches an HTML end tag at the start of the haystack.
static END_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^</([A-Za-z][^\t\n\x0c\r />]*)[\t\n\x0c\r ]*>").unwrap());

/// An HTML-like tag or comment.
///
/// ```wikitext
/// <span class="x">content</span>
/// ^^^^^^^^^^^^^^^^ start
///                 ^^^^^^^ content
///                        ^^^^^^^ end
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Tag {
    /// The lowercased tag name, or `"!--"` for comments.
    pub name: String,
    /// The source text of the start tag.
    pub start: String,
    /// The source text between the start and end tags. Void and self-closed
    /// tags have no content.
    pub content: Option<String>,
    /// The source text of the end tag. Empty for unclosed, void, and
    /// self-closed tags.
    pub end: String,
    /// The byte range of the whole tag in the source.
    pub span: Span,
    /// The number of tags which were still open when this tag started.
    pub nest_level: usize,
    /// Whether this is a void element.
    pub void: bool,
    /// Whether the tag had no end tag and was closed implicitly.
    pub unclosed: bool,
    /// Whether the start tag used `/>` syntax.
    pub self_closing: bool,
    /// Whether the tag is inside a skip range.
    pub skip: bool,
}

impl Tag {
    /// The source text of the tag.
    pub fn text(&self) -> String {
        let content = self.content.as_deref().unwrap_or_default();
        format!("{}{content}{}", self.start, self.end)
    }

    /// The source text of the tag, with a generated end tag if the tag is
    /// unclosed.
    pub fn closed_text(&self) -> String {
        if self.unclosed {
            let content = self.content.as_deref().unwrap_or_default();
            format!("{}{content}{}", self.start, end_tag_for(&self.name))
        } else {
            self.text()
        }
    }

    /// The byte range of the content between the start and end tags, if the
    /// tag has content.
    pub fn content_span(&self) -> Option<Span> {
        self.content.as_ref().map(|content| {
            let start = self.span.start + self.start.len();
            Span::new(start, start + content.len())
        })
    }
}

/// Returns the end tag which balances a start tag with the given name.
fn end_tag_for(name: &str) -> String {
    if name == COMMENT {
        "-->".to_string()
    } else {
        format!("</{name}>")
    }
}

/// A start tag which has not yet been balanced.
#[derive(Debug)]
struct OpenTag {
    /// The lowercased tag name.
    name: String,
    /// The byte range of the start tag.
    start_tag: Span,
    /// The nest level at the time the tag was opened.
    nest_level: usize,
    /// Whether the start tag used `/>` syntax.
    self_closing: bool,
}

/// Tag scanner state.
struct Scanner<'a> {
    /// The source text.
    source: &'a str,
    /// The parser configuration.
    config: &'a Configuration,
    /// Names of tags whose content is opaque.
    skip_tags: &'a TagNames,
    /// Open tags, most recent first.
    stack: Vec<OpenTag>,
    /// Recognised tags, in order of completion.
    tags: Vec<Tag>,
}

impl<'a> Scanner<'a> {
    /// Emits a leaf tag which has no content.
    fn leaf(&mut self, name: String, span: Span, void: bool, self_closing: bool) {
        self.tags.push(Tag {
            name,
            start: self.source[span.into_range()].to_string(),
            content: None,
            end: String::new(),
            span,
            nest_level: self.stack.len(),
            void,
            unclosed: false,
            self_closing,
            skip: false,
        });
    }

    /// Closes an open tag. If `end_tag` is `None`, the tag is unclosed and is
    /// terminated at `at` instead.
    fn close(&mut self, open: OpenTag, at: usize, end_tag: Option<Span>) {
        let end = end_tag.map_or(at, |span| span.end);
        self.tags.push(Tag {
            start: self.source[open.start_tag.into_range()].to_string(),
            content: Some(self.source[open.start_tag.end..at].to_string()),
            end: end_tag.map_or_else(String::new, |span| self.source[span.into_range()].to_string()),
            span: Span::new(open.start_tag.start, end),
            nest_level: open.nest_level,
            void: false,
            unclosed: end_tag.is_none(),
            self_closing: open.self_closing,
            skip: false,
            name: open.name,
        });
    }

    /// Finds the end tag of the innermost open skip tag, searching from
    /// `from`.
    fn skip_end(&self, from: usize) -> Option<usize> {
        let open = self
            .stack
            .iter()
            .find(|open| self.skip_tags.contains(&UniCase::new(open.name.clone())))?;
        memchr::memmem::find_iter(&self.source.as_bytes()[from..], b"</")
            .map(|pos| from + pos)
            .find(|&pos| {
                END_TAG
                    .captures(&self.source[pos..])
                    .and_then(|captures| captures.get(1))
                    .is_some_and(|name| name.as_str().eq_ignore_ascii_case(&open.name))
            })
    }

    /// Scans an HTML comment starting at `at`, returning the position after
    /// it. A comment inside a skip tag cannot extend past that tag's end tag.
    fn comment(&mut self, at: usize) -> usize {
        let body = at + "<!--".len();
        let limit = self.skip_end(body).unwrap_or(self.source.len());
        let (content_end, end) = memchr::memmem::find(&self.source.as_bytes()[body..limit], b"-->")
            .map_or((limit, None), |pos| {
                (body + pos, Some(Span::new(body + pos, body + pos + "-->".len())))
            });
        let span = Span::new(at, end.map_or(content_end, |end| end.end));
        self.tags.push(Tag {
            name: COMMENT.to_string(),
            start: "<!--".to_string(),
            content: Some(self.source[body..content_end].to_string()),
            end: end.map_or_else(String::new, |_| "-->".to_string()),
            span,
            nest_level: self.stack.len(),
            void: false,
            unclosed: end.is_none(),
            self_closing: false,
            skip: false,
        });
        span.end
    }

    /// Scans a start tag, returning the position after it, or `None` if the
    /// text at `at` is not a start tag.
    fn start_tag(&mut self, at: usize) -> Option<usize> {
        let captures = START_TAG.captures(&self.source[at..])?;
        let whole = captures.get(0)?;
        let name = captures.get(1)?.as_str().to_ascii_lowercase();
        let span = Span::new(at, at + whole.end());
        let self_closing = whole.as_str().ends_with("/>");

        // Extension tags shadow HTML void elements of the same name, like
        // `<source>`.
        let extension = self.config.extension_tags.contains(name.as_str());
        if extension && self_closing {
            // Extension tags honour self-closing syntax, but HTML tags do not.
            self.leaf(name, span, false, true);
        } else if !extension && VOID_TAGS.contains(name.as_str()) {
            self.leaf(name, span, true, self_closing);
        } else {
            let nest_level = self.stack.len();
            self.stack.insert(
                0,
                OpenTag {
                    name,
                    start_tag: span,
                    nest_level,
                    self_closing,
                },
            );
        }

        Some(span.end)
    }

    /// Scans an end tag, returning the position after it, or `None` if the
    /// text at `at` is not an end tag or has no matching start tag.
    fn end_tag(&mut self, at: usize) -> Option<usize> {
        let captures = END_TAG.captures(&self.source[at..])?;
        let span = Span::new(at, at + captures.get(0)?.end());
        let name = captures.get(1)?.as_str().to_ascii_lowercase();

        if name == "br" {
            // MediaWiki (and browsers) treat `</br>` as `<br>`.
            self.leaf(name, span, true, false);
            return Some(span.end);
        }

        let index = self.stack.iter().position(|open| open.name == name)?;
        let mut unclosed = self.stack.drain(..=index).collect::<Vec<_>>();
        let matched = unclosed.pop()?;
        for open in unclosed {
            self.close(open, at, None);
        }
        self.close(matched, at, Some(span));
        Some(span.end)
    }

    /// Runs the scanner to the end of the source.
    fn run(mut self) -> Vec<Tag> {
        let bytes = self.source.as_bytes();
        let mut pos = 0;
        while let Some(offset) = memchr::memchr(b'<', &bytes[pos..]) {
            let at = pos + offset;
            pos = if bytes[at..].starts_with(b"<!--") {
                self.comment(at)
            } else if bytes.get(at + 1) == Some(&b'/') {
                self.end_tag(at).unwrap_or(at + 1)
            } else {
                self.start_tag(at).unwrap_or(at + 1)
            };
        }

        let end = self.source.len();
        for open in core::mem::take(&mut self.stack) {
            self.close(open, end, None);
        }

        self.tags
            .sort_by(|a, b| a.span.start.cmp(&b.span.start).then(b.span.end.cmp(&a.span.end)));
        self.tags
    }
}

/// Scans `source` for tags and comments.
///
/// The result is sorted by start offset, with outer tags before inner tags
/// when two tags start at the same offset. `skip_tags` bounds comments which
/// start inside an opaque tag.
pub fn scan(source: &str, config: &Configuration, skip_tags: &TagNames) -> Vec<Tag> {
    Scanner {
        source,
        config,
        skip_tags,
        stack: Vec::new(),
        tags: Vec::new(),
    }
    .run()
}
