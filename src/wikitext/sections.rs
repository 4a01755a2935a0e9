//! Section splitting.

use super::{Span, config::HEADING_TAGS, skip::SkipRanges, tags::Tag};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// A pattern matching a wikitext heading line.
///
/// The trailing group may only contain horizontal whitespace and comments;
/// anything else after the closing `=` means the line is not a heading.
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(=+)(.+?)(=+)((?:[ \t]|<!--(?s:.*?)-->)*)$").unwrap()
});

/// A document section.
///
/// ```wikitext
/// == Title ==
/// Content
/// === Subsection ===
/// Subsection content
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Section {
    /// The source text of the heading line. Empty for the top section.
    pub heading: String,
    /// The trimmed heading title. `"top"` for the top section.
    pub title: String,
    /// The outline level, from 1 to 6.
    pub level: u8,
    /// The ordinal of the section, where the top section is 0.
    pub index: usize,
    /// The byte range of the section, including its heading and any
    /// subsections.
    pub span: Span,
    /// The source text of the section.
    pub content: String,
}

/// A recognised heading.
#[derive(Debug)]
struct Heading {
    /// The heading source text.
    text: String,
    /// The trimmed heading title.
    title: String,
    /// The outline level.
    level: u8,
    /// The position of the heading.
    start: usize,
}

/// Collects headings written as HTML `<hN>` tags.
fn html_headings(tags: &[Tag], skip: &SkipRanges) -> impl Iterator<Item = Heading> {
    tags.iter().filter_map(|tag| {
        let level = HEADING_TAGS.iter().position(|name| *name == tag.name)?;
        if skip.contains(tag.span) {
            return None;
        }
        Some(Heading {
            text: tag.text(),
            title: tag.content.as_deref().unwrap_or_default().trim().to_string(),
            level: u8::try_from(level + 1).ok()?,
            start: tag.span.start,
        })
    })
}

/// Collects headings written with `=` markers.
fn wikitext_headings<'a>(source: &'a str, skip: &'a SkipRanges) -> impl Iterator<Item = Heading> + 'a {
    HEADING.captures_iter(source).filter_map(|captures| {
        let whole = captures.get(0)?;
        let span = Span::new(whole.start(), whole.end());
        if skip.contains(span) {
            return None;
        }

        let left = captures.get(1)?.len();
        let right = captures.get(3)?.len();
        let level = left.min(right).min(6);
        let title = format!(
            "{}{}{}",
            "=".repeat(left - level),
            captures.get(2)?.as_str(),
            "=".repeat(right - level)
        );

        Some(Heading {
            text: whole.as_str().to_string(),
            title: title.trim().to_string(),
            level: u8::try_from(level).ok()?,
            start: span.start,
        })
    })
}

/// Splits `source` into sections.
///
/// The first section is always the implicit top section, which ends at the
/// first heading. Every other section ends at the next heading of the same or
/// a shallower level.
pub fn split(source: &str, tags: &[Tag], skip: &SkipRanges) -> Vec<Section> {
    let mut headings = html_headings(tags, skip)
        .chain(wikitext_headings(source, skip))
        .collect::<Vec<_>>();
    headings.sort_by_key(|heading| heading.start);

    let mut sections = Vec::with_capacity(headings.len() + 1);
    let top_end = headings.first().map_or(source.len(), |heading| heading.start);
    sections.push(Section {
        heading: String::new(),
        title: "top".to_string(),
        level: 1,
        index: 0,
        span: Span::new(0, top_end),
        content: source[..top_end].to_string(),
    });

    for (index, heading) in headings.iter().enumerate() {
        let end = headings[index + 1..]
            .iter()
            .find(|next| next.level <= heading.level)
            .map_or(source.len(), |next| next.start);
        let span = Span::new(heading.start, end);
        sections.push(Section {
            heading: heading.text.clone(),
            title: heading.title.clone(),
            level: heading.level,
            index: index + 1,
            span,
            content: source[span.into_range()].to_string(),
        });
    }

    // Every byte between two consecutive heading starts belongs to the section
    // of the first one.
    assert!(
        sections
            .windows(2)
            .all(|pair| pair[0].span.start <= pair[1].span.start && pair[1].span.start <= pair[0].span.end),
        "section list has holes"
    );

    sections
}
