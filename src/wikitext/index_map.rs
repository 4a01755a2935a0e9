//! An offset index of already recognised constructs.
//!
//! The template and wikilink scanners use this to step over a whole construct
//! at once, and to descend into only the part of it which may contain more
//! constructs of the kind being scanned for.

use super::{
    Span, parameters::Parameter, skip::SkipRanges, tags::Tag, templates::TemplateNode,
    wikilinks::FuzzyWikilink,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// The kind of construct recorded in an [`IndexMap`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// A skip tag.
    Tag,
    /// A triple-brace parameter.
    Parameter,
    /// A wikilink.
    Wikilink,
    /// A template or parser function.
    Template,
}

/// A recognised construct.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Entry {
    /// The end offset of the construct.
    pub end: usize,
    /// The kind of construct.
    pub kind: SpanKind,
    /// The part of the construct which may contain nested constructs.
    pub inner: Option<Span>,
}

/// Recognised constructs keyed by start offset.
#[derive(Clone, Debug, Default)]
pub struct IndexMap {
    /// The entries.
    entries: BTreeMap<usize, Entry>,
}

impl IndexMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a construct. When another construct already starts at the
    /// same offset, the longer of the two is kept.
    pub fn insert(&mut self, span: Span, kind: SpanKind, inner: Option<Span>) {
        let entry = Entry {
            end: span.end,
            kind,
            inner: inner.filter(|inner| span.encloses(*inner)),
        };
        self.entries
            .entry(span.start)
            .and_modify(|old| {
                if old.end < entry.end {
                    *old = entry;
                }
            })
            .or_insert(entry);
    }

    /// Records every retained skip range, with the tag content as its inner
    /// range.
    #[must_use]
    pub fn with_skip_tags(mut self, tags: &[Tag], skip: &SkipRanges) -> Self {
        for tag in tags.iter().filter(|tag| skip.is_range(tag.span)) {
            self.insert(tag.span, SpanKind::Tag, tag.content_span());
        }
        self
    }

    /// Records every parameter, with its default value as its inner range.
    #[must_use]
    pub fn with_parameters(mut self, parameters: &[Parameter]) -> Self {
        for parameter in parameters {
            self.insert(parameter.span, SpanKind::Parameter, parameter.value_span);
        }
        self
    }

    /// Records every wikilink, with the text between its brackets as its
    /// inner range, since both the target and the right operand may contain
    /// templates.
    #[must_use]
    pub fn with_wikilinks<'a>(mut self, links: impl IntoIterator<Item = &'a FuzzyWikilink>) -> Self {
        for link in links {
            let body = Span::new(link.span.start + 2, link.span.end - 2);
            self.insert(link.span, SpanKind::Wikilink, Some(body));
        }
        self
    }

    /// Records every template, with its argument list as its inner range.
    #[must_use]
    pub fn with_templates(mut self, templates: &[TemplateNode]) -> Self {
        for template in templates {
            self.insert(template.span, SpanKind::Template, template.args_span);
        }
        self
    }

    /// Returns the construct starting at `offset`, if it ends no later than
    /// `limit`.
    pub fn at(&self, offset: usize, limit: usize) -> Option<&Entry> {
        self.entries.get(&offset).filter(|entry| entry.end <= limit)
    }

    /// The number of recorded constructs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_wins() {
        let mut map = IndexMap::new();
        map.insert(Span::new(0, 5), SpanKind::Parameter, None);
        map.insert(Span::new(0, 9), SpanKind::Tag, Some(Span::new(2, 7)));
        map.insert(Span::new(0, 3), SpanKind::Template, None);
        let entry = map.at(0, 10).unwrap();
        assert_eq!(entry.kind, SpanKind::Tag);
        assert_eq!(entry.end, 9);
        assert_eq!(entry.inner, Some(Span::new(2, 7)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn limit() {
        let mut map = IndexMap::new();
        map.insert(Span::new(4, 9), SpanKind::Wikilink, Some(Span::new(12, 14)));
        assert!(map.at(4, 8).is_none());
        assert!(map.at(4, 9).unwrap().inner.is_none());
        assert!(map.at(3, 9).is_none());
    }
}
