//! Byte ranges which are opaque to every wikitext parser.

use super::{Span, tags::Tag};
use indexmap::IndexSet;
use unicase::UniCase;

/// An ordered, case-insensitive set of tag names.
pub type TagNames = IndexSet<UniCase<String>>;

/// Sorted, non-overlapping ranges covered by skip tags.
#[derive(Clone, Debug, Default)]
pub struct SkipRanges {
    /// The ranges, sorted by start offset.
    ranges: Vec<Span>,
}

impl SkipRanges {
    /// Collects the ranges of every tag in `tags` whose name is in `names`.
    ///
    /// `tags` must be sorted by start offset, outer tags first. A range which
    /// lies inside an already accepted range is discarded.
    pub fn build(tags: &[Tag], names: &TagNames) -> Self {
        let mut ranges = Vec::<Span>::new();
        for tag in tags {
            if !names.contains(&UniCase::new(tag.name.clone())) {
                continue;
            }
            if ranges.last().is_some_and(|last| last.encloses(tag.span)) {
                continue;
            }
            ranges.push(tag.span);
        }
        Self { ranges }
    }

    /// Returns true if `span` lies inside some skip range other than itself.
    pub fn contains(&self, span: Span) -> bool {
        let index = self.ranges.partition_point(|range| range.start <= span.start);
        index > 0 && {
            let range = self.ranges[index - 1];
            range != span && range.encloses(span)
        }
    }

    /// Returns true if `span` is exactly one of the retained ranges.
    pub fn is_range(&self, span: Span) -> bool {
        self.ranges.binary_search(&span).is_ok()
    }

    /// Iterates over the retained ranges.
    pub fn iter(&self) -> impl Iterator<Item = Span> + '_ {
        self.ranges.iter().copied()
    }

    /// The number of retained ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true if there are no skip ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Creates an index from already sorted, non-overlapping ranges.
    #[cfg(test)]
    pub(crate) fn from_spans(ranges: Vec<Span>) -> Self {
        Self { ranges }
    }
}

/// Builds a tag name set from `names`, ignoring blank names.
pub fn tag_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> TagNames {
    names
        .into_iter()
        .map(|name| UniCase::new(name.as_ref().trim().to_string()))
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::CONFIG, wikitext::tags};

    #[test]
    fn nested_ranges_are_dropped() {
        let source = "<nowiki><pre>a</pre></nowiki> <PRE>b</PRE> <span>c</span>";
        let names = tag_names(["nowiki", "pre"]);
        let tags = tags::scan(source, &CONFIG, &names);
        let skip = SkipRanges::build(&tags, &names);
        assert_eq!(skip.iter().collect::<Vec<_>>(), [Span::new(0, 29), Span::new(30, 42)]);
        assert!(skip.is_range(Span::new(30, 42)));
        assert!(skip.contains(Span::new(8, 20)));
        assert!(!skip.contains(Span::new(0, 29)));
        assert!(!skip.contains(Span::new(43, 57)));
    }

    #[test]
    fn names() {
        let names = tag_names(["Nowiki", " pre ", "", "NOWIKI"]);
        assert_eq!(names.len(), 2);
        assert!(names.contains(&UniCase::new("nowiki".to_string())));
        assert!(names.contains(&UniCase::new("pre".to_string())));
    }
}
