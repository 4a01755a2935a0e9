//! Wikitext recognition.
//!
//! A [`Wikitext`] document owns some source text and lazily recognises the
//! constructs in it. Every recognised construct carries the byte range it came
//! from, so callers can rewrite the source surgically with the `modify_*`
//! methods.

use crate::config::CONFIG;
pub use codemap::{FileMap, LineCol, Span};
pub use config::{Configuration, ConfigurationSource, DEFAULT_SKIP_TAGS};
pub use index_map::{Entry, IndexMap, SpanKind};
pub use parameters::Parameter;
pub use sections::Section;
pub use skip::{SkipRanges, TagNames};
pub use tags::{COMMENT, Tag};
pub use templates::{TemplateKind, TemplateNode, TemplateParamRaw};
pub use wikilinks::{FuzzyWikilink, Wikilink};
use std::{cell::OnceCell, time::Instant};
use unicase::UniCase;

mod codemap;
mod config;
mod index_map;
mod parameters;
mod sections;
mod skip;
mod tags;
mod templates;
#[cfg(test)]
mod tests;
mod wikilinks;

/// The deepest nesting of templates, wikilinks, or parameters which will be
/// recognised before giving up.
pub const MAX_NESTING: usize = 64;

/// A wikitext error.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A rewrite callback returned the wrong number of replacements.
    #[error("expected {expected} replacements, got {actual}")]
    ArityMismatch {
        /// The number of records given to the callback.
        expected: usize,
        /// The number of replacements it returned.
        actual: usize,
    },
    /// Two replaced records overlap, so the rewrite is ambiguous.
    #[error("edit at {}..{} overlaps edit at {}..{}", first.start, first.end, second.start, second.end)]
    OverlappingEdits {
        /// The earlier edit.
        first: Span,
        /// The later edit.
        second: Span,
    },
    /// The input nests constructs too deeply.
    #[error("{kind} nesting is deeper than {limit} at byte {offset}")]
    NestingTooDeep {
        /// The kind of construct.
        kind: &'static str,
        /// Where the limit was hit.
        offset: usize,
        /// The limit.
        limit: usize,
    },
}

/// Document options.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Extra names of tags whose content is opaque.
    pub skip_tags: Vec<String>,
    /// If true, `skip_tags` replaces [`DEFAULT_SKIP_TAGS`] instead of adding
    /// to it.
    pub overwrite_skip_tags: bool,
}

/// Memoised recognition results.
#[derive(Debug, Default)]
struct Cache {
    /// Tags, and the skip ranges derived from them.
    tags: OnceCell<(Vec<Tag>, SkipRanges)>,
    /// Sections.
    sections: OnceCell<Vec<Section>>,
    /// Parameters.
    parameters: OnceCell<Result<Vec<Parameter>, Error>>,
    /// Unclassified wikilinks.
    fuzzy_wikilinks: OnceCell<Result<Vec<FuzzyWikilink>, Error>>,
    /// Templates.
    templates: OnceCell<Result<Vec<TemplateNode>, Error>>,
    /// Classified wikilinks.
    wikilinks: OnceCell<Result<Vec<Wikilink>, Error>>,
}

/// Runs one recognition pass, logging how long it took.
fn timed<T>(name: &str, f: impl FnOnce() -> T) -> T {
    let now = Instant::now();
    let result = f();
    log::trace!("{name}: {}s", now.elapsed().as_secs_f64());
    result
}

/// Returns the records of a fallible pass which match `f`.
fn select<'a, T>(
    records: &'a Result<Vec<T>, Error>,
    f: impl Fn(&T) -> bool,
) -> Result<Vec<&'a T>, Error> {
    match records {
        Ok(records) => Ok(records.iter().filter(|record| f(record)).collect()),
        Err(err) => Err(err.clone()),
    }
}

/// A wikitext document.
///
/// ```
/// # use wiki_scan::wikitext::{Options, Wikitext};
/// let doc = Wikitext::new("{{Cite|url=x}} [[Foo|bar]]", Options::default());
/// let templates = doc.parse_templates().unwrap();
/// assert_eq!(templates[0].params[0].key, "url");
/// ```
#[derive(Debug)]
pub struct Wikitext<'a> {
    /// The parser configuration.
    config: &'a Configuration,
    /// The source text.
    content: String,
    /// Names of tags whose content is opaque.
    skip_tags: TagNames,
    /// Memoised recognition results.
    cache: Cache,
}

impl Wikitext<'static> {
    /// Creates a document using the default site configuration.
    pub fn new(content: impl Into<String>, options: Options) -> Self {
        Self::with_config(content, options, &CONFIG)
    }
}

impl<'a> Wikitext<'a> {
    /// Creates a document using the given site configuration.
    pub fn with_config(content: impl Into<String>, options: Options, config: &'a Configuration) -> Self {
        let extra = options.skip_tags.iter().map(String::as_str);
        let skip_tags = if options.overwrite_skip_tags {
            skip::tag_names(extra)
        } else {
            skip::tag_names(DEFAULT_SKIP_TAGS.iter().copied().chain(extra))
        };

        Self {
            config,
            content: content.into(),
            skip_tags,
            cache: Cache::default(),
        }
    }

    /// The site configuration.
    pub fn config(&self) -> &'a Configuration {
        self.config
    }

    /// The source text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the source text.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.clear();
    }

    /// Discards every recognition result.
    fn clear(&mut self) {
        self.cache = Cache::default();
    }

    /// Names of tags whose content is opaque.
    pub fn skip_tags(&self) -> impl Iterator<Item = &str> {
        self.skip_tags.iter().map(|name| name.as_str())
    }

    /// Makes the content of the named tags opaque.
    pub fn add_skip_tags<S: AsRef<str>>(&mut self, names: impl IntoIterator<Item = S>) {
        let before = self.skip_tags.len();
        self.skip_tags.extend(skip::tag_names(names));
        if self.skip_tags.len() != before {
            self.clear();
        }
    }

    /// Replaces the set of tags whose content is opaque.
    pub fn set_skip_tags<S: AsRef<str>>(&mut self, names: impl IntoIterator<Item = S>) {
        let skip_tags = skip::tag_names(names);
        if skip_tags != self.skip_tags {
            self.skip_tags = skip_tags;
            self.clear();
        }
    }

    /// Stops treating the content of the named tags as opaque.
    pub fn remove_skip_tags<S: AsRef<str>>(&mut self, names: impl IntoIterator<Item = S>) {
        let before = self.skip_tags.len();
        for name in names {
            self.skip_tags.shift_remove(&UniCase::new(name.as_ref().trim().to_string()));
        }
        if self.skip_tags.len() != before {
            self.clear();
        }
    }

    /// Scans tags and builds the skip ranges.
    fn scanned(&self) -> &(Vec<Tag>, SkipRanges) {
        self.cache.tags.get_or_init(|| {
            timed("tags", || {
                let mut tags = tags::scan(&self.content, self.config, &self.skip_tags);
                let skip = SkipRanges::build(&tags, &self.skip_tags);
                for tag in &mut tags {
                    tag.skip = skip.contains(tag.span);
                }
                log::debug!("found {} tags, {} skip ranges", tags.len(), skip.len());
                (tags, skip)
            })
        })
    }

    /// The byte ranges which are opaque to every parser.
    pub fn skip_ranges(&self) -> &SkipRanges {
        &self.scanned().1
    }

    /// Every tag and comment, including those inside skip ranges, sorted by
    /// start offset.
    pub fn parse_tags(&self) -> &[Tag] {
        &self.scanned().0
    }

    /// Every tag and comment which matches `f`.
    pub fn parse_tags_where(&self, f: impl Fn(&Tag) -> bool) -> Vec<&Tag> {
        self.parse_tags().iter().filter(|tag| f(tag)).collect()
    }

    /// The sections of the document. The first section is always the
    /// implicit top section.
    pub fn parse_sections(&self) -> &[Section] {
        self.cache.sections.get_or_init(|| {
            timed("sections", || {
                let (tags, skip) = self.scanned();
                sections::split(&self.content, tags, skip)
            })
        })
    }

    /// Every parameter, including those inside skip ranges.
    fn parameters(&self) -> &Result<Vec<Parameter>, Error> {
        self.cache.parameters.get_or_init(|| {
            timed("parameters", || parameters::parse(&self.content, self.skip_ranges()))
        })
    }

    /// Parameters outside skip ranges. If `recursive` is false, parameters
    /// nested inside other parameters are omitted.
    pub fn parse_parameters(&self, recursive: bool) -> Result<Vec<&Parameter>, Error> {
        self.parse_parameters_where(|parameter| !parameter.skip, recursive)
    }

    /// Parameters which match `f`. If `recursive` is false, parameters nested
    /// inside other parameters are omitted.
    pub fn parse_parameters_where(
        &self,
        f: impl Fn(&Parameter) -> bool,
        recursive: bool,
    ) -> Result<Vec<&Parameter>, Error> {
        select(self.parameters(), |parameter| {
            (recursive || parameter.nest_level == 0) && f(parameter)
        })
    }

    /// Every `[[…]]` pair, before classification.
    pub fn fuzzy_wikilinks(&self) -> Result<&[FuzzyWikilink], Error> {
        self.cache
            .fuzzy_wikilinks
            .get_or_init(|| {
                timed("fuzzy wikilinks", || {
                    let (tags, skip) = self.scanned();
                    let map = IndexMap::new()
                        .with_skip_tags(tags, skip)
                        .with_parameters(self.parameters().as_deref().map_err(Clone::clone)?);
                    wikilinks::parse_fuzzy(&self.content, &map, skip, self.config)
                })
            })
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Every template, including those inside skip ranges.
    fn templates(&self) -> &Result<Vec<TemplateNode>, Error> {
        self.cache.templates.get_or_init(|| {
            timed("templates", || {
                let (tags, skip) = self.scanned();
                let map = IndexMap::new()
                    .with_skip_tags(tags, skip)
                    .with_parameters(self.parameters().as_deref().map_err(Clone::clone)?)
                    .with_wikilinks(self.fuzzy_wikilinks()?);
                templates::parse(&self.content, self.config, self.config, &map, skip)
            })
        })
    }

    /// Templates and parser functions outside skip ranges, at every nesting
    /// depth, sorted by start offset.
    pub fn parse_templates(&self) -> Result<Vec<&TemplateNode>, Error> {
        self.parse_templates_where(|template| !template.skip)
    }

    /// Templates and parser functions which match `f`.
    pub fn parse_templates_where(&self, f: impl Fn(&TemplateNode) -> bool) -> Result<Vec<&TemplateNode>, Error> {
        select(self.templates(), f)
    }

    /// Every classified wikilink, including those inside skip ranges.
    fn wikilinks(&self) -> &Result<Vec<Wikilink>, Error> {
        self.cache.wikilinks.get_or_init(|| {
            timed("wikilinks", || {
                let (tags, skip) = self.scanned();
                let fuzzy = self.fuzzy_wikilinks()?;
                let map = IndexMap::new()
                    .with_skip_tags(tags, skip)
                    .with_parameters(self.parameters().as_deref().map_err(Clone::clone)?)
                    .with_templates(self.templates().as_deref().map_err(Clone::clone)?)
                    .with_wikilinks(fuzzy);
                Ok(wikilinks::finalize(&self.content, fuzzy, &map))
            })
        })
    }

    /// Wikilinks outside skip ranges, sorted by start offset.
    pub fn parse_wikilinks(&self) -> Result<Vec<&Wikilink>, Error> {
        self.parse_wikilinks_where(|link| !link.skip())
    }

    /// Wikilinks which match `f`.
    pub fn parse_wikilinks_where(&self, f: impl Fn(&Wikilink) -> bool) -> Result<Vec<&Wikilink>, Error> {
        select(self.wikilinks(), f)
    }

    /// Rewrites tags.
    ///
    /// `f` receives every tag and returns one replacement per tag, where
    /// `None` leaves the tag unchanged. Returns the new source text.
    ///
    /// A replacement covers the whole tag, including its content, so a tag
    /// and a tag nested inside it cannot both be replaced in one call: that
    /// fails with [`Error::OverlappingEdits`]. To rewrite nested tags, replace
    /// the outer tag with text that already contains the rewritten inner
    /// tags, or call this once per nesting level.
    pub fn modify_tags(&mut self, f: impl FnOnce(&[&Tag]) -> Vec<Option<String>>) -> Result<&str, Error> {
        let tags = self.parse_tags().iter().collect::<Vec<_>>();
        let replacements = f(&tags);
        let spans = tags.iter().map(|tag| tag.span).collect::<Vec<_>>();
        self.rewrite(&spans, replacements)
    }

    /// Rewrites parameters.
    ///
    /// `f` receives every parameter outside skip ranges and returns one
    /// replacement per parameter, where `None` leaves the parameter unchanged.
    /// Returns the new source text.
    pub fn modify_parameters(
        &mut self,
        f: impl FnOnce(&[&Parameter]) -> Vec<Option<String>>,
    ) -> Result<&str, Error> {
        let parameters = self.parse_parameters(true)?;
        let replacements = f(&parameters);
        let spans = parameters.iter().map(|parameter| parameter.span).collect::<Vec<_>>();
        self.rewrite(&spans, replacements)
    }

    /// Rewrites templates.
    ///
    /// `f` receives every template outside skip ranges and returns one
    /// replacement per template, where `None` leaves the template unchanged.
    /// Returns the new source text.
    pub fn modify_templates(
        &mut self,
        f: impl FnOnce(&[&TemplateNode]) -> Vec<Option<String>>,
    ) -> Result<&str, Error> {
        let templates = self.parse_templates()?;
        let replacements = f(&templates);
        let spans = templates.iter().map(|template| template.span).collect::<Vec<_>>();
        self.rewrite(&spans, replacements)
    }

    /// Replaces the text at `spans` with the corresponding replacements.
    ///
    /// Either every replacement is applied or none is.
    fn rewrite(&mut self, spans: &[Span], replacements: Vec<Option<String>>) -> Result<&str, Error> {
        if spans.len() != replacements.len() {
            return Err(Error::ArityMismatch {
                expected: spans.len(),
                actual: replacements.len(),
            });
        }

        let mut edits = spans
            .iter()
            .zip(replacements)
            .filter_map(|(span, text)| text.map(|text| (*span, text)))
            .collect::<Vec<_>>();
        if edits.is_empty() {
            return Ok(&self.content);
        }

        edits.sort_by_key(|(span, _)| *span);
        if let Some(pair) = edits.windows(2).find(|pair| pair[0].0.end > pair[1].0.start) {
            return Err(Error::OverlappingEdits {
                first: pair[0].0,
                second: pair[1].0,
            });
        }

        let expected_len = edits
            .iter()
            .fold(self.content.len(), |len, (span, text)| len - span.len() + text.len());
        let mut content = String::with_capacity(expected_len);
        let mut pos = 0;
        for (span, text) in &edits {
            content += &self.content[pos..span.start];
            content += text;
            pos = span.end;
        }
        content += &self.content[pos..];
        assert_eq!(content.len(), expected_len, "rewritten length does not match edits");

        log::debug!("applied {} edits", edits.len());
        self.set_content(content);
        Ok(&self.content)
    }
}
