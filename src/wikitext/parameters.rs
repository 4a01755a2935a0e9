//! Triple-brace template parameter recognition.
//!
//! ```wikitext
//! {{{name|default}}}
//! ```
//!
//! Parameter defaults may contain other parameters and templates, so a plain
//! pattern match can stop at the wrong closing braces. Each candidate is
//! therefore checked for balance and extended forward until its opening and
//! closing brace runs agree.

use super::{Error, MAX_NESTING, Span, skip::SkipRanges};
use fancy_regex::Regex as FancyRegex;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Finds candidate parameter spans. The match may end too early when the
/// default value contains nested braces.
static CANDIDATE: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"\{{3}(?!\{)[^|}]*\|?[^}]*\}{3}").unwrap());

/// Runs of two or more opening braces.
static OPEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{{2,}").unwrap());

/// Runs of two or more closing braces.
static CLOSE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\}{2,}").unwrap());

/// A template parameter reference.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Parameter {
    /// The trimmed parameter name.
    pub name: String,
    /// The trimmed default value, if the parameter has one.
    pub value: Option<String>,
    /// The source text of the whole parameter.
    pub text: String,
    /// The byte range of the parameter.
    pub span: Span,
    /// The byte range of the trimmed default value.
    pub value_span: Option<Span>,
    /// The number of other parameters which enclose this one.
    pub nest_level: usize,
    /// Whether the parameter is inside a skip range.
    pub skip: bool,
}

/// Counts the braces which belong to runs of two or more in `text`.
fn brace_runs(pattern: &Regex, text: &str) -> usize {
    pattern.find_iter(text).map(|m| m.len()).sum()
}

/// Extends a candidate ending at `end` until its braces balance. Returns the
/// balanced end offset, or `None` if there are not enough closing braces in
/// the rest of the source.
fn balance(source: &str, start: usize, end: usize) -> Option<usize> {
    let candidate = &source[start..end];
    let open = brace_runs(&OPEN_RUN, candidate);
    let mut close = brace_runs(&CLOSE_RUN, candidate);
    if open <= close {
        return Some(end);
    }

    for run in CLOSE_RUN.find_iter(&source[end..]) {
        close += run.len();
        if close >= open {
            return Some(end + run.end() - (close - open));
        }
    }

    None
}

/// Splits the interior of a parameter into its name and optional default.
///
/// The split happens at the first `|` which is not nested inside braces.
fn split(inner: &str, offset: usize) -> (String, Option<(String, Span)>) {
    let mut depth = 0_usize;
    for (index, b) in inner.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b'|' if depth == 0 => {
                let raw = &inner[index + 1..];
                let value = raw.trim();
                let value_start = offset + index + 1 + (raw.len() - raw.trim_start().len());
                return (
                    inner[..index].trim().to_string(),
                    Some((value.to_string(), Span::new(value_start, value_start + value.len()))),
                );
            }
            _ => {}
        }
    }
    (inner.trim().to_string(), None)
}

/// Finds every parameter in `source`, including parameters nested inside the
/// defaults of other parameters.
///
/// The result is sorted by start offset.
pub fn parse(source: &str, skip: &SkipRanges) -> Result<Vec<Parameter>, Error> {
    let mut parameters = Vec::new();
    // End offsets of the parameters which enclose the search position.
    let mut enclosing = Vec::<usize>::new();
    let mut pos = 0;

    while pos < source.len() {
        let found = match CANDIDATE.find_from_pos(source, pos) {
            Ok(Some(found)) => found,
            Ok(None) => break,
            Err(err) => {
                log::warn!("parameter search stopped at {pos}: {err}");
                break;
            }
        };

        let start = found.start();
        let Some(end) = balance(source, start, found.end()) else {
            log::trace!("discarding unbalanced parameter candidate at {start}");
            pos = start + 3;
            continue;
        };

        while enclosing.last().is_some_and(|&outer| outer <= start) {
            enclosing.pop();
        }
        let nest_level = enclosing.len();

        let span = Span::new(start, end);
        let text = &source[span.into_range()];
        let (name, value) = split(&text[3..text.len() - 3], start + 3);
        let (value, value_span) = value.unzip();
        parameters.push(Parameter {
            name,
            value,
            text: text.to_string(),
            span,
            value_span,
            nest_level,
            skip: skip.contains(span),
        });

        pos = if text[3..].contains("{{{") {
            enclosing.push(end);
            if enclosing.len() > MAX_NESTING {
                log::warn!("parameter nesting exceeds {MAX_NESTING} at {start}");
                return Err(Error::NestingTooDeep {
                    kind: "parameter",
                    offset: start,
                    limit: MAX_NESTING,
                });
            }
            start + 3
        } else {
            end
        };
    }

    log::debug!("found {} parameters", parameters.len());
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Vec<Parameter> {
        super::parse(source, &SkipRanges::default()).unwrap()
    }

    #[test]
    fn simple() {
        let params = parse("a {{{ name | value }}} b {{{other}}}");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "name");
        assert_eq!(params[0].value.as_deref(), Some("value"));
        assert_eq!(params[0].span, Span::new(2, 22));
        assert_eq!(params[0].value_span, Some(Span::new(13, 18)));
        assert_eq!(params[1].name, "other");
        assert_eq!(params[1].value, None);
        assert_eq!(params[1].nest_level, 0);
    }

    #[test]
    fn nested_balance() {
        let source = "{{{1|{{{page|{{PAGENAME}}}}}}}}";
        let params = parse(source);
        assert_eq!(params.len(), 2);

        assert_eq!(params[0].name, "1");
        assert_eq!(params[0].span, Span::new(0, source.len()));
        assert_eq!(params[0].value.as_deref(), Some("{{{page|{{PAGENAME}}}}}"));
        assert_eq!(params[0].nest_level, 0);

        assert_eq!(params[1].name, "page");
        assert_eq!(params[1].text, "{{{page|{{PAGENAME}}}}}");
        assert_eq!(params[1].span, Span::new(5, 28));
        assert_eq!(params[1].value.as_deref(), Some("{{PAGENAME}}"));
        assert_eq!(params[1].nest_level, 1);
    }

    #[test]
    fn siblings_after_nested() {
        let params = parse("{{{a|{{{b}}}}}}{{{c}}}");
        let names = params.iter().map(|p| (p.name.as_str(), p.nest_level)).collect::<Vec<_>>();
        assert_eq!(names, [("a", 0), ("b", 1), ("c", 0)]);
    }

    #[test]
    fn unbalanced() {
        let params = parse("{{{a|{{{b}}}");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "b");
        assert_eq!(params[0].nest_level, 0);
    }

    #[test]
    fn skipped() {
        let skip = SkipRanges::from_spans(vec![Span::new(0, 24)]);
        let params = super::parse("<nowiki>{{{a}}}</nowiki>       {{{b}}}", &skip).unwrap();
        assert!(params[0].skip);
        assert!(!params[1].skip);
    }

    #[test]
    fn too_deep() {
        let source = format!("{}x{}", "{{{a|".repeat(MAX_NESTING + 2), "}}}".repeat(MAX_NESTING + 2));
        assert!(matches!(
            super::parse(&source, &SkipRanges::default()),
            Err(Error::NestingTooDeep { kind: "parameter", .. })
        ));
    }
}
