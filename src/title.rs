//! Types and functions for validating and normalising MediaWiki title strings.
//!
//! The parsers in this crate only need a title collaborator that can clean up
//! a raw title, decide whether it is well-formed, and report its namespace.
//! That capability is the [`TitleResolver`] trait; the default implementation
//! is [`Configuration`], which works from static site configuration data.

use crate::wikitext::Configuration;
use html_escape::decode_html_entities;
use serde::{Serialize, Serializer};
use std::{borrow::Cow, fmt::Write as _};

/// The maximum length of a title, in bytes.
const MAX_TITLE_LEN: usize = 255;

/// The maximum length of a title in the File namespace, in bytes.
const MAX_FILE_TITLE_LEN: usize = 240;

/// The title casing strategy for a namespace.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NamespaceCase {
    /// The first letter of the title is capitalised.
    FirstLetter,
    /// The title is case-sensitive.
    CaseSensitive,
}

/// An article namespace.
#[derive(Debug, Eq)]
pub struct Namespace {
    /// The namespace ID.
    pub id: i32,
    /// The display name of the namespace.
    pub name: &'static str,
    /// The canonical name of the namespace.
    ///
    /// For example, the canonical 'Project' namespace, present on all MW
    /// installations, is normally given a display name matching the name of the
    /// wiki.
    pub canonical: Option<&'static str>,
    /// The case folding strategy for titles in the namespace.
    pub case: NamespaceCase,
    /// Named aliases for the namespace.
    pub aliases: &'static [&'static str],
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Namespace {
    /// The special namespace ID used for direct links to media files.
    pub const MEDIA: i32 = -2;
    /// The special namespace ID used for dynamic pages.
    pub const SPECIAL: i32 = -1;
    /// The main namespace ID.
    pub const MAIN: i32 = 0;
    /// The talk namespace ID.
    pub const TALK: i32 = 1;
    /// The user namespace ID.
    pub const USER: i32 = 2;
    /// The project namespace ID.
    pub const PROJECT: i32 = 4;
    /// The file namespace ID.
    pub const FILE: i32 = 6;
    /// The system namespace ID.
    pub const MEDIAWIKI: i32 = 8;
    /// The template namespace ID.
    pub const TEMPLATE: i32 = 10;
    /// The help namespace ID.
    pub const HELP: i32 = 12;
    /// The category namespace ID.
    pub const CATEGORY: i32 = 14;

    /// Returns true if this is a talk namespace.
    #[inline]
    pub const fn is_talk(&self) -> bool {
        self.id > Namespace::MAIN && self.id % 2 == 1
    }

    /// Returns true if `name` is the display name, canonical name, or an
    /// alias of this namespace, ignoring case and treating underscores as
    /// spaces.
    pub fn matches(&self, name: &str) -> bool {
        let eq = |candidate: &str| {
            candidate.len() == name.len()
                && candidate
                    .bytes()
                    .zip(name.bytes())
                    .all(|(a, b)| a.eq_ignore_ascii_case(&b) || (a == b' ' && b == b'_'))
        };
        eq(self.name) || self.canonical.is_some_and(eq) || self.aliases.iter().any(|a| eq(a))
    }
}

/// A capability that validates, normalises, and classifies raw title strings.
pub trait TitleResolver {
    /// Cleans a raw title string and resolves it into a [`Title`], using
    /// `default_namespace` when the text has no namespace prefix.
    ///
    /// Returns `None` if the title is empty or contains illegal characters.
    fn resolve(&self, raw: &str, default_namespace: i32) -> Option<Title>;

    /// Finds the namespace with the given numeric ID.
    fn namespace(&self, id: i32) -> Option<&'static Namespace>;
}

/// A normalised and validated title.
#[derive(Clone, Debug, Eq)]
pub struct Title {
    /// The location of the fragment delimiter in the title, if one exists.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    ///                                   ^
    /// ```
    fragment_delimiter: Option<usize>,

    /// The location of the interwiki delimiter in the title, if one exists.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    ///          ^
    /// ```
    iw_delimiter: Option<usize>,

    /// Whether the raw text started with a colon.
    leading_colon: bool,

    /// The namespace of the title.
    namespace: &'static Namespace,

    /// The location of the namespace delimiter in the title, if one exists.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    ///                    ^
    /// ```
    ns_delimiter: Option<usize>,

    /// The full title text.
    text: String,
}

impl PartialEq for Title {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Title {
    /// Creates a title from a known namespace plus already-normalised text
    /// parts.
    pub fn from_parts(
        namespace: &'static Namespace,
        title: &str,
        fragment: Option<&str>,
        interwiki: Option<&str>,
    ) -> Self {
        let mut text = String::with_capacity(title.len() + namespace.name.len() + 1);

        let iw_delimiter = interwiki.map(|interwiki| {
            text += interwiki;
            let delimiter = text.len();
            text.push(':');
            delimiter
        });

        let ns_delimiter = (!namespace.name.is_empty()).then(|| {
            text += namespace.name;
            let delimiter = text.len();
            text.push(':');
            delimiter
        });

        match title.chars().next() {
            Some(first)
                if namespace.case == NamespaceCase::FirstLetter
                    && interwiki.is_none()
                    && first.is_lowercase() =>
            {
                // `write!` into a `String` cannot fail.
                let _ = write!(text, "{}{}", first.to_uppercase(), &title[first.len_utf8()..]);
            }
            _ => text += title,
        }

        let fragment_delimiter = fragment.map(|fragment| {
            let delimiter = text.len();
            text.push('#');
            text += fragment;
            delimiter
        });

        Self {
            fragment_delimiter,
            iw_delimiter,
            leading_colon: false,
            namespace,
            ns_delimiter,
            text,
        }
    }

    /// The page fragment.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    ///                                    ^^^^^^^^
    /// ```
    pub fn fragment(&self) -> Option<&str> {
        self.fragment_delimiter.map(|d| &self.text[d + 1..])
    }

    /// Returns true if the raw text started with a colon, e.g.
    /// `[[:File:Example.png]]`.
    pub fn had_leading_colon(&self) -> bool {
        self.leading_colon
    }

    /// The title interwiki identifier.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    /// ^^^^^^^^^
    /// ```
    pub fn interwiki(&self) -> Option<&str> {
        self.iw_delimiter.map(|d| &self.text[..d])
    }

    /// Returns true if the title points to another wiki.
    pub fn is_external(&self) -> bool {
        self.iw_delimiter.is_some()
    }

    /// The namespace and local part of the title.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    ///           ^^^^^^^^^^^^^^^^^^^^^^^^
    /// ```
    pub fn key(&self) -> &str {
        let start_at = self.iw_delimiter.map_or(0, |d| d + 1);
        let end_at = self.fragment_delimiter.unwrap_or(self.text.len());
        &self.text[start_at..end_at]
    }

    /// The title’s namespace object.
    pub fn namespace(&self) -> &'static Namespace {
        self.namespace
    }

    /// The title’s namespace ID.
    pub fn namespace_id(&self) -> i32 {
        self.namespace.id
    }

    /// The full title, without its fragment, optionally with a leading colon.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    /// ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
    /// ```
    pub fn prefixed_text(&self, with_colon: bool) -> Cow<'_, str> {
        let end_at = self.fragment_delimiter.unwrap_or(self.text.len());
        let text = &self.text[..end_at];
        if with_colon {
            Cow::Owned(format!(":{text}"))
        } else {
            Cow::Borrowed(text)
        }
    }

    /// The path of the page, without namespace or fragment.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    ///                     ^^^^^^^^^^^^^^
    /// ```
    pub fn text(&self) -> &str {
        let start_at = self.ns_delimiter.or(self.iw_delimiter).map_or(0, |d| d + 1);
        let end_at = self.fragment_delimiter.unwrap_or(self.text.len());
        &self.text[start_at..end_at]
    }

    /// The full text of the title.
    ///
    /// ```text
    /// Interwiki:Namespace:Title/Sub/Page#Fragment
    /// ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
    /// ```
    pub fn full_text(&self) -> &str {
        &self.text
    }
}

impl core::fmt::Display for Title {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.prefixed_text(false))
    }
}

impl Serialize for Title {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl TitleResolver for Configuration {
    fn resolve(&self, raw: &str, default_namespace: i32) -> Option<Title> {
        let text = normalize(raw);
        let (leading_colon, text) = match text.strip_prefix(':') {
            Some(rest) => (true, rest.trim_start_matches(' ')),
            None => (false, &*text),
        };

        let mut namespace = if leading_colon {
            self.namespace_by_id(Namespace::MAIN)?
        } else {
            self.namespace_by_id(default_namespace)?
        };
        let mut explicit_namespace = false;
        let mut interwiki = None;
        let mut rest = text;

        if let Some((prefix, tail)) = text.split_once(':') {
            let prefix = prefix.trim_end_matches(' ');
            if let Some(ns) = self.namespace_by_name(prefix) {
                namespace = ns;
                explicit_namespace = true;
                rest = tail.trim_start_matches(' ');
            } else if self.is_interwiki(prefix) {
                namespace = self.namespace_by_id(Namespace::MAIN)?;
                interwiki = Some(prefix.to_lowercase());
                rest = tail.trim_start_matches(' ');
            }
        }

        let (rest, fragment) = rest.split_once('#').map_or((rest, None), |(text, fragment)| {
            (text.trim_end_matches(' '), Some(fragment))
        });

        if !self.is_valid_title_text(rest, namespace.id) {
            return None;
        }

        if rest.is_empty()
            && interwiki.is_none()
            && (explicit_namespace || fragment.is_none() || namespace.id != Namespace::MAIN)
        {
            return None;
        }

        let mut title = Title::from_parts(namespace, rest, fragment, interwiki.as_deref());
        title.leading_colon = leading_colon;
        Some(title)
    }

    fn namespace(&self, id: i32) -> Option<&'static Namespace> {
        self.namespace_by_id(id)
    }
}

impl Configuration {
    /// Returns true if `text` is acceptable as the local part of a title in
    /// the given namespace.
    fn is_valid_title_text(&self, text: &str, namespace: i32) -> bool {
        let max_len = if namespace == Namespace::FILE {
            MAX_FILE_TITLE_LEN
        } else {
            MAX_TITLE_LEN
        };

        let bytes = text.as_bytes();
        text.len() <= max_len
            && bytes.iter().all(|b| self.valid_title_bytes.contains(*b))
            && !bytes.windows(3).any(|w| {
                w[0] == b'%' && w[1].is_ascii_hexdigit() && w[2].is_ascii_hexdigit()
            })
            && !text.starts_with(':')
            && !text.contains("~~~")
            && !is_relative_path(text)
    }
}

/// Returns true if the title text is a relative path, which MediaWiki
/// forbids because it would break URLs.
fn is_relative_path(text: &str) -> bool {
    text == "."
        || text == ".."
        || text.starts_with("./")
        || text.starts_with("../")
        || text.contains("/./")
        || text.contains("/../")
        || text.ends_with("/.")
        || text.ends_with("/..")
}

/// Returns true if the given character `c` is a bidirectional text control
/// character.
fn bidi(c: char) -> bool {
    ('\u{200e}'..='\u{200f}').contains(&c) || ('\u{202a}'..='\u{202e}').contains(&c)
}

/// Returns true if the character `c` is considered like whitespace in title
/// text.
fn spacelike(c: char) -> bool {
    c == '_' || c.is_whitespace()
}

/// Normalises a title text part by decoding HTML entities, removing bidi
/// markers, and converting runs of whitespace and underscores to a single
/// space character. Leading and trailing whitespace is removed.
pub fn normalize(text: &str) -> Cow<'_, str> {
    let decoded = decode_html_entities(text);

    let is_clean = {
        let mut prev_space = true;
        let mut clean = true;
        for c in decoded.chars() {
            if bidi(c) || (spacelike(c) && (c != ' ' || prev_space)) {
                clean = false;
                break;
            }
            prev_space = c == ' ';
        }
        clean && !decoded.ends_with(' ')
    };

    if is_clean {
        return decoded;
    }

    let mut out = String::with_capacity(decoded.len());
    let mut pending_space = false;
    for c in decoded.chars() {
        if bidi(c) {
            continue;
        } else if spacelike(c) {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG;

    #[test]
    fn normalize() {
        assert_eq!(super::normalize("A b"), Cow::Borrowed("A b"));
        assert_eq!(super::normalize("A_b"), "A b");
        assert_eq!(super::normalize("A_______b"), "A b");
        assert_eq!(super::normalize("A__  __b"), "A b");
        assert_eq!(super::normalize("A  b"), "A b");
        assert_eq!(super::normalize("   A b   "), "A b");
        assert_eq!(super::normalize(" \t A b"), "A b");
        assert_eq!(super::normalize("\u{200e}A b   \u{202e}"), "A b");
        assert_eq!(super::normalize("A&amp;B"), "A&B");
    }

    #[test]
    fn resolve_default_namespace() {
        let title = CONFIG.resolve("foo bar", Namespace::TEMPLATE).unwrap();
        assert_eq!(title.namespace_id(), Namespace::TEMPLATE);
        assert_eq!(title.prefixed_text(false), "Template:Foo bar");
        assert_eq!(title.text(), "Foo bar");
        assert!(!title.had_leading_colon());
    }

    #[test]
    fn resolve_explicit_namespace() {
        let title = CONFIG.resolve("image:Foo.png", Namespace::MAIN).unwrap();
        assert_eq!(title.namespace_id(), Namespace::FILE);
        assert_eq!(title.prefixed_text(false), "File:Foo.png");

        let title = CONFIG.resolve(":File:Foo.png", Namespace::MAIN).unwrap();
        assert_eq!(title.namespace_id(), Namespace::FILE);
        assert!(title.had_leading_colon());
        assert_eq!(title.prefixed_text(true), ":File:Foo.png");
    }

    #[test]
    fn resolve_leading_colon_means_main() {
        let title = CONFIG.resolve(":Foo", Namespace::TEMPLATE).unwrap();
        assert_eq!(title.namespace_id(), Namespace::MAIN);
        assert_eq!(title.to_string(), "Foo");
    }

    #[test]
    fn resolve_fragment_and_interwiki() {
        let title = CONFIG.resolve("Foo#Bar baz", Namespace::MAIN).unwrap();
        assert_eq!(title.fragment(), Some("Bar baz"));
        assert_eq!(title.key(), "Foo");

        let title = CONFIG.resolve("#Section", Namespace::MAIN).unwrap();
        assert_eq!(title.text(), "");
        assert_eq!(title.fragment(), Some("Section"));

        let title = CONFIG.resolve("wikt:foo", Namespace::MAIN).unwrap();
        assert!(title.is_external());
        assert_eq!(title.interwiki(), Some("wikt"));
        assert_eq!(title.text(), "foo");
    }

    #[test]
    fn resolve_rejects_bad_titles() {
        for bad in [
            "", "   ", "Template:", "a[b", "a|b", "a{b}", "a<b>", "%41bc", "./a", "a/../b",
            "~~~~", "::a",
        ] {
            assert_eq!(CONFIG.resolve(bad, Namespace::MAIN), None, "{bad:?}");
        }
        assert!(CONFIG.resolve(&"a".repeat(256), Namespace::MAIN).is_none());
        assert!(CONFIG.resolve(&"a".repeat(241), Namespace::FILE).is_none());
        assert!(CONFIG.resolve(&"a".repeat(241), Namespace::MAIN).is_some());
    }
}
