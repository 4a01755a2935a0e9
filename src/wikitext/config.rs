//! Parser configuration data.

// This code is loosely based on `parse_wiki_text`. The upstream copyright is:
//
// SPDX-License-Identifier: MIT
// SPDX-FileCopyright: Copyright 2019 Fredrik Portström and other contributors

use crate::title::Namespace;
use phf::Set;

/// Site specific configuration of a wiki.
///
/// Like every other part of a Wikitext document’s context, these tables come
/// from the MediaWiki installation the document belongs to.
#[derive(Debug)]
pub struct ConfigurationSource {
    /// Tag names of registered extension tags, lowercased. Unlike HTML tags,
    /// these honour self-closing syntax.
    pub extension_tags: Set<&'static str>,

    /// Registered function hooks, lowercased, without any leading `#`.
    pub function_hooks: Set<&'static str>,

    /// Registered interwiki prefixes, lowercased.
    pub interwiki_prefixes: Set<&'static str>,

    /// Registered title namespaces.
    pub namespaces: &'static [Namespace],

    /// The list of allowable bytes in an article title, in a format suitable
    /// for interpolation into a PHP PCRE character set pattern.
    pub valid_title_bytes: &'static str,

    /// Registered variables, lowercased. Variables are case-sensitive and must
    /// be written in upper case to be recognised.
    pub variables: Set<&'static str>,
}

/// Processed configuration data for the parser.
#[derive(Debug)]
pub struct Configuration {
    /// Configuration source.
    source: &'static ConfigurationSource,
    /// A lookup table for valid title bytes.
    pub valid_title_bytes: BitMap,
}

impl core::ops::Deref for Configuration {
    type Target = ConfigurationSource;

    fn deref(&self) -> &Self::Target {
        self.source
    }
}

impl Configuration {
    /// Allocates and returns a new configuration based on the given site
    /// specific configuration.
    #[must_use]
    pub fn new(source: &'static ConfigurationSource) -> Self {
        Self {
            source,
            valid_title_bytes: char_class_to_bitmap(source.valid_title_bytes.bytes()),
        }
    }

    /// Finds the namespace with the given numeric ID.
    pub fn namespace_by_id(&self, id: i32) -> Option<&'static Namespace> {
        self.source.namespaces.iter().find(|ns| ns.id == id)
    }

    /// Finds the namespace with the given case-insensitive name. Searches the
    /// name, canonical name, and all aliases.
    pub fn namespace_by_name(&self, name: &str) -> Option<&'static Namespace> {
        if name.is_empty() {
            return None;
        }
        self.source.namespaces.iter().find(|ns| ns.matches(name))
    }

    /// Returns true if `prefix` is a registered interwiki prefix.
    pub fn is_interwiki(&self, prefix: &str) -> bool {
        self.interwiki_prefixes.contains(prefix.to_lowercase().as_str())
    }

    /// Classifies a cleaned template name as a parser function call.
    ///
    /// `name` is the full target, including any `:` and first argument.
    /// Returns the hook name as written (including any `#`) and its
    /// lowercased canonical form.
    pub fn function_hook<'a>(&self, name: &'a str, has_args: bool) -> Option<(&'a str, String)> {
        let (callee, has_colon) = match name.split_once(':') {
            Some((callee, _)) => (callee.trim_end(), true),
            None => (name, false),
        };
        let lower = callee.to_lowercase();

        // We can just assume that if it starts with a '#' then it is a parser
        // function since the way MediaWiki URLs work mean these cannot be
        // templates, and the list of function hooks from the MediaWiki API does
        // not actually include the hash.
        let is_hook = if let Some(bare) = lower.strip_prefix('#') {
            !bare.is_empty()
        } else if self.variables.contains(lower.as_str()) {
            callee.chars().all(|c| !c.is_lowercase()) && (has_colon || !has_args)
        } else {
            has_colon && self.function_hooks.contains(lower.as_str())
        };

        is_hook.then_some((callee, lower))
    }
}

/// A simple bitmap.
#[derive(Clone, Copy, Debug, Default)]
pub struct BitMap([u8; 32]);

impl BitMap {
    /// Returns true if the bitmap contains the given byte.
    pub fn contains(&self, byte: u8) -> bool {
        self.0[usize::from(byte / 8)] & (1 << (byte & 7)) != 0
    }

    /// Adds the given byte to the bitmap.
    fn insert(&mut self, byte: u8) {
        self.0[usize::from(byte / 8)] |= 1 << (byte & 7);
    }
}

/// Converts a PCRE character class to a bitmap.
///
/// Only the escapes which actually appear in MediaWiki’s `$wgLegalTitleChars`
/// are understood: `\xHH`, and a backslash followed by a literal byte.
fn char_class_to_bitmap(bytes: impl Iterator<Item = u8>) -> BitMap {
    fn hex(b: u8) -> Option<u8> {
        char::from(b).to_digit(16).and_then(|d| u8::try_from(d).ok())
    }

    fn value(iter: &mut core::iter::Peekable<impl Iterator<Item = u8>>) -> Option<u8> {
        match iter.next()? {
            b'\\' => match iter.next() {
                None => Some(b'\\'),
                Some(b'x') => {
                    let hi = iter.next_if(u8::is_ascii_hexdigit).and_then(hex);
                    let lo = iter.next_if(u8::is_ascii_hexdigit).and_then(hex);
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => Some(hi << 4 | lo),
                        (Some(digit), None) => Some(digit),
                        _ => Some(b'x'),
                    }
                }
                Some(b'n') => Some(b'\n'),
                Some(b'r') => Some(b'\r'),
                Some(b't') => Some(b'\t'),
                Some(b) => Some(b),
            },
            b => Some(b),
        }
    }

    let mut bits = BitMap::default();
    let mut iter = bytes.peekable();

    while let Some(b) = value(&mut iter) {
        bits.insert(b);
        if iter.next_if_eq(&b'-').is_some() {
            if let Some(next) = value(&mut iter) {
                for b in b..=next {
                    bits.insert(b);
                }
            } else {
                bits.insert(b'-');
            }
        }
    }

    bits
}

/// Void HTML5 tags.
pub static VOID_TAGS: Set<&str> = phf::phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img",
    "input", "link", "meta", "param", "source",
    "track", "wbr",
};

/// Tags whose content is opaque to every parser unless configured otherwise.
pub static DEFAULT_SKIP_TAGS: [&str; 6] = ["!--", "nowiki", "pre", "syntaxhighlight", "source", "math"];

/// The HTML heading tags, indexed by level - 1.
pub static HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG;

    #[test]
    fn title_bytes() {
        let map = char_class_to_bitmap(br#" %!"$&'()*,\-.\/0-9:;=?@A-Z\\^_`a-z~\x80-\xFF+"#.iter().copied());
        for b in b"aZ09 %-/\\~+".iter().chain(&[0x80, 0xc3, 0xff]) {
            assert!(map.contains(*b), "{}", char::from(*b));
        }
        for b in b"#<>[]|{}\n\t\x7f" {
            assert!(!map.contains(*b), "{}", char::from(*b));
        }
    }

    #[test]
    fn function_hooks() {
        assert_eq!(
            CONFIG.function_hook("#if: x", true),
            Some(("#if", "#if".to_string()))
        );
        assert_eq!(
            CONFIG.function_hook("#IfEq:a", true).map(|(_, c)| c),
            Some("#ifeq".to_string())
        );
        assert!(CONFIG.function_hook("lc:ABC", false).is_some());
        assert!(CONFIG.function_hook("lc", false).is_none());
        assert!(CONFIG.function_hook("PAGENAME", false).is_some());
        assert!(CONFIG.function_hook("PAGENAME", true).is_none());
        assert!(CONFIG.function_hook("pagename", false).is_none());
        assert!(CONFIG.function_hook("PAGENAME:Foo", false).is_some());
        assert!(CONFIG.function_hook("Infobox", true).is_none());
        assert!(CONFIG.function_hook("#", false).is_none());
    }
}
