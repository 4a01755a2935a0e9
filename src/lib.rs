//! A position-preserving recognizer and rewriter for MediaWiki wikitext.
//!
//! [`wikitext::Wikitext`] finds tags, sections, parameters, templates, and
//! wikilinks in a document without building a syntax tree, and can rewrite
//! any of them in place. [`template::Template`] is an editable model of a
//! single template call.

pub mod config;
pub mod template;
pub mod title;
pub mod wikitext;
