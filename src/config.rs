//! Default MediaWiki site configuration.
//!
//! Wikitext documents are not self-encapsulated and cannot be parsed without
//! out-of-band configuration data. The tables here describe a stock English
//! Wikipedia installation; other sites can supply their own
//! [`ConfigurationSource`] to [`Configuration::new`].

use crate::{
    title::{Namespace, NamespaceCase::FirstLetter},
    wikitext::{Configuration, ConfigurationSource},
};
use std::sync::LazyLock;

/// Creates a first-letter-cased namespace record.
const fn ns(
    id: i32,
    name: &'static str,
    canonical: Option<&'static str>,
    aliases: &'static [&'static str],
) -> Namespace {
    Namespace {
        id,
        name,
        canonical,
        case: FirstLetter,
        aliases,
    }
}

/// The static source configuration for the default installation.
static CONFIG_SOURCE: ConfigurationSource = ConfigurationSource {
    extension_tags: phf::phf_set! {
        "pre", "nowiki", "gallery", "indicator", "langconvert", "graph", "timeline",
        "hiero", "charinsert", "ref", "references", "inputbox", "imagemap", "source",
        "syntaxhighlight", "poem", "categorytree", "section", "score", "templatestyles",
        "templatedata", "math", "ce", "chem", "maplink", "mapframe"
    },
    function_hooks: phf::phf_set! {
        "ns", "nse", "urlencode", "lcfirst", "ucfirst", "lc", "uc", "localurl",
        "localurle", "fullurl", "fullurle", "canonicalurl", "canonicalurle", "formatnum",
        "grammar", "gender", "plural", "formal", "bidi", "numberingroup", "language",
        "padleft", "padright", "anchorencode", "defaultsort", "filepath",
        "pagesincategory", "pagesize", "protectionlevel", "protectionexpiry", "pagename",
        "pagenamee", "fullpagename", "fullpagenamee", "subpagename", "subpagenamee",
        "rootpagename", "rootpagenamee", "basepagename", "basepagenamee", "talkpagename",
        "talkpagenamee", "subjectpagename", "subjectpagenamee", "pageid", "revisionid",
        "revisionday", "revisionday2", "revisionmonth", "revisionmonth1", "revisionyear",
        "revisiontimestamp", "revisionuser", "cascadingsources", "namespace",
        "namespacee", "namespacenumber", "talkspace", "talkspacee", "subjectspace",
        "subjectspacee", "numberofarticles", "numberoffiles", "numberofusers",
        "numberofactiveusers", "numberofpages", "numberofadmins", "numberofedits",
        "int", "special", "speciale", "tag", "formatdate", "displaytitle", "if", "ifeq",
        "switch", "ifexist", "ifexpr", "iferror", "time", "timel", "expr", "rel2abs",
        "titleparts", "invoke", "noexternallanglinks", "shortdesc", "property",
        "statements", "msg", "msgnw", "raw"
    },
    interwiki_prefixes: phf::phf_set! {
        "commons", "mw", "mediawikiwiki", "meta", "metawiki", "wikidata", "d",
        "wikibooks", "b", "wikinews", "n", "wikiquote", "q", "wikisource", "s",
        "wikiversity", "v", "wikivoyage", "voy", "wiktionary", "wikt", "species",
        "wikispecies", "wikipedia", "w", "phab", "phabricator", "foundation", "wmf",
        "incubator", "outreach", "translatewiki", "betawiki", "doi", "rfc", "arxiv",
        "google", "imdbtitle", "imdbname", "iarchive", "gutenberg", "oeis", "c",
        "de", "en", "es", "fr", "it", "ja", "nl", "pl", "pt", "ru", "sv", "uk", "vi",
        "zh", "ar", "ko", "fa", "he", "id", "no", "fi", "cs", "hu", "tr", "ca", "ro"
    },
    namespaces: &[
        ns(-2, "Media", Some("Media"), &[]),
        ns(-1, "Special", Some("Special"), &[]),
        ns(0, "", None, &[]),
        ns(1, "Talk", Some("Talk"), &[]),
        ns(2, "User", Some("User"), &[]),
        ns(3, "User talk", Some("User talk"), &[]),
        ns(4, "Wikipedia", Some("Project"), &["WP"]),
        ns(5, "Wikipedia talk", Some("Project talk"), &["WT"]),
        ns(6, "File", Some("File"), &["Image"]),
        ns(7, "File talk", Some("File talk"), &["Image talk"]),
        ns(8, "MediaWiki", Some("MediaWiki"), &[]),
        ns(9, "MediaWiki talk", Some("MediaWiki talk"), &[]),
        ns(10, "Template", Some("Template"), &["TM"]),
        ns(11, "Template talk", Some("Template talk"), &[]),
        ns(12, "Help", Some("Help"), &[]),
        ns(13, "Help talk", Some("Help talk"), &[]),
        ns(14, "Category", Some("Category"), &[]),
        ns(15, "Category talk", Some("Category talk"), &[]),
        ns(100, "Portal", Some("Portal"), &[]),
        ns(101, "Portal talk", Some("Portal talk"), &[]),
        ns(118, "Draft", Some("Draft"), &[]),
        ns(119, "Draft talk", Some("Draft talk"), &[]),
        ns(828, "Module", Some("Module"), &[]),
        ns(829, "Module talk", Some("Module talk"), &[]),
    ],
    valid_title_bytes: " %!\"$&'()*,\\-.\\/0-9:;=?@A-Z\\\\^_`a-z~\\x80-\\xFF+",
    variables: phf::phf_set! {
        "!", "=", "currentmonth", "currentmonth1", "currentmonthname",
        "currentmonthnamegen", "currentmonthabbrev", "currentday", "currentday2",
        "currentdayname", "currentyear", "currenttime", "currenthour", "localmonth",
        "localmonth1", "localmonthname", "localmonthnamegen", "localmonthabbrev",
        "localday", "localday2", "localdayname", "localyear", "localtime", "localhour",
        "numberofarticles", "numberoffiles", "numberofedits", "articlepath", "pageid",
        "sitename", "server", "servername", "scriptpath", "stylepath", "pagename",
        "pagenamee", "fullpagename", "fullpagenamee", "namespace", "namespacee",
        "namespacenumber", "currentweek", "currentdow", "localweek", "localdow",
        "revisionid", "revisionday", "revisionday2", "revisionmonth", "revisionmonth1",
        "revisionyear", "revisiontimestamp", "revisionuser", "revisionsize",
        "subpagename", "subpagenamee", "talkspace", "talkspacee", "subjectspace",
        "subjectspacee", "talkpagename", "talkpagenamee", "subjectpagename",
        "subjectpagenamee", "numberofusers", "numberofactiveusers", "numberofpages",
        "currentversion", "rootpagename", "rootpagenamee", "basepagename",
        "basepagenamee", "currenttimestamp", "localtimestamp", "directionmark",
        "contentlanguage", "userlanguage", "pagelanguage", "numberofadmins",
        "cascadingsources", "contentmodel", "numberofwikis"
    },
};

/// The default installation configuration, suitable for runtime use.
pub static CONFIG: LazyLock<Configuration> = LazyLock::new(|| Configuration::new(&CONFIG_SOURCE));
