//! An editable model of a single template call.
//!
//! ```
//! # use wiki_scan::{template::Template, wikitext::{Options, Wikitext}};
//! let doc = Wikitext::new("{{Cite web|url=https://example.com|title=Example}}", Options::default());
//! let node = doc.parse_templates().unwrap()[0];
//! let mut template = Template::from_node(node);
//! template.params.set("title", "Better example");
//! assert_eq!(
//!     template.to_wikitext(),
//!     "{{Cite web|url=https://example.com|title=Better example}}"
//! );
//! ```

pub use params::{Param, ParamSet, Position};
use crate::{
    title::Title,
    wikitext::{TemplateKind, TemplateNode},
};
use serde::Serialize;
use std::cmp::Ordering;

mod params;

/// A template call whose arguments can be edited.
#[derive(Clone, Debug, Serialize)]
pub struct Template {
    /// The name part of the call as written, including any substitution
    /// prefix.
    pub name: String,
    /// What the call refers to.
    pub kind: TemplateKind,
    /// The arguments.
    pub params: ParamSet,
}

impl Template {
    /// Creates a call to a template with no arguments.
    pub fn new(name: impl Into<String>, kind: TemplateKind) -> Self {
        Self {
            name: name.into(),
            kind,
            params: ParamSet::new(),
        }
    }

    /// Creates an editable copy of a recognised template call.
    ///
    /// When an argument key is repeated, the last value wins and earlier
    /// values are kept as duplicates.
    pub fn from_node(node: &TemplateNode) -> Self {
        let mut params = ParamSet::new();
        for raw in &node.params {
            let param = Param {
                key: raw.key.clone(),
                value: raw.value.clone(),
                text: Some(raw.text.clone()),
                unnamed: raw.unnamed,
                duplicates: Vec::new(),
            };
            if params.contains_key(&param.key) {
                log::debug!("{}: duplicate argument {}", node.raw_title.trim(), param.key);
            }
            params.overwrite(param, true);
        }

        Self {
            name: node.raw_title.clone(),
            kind: node.kind.clone(),
            params,
        }
    }

    /// The called template, if this is a template call.
    pub fn title(&self) -> Option<&Title> {
        match &self.kind {
            TemplateKind::Template { title } => Some(title),
            _ => None,
        }
    }

    /// Writes the call as wikitext.
    pub fn to_wikitext(&self) -> String {
        format!("{{{{{}{}}}}}", self.name, self.params.to_wikitext(None))
    }

    /// Writes the call as wikitext, with arguments in the order given by
    /// `compare`.
    pub fn to_wikitext_sorted(&self, compare: &dyn Fn(&Param, &Param) -> Ordering) -> String {
        format!("{{{{{}{}}}}}", self.name, self.params.to_wikitext(Some(compare)))
    }
}

impl core::fmt::Display for Template {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_wikitext())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikitext::{Options, Wikitext};

    fn template(source: &str) -> Template {
        let doc = Wikitext::new(source, Options::default());
        Template::from_node(doc.parse_templates().unwrap()[0])
    }

    #[test]
    fn round_trip() {
        for source in [
            "{{Infobox person\n| name = Foo\n| birth_date = {{Birth date|1970|1|1}}\n|x\n}}",
            "{{a|b|c=d| e }}",
            "{{subst:a}}",
            "{{a|[[b|c]]|{{{1|}}}}}",
            "{{a|{{b|c=d}}|x}}",
            "{{a|[[File:x.png|alt=y]]|z}}",
        ] {
            assert_eq!(template(source).to_wikitext(), source);
        }
    }

    #[test]
    fn duplicate_keys() {
        let template = template("{{a|x|1=y|k=1|k=2}}");
        assert_eq!(template.params.len(), 2);
        assert_eq!(template.params.get("1").unwrap().duplicates, ["x"]);
        assert_eq!(template.params.get("k").unwrap().value, "2");
        assert_eq!(template.to_wikitext(), "{{a|1=y|k=2}}");
    }

    #[test]
    fn edit() {
        let mut template = template("{{Infobox|name=Foo|b}}");
        assert_eq!(template.title().unwrap().full_text(), "Template:Infobox");
        template.params.set("name", "Bar");
        template.params.insert_at(Param::named("image", "x.png"), Position::After("name"));
        template.params.remove("1");
        assert_eq!(template.to_wikitext(), "{{Infobox|name=Bar|image=x.png}}");

        let by_key = |a: &Param, b: &Param| a.key.cmp(&b.key);
        assert_eq!(template.to_wikitext_sorted(&by_key), "{{Infobox|image=x.png|name=Bar}}");
        assert_eq!(template.to_string(), "{{Infobox|name=Bar|image=x.png}}");
    }
}
