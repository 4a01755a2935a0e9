//! Editable template arguments.

use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;

/// A template argument.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Param {
    /// The key. Unnamed arguments use their position.
    pub key: String,
    /// The value.
    pub value: String,
    /// The argument as originally written, without the leading `|`. Cleared
    /// when the value changes.
    pub text: Option<String>,
    /// Whether the argument is positional.
    pub unnamed: bool,
    /// Earlier values which were replaced by an argument with the same key.
    pub duplicates: Vec<String>,
}

impl Param {
    /// Creates a named argument.
    pub fn named(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Creates a positional argument at the given one-based position.
    pub fn positional(position: usize, value: impl Into<String>) -> Self {
        Self {
            key: position.to_string(),
            value: value.into(),
            unnamed: true,
            ..Default::default()
        }
    }

    /// Replaces the value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.text = None;
    }

    /// Writes the argument, including the leading `|`. `bare` omits the key
    /// of a positional argument.
    fn write(&self, out: &mut String, bare: bool) {
        out.push('|');
        match &self.text {
            Some(text) if bare || !self.unnamed => *out += text,
            _ if bare => *out += &self.value,
            _ => {
                *out += &self.key;
                out.push('=');
                *out += &self.value;
            }
        }
    }
}

/// Where to put an inserted argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position<'a> {
    /// Before every other argument.
    Start,
    /// After every other argument.
    End,
    /// Immediately before the argument with the given key, or at the end if
    /// there is no such argument.
    Before(&'a str),
    /// Immediately after the argument with the given key, or at the end if
    /// there is no such argument.
    After(&'a str),
}

/// An ordered set of template arguments.
///
/// Templates often accept several aliases for the same argument. These can be
/// registered as hierarchies, ordered from highest to lowest priority, and
/// lookups by any alias then find whichever alias is present with the highest
/// priority.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ParamSet {
    /// The arguments, keyed by [`Param::key`].
    params: IndexMap<String, Param>,
    /// Alias lists.
    #[serde(skip)]
    hierarchies: Vec<Vec<String>>,
}

impl ParamSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with the given alias hierarchies.
    pub fn with_hierarchies(hierarchies: Vec<Vec<String>>) -> Self {
        Self {
            params: IndexMap::new(),
            hierarchies,
        }
    }

    /// Replaces the alias hierarchies.
    pub fn set_hierarchies(&mut self, hierarchies: Vec<Vec<String>>) {
        self.hierarchies = hierarchies;
    }

    /// The number of arguments.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over the arguments in order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.values()
    }

    /// Finds the key actually used for `key`, following any hierarchy which
    /// contains it.
    fn resolve(&self, key: &str) -> Option<&str> {
        if let Some(hierarchy) = self.hierarchies.iter().find(|aliases| aliases.iter().any(|alias| alias == key)) {
            hierarchy
                .iter()
                .find(|alias| self.params.contains_key(alias.as_str()))
                .map(String::as_str)
        } else {
            self.params.get_key_value(key).map(|(key, _)| key.as_str())
        }
    }

    /// Returns true if an argument with the key, or one of its aliases,
    /// exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.resolve(key).is_some()
    }

    /// Gets the argument with the key, or its highest priority alias.
    pub fn get(&self, key: &str) -> Option<&Param> {
        self.params.get(self.resolve(key)?)
    }

    /// Gets the argument with the key, or its highest priority alias.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Param> {
        let key = self.resolve(key)?.to_string();
        self.params.get_mut(&key)
    }

    /// Sets the value of the argument with the key or its highest priority
    /// alias, adding a named argument at the end if there is none.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(param) = self.get_mut(key) {
            param.set_value(value);
        } else {
            self.insert(Param::named(key, value));
        }
    }

    /// Adds an argument at the end, or replaces an argument with the same key
    /// in place. Returns the replaced argument.
    pub fn insert(&mut self, param: Param) -> Option<Param> {
        self.overwrite(param, false)
    }

    /// Like [`Self::insert`], but if `record_duplicate` is true, the value of
    /// a replaced argument is kept in [`Param::duplicates`].
    pub fn overwrite(&mut self, mut param: Param, record_duplicate: bool) -> Option<Param> {
        if record_duplicate && let Some(old) = self.params.get(&param.key) {
            param.duplicates.extend(old.duplicates.iter().cloned());
            param.duplicates.push(old.value.clone());
        }
        self.params.insert(param.key.clone(), param)
    }

    /// Adds an argument at the given position, moving any argument which
    /// already has the same key.
    pub fn insert_at(&mut self, param: Param, position: Position<'_>) {
        self.params.shift_remove(&param.key);
        let anchor = |key: &str| self.resolve(key).and_then(|key| self.params.get_index_of(key));
        let index = match position {
            Position::Start => 0,
            Position::End => self.params.len(),
            Position::Before(key) => anchor(key).unwrap_or(self.params.len()),
            Position::After(key) => anchor(key).map_or(self.params.len(), |index| index + 1),
        };
        self.params.shift_insert(index, param.key.clone(), param);
    }

    /// Removes the argument with the key, or its highest priority alias.
    pub fn remove(&mut self, key: &str) -> Option<Param> {
        let key = self.resolve(key)?.to_string();
        self.params.shift_remove(&key)
    }

    /// Writes the arguments as wikitext, each with a leading `|`.
    ///
    /// If `compare` is given, the arguments are written in that order.
    /// Positional arguments omit their key when it matches their position and
    /// either they are unedited or their value does not contain `=`. An
    /// unedited value can only contain `=` inside a nested construct.
    pub fn to_wikitext(&self, compare: Option<&dyn Fn(&Param, &Param) -> Ordering>) -> String {
        let mut params = self.params.values().collect::<Vec<_>>();
        if let Some(compare) = compare {
            params.sort_by(|a, b| compare(a, b));
        }

        let mut out = String::new();
        let mut position = 1;
        for param in params {
            let bare = param.unnamed
                && param.key == position.to_string()
                && (param.text.is_some() || !param.value.contains('='));
            if bare {
                position += 1;
            }
            param.write(&mut out, bare);
        }
        out
    }
}

impl<'a> IntoIterator for &'a ParamSet {
    type Item = &'a Param;
    type IntoIter = indexmap::map::Values<'a, String, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ParamSet {
        let mut params = ParamSet::new();
        params.insert(Param::positional(1, "a"));
        params.insert(Param::named("name", "Foo"));
        params.insert(Param::positional(2, "b"));
        params
    }

    #[test]
    fn write() {
        assert_eq!(set().to_wikitext(None), "|a|name=Foo|b");
    }

    #[test]
    fn removed_position_keeps_key() {
        let mut params = set();
        params.remove("1");
        assert_eq!(params.to_wikitext(None), "|name=Foo|2=b");
    }

    #[test]
    fn equals_sign_keeps_key() {
        let mut params = ParamSet::new();
        params.insert(Param::positional(1, "a=b"));
        assert_eq!(params.to_wikitext(None), "|1=a=b");
    }

    #[test]
    fn unedited_nested_equals_sign() {
        let mut params = ParamSet::new();
        params.insert(Param {
            text: Some("{{b|c=d}}".to_string()),
            ..Param::positional(1, "{{b|c=d}}")
        });
        params.insert(Param {
            text: Some("x".to_string()),
            ..Param::positional(2, "x")
        });
        assert_eq!(params.to_wikitext(None), "|{{b|c=d}}|x");

        params.get_mut("1").unwrap().set_value("{{b|c=e}}");
        assert_eq!(params.to_wikitext(None), "|1={{b|c=e}}|2=x");
    }

    #[test]
    fn sorted() {
        let by_key = |a: &Param, b: &Param| a.key.cmp(&b.key);
        assert_eq!(set().to_wikitext(Some(&by_key)), "|a|b|name=Foo");
    }

    #[test]
    fn positions() {
        let mut params = set();
        params.insert_at(Param::named("first", "x"), Position::Start);
        params.insert_at(Param::named("mid", "y"), Position::After("name"));
        params.insert_at(Param::named("late", "z"), Position::Before("missing"));
        params.insert_at(Param::named("name", "Bar"), Position::Before("first"));
        let keys = params.iter().map(|param| param.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["name", "first", "1", "mid", "2", "late"]);
        assert_eq!(params.get("name").unwrap().value, "Bar");
    }

    #[test]
    fn hierarchies() {
        let mut params = ParamSet::with_hierarchies(vec![vec![
            "image".to_string(),
            "img".to_string(),
            "picture".to_string(),
        ]]);
        params.insert(Param::named("picture", "b.png"));
        params.insert(Param::named("img", "a.png"));
        assert_eq!(params.get("image").unwrap().value, "a.png");
        assert_eq!(params.get("picture").unwrap().key, "img");
        params.set("image", "c.png");
        assert_eq!(params.get("img").unwrap().value, "c.png");
        assert_eq!(params.remove("image").unwrap().key, "img");
        assert_eq!(params.get("image").unwrap().key, "picture");
        assert!(params.remove("picture").is_some());
        assert!(!params.contains_key("img"));
    }

    #[test]
    fn duplicates() {
        let mut params = ParamSet::new();
        params.overwrite(Param::named("a", "1"), true);
        params.overwrite(Param::named("b", "x"), true);
        params.overwrite(Param::named("a", "2"), true);
        params.overwrite(Param::named("a", "3"), true);
        let a = params.get("a").unwrap();
        assert_eq!(a.value, "3");
        assert_eq!(a.duplicates, ["1", "2"]);
        assert_eq!(params.to_wikitext(None), "|a=3|b=x");
        assert!(params.insert(Param::named("b", "y")).unwrap().duplicates.is_empty());
    }
}
