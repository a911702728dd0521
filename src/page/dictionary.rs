use std::{
    borrow::Cow,
    collections::BTreeMap,
    sync::OnceLock,
};

use regex::{
    Captures,
    Regex,
};
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::core::KnownVocabulary;

/// Word dictionary shipped alongside an NHK News Web Easy article.
///
/// Shape: `{"reikai": {"entries": {KEY: [{"def": "...", ...}]}}}`. Fields other than
/// `def` are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    pub reikai: Reikai,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reikai {
    pub entries: BTreeMap<String, Vec<DictionaryEntry>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub def: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn ruby_markup() -> &'static Regex {
    static RUBY_MARKUP: OnceLock<Regex> = OnceLock::new();
    RUBY_MARKUP.get_or_init(|| {
        Regex::new(r"<ruby><rb>([^<]*)</rb><rt>([^<]*)</rt></ruby>")
            .expect("ruby markup pattern is valid")
    })
}

fn strip_counted<'t>(text: &'t str, known: &KnownVocabulary) -> (Cow<'t, str>, usize) {
    let mut stripped = 0;
    let rewritten = ruby_markup().replace_all(text, |caps: &Captures| {
        let base = &caps[1];
        if known.contains(base) {
            stripped += 1;
            base.to_string()
        } else {
            caps[0].to_string()
        }
    });
    (rewritten, stripped)
}

/// Replaces `<ruby><rb>BASE</rb><rt>READING</rt></ruby>` with `BASE` wherever BASE is
/// known. Everything else is returned byte for byte.
pub fn strip_known_ruby<'t>(text: &'t str, known: &KnownVocabulary) -> Cow<'t, str> {
    strip_counted(text, known).0
}

/// Rewrites every definition in the dictionary, if the page has one. Returns the number
/// of readings removed.
pub fn suppress_dictionary(dictionary: Option<&mut Dictionary>, known: &KnownVocabulary) -> usize {
    let Some(dictionary) = dictionary else {
        return 0;
    };

    let mut stripped = 0;
    for entry in dictionary.reikai.entries.values_mut().flatten() {
        let (rewritten, count) = strip_counted(&entry.def, known);
        if count > 0 {
            entry.def = rewritten.into_owned();
            stripped += count;
        }
    }
    stripped
}
