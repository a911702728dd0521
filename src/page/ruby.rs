use serde::{
    Deserialize,
    Serialize,
};

use super::document::{
    Document,
    Element,
    Node,
};
use crate::core::KnownVocabulary;

/// How a hidden reading is taken out of view. The `<rt>` stays in the page either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HideMode {
    /// `visibility: hidden`, keeps the space above the text
    #[default]
    Visibility,
    /// `display: none`, collapses the space
    Display,
}

impl HideMode {
    fn declaration(self) -> (&'static str, &'static str) {
        match self {
            HideMode::Visibility => ("visibility", "hidden"),
            HideMode::Display => ("display", "none"),
        }
    }
}

fn is_reading(node: &Node) -> bool {
    matches!(node, Node::Element(element) if element.is("rt") || element.is("rp"))
}

/// Text of a `<ruby>` without its readings, e.g. `日本語` for
/// `<ruby>日本<b>語</b><rt>にほんご</rt></ruby>`.
pub fn base_text(ruby: &Element) -> String {
    ruby.children.iter().filter(|child| !is_reading(child)).map(Node::text_content).collect()
}

fn hide(element: &mut Element, mode: HideMode) {
    let (property, value) = mode.declaration();
    let style = element.attribute("style").unwrap_or_default().to_string();

    let already_hidden = style.split(';').any(|declaration| {
        let mut parts = declaration.splitn(2, ':');
        parts.next().map(str::trim) == Some(property) && parts.next().map(str::trim) == Some(value)
    });
    if already_hidden {
        return;
    }

    let existing = style.trim().trim_end_matches(';').trim_end();
    let updated = if existing.is_empty() {
        format!("{property}: {value}")
    } else {
        format!("{existing}; {property}: {value}")
    };
    element.set_attribute("style", updated);
}

/// Hides the `<rt>` of every `<ruby>` whose base text is known. Returns how many
/// ruby elements matched.
pub fn hide_known_readings(
    document: &mut Document,
    known: &KnownVocabulary,
    mode: HideMode,
) -> usize {
    let mut matched = 0;
    document.for_each_element_mut("ruby", |ruby| {
        if !known.contains(&base_text(ruby)) {
            return;
        }
        matched += 1;
        for child in ruby.children.iter_mut() {
            if let Node::Element(reading) = child {
                if reading.is("rt") {
                    hide(reading, mode);
                }
            }
        }
    });
    matched
}
