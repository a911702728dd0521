//! Hides furigana on Japanese news pages for the kanji and vocabulary a WaniKani user
//! already knows.

pub mod core;
pub mod page;
pub mod persistence;
pub mod settings;
pub mod wanikani;

pub use crate::core::{
    pipeline::{
        process_page,
        suppress_known_furigana,
        NewsPage,
        SuppressionReport,
    },
    Credential,
    FurikesuError,
    KnownVocabulary,
};
pub use crate::settings::Settings;
