use std::time::Instant;

use tracing::{
    info,
    warn,
};

use super::{
    FurikesuError,
    KnownVocabulary,
};
use crate::{
    page::{
        dictionary::suppress_dictionary,
        ruby::hide_known_readings,
        Dictionary,
        Document,
        HideMode,
    },
    settings::Settings,
    wanikani::{
        api::{
            ApiTransport,
            Endpoints,
        },
        credential::{
            resolve_credential,
            CredentialStore,
            UserPrompt,
            INVALID_TOKEN_MESSAGE,
        },
        resolve_known_vocabulary,
    },
};

/// A news article as loaded: its markup and, when the site provides one, its word dictionary.
#[derive(Debug, Clone)]
pub struct NewsPage {
    pub document: Document,
    pub dictionary: Option<Dictionary>,
}

impl NewsPage {
    pub fn parse(html: &str, dictionary: Option<Dictionary>) -> Result<Self, FurikesuError> {
        Ok(Self { document: Document::parse(html)?, dictionary })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppressionReport {
    /// Ruby elements in the page whose readings were hidden.
    pub hidden_readings: usize,
    /// Readings removed from dictionary definitions.
    pub stripped_definitions: usize,
    pub vocabulary_complete: bool,
}

pub fn suppress_known_furigana(
    page: &mut NewsPage,
    known: &KnownVocabulary,
    mode: HideMode,
) -> SuppressionReport {
    let hidden_readings = hide_known_readings(&mut page.document, known, mode);
    let stripped_definitions = suppress_dictionary(page.dictionary.as_mut(), known);

    SuppressionReport {
        hidden_readings,
        stripped_definitions,
        vocabulary_complete: known.is_complete(),
    }
}

/// The whole page-load flow: credential, known vocabulary, then both suppression passes.
///
/// Without a usable credential the user is alerted once and the page is left untouched.
pub async fn process_page(
    transport: &impl ApiTransport,
    store: &impl CredentialStore,
    prompt: &impl UserPrompt,
    settings: &Settings,
    page: &mut NewsPage,
) -> Result<SuppressionReport, FurikesuError> {
    let total_start = Instant::now();
    let endpoints = Endpoints::new(&settings.api_base_url);

    let Some(credential) = resolve_credential(store, prompt, transport, &endpoints).await else {
        prompt.alert(INVALID_TOKEN_MESSAGE);
        return Err(FurikesuError::MissingCredential);
    };

    let known =
        resolve_known_vocabulary(transport, &endpoints, &credential, settings.subject_batch_size)
            .await;

    let report = suppress_known_furigana(page, &known, settings.hide_mode);
    if !report.vocabulary_complete {
        warn!("Some furigana may still be shown for known words");
    }
    info!(
        "Hid {} readings and cleaned {} dictionary readings ({:.1}s)",
        report.hidden_readings,
        report.stripped_definitions,
        total_start.elapsed().as_secs_f32()
    );

    Ok(report)
}
