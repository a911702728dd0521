use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    page::ruby::HideMode,
    persistence::{
        get_data_file_path,
        load_json_or_default,
        save_json,
    },
    core::FurikesuError,
};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_API_BASE_URL: &str = "https://api.wanikani.com/v2";
pub const DEFAULT_SUBJECT_BATCH_SIZE: usize = 500;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_PATTERNS: &[&str] =
    &["https://www3.nhk.or.jp/news/easy/*", "https://www3.nhk.or.jp/news/html/*"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub hide_mode: HideMode,
    pub subject_batch_size: usize,
    pub request_timeout_secs: u64,
    pub page_patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            hide_mode: HideMode::default(),
            subject_batch_size: DEFAULT_SUBJECT_BATCH_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_patterns: DEFAULT_PAGE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        get_data_file_path(SETTINGS_FILE)
    }

    pub fn load() -> Self {
        load_json_or_default(&Self::path())
    }

    pub fn save(&self) -> Result<(), FurikesuError> {
        save_json(self, &Self::path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "hide_mode": "display", "subject_batch_size": 100 }"#)
                .unwrap();

        assert_eq!(settings.hide_mode, HideMode::Display);
        assert_eq!(settings.subject_batch_size, 100);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(settings.page_patterns.len(), 2);
    }
}
