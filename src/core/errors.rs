use thiserror::Error;

#[derive(Error, Debug)]
pub enum FurikesuError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("HTML error: {0}")]
    Html(Box<quick_xml::Error>),

    #[error("HTTP error {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("No valid WaniKani API token available")]
    MissingCredential,

    #[error("Page is not a supported news page: {0}")]
    UnsupportedPage(String),

    #[error("FurikesuError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for FurikesuError {
    fn from(error: std::io::Error) -> Self {
        FurikesuError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for FurikesuError {
    fn from(error: reqwest::Error) -> Self {
        FurikesuError::Reqwest(Box::new(error))
    }
}

impl From<quick_xml::Error> for FurikesuError {
    fn from(error: quick_xml::Error) -> Self {
        FurikesuError::Html(Box::new(error))
    }
}
