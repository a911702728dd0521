pub mod errors;
pub mod http;
pub mod models;
pub mod pipeline;

pub use errors::FurikesuError;
pub use models::{ Credential, KnownVocabulary };
