use serde::Deserialize;

/// Collection envelope shared by every paginated WaniKani endpoint.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub data: Vec<Resource<T>>,
    #[serde(default)]
    pub pages: Option<Pagination>,
}

impl<T> Page<T> {
    pub fn next_url(&self) -> Option<&str> {
        self.pages.as_ref().and_then(|p| p.next_url.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Resource<T> {
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Radical,
    Kanji,
    Vocabulary,
    KanaVocabulary,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    pub subject_id: u64,
    pub subject_type: SubjectKind,
    pub srs_stage: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub slug: String,
}
