use reqwest::{
    header::AUTHORIZATION,
    Client,
};

use crate::core::{
    http::ensure_success,
    Credential,
    FurikesuError,
};

pub const API_REVISION: &str = "20170710";

/// Stage 5 of 9 ("Guru" and above).
pub const KNOWN_SRS_STAGES: &str = "5,6,7,8,9";
pub const KNOWN_SUBJECT_TYPES: &str = "kanji,vocabulary";

#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// Cheap, side-effect-free endpoint used to check a token.
    pub fn user(&self) -> String {
        format!("{}/user", self.base_url)
    }

    pub fn assignments(&self) -> String {
        format!(
            "{}/assignments?srs_stages={}&subject_types={}",
            self.base_url, KNOWN_SRS_STAGES, KNOWN_SUBJECT_TYPES
        )
    }

    pub fn subjects(&self, ids: &[u64]) -> String {
        let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
        format!("{}/subjects?ids={}", self.base_url, ids.join(","))
    }
}

/// Authenticated GET returning the body of a successful response.
///
/// Non-2xx statuses are reported as [`FurikesuError::HttpStatus`].
#[allow(async_fn_in_trait)]
pub trait ApiTransport {
    async fn get(&self, url: &str, credential: &Credential) -> Result<String, FurikesuError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ApiTransport for ReqwestTransport {
    async fn get(&self, url: &str, credential: &Credential) -> Result<String, FurikesuError> {
        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, credential.bearer())
            .header("Wanikani-Revision", API_REVISION)
            .send()
            .await?;

        ensure_success(&resp)?;
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{
        cell::RefCell,
        collections::HashMap,
    };

    use super::*;

    /// Canned responses keyed by URL. Unknown URLs fail like a refused connection.
    #[derive(Default)]
    pub struct MockTransport {
        responses: HashMap<String, Result<String, u16>>,
        accepted_token: Option<String>,
        pub requests: RefCell<Vec<String>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn accept_token(mut self, token: &str) -> Self {
            self.accepted_token = Some(token.to_string());
            self
        }

        pub fn respond(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub fn fail_with_status(mut self, url: &str, status: u16) -> Self {
            self.responses.insert(url.to_string(), Err(status));
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl ApiTransport for MockTransport {
        async fn get(&self, url: &str, credential: &Credential) -> Result<String, FurikesuError> {
            self.requests.borrow_mut().push(url.to_string());

            if let Some(token) = &self.accepted_token {
                if credential.as_str() != token {
                    return Err(FurikesuError::HttpStatus { status: 401, url: url.to_string() });
                }
            }

            match self.responses.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => {
                    Err(FurikesuError::HttpStatus { status: *status, url: url.to_string() })
                }
                None => Err(FurikesuError::Custom(format!("connection refused: {url}"))),
            }
        }
    }
}
