use std::{
    cell::RefCell,
    io::{
        self,
        BufRead,
        Write,
    },
    path::PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    info,
    warn,
};

use super::api::{
    ApiTransport,
    Endpoints,
};
use crate::{
    core::{
        Credential,
        FurikesuError,
    },
    persistence::{
        delete_data_file,
        get_data_file_path,
        load_json_or_default,
        save_json,
    },
};

pub const CREDENTIALS_FILE: &str = "credentials.json";
pub const PROMPT_MESSAGE: &str = "Enter your WaniKani API token (v2): ";
pub const INVALID_TOKEN_MESSAGE: &str =
    "No valid WaniKani API token. Furigana were left unchanged.";

pub trait CredentialStore {
    fn load(&self) -> Option<Credential>;
    fn save(&self, credential: &Credential) -> Result<(), FurikesuError>;
    /// Returns true when a stored credential was removed.
    fn forget(&self) -> Result<bool, FurikesuError>;
}

pub trait UserPrompt {
    /// Blocking text prompt. `None` when the user cancels or input is unavailable.
    fn prompt(&self, message: &str) -> Option<String>;
    fn alert(&self, message: &str);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredential {
    #[serde(default)]
    api_token: Option<String>,
}

/// Keeps the token in `credentials.json` under the app data dir.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(get_data_file_path(CREDENTIALS_FILE))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<Credential> {
        let stored: StoredCredential = load_json_or_default(&self.path);
        stored.api_token.and_then(Credential::new)
    }

    fn save(&self, credential: &Credential) -> Result<(), FurikesuError> {
        let stored = StoredCredential { api_token: Some(credential.as_str().to_string()) };
        save_json(&stored, &self.path)
    }

    fn forget(&self) -> Result<bool, FurikesuError> {
        delete_data_file(&self.path)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RefCell<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn with_credential(credential: Credential) -> Self {
        Self { credential: RefCell::new(Some(credential)) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Credential> {
        self.credential.borrow().clone()
    }

    fn save(&self, credential: &Credential) -> Result<(), FurikesuError> {
        *self.credential.borrow_mut() = Some(credential.clone());
        Ok(())
    }

    fn forget(&self) -> Result<bool, FurikesuError> {
        Ok(self.credential.borrow_mut().take().is_some())
    }
}

/// Terminal prompt. A preset answer (from `--token` or the environment) is returned
/// instead of reading stdin.
#[derive(Debug, Default)]
pub struct ConsolePrompt {
    preset: Option<String>,
}

impl ConsolePrompt {
    pub fn new(preset: Option<String>) -> Self {
        Self { preset }
    }
}

impl UserPrompt for ConsolePrompt {
    fn prompt(&self, message: &str) -> Option<String> {
        if let Some(preset) = &self.preset {
            return Some(preset.clone());
        }

        eprint!("{message}");
        io::stderr().flush().ok();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}

pub async fn validate_credential(
    transport: &impl ApiTransport,
    endpoints: &Endpoints,
    credential: &Credential,
) -> bool {
    match transport.get(&endpoints.user(), credential).await {
        Ok(_) => true,
        Err(e) => {
            warn!("WaniKani rejected the API token: {}", e);
            false
        }
    }
}

/// A stored token is trusted as-is. Otherwise the user is asked once, and the answer is
/// kept only if the API accepts it.
pub async fn resolve_credential(
    store: &impl CredentialStore,
    prompt: &impl UserPrompt,
    transport: &impl ApiTransport,
    endpoints: &Endpoints,
) -> Option<Credential> {
    if let Some(credential) = store.load() {
        return Some(credential);
    }

    let credential = prompt.prompt(PROMPT_MESSAGE).and_then(Credential::new)?;

    if !validate_credential(transport, endpoints, &credential).await {
        return None;
    }

    if let Err(e) = store.save(&credential) {
        warn!("Failed to save API token: {}", e);
    } else {
        info!("WaniKani API token saved");
    }

    Some(credential)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{
        persistence::temp_path,
        wanikani::api::mock::MockTransport,
    };

    const BASE: &str = "https://api.test/v2";

    /// Answers prompts from a script and records alerts.
    #[derive(Default)]
    pub struct ScriptedPrompt {
        pub answer: Option<String>,
        pub prompts: Cell<usize>,
        pub alerts: RefCell<Vec<String>>,
    }

    impl ScriptedPrompt {
        pub fn answering(answer: &str) -> Self {
            Self { answer: Some(answer.to_string()), ..Self::default() }
        }
    }

    impl UserPrompt for ScriptedPrompt {
        fn prompt(&self, _message: &str) -> Option<String> {
            self.prompts.set(self.prompts.get() + 1);
            self.answer.clone()
        }

        fn alert(&self, message: &str) {
            self.alerts.borrow_mut().push(message.to_string());
        }
    }

    fn user_endpoint_transport(token: &str) -> MockTransport {
        MockTransport::new()
            .accept_token(token)
            .respond(&format!("{BASE}/user"), r#"{ "object": "user", "data": {} }"#)
    }

    #[tokio::test]
    async fn test_stored_credential_is_not_revalidated() {
        let store = MemoryCredentialStore::with_credential(Credential::new("stored").unwrap());
        let prompt = ScriptedPrompt::answering("typed");
        let transport = MockTransport::new();

        let credential =
            resolve_credential(&store, &prompt, &transport, &Endpoints::new(BASE)).await;

        assert_eq!(credential.unwrap().as_str(), "stored");
        assert_eq!(prompt.prompts.get(), 0);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_accepted_token_is_persisted() {
        let store = MemoryCredentialStore::default();
        let prompt = ScriptedPrompt::answering(" good-token\n");
        let transport = user_endpoint_transport("good-token");

        let credential =
            resolve_credential(&store, &prompt, &transport, &Endpoints::new(BASE)).await;

        assert_eq!(credential.unwrap().as_str(), "good-token");
        assert_eq!(store.load().unwrap().as_str(), "good-token");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_token_is_not_persisted() {
        let store = MemoryCredentialStore::default();
        let prompt = ScriptedPrompt::answering("bad-token");
        let transport = user_endpoint_transport("good-token");

        let credential =
            resolve_credential(&store, &prompt, &transport, &Endpoints::new(BASE)).await;

        assert!(credential.is_none());
        assert!(store.load().is_none());
        assert_eq!(prompt.prompts.get(), 1);
    }

    #[tokio::test]
    async fn test_empty_or_cancelled_input_skips_validation() {
        let transport = user_endpoint_transport("good-token");

        for prompt in [ScriptedPrompt::answering("   "), ScriptedPrompt::default()] {
            let store = MemoryCredentialStore::default();
            let credential =
                resolve_credential(&store, &prompt, &transport, &Endpoints::new(BASE)).await;
            assert!(credential.is_none());
        }

        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_network_error_during_validation() {
        let store = MemoryCredentialStore::default();
        let prompt = ScriptedPrompt::answering("good-token");

        let credential =
            resolve_credential(&store, &prompt, &MockTransport::new(), &Endpoints::new(BASE))
                .await;

        assert!(credential.is_none());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_file_store_save_load_forget() {
        let store = FileCredentialStore::new(temp_path("furikesu-credentials"));
        assert!(store.load().is_none());

        store.save(&Credential::new("abc").unwrap()).unwrap();
        assert_eq!(store.load().unwrap().as_str(), "abc");

        assert!(store.forget().unwrap());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_console_prompt_preset() {
        let prompt = ConsolePrompt::new(Some("from-env".to_string()));
        assert_eq!(prompt.prompt(PROMPT_MESSAGE).as_deref(), Some("from-env"));
    }
}
