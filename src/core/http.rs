use std::time::Duration;

use reqwest::{
    Client,
    Response,
};

use crate::core::FurikesuError;

const USER_AGENT: &str = "furikesu/0.1 (+reqwest)";

pub fn http_client(timeout_secs: u64) -> Result<Client, FurikesuError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FurikesuError::Custom(format!("HTTP client build failed: {e}")))
}

pub fn ensure_success(resp: &Response) -> Result<(), FurikesuError> {
    if !resp.status().is_success() {
        return Err(FurikesuError::HttpStatus {
            status: resp.status().as_u16(),
            url: resp.url().to_string(),
        });
    }
    Ok(())
}
