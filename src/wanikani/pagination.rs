use std::collections::HashSet;

use serde::de::DeserializeOwned;
use tracing::{
    debug,
    warn,
};

use super::{
    api::ApiTransport,
    types::Page,
};
use crate::core::{
    Credential,
    FurikesuError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub pages: usize,
    /// False when the walk stopped early because a page could not be fetched or decoded.
    pub complete: bool,
}

/// Walks a `pages.next_url` cursor chain starting at `initial_url`, handing each decoded
/// page to `on_page` before requesting the next one.
///
/// A failed or undecodable page ends the walk; pages already delivered are kept and the
/// summary is marked incomplete.
pub async fn fetch_all_pages<T, F>(
    transport: &impl ApiTransport,
    initial_url: &str,
    credential: &Credential,
    mut on_page: F,
) -> FetchSummary
where
    T: DeserializeOwned,
    F: FnMut(Page<T>),
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut next = Some(initial_url.to_string());
    let mut pages = 0;

    while let Some(url) = next.take() {
        if !visited.insert(url.clone()) {
            warn!("Pagination revisited {}, stopping. Results will be partial.", url);
            return FetchSummary { pages, complete: false };
        }

        let page: Page<T> = match fetch_page(transport, &url, credential).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to fetch {}: {}. Results will be partial.", url, e);
                return FetchSummary { pages, complete: false };
            }
        };

        pages += 1;
        debug!("Fetched page {} ({} items) from {}", pages, page.data.len(), url);
        next = page.next_url().map(str::to_string);
        on_page(page);
    }

    FetchSummary { pages, complete: true }
}

async fn fetch_page<T: DeserializeOwned>(
    transport: &impl ApiTransport,
    url: &str,
    credential: &Credential,
) -> Result<Page<T>, FurikesuError> {
    let body = transport.get(url, credential).await?;
    Ok(serde_json::from_str(&body)?)
}
