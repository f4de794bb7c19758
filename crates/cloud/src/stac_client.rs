//! Async STAC client: item search with pagination, Planetary Computer
//! asset signing and asset download.

use std::time::Duration;

use tracing::debug;

use crate::error::{CloudError, Result};
use crate::stac_models::{StacItem, StacItemCollection, StacLink, StacSearchParams};

const PC_SIGN_URL: &str = "https://planetarycomputer.microsoft.com/api/sas/v1/sign";

// ---------------------------------------------------------------------------
// Catalog enum
// ---------------------------------------------------------------------------

/// Well-known STAC catalogs plus custom endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StacCatalog {
    /// Microsoft Planetary Computer STAC API.
    #[default]
    PlanetaryComputer,
    /// AWS Earth Search (Element 84).
    EarthSearch,
    /// Any STAC API root URL.
    Custom(String),
}

impl StacCatalog {
    /// Full `POST /search` URL for this catalog.
    pub fn search_url(&self) -> String {
        match self {
            Self::PlanetaryComputer => {
                "https://planetarycomputer.microsoft.com/api/stac/v1/search".to_string()
            }
            Self::EarthSearch => "https://earth-search.aws.element84.com/v1/search".to_string(),
            Self::Custom(base) => {
                let base = base.trim_end_matches('/');
                if base.ends_with("/search") {
                    base.to_string()
                } else {
                    format!("{base}/search")
                }
            }
        }
    }

    /// Parse a shorthand (`pc`, `planetary-computer`, `es`, `earth-search`)
    /// or treat the input as a custom URL.
    pub fn from_str_or_url(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pc" | "planetary-computer" | "planetarycomputer" => Self::PlanetaryComputer,
            "es" | "earth-search" | "earthsearch" => Self::EarthSearch,
            _ => Self::Custom(s.trim().to_string()),
        }
    }

    /// Whether asset hrefs need a SAS token before download.
    pub fn needs_signing(&self) -> bool {
        matches!(self, Self::PlanetaryComputer)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`StacClient`].
#[derive(Debug, Clone)]
pub struct StacClientOptions {
    /// Per-request timeout (default 30 s).
    pub request_timeout: Duration,
    /// Retries on transient failures (default 3). Client errors (4xx) are
    /// never retried.
    pub max_retries: u32,
    /// Maximum total items across pages (default 100).
    pub max_items: usize,
    /// Items requested per page (default 10).
    pub page_limit: u32,
}

impl Default for StacClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            max_items: 100,
            page_limit: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async client for STAC Item Search and asset access.
pub struct StacClient {
    catalog: StacCatalog,
    client: reqwest::Client,
    options: StacClientOptions,
}

impl StacClient {
    pub fn new(catalog: StacCatalog, options: StacClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            catalog,
            client,
            options,
        })
    }

    pub fn catalog(&self) -> &StacCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &StacClientOptions {
        &self.options
    }

    /// One page of results.
    pub async fn search(&self, params: &StacSearchParams) -> Result<StacItemCollection> {
        self.post_search(&self.catalog.search_url(), params).await
    }

    /// Follow `next` links, collecting up to `max_items` items in server order.
    pub async fn search_all(&self, params: &StacSearchParams) -> Result<Vec<StacItem>> {
        let max = self.options.max_items;
        let mut items: Vec<StacItem> = Vec::new();
        let mut page = self.search(params).await?;

        loop {
            let next = page.next_link().cloned();
            items.append(&mut page.features);

            if items.len() >= max {
                break;
            }
            match next {
                Some(link) => {
                    page = self.follow_next(&link, params).await?;
                    if page.is_empty() {
                        break;
                    }
                }
                None => break,
            }
        }

        items.truncate(max);
        debug!(items = items.len(), "search complete");
        Ok(items)
    }

    /// Sign an asset href for Planetary Computer. Other catalogs return the
    /// href unchanged.
    pub async fn sign_asset_href(&self, href: &str) -> Result<String> {
        if !self.catalog.needs_signing() {
            return Ok(href.to_string());
        }

        let resp = self
            .client
            .get(PC_SIGN_URL)
            .query(&[("href", href)])
            .send()
            .await
            .map_err(|e| CloudError::Auth(format!("PC sign request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CloudError::Auth(format!(
                "PC sign returned HTTP {status}: {}",
                truncate(&body, 300)
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CloudError::Auth(format!("parsing PC sign response: {e}")))?;

        body["href"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CloudError::Auth("PC sign response missing 'href' field".into()))
    }

    /// Download a whole asset.
    pub async fn download(&self, href: &str) -> Result<Vec<u8>> {
        let resp = self
            .with_retry("asset download", || self.client.get(href))
            .await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CloudError::Network(format!("reading asset body: {e}")))?;
        debug!(bytes = bytes.len(), "asset downloaded");
        Ok(bytes.to_vec())
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Send the request built by `build`, retrying transport errors and
    /// 5xx responses with exponential backoff (500 ms, 1 s, 2 s, ...).
    async fn with_retry<F>(&self, what: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_err = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                debug!(what, attempt, ?delay, "retrying");
                tokio::time::sleep(delay).await;
            }

            match build().send().await {
                Ok(r) if r.status().is_success() => return Ok(r),
                Ok(r) => {
                    let status = r.status();
                    let body = r.text().await.unwrap_or_default();
                    last_err = Some(CloudError::Network(format!(
                        "{what} returned HTTP {status}: {}",
                        truncate(&body, 500)
                    )));
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => {
                    last_err = Some(CloudError::Network(format!("{what} failed: {e}")));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| CloudError::Network(format!("{what} failed"))))
    }

    async fn post_search(&self, url: &str, params: &StacSearchParams) -> Result<StacItemCollection> {
        let resp = self
            .with_retry("STAC search", || self.client.post(url).json(params))
            .await?;
        let body = resp
            .text()
            .await
            .map_err(|e| CloudError::Network(format!("reading response body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| CloudError::Network(format!("parsing STAC response: {e}")))
    }

    /// Follow a pagination link, POST (body / merge) or GET.
    async fn follow_next(
        &self,
        link: &StacLink,
        original: &StacSearchParams,
    ) -> Result<StacItemCollection> {
        let method = link.method.as_deref().unwrap_or("GET").to_uppercase();

        if method == "POST" {
            let merged = next_page_params(link, original)?;
            return self.post_search(&link.href, &merged).await;
        }

        let resp = self
            .with_retry("STAC pagination", || self.client.get(&link.href))
            .await?;
        let body = resp
            .text()
            .await
            .map_err(|e| CloudError::Network(format!("reading pagination body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| CloudError::Network(format!("parsing pagination response: {e}")))
    }
}

/// Body for a POST `next` link: the link body merged over the original
/// parameters when `merge` is set, the link body alone otherwise.
fn next_page_params(link: &StacLink, original: &StacSearchParams) -> Result<StacSearchParams> {
    let serialize = |p: &StacSearchParams| {
        serde_json::to_value(p).map_err(|e| CloudError::Network(format!("serializing params: {e}")))
    };

    let body = match (&link.body, link.merge.unwrap_or(false)) {
        (Some(link_body), true) => {
            let mut base = serialize(original)?;
            if let (Some(base_obj), Some(link_obj)) = (base.as_object_mut(), link_body.as_object())
            {
                for (k, v) in link_obj {
                    base_obj.insert(k.clone(), v.clone());
                }
            }
            base
        }
        (Some(link_body), false) => link_body.clone(),
        (None, _) => serialize(original)?,
    };

    serde_json::from_value(body)
        .map_err(|e| CloudError::Network(format!("parsing next-page params: {e}")))
}

fn truncate(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
