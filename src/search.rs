//! Search relay: autocomplete query → stream of annotated hits.
//!
//! The autocomplete endpoint only knows titles, energy per 100 g/ml and a
//! slug. For hits that advertise an image the relay also visits the detail
//! page to find the thumbnail, which incidentally tells which page family
//! the slug belongs to. Hits are emitted one at a time as they are resolved.

use crate::error::NutritionError;
use crate::extractors::{AnchorSpec, AttrPredicate};
use crate::fetchers::PageFetcher;
use crate::model::{AutocompleteItem, ContentType, SearchHit, NOT_AVAILABLE};
use crate::resolver::candidate_locations;
use futures::stream::{self, Stream};
use log::{debug, info, warn};
use scraper::Html;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use std::vec;
use url::Url;

/// Name fragments that mark a drink or soup, whose energy is per 100 ml
const LIQUID_KEYWORDS: &[&str] = &[
    "mléko",
    "kefír",
    "jogurtový nápoj",
    "džus",
    "šťáva",
    "voda",
    "nápoj",
    "limonáda",
    "sirup",
    "polévka",
    "vývar",
];

const IMAGE_PATH_PREFIX: &str = "/file/image/";
const THUMBNAIL_QUERY: &str = "w=100";

/// One line of relay output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchEvent {
    Hit(SearchHit),
    Error { error: String },
}

impl SearchEvent {
    pub fn error(message: impl Into<String>) -> Self {
        SearchEvent::Error {
            error: message.into(),
        }
    }

    /// Newline-terminated JSON, as sent on the wire.
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json + "\n",
            Err(err) => format!("{{\"error\":\"{}\"}}\n", err.to_string().replace('"', "'")),
        }
    }
}

/// Best-effort: the only signal is the display name.
pub fn is_liquid(name: &str) -> bool {
    let name = name.to_lowercase();
    LIQUID_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

/// `"<value> kcal/100 ml"` or `"<value> kcal/100 g"`
pub fn calories_label(name: &str, value: Option<&Value>) -> String {
    let value = match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    let per = if is_liquid(name) { "100 ml" } else { "100 g" };
    format!("{value} kcal/{per}")
}

/// Parses the autocomplete payload; anything but a JSON list is malformed.
pub fn parse_autocomplete(body: &str) -> Result<Vec<AutocompleteItem>, NutritionError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        NutritionError::MalformedPayload(format!("autocomplete response is not JSON: {e}"))
    })?;
    if !value.is_array() {
        return Err(NutritionError::MalformedPayload(
            "autocomplete response is not a list".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| {
        NutritionError::MalformedPayload(format!("unexpected autocomplete entry: {e}"))
    })
}

/// `src` of the first site-hosted image on a detail page.
fn find_image_src(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    AnchorSpec::tag("img")
        .attr("src", AttrPredicate::Prefix(IMAGE_PATH_PREFIX.to_string()))
        .find_first(document.root_element())
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

enum RelayState {
    Pending { relay: SearchRelay, query: String },
    Streaming {
        relay: SearchRelay,
        items: vec::IntoIter<AutocompleteItem>,
    },
    Done,
}

#[derive(Clone)]
pub struct SearchRelay {
    fetcher: Arc<dyn PageFetcher>,
    base_url: Url,
    autocomplete_url: Url,
    retry_attempts: u32,
    retry_delay: Duration,
    image_lookup_delay: Duration,
}

impl SearchRelay {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: Url, autocomplete_url: Url) -> Self {
        Self {
            fetcher,
            base_url,
            autocomplete_url,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(500),
            image_lookup_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn with_image_lookup_delay(mut self, delay: Duration) -> Self {
        self.image_lookup_delay = delay;
        self
    }

    /// Lazily resolves every autocomplete hit for `query`.
    ///
    /// If the autocomplete call itself fails, the stream consists of a single
    /// [`SearchEvent::Error`]. An empty result list yields an empty stream.
    pub fn search(&self, query: &str) -> impl Stream<Item = SearchEvent> + Send + 'static {
        let initial = RelayState::Pending {
            relay: self.clone(),
            query: query.to_string(),
        };

        stream::unfold(initial, |state| async move {
            match state {
                RelayState::Pending { relay, query } => match relay.autocomplete(&query).await {
                    Ok(items) => {
                        info!("Autocomplete for '{}' returned {} items", query, items.len());
                        relay.next_hit(items.into_iter()).await
                    }
                    Err(err) => {
                        warn!("Search for '{}' failed: {}", query, err);
                        Some((SearchEvent::error(err.to_string()), RelayState::Done))
                    }
                },
                RelayState::Streaming { relay, items } => relay.next_hit(items).await,
                RelayState::Done => None,
            }
        })
    }

    async fn next_hit(
        self,
        mut items: vec::IntoIter<AutocompleteItem>,
    ) -> Option<(SearchEvent, RelayState)> {
        let item = items.next()?;
        let hit = self.resolve_hit(item).await;
        Some((
            SearchEvent::Hit(hit),
            RelayState::Streaming { relay: self, items },
        ))
    }

    /// Calls the autocomplete endpoint with a fixed-delay retry.
    pub async fn autocomplete(&self, query: &str) -> Result<Vec<AutocompleteItem>, NutritionError> {
        let url = Url::parse_with_params(self.autocomplete_url.as_str(), &[("query", query)])?;

        let mut attempt = 1;
        let body = loop {
            match self.fetcher.fetch(url.as_str()).await {
                Ok(body) => break body,
                Err(err) if attempt < self.retry_attempts => {
                    warn!(
                        "Autocomplete failed (attempt {}/{}): {}",
                        attempt, self.retry_attempts, err
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        parse_autocomplete(&body)
    }

    /// Turns an autocomplete entry into a hit, looking up its image if it has one.
    pub async fn resolve_hit(&self, item: AutocompleteItem) -> SearchHit {
        let name = item.title.unwrap_or_else(|| "Unknown food".to_string());
        let calories = calories_label(&name, item.value.as_ref());

        let (image_url, food_type) = match (&item.url, item.has_image) {
            (Some(slug), true) => self.lookup_image(slug).await.unzip(),
            _ => (None, None),
        };

        SearchHit {
            name,
            calories,
            image_url,
            slug: item.url,
            food_type,
        }
    }

    /// Visits the recipe page, then the food page, until one shows an image.
    /// Failures are not retried; they only move on to the next page.
    async fn lookup_image(&self, slug: &str) -> Option<(String, ContentType)> {
        let candidates = match candidate_locations(&self.base_url, slug, None) {
            Ok(candidates) => candidates,
            Err(err) => {
                debug!("No image candidates for '{}': {}", slug, err);
                return None;
            }
        };

        for candidate in candidates {
            if !self.image_lookup_delay.is_zero() {
                tokio::time::sleep(self.image_lookup_delay).await;
            }
            let body = match self.fetcher.fetch(&candidate.url).await {
                Ok(body) => body,
                Err(err) => {
                    debug!("Image lookup at {} failed: {}", candidate.url, err);
                    continue;
                }
            };
            if let Some(src) = find_image_src(&body) {
                let image_url = format!(
                    "{}{}?{}",
                    self.base_url.origin().ascii_serialization(),
                    src,
                    THUMBNAIL_QUERY
                );
                return Some((image_url, candidate.content_type));
            }
        }
        None
    }
}
