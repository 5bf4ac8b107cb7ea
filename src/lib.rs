//! Nutrition facts scraper for kaloricketabulky.cz.
//!
//! Resolves a food or recipe slug into a fixed record of nutrient values and
//! relays the site's autocomplete search as a stream of annotated hits.
//!
//! # Example
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let details = nutrition_scrape::fetch_details("rajce", None).await?;
//! println!("{}", serde_json::to_string_pretty(&details)?);
//! # Ok(())
//! # }
//! ```

pub mod barcode;
pub mod builder;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod search;
pub mod server;

use futures::Stream;

pub use crate::builder::{NutritionScraper, NutritionScraperBuilder};
pub use crate::config::ScraperConfig;
pub use crate::error::NutritionError;
pub use crate::fetchers::{PageFetcher, RequestFetcher};
pub use crate::model::{
    ContentType, NutrientDetails, NutrientKey, NutrientRecord, SearchHit, NOT_AVAILABLE,
};
pub use crate::normalize::{format_energy, parse_quantity, ParsedQuantity, Unit};
pub use crate::search::SearchEvent;

/// Resolve a slug with the default configuration.
///
/// # Arguments
/// * `slug` - Site slug, with or without a leading slash
/// * `food_type` - Page family to consult; `None` tries the recipe page first
pub async fn fetch_details(
    slug: &str,
    food_type: Option<ContentType>,
) -> Result<NutrientDetails, NutritionError> {
    NutritionScraper::builder()
        .build()?
        .details(slug, food_type)
        .await
}

/// Search with the default configuration.
///
/// Client construction errors are reported as the single error event of the
/// stream, the same way upstream failures are.
pub fn search(query: &str) -> impl Stream<Item = SearchEvent> + Send + 'static {
    use futures::stream::{self, StreamExt};

    match NutritionScraper::builder().build() {
        Ok(scraper) => scraper.search(query).left_stream(),
        Err(err) => stream::once(async move { SearchEvent::error(err.to_string()) }).right_stream(),
    }
}
