use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use url::Url;

use crate::config::ScraperConfig;
use crate::error::NutritionError;
use crate::extractors::{EnergyAnchors, NutrientTableAnchors, RecordExtractor};
use crate::fetchers::{PageFetcher, RequestFetcher};
use crate::model::{ContentType, NutrientDetails};
use crate::resolver::DetailResolver;
use crate::search::{SearchEvent, SearchRelay};

/// Builder for configuring a [`NutritionScraper`]
#[derive(Default)]
pub struct NutritionScraperBuilder {
    config: Option<ScraperConfig>,
    base_url: Option<String>,
    autocomplete_path: Option<String>,
    timeout: Option<Duration>,
    retry_attempts: Option<u32>,
    retry_delay: Option<Duration>,
    image_lookup_delay: Option<Duration>,
    user_agent: Option<String>,
    fetcher: Option<Arc<dyn PageFetcher>>,
    energy_anchors: Option<EnergyAnchors>,
    nutrient_anchors: Option<NutrientTableAnchors>,
}

impl NutritionScraperBuilder {
    /// Start from a loaded configuration instead of the defaults.
    ///
    /// Individual setters called on the builder still take precedence.
    pub fn config(mut self, config: ScraperConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the base address of the nutrition site
    ///
    /// # Example
    /// ```
    /// use nutrition_scrape::NutritionScraper;
    ///
    /// let builder = NutritionScraper::builder()
    ///     .base_url("http://127.0.0.1:8080");
    /// ```
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn autocomplete_path(mut self, path: impl Into<String>) -> Self {
        self.autocomplete_path = Some(path.into());
        self
    }

    /// Set a timeout for HTTP requests
    ///
    /// # Example
    /// ```
    /// use nutrition_scrape::NutritionScraper;
    /// use std::time::Duration;
    ///
    /// let builder = NutritionScraper::builder()
    ///     .timeout(Duration::from_secs(30));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Attempts for the autocomplete call; values below 1 are treated as 1.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = Some(attempts);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn image_lookup_delay(mut self, delay: Duration) -> Self {
        self.image_lookup_delay = Some(delay);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use a custom page fetcher instead of the built-in HTTP client.
    ///
    /// When set, `timeout` and `user_agent` are ignored.
    pub fn fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the markers used to find total energy on detail pages.
    pub fn energy_anchors(mut self, anchors: EnergyAnchors) -> Self {
        self.energy_anchors = Some(anchors);
        self
    }

    /// Replace the markers used to walk the nutrient table.
    pub fn nutrient_anchors(mut self, anchors: NutrientTableAnchors) -> Self {
        self.nutrient_anchors = Some(anchors);
        self
    }

    /// Build the scraper
    ///
    /// # Errors
    /// Returns `NutritionError` if:
    /// - The base URL or autocomplete path is not a valid URL
    /// - The base URL cannot carry a path (e.g. `mailto:`)
    /// - The HTTP client cannot be created
    pub fn build(self) -> Result<NutritionScraper, NutritionError> {
        let config = self.config.unwrap_or_default();

        let base_url = Url::parse(self.base_url.as_deref().unwrap_or(config.base_url.as_str()))?;
        if base_url.cannot_be_a_base() {
            return Err(NutritionError::BuilderError(format!(
                "'{}' cannot be used as a base URL",
                base_url
            )));
        }
        let autocomplete_url = base_url.join(
            self.autocomplete_path
                .as_deref()
                .unwrap_or(config.autocomplete_path.as_str()),
        )?;

        let fetcher: Arc<dyn PageFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                let referer = base_url.join("/")?;
                let timeout = self
                    .timeout
                    .unwrap_or(Duration::from_secs(config.timeout));
                let user_agent = self.user_agent.as_deref().unwrap_or(config.user_agent.as_str());
                Arc::new(RequestFetcher::new(
                    Some(timeout),
                    user_agent,
                    referer.as_str(),
                )?)
            }
        };

        let retry_attempts = self.retry_attempts.unwrap_or(config.retry_attempts);
        let retry_delay = self
            .retry_delay
            .unwrap_or(Duration::from_millis(config.retry_delay_ms));
        let image_lookup_delay = self
            .image_lookup_delay
            .unwrap_or(Duration::from_millis(config.image_lookup_delay_ms));

        let extractor = RecordExtractor::new(
            self.energy_anchors.unwrap_or_default(),
            self.nutrient_anchors.unwrap_or_default(),
        );
        let resolver =
            DetailResolver::new(fetcher.clone(), base_url.clone()).with_extractor(extractor);
        let relay = SearchRelay::new(fetcher, base_url, autocomplete_url)
            .with_retry(retry_attempts, retry_delay)
            .with_image_lookup_delay(image_lookup_delay);

        Ok(NutritionScraper { resolver, relay })
    }
}

/// Entry point for detail lookups and searches.
///
/// Cheap to clone; clones share one HTTP client.
#[derive(Clone)]
pub struct NutritionScraper {
    resolver: DetailResolver,
    relay: SearchRelay,
}

impl NutritionScraper {
    /// Creates a new builder
    ///
    /// # Example
    /// ```
    /// use nutrition_scrape::NutritionScraper;
    ///
    /// let scraper = NutritionScraper::builder().build();
    /// assert!(scraper.is_ok());
    /// ```
    pub fn builder() -> NutritionScraperBuilder {
        NutritionScraperBuilder::default()
    }

    pub fn from_config(config: ScraperConfig) -> Result<Self, NutritionError> {
        Self::builder().config(config).build()
    }

    /// Resolves a slug into its nutrient record.
    ///
    /// With `food_type` set only that page family is consulted; otherwise the
    /// recipe page is tried before the food page.
    ///
    /// # Example
    /// ```no_run
    /// # use nutrition_scrape::{ContentType, NutritionScraper};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let scraper = NutritionScraper::builder().build()?;
    /// let details = scraper.details("rajce", Some(ContentType::FoodItem)).await?;
    /// println!("{}", serde_json::to_string(&details)?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn details(
        &self,
        slug: &str,
        food_type: Option<ContentType>,
    ) -> Result<NutrientDetails, NutritionError> {
        self.resolver.resolve(slug, food_type).await
    }

    /// Streams search hits for `query` as they are resolved.
    pub fn search(&self, query: &str) -> impl Stream<Item = SearchEvent> + Send + 'static {
        self.relay.search(query)
    }

    pub fn resolver(&self) -> &DetailResolver {
        &self.resolver
    }

    pub fn relay(&self) -> &SearchRelay {
        &self.relay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_build() {
        assert!(NutritionScraper::builder().build().is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let result = NutritionScraper::builder().base_url("not a url").build();
        assert!(matches!(result, Err(NutritionError::InvalidUrl(_))));
    }

    #[test]
    fn test_opaque_base_url_is_rejected() {
        let result = NutritionScraper::builder()
            .base_url("mailto:someone@example.com")
            .build();
        assert!(matches!(result, Err(NutritionError::BuilderError(_))));
    }

    #[test]
    fn test_setters_override_config() {
        let config = ScraperConfig {
            base_url: "http://config.invalid".to_string(),
            ..Default::default()
        };
        let scraper = NutritionScraper::builder()
            .config(config)
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let candidates = scraper.resolver().candidates("rajce", None).unwrap();
        assert!(candidates[0].url.starts_with("http://127.0.0.1:1/"));
    }

    struct SinglePage(&'static str);

    #[async_trait::async_trait]
    impl PageFetcher for SinglePage {
        async fn fetch(&self, _url: &str) -> Result<String, NutritionError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_anchor_setters_reach_the_resolver() {
        use crate::extractors::AnchorSpec;
        use crate::model::NutrientKey;

        let page = r#"<html><body><input id="kcal" value="31"></body></html>"#;
        let scraper = NutritionScraper::builder()
            .fetcher(Arc::new(SinglePage(page)))
            .energy_anchors(EnergyAnchors {
                food_kcal_carrier: AnchorSpec::tag("input").attr_eq("id", "kcal"),
                ..EnergyAnchors::default()
            })
            .build()
            .unwrap();

        let details = scraper
            .details("okurka", Some(ContentType::FoodItem))
            .await
            .unwrap();
        assert_eq!(details.record.get(NutrientKey::TotalKcal), "31 kcal");
    }
}
