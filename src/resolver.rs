//! Detail resolution with content-type fallback.
//!
//! A slug alone does not say whether it names a foodstuff or a recipe, and
//! the two page families need different anchors. When the caller does not
//! assert a type, the resolver tries the recipe page first and the food page
//! second; the first page that yields a total kcal value wins. An asserted
//! type is trusted and never second-guessed.

use crate::error::NutritionError;
use crate::extractors::{ParsingContext, RecordExtractor};
use crate::fetchers::PageFetcher;
use crate::model::{CandidateLocation, ContentType, NutrientDetails, NutrientRecord};
use log::{debug, info, warn};
use std::sync::Arc;
use url::Url;

/// Order in which page families are tried for an unasserted slug
pub const FALLBACK_ORDER: [ContentType; 2] = [ContentType::Recipe, ContentType::FoodItem];

/// Builds the address of one page family for a slug.
pub fn candidate_url(
    base: &Url,
    content_type: ContentType,
    slug: &str,
) -> Result<Url, NutritionError> {
    let path = format!(
        "/{}/{}",
        content_type.path_segment(),
        slug.trim_start_matches('/')
    );
    Ok(base.join(&path)?)
}

/// Ordered, de-duplicated candidate locations for a slug.
///
/// An asserted type yields exactly one candidate; otherwise every page
/// family is listed in [`FALLBACK_ORDER`].
pub fn candidate_locations(
    base: &Url,
    slug: &str,
    asserted: Option<ContentType>,
) -> Result<Vec<CandidateLocation>, NutritionError> {
    let order: Vec<ContentType> = match asserted {
        Some(content_type) => vec![content_type],
        None => FALLBACK_ORDER.to_vec(),
    };

    let mut candidates: Vec<CandidateLocation> = Vec::with_capacity(order.len());
    for content_type in order {
        let url = candidate_url(base, content_type, slug)?.to_string();
        if candidates.iter().any(|candidate| candidate.url == url) {
            continue;
        }
        candidates.push(CandidateLocation { url, content_type });
    }
    Ok(candidates)
}

/// Outcome of trying a single candidate
#[derive(Debug)]
enum Attempt {
    Resolved(NutrientRecord),
    NoEnergy,
    Unreachable(NutritionError),
}

#[derive(Clone)]
pub struct DetailResolver {
    fetcher: Arc<dyn PageFetcher>,
    base_url: Url,
    extractor: Arc<RecordExtractor>,
}

impl DetailResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: Url) -> Self {
        Self {
            fetcher,
            base_url,
            extractor: Arc::new(RecordExtractor::default()),
        }
    }

    /// Replaces the default anchors used to read fetched pages.
    pub fn with_extractor(mut self, extractor: RecordExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Candidate locations in the order they will be tried, without duplicates.
    pub fn candidates(
        &self,
        slug: &str,
        asserted: Option<ContentType>,
    ) -> Result<Vec<CandidateLocation>, NutritionError> {
        candidate_locations(&self.base_url, slug, asserted)
    }

    /// Resolves a slug into a nutrient record.
    ///
    /// Transport failures and pages without energy data only disqualify the
    /// candidate they happened on; the error is returned once every candidate
    /// has been tried.
    pub async fn resolve(
        &self,
        slug: &str,
        asserted: Option<ContentType>,
    ) -> Result<NutrientDetails, NutritionError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(NutritionError::MissingInput("slug".to_string()));
        }

        for candidate in self.candidates(slug, asserted)? {
            match self.attempt(&candidate).await {
                Attempt::Resolved(record) => {
                    info!(
                        "Resolved '{}' as {} from {}",
                        slug, candidate.content_type, candidate.url
                    );
                    return Ok(NutrientDetails {
                        record,
                        source_url: candidate.url,
                        food_type: candidate.content_type,
                    });
                }
                Attempt::NoEnergy => {
                    debug!("No energy data at {}", candidate.url);
                }
                Attempt::Unreachable(err) => {
                    warn!("Candidate {} failed: {}", candidate.url, err);
                }
            }
        }

        Err(NutritionError::Exhausted {
            slug: slug.to_string(),
        })
    }

    async fn attempt(&self, candidate: &CandidateLocation) -> Attempt {
        let body = match self.fetcher.fetch(&candidate.url).await {
            Ok(body) => body,
            Err(err) => return Attempt::Unreachable(err),
        };

        // parsed documents are not Send; keep them out of the async state
        let record = parse_candidate(
            &self.extractor,
            &candidate.url,
            &body,
            candidate.content_type,
        );
        if record.has_energy() {
            Attempt::Resolved(record)
        } else {
            Attempt::NoEnergy
        }
    }
}

fn parse_candidate(
    extractor: &RecordExtractor,
    url: &str,
    body: &str,
    content_type: ContentType,
) -> NutrientRecord {
    let context = ParsingContext::new(url, body, content_type);
    extractor.extract(&context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NutrientKey;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "https://www.kaloricketabulky.cz";

    const FOOD_PAGE: &str = r#"<html><body>
        <input type="hidden" id="calculatedEnergyValueInit" value="18,0">
    </body></html>"#;

    const RECIPE_PAGE: &str = r#"<html><body>
        <div><span ng-if="data.energy==null"></span>412 kcal</div>
    </body></html>"#;

    /// Serves canned pages and records every requested URL.
    struct CannedFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(path, body)| (format!("{BASE}{path}"), body.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            })
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String, NutritionError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| NutritionError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn resolver(fetcher: Arc<CannedFetcher>) -> DetailResolver {
        DetailResolver::new(fetcher, Url::parse(BASE).unwrap())
    }

    #[test]
    fn test_candidate_url_strips_leading_slashes() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(
            candidate_url(&base, ContentType::FoodItem, "//rajce").unwrap().as_str(),
            "https://www.kaloricketabulky.cz/potraviny/rajce"
        );
        assert_eq!(
            candidate_url(&base, ContentType::Recipe, "rajce").unwrap().as_str(),
            "https://www.kaloricketabulky.cz/recepty/rajce"
        );
    }

    #[test]
    fn test_candidates_unasserted_recipe_first() {
        let candidates = resolver(CannedFetcher::new(&[]))
            .candidates("rajce", None)
            .unwrap();
        let types: Vec<ContentType> = candidates.iter().map(|c| c.content_type).collect();
        assert_eq!(types, vec![ContentType::Recipe, ContentType::FoodItem]);
    }

    #[test]
    fn test_candidates_asserted_single() {
        let candidates = resolver(CannedFetcher::new(&[]))
            .candidates("rajce", Some(ContentType::FoodItem))
            .unwrap();
        assert_eq!(
            candidates,
            vec![CandidateLocation {
                url: format!("{BASE}/potraviny/rajce"),
                content_type: ContentType::FoodItem,
            }]
        );
    }

    #[test]
    fn test_candidate_urls_are_unique() {
        let candidates = resolver(CannedFetcher::new(&[]))
            .candidates("/polevky/gulasova-polevka", None)
            .unwrap();
        assert_eq!(
            candidates.iter().map(|c| c.url.as_str()).collect::<Vec<_>>(),
            vec![
                "https://www.kaloricketabulky.cz/recepty/polevky/gulasova-polevka",
                "https://www.kaloricketabulky.cz/potraviny/polevky/gulasova-polevka",
            ]
        );
    }

    #[test]
    fn test_colliding_candidates_are_deduplicated() {
        // both page families normalize to the same address
        let candidates = resolver(CannedFetcher::new(&[]))
            .candidates("../rajce", None)
            .unwrap();
        assert_eq!(
            candidates,
            vec![CandidateLocation {
                url: format!("{BASE}/rajce"),
                content_type: ContentType::Recipe,
            }]
        );
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let fetcher = CannedFetcher::new(&[("/recepty/gulas", RECIPE_PAGE)]);
        let details = resolver(fetcher.clone()).resolve("gulas", None).await.unwrap();

        assert_eq!(details.food_type, ContentType::Recipe);
        assert_eq!(details.record.get(NutrientKey::TotalKcal), "412 kcal");
        assert_eq!(fetcher.requested(), vec![format!("{BASE}/recepty/gulas")]);
    }

    #[tokio::test]
    async fn test_fallback_to_food_page() {
        let fetcher = CannedFetcher::new(&[
            ("/recepty/rajce", "<html><body>Recept nenalezen</body></html>"),
            ("/potraviny/rajce", FOOD_PAGE),
        ]);
        let details = resolver(fetcher.clone()).resolve("rajce", None).await.unwrap();

        assert_eq!(details.food_type, ContentType::FoodItem);
        assert_eq!(details.source_url, format!("{BASE}/potraviny/rajce"));
        assert_eq!(details.record.get(NutrientKey::TotalKcal), "18,0 kcal");
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_asserted_type_never_falls_back() {
        // the recipe page would succeed, but the caller asserted a food item
        let fetcher = CannedFetcher::new(&[
            ("/recepty/gulas", RECIPE_PAGE),
            ("/potraviny/gulas", "<html><body></body></html>"),
        ]);
        let err = resolver(fetcher.clone())
            .resolve("gulas", Some(ContentType::FoodItem))
            .await
            .unwrap_err();

        assert!(matches!(err, NutritionError::Exhausted { .. }));
        assert_eq!(fetcher.requested(), vec![format!("{BASE}/potraviny/gulas")]);
    }

    #[tokio::test]
    async fn test_exhausted_when_nothing_resolves() {
        let fetcher = CannedFetcher::new(&[]);
        let err = resolver(fetcher.clone()).resolve("nic", None).await.unwrap_err();

        assert!(matches!(err, NutritionError::Exhausted { ref slug } if slug == "nic"));
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_custom_extractor_is_used_for_candidates() {
        use crate::extractors::{AnchorSpec, EnergyAnchors, NutrientTableAnchors};

        let page = r#"<html><body><input id="kcal" value="55"></body></html>"#;
        let fetcher = CannedFetcher::new(&[("/potraviny/mrkev", page)]);
        let energy = EnergyAnchors {
            food_kcal_carrier: AnchorSpec::tag("input").attr_eq("id", "kcal"),
            ..EnergyAnchors::default()
        };
        let details = resolver(fetcher)
            .with_extractor(RecordExtractor::new(energy, NutrientTableAnchors::default()))
            .resolve("mrkev", Some(ContentType::FoodItem))
            .await
            .unwrap();

        assert_eq!(details.record.get(NutrientKey::TotalKcal), "55 kcal");
    }

    #[tokio::test]
    async fn test_blank_slug_is_rejected_before_fetching() {
        let fetcher = CannedFetcher::new(&[]);
        let err = resolver(fetcher.clone()).resolve("  ", None).await.unwrap_err();

        assert!(err.is_client_error());
        assert!(fetcher.requested().is_empty());
    }
}
