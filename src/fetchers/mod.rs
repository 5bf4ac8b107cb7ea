mod request;

pub use self::request::RequestFetcher;

use crate::error::NutritionError;
use async_trait::async_trait;

/// Retrieves the body of a page or endpoint.
///
/// Implementations must be shareable between concurrent requests; the
/// resolver and the search relay hold one behind an `Arc`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns the body; non-2xx statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String, NutritionError>;
}
