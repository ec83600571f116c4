pub mod perplexity;

pub use perplexity::PerplexityResearcher;

pub const NO_DATA_TEXT: &str = "No data found.";
pub const MISSING_KEY_TEXT: &str = "No data found. (Missing PERPLEXITY_API_KEY)";

/// Source of free-text facts for a case. Never fails: a missing key or an
/// unusable answer collapses into one of the `No data` sentinels.
#[async_trait::async_trait]
pub trait FactSource: Send + Sync {
    async fn search(&self, query: &str) -> String;
}
