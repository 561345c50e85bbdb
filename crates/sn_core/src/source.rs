use async_trait::async_trait;

use crate::types::RawEntry;
use crate::Result;

/// Anything that turns a feed URL into raw entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch and parse a single feed. Transport and parse failures are
    /// reported per call so callers can isolate them.
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>>;
}
