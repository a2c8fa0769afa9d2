use async_trait::async_trait;

use crate::error::Result;
use crate::types::FaqMatch;

/// Lexical FAQ matcher (§6.4). This crate owns the trait and an in-memory
/// reference implementation; a real lexical/vector store is out of scope
/// (§1) and would be a separate crate depending on this contract.
#[async_trait]
pub trait FaqMatcher: Send + Sync {
    async fn find_match(&self, tenant_id: &str, query: &str) -> Result<Option<FaqMatch>>;
}
