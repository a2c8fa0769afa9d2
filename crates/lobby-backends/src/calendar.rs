use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BookOutcome, LookupOutcome, Preference, Qualification, SlotOffer};

/// Free-slot lookup, booking, cancellation, and lookup-by-name (§6.3). This
/// crate owns the trait and an in-memory reference implementation used for
/// tests and as the local fallback store (§1); a real scheduling system's
/// client is a separate, out-of-scope crate depending on this contract.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn free_slots(&self, tenant_id: &str, preference: Preference, max: usize) -> Result<Vec<SlotOffer>>;

    async fn book(&self, tenant_id: &str, slot: &SlotOffer, qualification: &Qualification) -> Result<BookOutcome>;

    async fn cancel(&self, tenant_id: &str, identifying_name: &str) -> Result<LookupOutcome>;

    async fn find(&self, tenant_id: &str, identifying_name: &str) -> Result<LookupOutcome>;
}
