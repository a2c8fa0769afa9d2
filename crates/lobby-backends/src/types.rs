use chrono::{DateTime, Utc};

/// Morning/afternoon/unspecified, as resolved by the entity extractor
/// (§4.2) before reaching the calendar backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Morning,
    Afternoon,
    Unspecified,
}

/// One proposed appointment (§3). `index` is stable and 1-based for the
/// lifetime of a single `pending_slots` batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOffer {
    pub index: u8,
    pub start_ts: DateTime<Utc>,
    pub label: String,
}

/// What the caller collected during qualification, passed to `book` so the
/// backend can attach it to the created event.
#[derive(Debug, Clone, Default)]
pub struct Qualification {
    pub name: Option<String>,
    pub motif: Option<String>,
    pub contact: Option<String>,
}

/// Outcome of a `book` attempt (§6.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookOutcome {
    Ok { event_id: String },
    Taken,
    Unavailable,
}

/// Outcome of `cancel`/`find` (§6.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Ok { slot_label: String },
    NotFound,
}

/// A scored FAQ match (§6.4). `score` is in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqMatch {
    pub id: String,
    pub answer: String,
    pub score: f32,
}
