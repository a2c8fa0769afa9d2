//! In-memory reference implementations of [`CalendarBackend`] and
//! [`FaqMatcher`] (§1: "an in-memory reference implementation used for
//! tests and as the local fallback store"). Deterministic given a fixed
//! [`lobby_core::Clock`], so tests can assert on exact slot labels.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;

use lobby_core::Clock;

use crate::calendar::CalendarBackend;
use crate::error::Result;
use crate::faq::FaqMatcher;
use crate::types::{BookOutcome, FaqMatch, LookupOutcome, Preference, Qualification, SlotOffer};

struct Booking {
    name: String,
    slot_label: String,
}

/// Generates slots on fixed daily offsets (09:00/10:00/11:00 for morning,
/// 14:00/15:00/16:00 for afternoon) starting the day after `now`, and tracks
/// bookings per tenant in memory. Good enough as a test double and as the
/// fallback store when a real scheduling system is unreachable (§4.10).
pub struct InMemoryCalendar {
    clock: Arc<dyn Clock>,
    bookings: Mutex<HashMap<String, Vec<Booking>>>,
}

impl InMemoryCalendar {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, bookings: Mutex::new(HashMap::new()) }
    }

    fn hours_for(preference: Preference) -> &'static [u32] {
        match preference {
            Preference::Morning => &[9, 10, 11],
            Preference::Afternoon => &[14, 15, 16],
            Preference::Unspecified => &[9, 14, 10],
        }
    }
}

#[async_trait]
impl CalendarBackend for InMemoryCalendar {
    async fn free_slots(&self, _tenant_id: &str, preference: Preference, max: usize) -> Result<Vec<SlotOffer>> {
        let base = self.clock.now() + ChronoDuration::days(1);
        let hours = Self::hours_for(preference);

        let slots = hours
            .iter()
            .take(max)
            .enumerate()
            .map(|(i, hour)| {
                let start_ts = base.date_naive().and_hms_opt(*hour, 0, 0).unwrap().and_utc();
                SlotOffer {
                    index: (i + 1) as u8,
                    start_ts,
                    label: format!("{} à {}h", start_ts.format("%A %d %B"), hour),
                }
            })
            .collect();

        Ok(slots)
    }

    async fn book(&self, tenant_id: &str, slot: &SlotOffer, qualification: &Qualification) -> Result<BookOutcome> {
        let mut bookings = self.bookings.lock().unwrap();
        let tenant_bookings = bookings.entry(tenant_id.to_string()).or_default();

        if tenant_bookings.iter().any(|b| b.slot_label == slot.label) {
            return Ok(BookOutcome::Taken);
        }

        let name = qualification.name.clone().unwrap_or_else(|| "Anonyme".to_string());
        tenant_bookings.push(Booking { name, slot_label: slot.label.clone() });

        Ok(BookOutcome::Ok { event_id: uuid::Uuid::now_v7().to_string() })
    }

    async fn cancel(&self, tenant_id: &str, identifying_name: &str) -> Result<LookupOutcome> {
        let mut bookings = self.bookings.lock().unwrap();
        let Some(tenant_bookings) = bookings.get_mut(tenant_id) else {
            return Ok(LookupOutcome::NotFound);
        };

        if let Some(pos) = tenant_bookings.iter().position(|b| b.name.eq_ignore_ascii_case(identifying_name)) {
            let booking = tenant_bookings.remove(pos);
            Ok(LookupOutcome::Ok { slot_label: booking.slot_label })
        } else {
            Ok(LookupOutcome::NotFound)
        }
    }

    async fn find(&self, tenant_id: &str, identifying_name: &str) -> Result<LookupOutcome> {
        let bookings = self.bookings.lock().unwrap();
        let Some(tenant_bookings) = bookings.get(tenant_id) else {
            return Ok(LookupOutcome::NotFound);
        };

        match tenant_bookings.iter().find(|b| b.name.eq_ignore_ascii_case(identifying_name)) {
            Some(booking) => Ok(LookupOutcome::Ok { slot_label: booking.slot_label.clone() }),
            None => Ok(LookupOutcome::NotFound),
        }
    }
}

/// A fixed `(keywords, answer)` table scored by keyword-overlap ratio — no
/// external index, matching this crate's "no regex / fixed matching" bias.
pub struct InMemoryFaq {
    entries: Vec<(String, Vec<String>, String)>,
}

impl InMemoryFaq {
    pub fn new(entries: Vec<(String, Vec<String>, String)>) -> Self {
        Self { entries }
    }

    fn score(keywords: &[String], query_lower: &str) -> f32 {
        if keywords.is_empty() {
            return 0.0;
        }
        let hits = keywords.iter().filter(|k| query_lower.contains(k.as_str())).count();
        hits as f32 / keywords.len() as f32
    }
}

#[async_trait]
impl FaqMatcher for InMemoryFaq {
    async fn find_match(&self, _tenant_id: &str, query: &str) -> Result<Option<FaqMatch>> {
        let query_lower = query.to_lowercase();

        let best = self
            .entries
            .iter()
            .map(|(id, keywords, answer)| {
                let score = Self::score(keywords, &query_lower);
                (id, answer, score)
            })
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((id, answer, score)) if score > 0.0 => {
                Ok(Some(FaqMatch { id: id.clone(), answer: answer.clone(), score }))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby_core::FixedClock;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(chrono::DateTime::parse_from_rfc3339("2026-07-28T10:00:00Z").unwrap().into()))
    }

    #[tokio::test]
    async fn free_slots_respects_preference_and_max() {
        let cal = InMemoryCalendar::new(clock());
        let slots = cal.free_slots("tenant-a", Preference::Morning, 2).await.unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].index, 1);
    }

    #[tokio::test]
    async fn booking_then_rebooking_same_slot_is_taken() {
        let cal = InMemoryCalendar::new(clock());
        let slots = cal.free_slots("tenant-a", Preference::Morning, 1).await.unwrap();
        let qualification = Qualification { name: Some("Jean Dupont".to_string()), ..Default::default() };

        let first = cal.book("tenant-a", &slots[0], &qualification).await.unwrap();
        assert!(matches!(first, BookOutcome::Ok { .. }));

        let second = cal.book("tenant-a", &slots[0], &qualification).await.unwrap();
        assert_eq!(second, BookOutcome::Taken);
    }

    #[tokio::test]
    async fn cancel_then_find_reports_not_found() {
        let cal = InMemoryCalendar::new(clock());
        let slots = cal.free_slots("tenant-a", Preference::Afternoon, 1).await.unwrap();
        let qualification = Qualification { name: Some("Marie Curie".to_string()), ..Default::default() };
        cal.book("tenant-a", &slots[0], &qualification).await.unwrap();

        let cancelled = cal.cancel("tenant-a", "marie curie").await.unwrap();
        assert!(matches!(cancelled, LookupOutcome::Ok { .. }));

        let refind = cal.find("tenant-a", "marie curie").await.unwrap();
        assert_eq!(refind, LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn faq_matches_above_zero_and_none_otherwise() {
        let faq = InMemoryFaq::new(vec![(
            "hours".to_string(),
            vec!["horaires".to_string(), "ouvert".to_string()],
            "Nous sommes ouverts du lundi au vendredi.".to_string(),
        )]);

        let hit = faq.find_match("tenant-a", "quels sont vos horaires").await.unwrap();
        assert!(hit.is_some());
        assert!(hit.unwrap().score > 0.0);

        let miss = faq.find_match("tenant-a", "combien coute une pizza").await.unwrap();
        assert!(miss.is_none());
    }
}
