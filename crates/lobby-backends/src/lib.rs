pub mod calendar;
pub mod deadline;
pub mod error;
pub mod faq;
pub mod memory;
pub mod types;

pub use calendar::CalendarBackend;
pub use deadline::with_deadline;
pub use error::BackendError;
pub use faq::FaqMatcher;
pub use memory::{InMemoryCalendar, InMemoryFaq};
pub use types::{BookOutcome, FaqMatch, LookupOutcome, Preference, Qualification, SlotOffer};
