pub mod entities;
pub mod guards;
pub mod intent;
pub mod normalize;

pub use entities::{detect_slot_choice, extract_name, extract_phone, extract_time_preference, SlotHint, TimePreference};
pub use guards::{clean_vocal_name, is_empty, is_french, is_spam_or_abuse, is_too_long};
pub use intent::{detect_correction_intent, detect_intent, detect_strong_intent, Intent};
