//! Pure input validators (§4.1). No session access, no side effects — each
//! function is a boolean or string transform of its input only.

use crate::normalize::fold;

pub use crate::normalize::clean_vocal_name;

/// Hard byte/character cap on a single user message (§6.5 `max_message_length`).
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 500;

/// Whitespace-only (or literally empty) text counts as empty.
pub fn is_empty(text: &str) -> bool {
    text.trim().is_empty()
}

/// Strict character-count cap. Counting chars (not bytes) keeps the limit
/// meaningful for accented French text, where one visible character can be
/// multiple UTF-8 bytes.
pub fn is_too_long(text: &str, max_chars: usize) -> bool {
    text.chars().count() > max_chars
}

/// A handful of unambiguous French function words. Their presence is a
/// strong signal the utterance is French; their total absence from an
/// otherwise recognisable sentence is the only case where we call it
/// non-French, per the "false only with high confidence" rule.
const FRENCH_MARKERS: &[&str] = &[
    " le ", " la ", " les ", " un ", " une ", " des ", " de ", " du ",
    " je ", " vous ", " nous ", " est ", " c'est", " oui", " non",
    "bonjour", "merci", "rendez-vous", "creneau", "madame", "monsieur",
];

/// Common English function words — seeing several of these with zero French
/// markers is the high-confidence non-French signal.
const ENGLISH_MARKERS: &[&str] = &[
    " the ", " is ", " you ", " hello ", " please ", " thanks ", " yes",
    " no ", " appointment ", " book ",
];

/// Heuristic language detection. Returns `false` only with high confidence
/// of non-French (§4.1): short utterances, numbers, and ambiguous text all
/// default to French so the pipeline doesn't reject legitimate short replies
/// like "oui" or "3".
pub fn is_french(text: &str) -> bool {
    let folded = format!(" {} ", fold(text));

    if FRENCH_MARKERS.iter().any(|m| folded.contains(m)) {
        return true;
    }

    // Non-Latin scripts (Cyrillic, CJK, Arabic, …) are an immediate no.
    let has_non_latin = text.chars().any(|c| {
        let cp = c as u32;
        (0x0400..=0x04FF).contains(&cp) // Cyrillic
            || (0x4E00..=0x9FFF).contains(&cp) // CJK
            || (0x0600..=0x06FF).contains(&cp) // Arabic
            || (0x3040..=0x30FF).contains(&cp) // Hiragana/Katakana
    });
    if has_non_latin {
        return false;
    }

    let english_hits = ENGLISH_MARKERS.iter().filter(|m| folded.contains(*m)).count();
    // Require more than one hit: a single ambiguous word ("no", "yes") is
    // too common as a borrowed/short reply to be a confident signal.
    if english_hits >= 2 {
        return false;
    }

    true
}

/// Crude abuse/spam block-list plus a couple of structural heuristics.
/// Fails closed: ambiguous input is never flagged as spam.
pub fn is_spam_or_abuse(text: &str) -> bool {
    const BLOCKLIST: &[&str] = &[
        "connard", "salope", "enculé", "encule", "pute", "va te faire",
        "http://", "https://", "www.",
    ];

    let folded = fold(text);
    if BLOCKLIST.iter().any(|w| folded.contains(w)) {
        return true;
    }

    // A long run of the same character ("aaaaaaaaaaaaaaaaaaaa") is almost
    // never a real reply.
    let mut max_run = 0usize;
    let mut run = 0usize;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        max_run = max_run.max(run);
    }
    if max_run >= 10 {
        return true;
    }

    // Overwhelmingly non-alphanumeric, non-whitespace content (e.g. a wall
    // of punctuation or emoji) is treated as noise/abuse, not a real message.
    let total = text.chars().count();
    if total >= 15 {
        let symbolic = text
            .chars()
            .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
            .count();
        if symbolic * 2 > total {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_are_empty() {
        assert!(is_empty(""));
        assert!(is_empty("   \t\n "));
        assert!(!is_empty("oui"));
    }

    #[test]
    fn too_long_counts_characters_not_bytes() {
        let accented = "é".repeat(501);
        assert!(is_too_long(&accented, 500));
        assert!(!is_too_long(&"é".repeat(500), 500));
    }

    #[test]
    fn short_replies_default_to_french() {
        assert!(is_french("oui"));
        assert!(is_french("3"));
        assert!(is_french("Jean Dupont"));
    }

    #[test]
    fn clear_french_sentences_are_french() {
        assert!(is_french("Bonjour, je voudrais prendre rendez-vous"));
    }

    #[test]
    fn clear_english_sentences_are_rejected() {
        assert!(!is_french("Hello, please book the appointment for me thanks"));
    }

    #[test]
    fn non_latin_script_is_rejected() {
        assert!(!is_french("привет, как дела"));
    }

    #[test]
    fn blocklist_word_is_spam() {
        assert!(is_spam_or_abuse("espece de connard"));
    }

    #[test]
    fn repeated_char_run_is_spam() {
        assert!(is_spam_or_abuse("aaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn ordinary_message_is_not_spam() {
        assert!(!is_spam_or_abuse("Jean Dupont, le matin si possible"));
    }
}
