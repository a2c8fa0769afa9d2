//! Fail-closed entity extraction (§4.2): every extractor returns `None` (or
//! `Unspecified`) rather than guess when the input doesn't clearly match one
//! of its recognised forms.

use crate::normalize::{clean_vocal_name, digit_word_to_str, fold};

const NAME_LEAD_INS: &[&str] = &["je suis", "je m'appelle", "c'est", "mon nom est", "ici"];

/// Extracts a two-token name ("first last") from a short utterance.
///
/// Recognises an explicit lead-in ("je m'appelle Jean Dupont") or, failing
/// that, a bare utterance of exactly two or three alphabetic tokens — the
/// caller is expected to have already routed here only while `QUALIF_NAME`
/// is awaiting exactly this kind of reply. Anything else is `None`.
pub fn extract_name(text: &str) -> Option<String> {
    let cleaned = clean_vocal_name(text);
    if cleaned.is_empty() {
        return None;
    }

    for lead_in in NAME_LEAD_INS {
        if let Some(rest) = cleaned.strip_prefix(lead_in) {
            let rest = rest.trim_start_matches(|c: char| !c.is_alphabetic());
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if (1..=3).contains(&tokens.len()) && tokens.iter().all(|t| is_name_token(t)) {
                return Some(capitalize_tokens(&tokens));
            }
        }
    }

    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if (2..=3).contains(&tokens.len()) && tokens.iter().all(|t| is_name_token(t)) {
        return Some(capitalize_tokens(&tokens));
    }

    None
}

fn is_name_token(tok: &str) -> bool {
    !tok.is_empty() && tok.chars().all(|c| c.is_alphabetic() || c == '-' || c == '\'')
}

fn capitalize_tokens(tokens: &[&str]) -> String {
    tokens
        .iter()
        .map(|t| {
            let mut chars = t.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts and normalises a French phone number, supporting both digit
/// strings ("0612345678") and digit-by-digit dictation ("zero six douze
/// trente-quatre cinquante-six soixante-dix-huit"). Requires exactly 10
/// digits once assembled; anything else is `None` rather than a guess.
pub fn extract_phone(text: &str) -> Option<String> {
    let folded = fold(text);
    let mut digits = String::new();

    for raw_token in folded.split_whitespace() {
        let token = raw_token.trim_matches(|c: char| !c.is_alphanumeric());
        if token.chars().all(|c| c.is_ascii_digit()) && !token.is_empty() {
            digits.push_str(token);
            continue;
        }
        if let Some(mapped) = digit_word_to_str(token) {
            digits.push_str(mapped);
        }
    }

    if digits.len() != 10 || !digits.starts_with('0') {
        return None;
    }

    Some(digits)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePreference {
    Morning,
    Afternoon,
    Unspecified,
}

const MORNING_MARKERS: &[&str] = &["matin", "tot le matin", "avant midi"];
const AFTERNOON_MARKERS: &[&str] = &["apres-midi", "apres midi", "aprem", "tantot", "fin de journee"];

/// Extracts a morning/afternoon preference. Both markers present, or
/// neither, is `Unspecified` — the caller routes that to `PREFERENCE_CONFIRM`
/// rather than picking one.
pub fn extract_time_preference(text: &str) -> TimePreference {
    let folded = fold(text);
    let has_morning = MORNING_MARKERS.iter().any(|m| folded.contains(m));
    let has_afternoon = AFTERNOON_MARKERS.iter().any(|m| folded.contains(m));

    match (has_morning, has_afternoon) {
        (true, false) => TimePreference::Morning,
        (false, true) => TimePreference::Afternoon,
        _ => TimePreference::Unspecified,
    }
}

/// A slot currently on offer, reduced to the cues `detect_slot_choice` can
/// match a reply against, without pulling a date/time library into this
/// crate — callers derive `weekday`/`hour` from the real timestamp.
#[derive(Debug, Clone, Copy)]
pub struct SlotHint {
    pub index: u8,
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: u8,
    pub hour: u32,
}

const FRENCH_WEEKDAYS: [&str; 7] = ["lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche"];

/// Recognises a choice among up to three proposed slots (§4.10,
/// `max_slots_proposed`). Accepts bare digits, cardinal words, ordinal
/// words, short positional phrases ("le premier", "le deuxieme creneau"),
/// a day name that resolves unambiguously against the offered slots
/// ("celui de mardi"), and an explicit hour that matches exactly one
/// offered slot ("14h"). Returns `None` for anything else, including
/// out-of-range numbers and day/hour references that match zero or more
/// than one offered slot.
pub fn detect_slot_choice(text: &str, slots: &[SlotHint]) -> Option<u8> {
    let folded = fold(text);

    const ONE: &[&str] = &["1", "un", "une", "premier", "premiere", "le premier"];
    const TWO: &[&str] = &["2", "deux", "deuxieme", "le deuxieme", "second", "seconde"];
    const THREE: &[&str] = &["3", "trois", "troisieme", "le troisieme"];

    const NEGATION_MARKERS: &[&str] = &["aucun", "ni l'un ni l'autre", "pas celui", "aucune"];
    if NEGATION_MARKERS.iter().any(|m| folded.contains(m)) {
        return None;
    }

    let tokens: Vec<&str> = folded.split_whitespace().collect();
    let matches = |markers: &[&str]| markers.iter().any(|m| folded.contains(m) || tokens.contains(m));

    // Check longest phrase first so "le premier" doesn't get shadowed by
    // looser single-token logic in future edits.
    if matches(ONE) {
        return Some(1);
    }
    if matches(TWO) {
        return Some(2);
    }
    if matches(THREE) {
        return Some(3);
    }

    if let Some(index) = match_by_weekday(&folded, slots) {
        return Some(index);
    }
    match_by_hour(&tokens, slots)
}

fn match_by_weekday(folded: &str, slots: &[SlotHint]) -> Option<u8> {
    let day = FRENCH_WEEKDAYS.iter().position(|d| folded.contains(d))? as u8;
    let mut hit = None;
    for slot in slots {
        if slot.weekday == day {
            if hit.is_some() {
                return None;
            }
            hit = Some(slot.index);
        }
    }
    hit
}

fn match_by_hour(tokens: &[&str], slots: &[SlotHint]) -> Option<u8> {
    let mut hit = None;
    for token in tokens {
        let Some(digits) = token.strip_suffix('h') else { continue };
        let Ok(hour) = digits.parse::<u32>() else { continue };
        for slot in slots {
            if slot.hour == hour {
                if hit.is_some() && hit != Some(slot.index) {
                    return None;
                }
                hit = Some(slot.index);
            }
        }
    }
    hit
}
