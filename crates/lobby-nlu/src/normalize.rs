//! Deterministic, allocation-cheap text normalisation shared by guards,
//! the intent detector, and the entity extractor.
//!
//! Everything here is a fixed lookup table rather than a locale library —
//! the spec requires fixed-string matching, not a general-purpose NLP stack
//! (§4.3: "No regex backtracking pitfalls: use fixed-string search").

/// Strip the accents this agent will ever see in French input. Unmapped
/// characters pass through unchanged.
pub fn strip_diacritics(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' | 'ì' => 'i',
        'ô' | 'ö' | 'ó' | 'ò' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'œ' => 'o',
        'æ' => 'a',
        other => other,
    }
}

/// Lowercase + diacritic-fold a whole string. Used before every substring
/// match in the intent detector and guards so phrasing variance ("Écoute",
/// "écoute", "ecoute") collapses to one canonical form.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(|c| c.to_lowercase())
        .map(strip_diacritics)
        .collect()
}

/// Filler tokens stripped by `clean_vocal_name` (§4.1) before name extraction
/// runs on voice transcripts, where disfluencies are common.
const FILLER_TOKENS: &[&str] = &["euh", "hum", "heu", "ben", "bah", "donc"];

/// Strip filler tokens and collapse whitespace, diacritic-folding the result.
/// Pure, no session access (§4.1).
pub fn clean_vocal_name(text: &str) -> String {
    let folded = fold(text);
    let cleaned: Vec<&str> = folded
        .split_whitespace()
        .filter(|tok| {
            let trimmed = tok.trim_matches(|c: char| !c.is_alphanumeric());
            !FILLER_TOKENS.contains(&trimmed)
        })
        .collect();
    cleaned.join(" ")
}

/// Maps spoken/written digit words to their numeral, for digit-by-digit
/// phone dictation ("zéro six, douze, ...") per §4.2.
pub fn digit_word_to_str(word: &str) -> Option<&'static str> {
    match word {
        "zero" => Some("0"),
        "un" | "une" => Some("1"),
        "deux" => Some("2"),
        "trois" => Some("3"),
        "quatre" => Some("4"),
        "cinq" => Some("5"),
        "six" => Some("6"),
        "sept" => Some("7"),
        "huit" => Some("8"),
        "neuf" => Some("9"),
        "dix" => Some("10"),
        "onze" => Some("11"),
        "douze" => Some("12"),
        "treize" => Some("13"),
        "quatorze" => Some("14"),
        "quinze" => Some("15"),
        "seize" => Some("16"),
        "dix-sept" | "dixsept" => Some("17"),
        "dix-huit" | "dixhuit" => Some("18"),
        "dix-neuf" | "dixneuf" => Some("19"),
        "vingt" => Some("20"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_collapses_accents_and_case() {
        assert_eq!(fold("Écoute ça"), "ecoute ca");
    }

    #[test]
    fn clean_vocal_name_drops_fillers() {
        assert_eq!(clean_vocal_name("euh, c'est Jean Dupont"), "c'est jean dupont");
    }

    #[test]
    fn digit_word_mapping_covers_dictation_range() {
        assert_eq!(digit_word_to_str("zero"), Some("0"));
        assert_eq!(digit_word_to_str("douze"), Some("12"));
        assert_eq!(digit_word_to_str("inconnu"), None);
    }
}
