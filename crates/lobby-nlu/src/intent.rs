//! Closed-vocabulary intent detection (§4.3). Every intent is recognised by
//! fixed-substring matching against the folded input — no scoring, no
//! partial credit. Ambiguous input yields `None`, never a guess.

use crate::normalize::fold;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Yes,
    No,
    Booking,
    Cancel,
    Modify,
    Transfer,
    Abandon,
    Faq,
}

const YES_MARKERS: &[&str] = &[
    "oui", "ouais", "ok", "d'accord", "daccord", "exact", "voila", "parfait",
    "c'est ca", "c'est bon", "tout a fait",
];

const NO_MARKERS: &[&str] = &["non", "pas du tout", "negatif", "jamais"];

const BOOKING_MARKERS: &[&str] = &[
    "rendez-vous", "rendez vous", "rdv", "reserver", "prendre un creneau",
    "un creneau", "disponibilite",
];

const CANCEL_MARKERS: &[&str] = &["annuler", "annulation", "je ne viendrai pas", "supprimer mon rdv"];

const MODIFY_MARKERS: &[&str] = &["modifier", "changer", "deplacer", "reporter"];

const TRANSFER_MARKERS: &[&str] = &[
    "parler a quelqu'un", "parler a un humain", "un conseiller", "une personne",
    "un responsable", "passez-moi",
];

const ABANDON_MARKERS: &[&str] = &["laisse tomber", "annule tout", "au revoir", "j'abandonne", "rien merci"];

const FAQ_MARKERS: &[&str] = &[
    "horaires", "ouvert", "fermé", "ferme", "adresse", "ou etes-vous",
    "combien ca coute", "prix", "tarif",
];

/// Best single-intent guess for free text. Checked in a fixed priority order
/// so an utterance mentioning both "annuler" and "rendez-vous" resolves to
/// the more specific (cancel) reading.
pub fn detect_intent(text: &str) -> Option<Intent> {
    let folded = fold(text);

    if CANCEL_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Cancel);
    }
    if MODIFY_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Modify);
    }
    if TRANSFER_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Transfer);
    }
    if ABANDON_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Abandon);
    }
    if FAQ_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Faq);
    }
    if BOOKING_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Booking);
    }
    if YES_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Yes);
    }
    if NO_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::No);
    }

    None
}

/// Strong intents pre-empt the current flow from *any* non-terminal state
/// (§4.3, §4.8). Only CANCEL, MODIFY and TRANSFER qualify, and TRANSFER
/// additionally requires the utterance be at least 14 characters long so a
/// short fragment that merely contains "personne" doesn't derail a booking
/// in progress.
pub fn detect_strong_intent(text: &str) -> Option<Intent> {
    let folded = fold(text);

    if CANCEL_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Cancel);
    }
    if MODIFY_MARKERS.iter().any(|m| folded.contains(m)) {
        return Some(Intent::Modify);
    }
    if TRANSFER_MARKERS.iter().any(|m| folded.contains(m)) && text.trim().chars().count() >= 14 {
        return Some(Intent::Transfer);
    }

    None
}

const CORRECTION_MARKERS: &[&str] = &[
    "attendez", "attends", "recommencez", "recommencons", "c'est pas ca",
    "ce n'est pas ca", "je me suis trompe", "erreur", "non pas ca",
];

/// Detects a meta-level correction request ("attendez, recommencez"),
/// orthogonal to `detect_intent`: it can co-occur with any other intent and
/// always routes to the recovery layer rather than the FSM (§4.3, §4.6).
pub fn detect_correction_intent(text: &str) -> bool {
    let folded = fold(text);
    CORRECTION_MARKERS.iter().any(|m| folded.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_yes_no() {
        assert_eq!(detect_intent("Oui tout a fait"), Some(Intent::Yes));
        assert_eq!(detect_intent("Non merci"), Some(Intent::No));
    }

    #[test]
    fn recognises_booking_request() {
        assert_eq!(detect_intent("Je voudrais prendre un rendez-vous"), Some(Intent::Booking));
    }

    #[test]
    fn cancel_outranks_booking_mention() {
        let text = "Je veux annuler mon rendez-vous";
        assert_eq!(detect_intent(text), Some(Intent::Cancel));
    }

    #[test]
    fn ambiguous_text_detects_nothing() {
        assert_eq!(detect_intent("le chat est sur la table"), None);
    }

    #[test]
    fn strong_transfer_requires_minimum_length() {
        assert_eq!(detect_strong_intent("une personne"), None);
        assert_eq!(
            detect_strong_intent("je veux parler a une personne tout de suite"),
            Some(Intent::Transfer)
        );
    }

    #[test]
    fn strong_cancel_has_no_length_gate() {
        assert_eq!(detect_strong_intent("annuler"), Some(Intent::Cancel));
    }

    #[test]
    fn correction_marker_detected_independently_of_intent() {
        assert!(detect_correction_intent("attendez, ce n'est pas ca"));
        assert!(!detect_correction_intent("Jean Dupont"));
    }
}
