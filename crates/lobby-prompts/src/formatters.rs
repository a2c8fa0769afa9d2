//! Formatters for catalog entries whose body is built from structured data
//! rather than a single flat placeholder (§4.4: slot proposal, booking
//! confirmation).

use lobby_core::Channel;

use crate::catalog::{render, PromptKey};

const ORDINALS: &[&str] = &["Un", "Deux", "Trois"];

/// Builds the `{slots}` fragment of the slot-proposal prompt: "Un : {s1}.
/// Deux : {s2}. Trois : {s3}." — only as many ordinals as there are slots.
fn format_slot_list(slot_labels: &[String]) -> String {
    slot_labels
        .iter()
        .zip(ORDINALS.iter())
        .map(|(label, ordinal)| format!("{ordinal} : {label}."))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the full slot-proposal prompt for up to three offered slots
/// (§4.10).
pub fn slot_proposal(channel: Channel, slot_labels: &[String]) -> String {
    let count = match slot_labels.len() {
        1 => "un",
        2 => "deux",
        _ => "trois",
    };
    let slots = format_slot_list(slot_labels);
    render(PromptKey::SlotProposal, channel, &[("count", count), ("slots", &slots)])
}

/// Renders the booking-confirmation prompt with the caller's first name and
/// the confirmed slot label (§4.4, §4.10).
pub fn booking_confirmation(channel: Channel, first_name: &str, slot_label: &str) -> String {
    render(
        PromptKey::BookingConfirmation,
        channel,
        &[("first_name", first_name), ("slot_label", slot_label)],
    )
}

/// Passes a backend-provided FAQ answer through the catalog (§4.11).
pub fn faq_answer(channel: Channel, answer: &str) -> String {
    render(PromptKey::FaqAnswer, channel, &[("answer", answer)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_proposal_renders_three_slots_in_order() {
        let labels = vec!["lundi 9h".to_string(), "lundi 14h".to_string(), "mardi 9h".to_string()];
        let rendered = slot_proposal(Channel::Voice, &labels);
        assert!(rendered.contains("Un : lundi 9h."));
        assert!(rendered.contains("Deux : lundi 14h."));
        assert!(rendered.contains("Trois : mardi 9h."));
        assert!(rendered.starts_with("J'ai trois créneaux."));
    }

    #[test]
    fn slot_proposal_handles_fewer_than_three() {
        let labels = vec!["lundi 9h".to_string()];
        let rendered = slot_proposal(Channel::Text, &labels);
        assert!(rendered.contains("Un : lundi 9h."));
        assert!(!rendered.contains("Deux"));
    }

    #[test]
    fn booking_confirmation_includes_name_and_slot() {
        let rendered = booking_confirmation(Channel::Voice, "Jean", "lundi 9h");
        assert!(rendered.contains("Jean"));
        assert!(rendered.contains("lundi 9h"));
    }

    #[test]
    fn faq_answer_passes_through_verbatim() {
        assert_eq!(faq_answer(Channel::Text, "Nous ouvrons à 9h."), "Nous ouvrons à 9h.");
    }
}
