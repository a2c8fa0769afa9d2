//! The prompt catalog (§4.4): the single source of truth for every
//! user-visible string. No user-facing text is ever written anywhere else
//! in the engine — every reply flows through [`render`].

use lobby_core::{Channel, RecoveryContext};

/// Which destructive flow a shared prompt applies to (§4.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Cancel,
    Modify,
}

/// Every catalog entry. Grouped to match §4.4's section headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKey {
    // System notices
    EmptyInput,
    TooLong,
    FrenchOnly,
    SessionExpired,
    ConversationClosed,
    SafeReplyFallback,

    // First message
    Greeting,

    // Qualification prompts
    AskName,
    AskMotif,
    AskPreference,
    AskContact,
    ConfirmNumber,
    PreferenceAmbiguousConfirm,

    // Cancel / Modify
    DestructiveAskName(Flow),
    DestructiveNotFound(Flow, u8),
    DestructiveConfirm(Flow),
    DestructiveDone(Flow),
    DestructiveKept(Flow),

    // Clarify
    ClarifyLevel1,
    ClarifyLevel2,
    ClarifyStillUnclear,

    // Graduated per-context clarification (§4.6)
    Clarification(RecoveryContext, u8),

    // Intent-router menu (§4.7)
    RouterMenu,
    RouterRetry,
    RouterChoiceBooking,
    RouterChoiceCancelModify,
    RouterChoiceFaq,
    RouterChoiceTransfer,

    // Transfer
    TransferMessage,

    // FAQ
    FaqGoodbye,
    /// Passes the backend-provided answer text through the catalog so every
    /// emitted string, including this one, satisfies P5 (prompt provenance).
    /// The match's source id travels separately in the audit event, not in
    /// the spoken/written text (§6.2 only carries `text` and `new_state`).
    FaqAnswer,

    /// `{slots}` is pre-formatted by `formatters::format_slot_proposal`.
    SlotProposal,
    /// `{first_name}` and `{slot_label}`.
    BookingConfirmation,
    SlotAlreadyBooked,
}

/// Looks up the raw template for `key` on `channel`, substitutes every
/// `{placeholder}` found in `vars`, and returns the rendered string.
/// Unknown placeholders are left as-is rather than silently dropped, so a
/// missing var shows up immediately in manual testing.
pub fn render(key: PromptKey, channel: Channel, vars: &[(&str, &str)]) -> String {
    let template = template_for(key, channel);
    substitute(template, vars)
}

fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

fn template_for(key: PromptKey, channel: Channel) -> &'static str {
    use Channel::*;
    use Flow::*;
    use PromptKey::*;

    match (key, channel) {
        (EmptyInput, Voice) => "Je n'ai pas entendu. Pouvez-vous répéter ?",
        (EmptyInput, Text) => "Je n'ai pas reçu de message. Pouvez-vous réessayer ?",

        (TooLong, _) => "Votre message est trop long, pouvez-vous le raccourcir ?",

        (FrenchOnly, _) => "Je ne comprends que le français pour le moment, merci de reformuler.",

        (SessionExpired, _) => "Notre conversation précédente a expiré. Recommençons.",

        (ConversationClosed, _) => "Cette conversation est terminée. Merci et à bientôt.",

        (SafeReplyFallback, _) => "D'accord. Je vous écoute.",

        (Greeting, _) => "Bonjour, bienvenue chez {business_name}. Souhaitez-vous prendre rendez-vous ?",

        (AskName, _) => "Quel est votre nom ?",
        (AskMotif, _) => "Quel est le motif de votre visite ?",
        (AskPreference, _) => "Préférez-vous un rendez-vous le matin ou l'après-midi ?",
        (AskContact, _) => "Quel est votre numéro de téléphone ?",
        (ConfirmNumber, _) => "Je confirme votre numéro : {phone}. Est-ce exact ?",
        (PreferenceAmbiguousConfirm, _) => "Si je comprends bien, vous préférez {preference_guess}, c'est bien ça ?",

        (DestructiveAskName(Cancel), _) => "Quel est le nom du rendez-vous à annuler ?",
        (DestructiveAskName(Modify), _) => "Quel est le nom du rendez-vous à modifier ?",

        (DestructiveNotFound(_, 1), _) => "Je ne trouve pas de rendez-vous à ce nom, pouvez-vous préciser ?",
        (DestructiveNotFound(_, _), _) => {
            "Je ne trouve toujours pas ce rendez-vous. Par exemple : \"Jean Dupont\"."
        }

        (DestructiveConfirm(Cancel), _) => {
            "J'ai trouvé votre rendez-vous : {slot_label}. Voulez-vous vraiment l'annuler ?"
        }
        (DestructiveConfirm(Modify), _) => {
            "J'ai trouvé votre rendez-vous : {slot_label}. Voulez-vous le modifier ?"
        }

        (DestructiveDone(Cancel), _) => "Votre rendez-vous a bien été annulé.",
        (DestructiveDone(Modify), _) => "Votre ancien rendez-vous a été annulé, choisissons un nouveau créneau.",

        (DestructiveKept(_), _) => "D'accord, votre rendez-vous est conservé tel quel.",

        (ClarifyLevel1, _) => "Je n'ai pas bien compris, pouvez-vous reformuler ?",
        (ClarifyLevel2, _) => {
            "Je n'ai toujours pas compris. Par exemple, vous pouvez dire \"je voudrais un rendez-vous\"."
        }
        (ClarifyStillUnclear, _) => "Je vais vous mettre en relation avec quelqu'un de l'équipe.",

        (Clarification(RecoveryContext::SlotChoice, 1), _) => {
            "Je n'ai pas compris votre choix. Dites un, deux ou trois."
        }
        (Clarification(RecoveryContext::SlotChoice, _), _) => {
            "Toujours pas compris : répondez simplement \"un\", \"deux\" ou \"trois\"."
        }
        (Clarification(RecoveryContext::Name, 1), _) => "Pouvez-vous répéter votre nom complet ?",
        (Clarification(RecoveryContext::Name, _), _) => {
            "Je n'arrive pas à capter votre nom. Par exemple : \"Jean Dupont\"."
        }
        (Clarification(RecoveryContext::Phone, 1), _) => "Pouvez-vous redonner votre numéro, chiffre par chiffre ?"
        ,
        (Clarification(RecoveryContext::Phone, _), _) => {
            "Toujours pas compris votre numéro. Par exemple : \"zéro six douze trente-quatre cinquante-six soixante-dix-huit\"."
        }
        (Clarification(RecoveryContext::Preference, 1), _) => "Matin ou après-midi ?",
        (Clarification(RecoveryContext::Preference, _), _) => {
            "Je n'ai pas compris : répondez simplement \"matin\" ou \"après-midi\"."
        }
        (Clarification(RecoveryContext::ContactConfirm, 1), _) => "Est-ce bien votre numéro, oui ou non ?",
        (Clarification(RecoveryContext::ContactConfirm, _), _) => {
            "Répondez simplement \"oui\" ou \"non\" pour confirmer votre numéro."
        }

        (RouterMenu, _) => {
            "Pour mieux vous aider : dites 1 pour prendre rendez-vous, 2 pour annuler ou modifier, \
             3 pour une question, ou 4 pour parler à quelqu'un."
        }
        (RouterRetry, _) => "Je n'ai pas compris. Dites 1, 2, 3 ou 4.",
        (RouterChoiceBooking, _) => "D'accord, prenons rendez-vous.",
        (RouterChoiceCancelModify, _) => "D'accord, commençons par retrouver votre rendez-vous.",
        (RouterChoiceFaq, _) => "Je vous écoute, quelle est votre question ?",
        (RouterChoiceTransfer, _) => "Je vous mets en relation avec quelqu'un de l'équipe.",

        (TransferMessage, Voice) => "Je vous transfère à un conseiller, merci de patienter.",
        (TransferMessage, Text) => "Un conseiller va prendre le relais de cette conversation.",

        (FaqGoodbye, _) => "Très bien, n'hésitez pas si vous avez d'autres questions. À bientôt !",
        (FaqAnswer, _) => "{answer}",

        (SlotProposal, _) => "J'ai {count} créneaux. {slots} Dites un, deux ou trois.",
        (BookingConfirmation, _) => "Parfait {first_name}, votre rendez-vous est confirmé : {slot_label}.",
        (SlotAlreadyBooked, _) => {
            "Ce créneau vient d'être pris par quelqu'un d'autre, je vous mets en relation avec l'équipe."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholders() {
        let rendered = render(PromptKey::ConfirmNumber, Channel::Voice, &[("phone", "0612345678")]);
        assert_eq!(rendered, "Je confirme votre numéro : 0612345678. Est-ce exact ?");
    }

    #[test]
    fn voice_and_text_can_diverge() {
        let voice = render(PromptKey::TransferMessage, Channel::Voice, &[]);
        let text = render(PromptKey::TransferMessage, Channel::Text, &[]);
        assert_ne!(voice, text);
    }

    #[test]
    fn clarification_graduates_by_context_and_level() {
        let level1 = render(PromptKey::Clarification(RecoveryContext::Phone, 1), Channel::Text, &[]);
        let level2 = render(PromptKey::Clarification(RecoveryContext::Phone, 2), Channel::Text, &[]);
        assert_ne!(level1, level2);
    }

    #[test]
    fn safe_reply_fallback_matches_the_canonical_text() {
        assert_eq!(
            render(PromptKey::SafeReplyFallback, Channel::Voice, &[]),
            "D'accord. Je vous écoute."
        );
    }
}
