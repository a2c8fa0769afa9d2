use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::states::State;

/// Every event that can cause a state change. Deliberately closed — any
/// transition not covered by `whitelisted_target` is a programming error
/// (§4.8: "Any transition not in the whitelist is a programming error").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A YES or BOOKING intent in `START`.
    BookingRequested,
    /// A NO intent in `START`.
    Declined,
    /// A matched FAQ above threshold.
    FaqMatched,
    /// A well-formed name was extracted.
    NameCollected,
    /// A well-formed name was extracted on a voice channel, where the
    /// reason-for-visit question is skipped and the caller goes straight to
    /// time preference (§4.8 table: "QUALIF_NAME | valid name | QUALIF_PREF
    /// (voice) / QUALIF_MOTIF (text)").
    NameCollectedVoiceSkipMotif,
    /// A well-formed motif (reason for visit) was extracted.
    MotifCollected,
    /// A confident time preference was extracted.
    PreferenceCollected,
    /// A confident time preference was extracted *and* the caller already
    /// has a known `caller_id` pending confirmation — skips straight to
    /// `CONTACT_CONFIRM` instead of asking for the number again (§4.8
    /// table: "QUALIF_PREF | valid preference | ... WAIT_CONFIRM (if
    /// caller_id present → CONTACT_CONFIRM first)").
    PreferenceCollectedContactKnown,
    /// An ambiguous time preference needs explicit confirmation.
    PreferenceAmbiguous,
    /// The ambiguous preference was confirmed (YES in `PREFERENCE_CONFIRM`).
    PreferenceConfirmed,
    /// The ambiguous preference was rejected (NO in `PREFERENCE_CONFIRM`).
    PreferenceRejected,
    /// A well-formed contact (phone) was extracted.
    ContactCollected,
    /// Caller id already known and confirmed (YES in `CONTACT_CONFIRM`).
    ContactConfirmed,
    /// Caller id rejected (NO in `CONTACT_CONFIRM`) — fall back to asking.
    ContactRejected,
    /// A valid 1/2/3 slot choice followed by a successful booking.
    BookingConfirmed,
    /// The caller's booking was found by name.
    AppointmentFound,
    /// Destructive action (cancel or modify) confirmed by the caller.
    DestructiveConfirmed,
    /// Destructive action declined by the caller — appointment kept.
    DestructiveDeclined,
    /// `FAQ_ANSWERED` → re-enter booking.
    FaqFollowupBooking,
    /// A strong CANCEL intent pre-empted the current flow.
    StrongCancel,
    /// A strong MODIFY intent pre-empted the current flow.
    StrongModify,
    /// A strong TRANSFER intent (≥14 chars) pre-empted the current flow.
    StrongTransfer,
    /// Any recovery/escalation condition routing to the stabilisation menu.
    IntentRouterTrigger,
    /// Choice "1" in `INTENT_ROUTER`.
    RouterChooseBooking,
    /// Choice "2" in `INTENT_ROUTER`.
    RouterChooseCancelModify,
    /// Choice "3" in `INTENT_ROUTER`.
    RouterChooseFaq,
    /// Choice "4" in `INTENT_ROUTER`.
    RouterChooseTransfer,
    /// Exhausted recovery budget while inside `INTENT_ROUTER` itself.
    RouterExhausted,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("transition not in whitelist: {from} -({trigger:?})-> ?")]
pub struct TransitionError {
    pub from: State,
    pub trigger: Trigger,
}

/// Look up the single allowed destination for `(from, trigger)`.
///
/// Returns `None` (surfaced by the caller as a `TransitionError`) when the
/// pair is not in the whitelist — per spec this is always an internal fault,
/// never a user-triggerable condition, and the caller must escalate to
/// `TRANSFERRED` (§4.8, §7).
pub fn whitelisted_target(from: State, trigger: Trigger) -> Option<State> {
    use State::*;
    use Trigger::*;

    // Triggers valid from *any* non-terminal state, regardless of current
    // state — strong-intent overrides and the intent-router escalation path.
    if !from.is_terminal() {
        match trigger {
            StrongCancel => return Some(CancelName),
            StrongModify => return Some(ModifyName),
            StrongTransfer => return Some(Transferred),
            IntentRouterTrigger => return Some(IntentRouter),
            _ => {}
        }
    }

    match (from, trigger) {
        (Start, BookingRequested) => Some(QualifName),
        (Start, Declined) => Some(Clarify),
        (Start, FaqMatched) => Some(FaqAnswered),
        (Clarify, FaqMatched) => Some(FaqAnswered),
        (Clarify, BookingRequested) => Some(QualifName),

        (QualifName, NameCollected) => Some(QualifMotif),
        (QualifName, NameCollectedVoiceSkipMotif) => Some(QualifPref),
        (QualifMotif, MotifCollected) => Some(QualifPref),

        (QualifPref, PreferenceCollected) => Some(QualifContact),
        (QualifPref, PreferenceCollectedContactKnown) => Some(ContactConfirm),
        (QualifPref, PreferenceAmbiguous) => Some(PreferenceConfirm),
        (PreferenceConfirm, PreferenceConfirmed) => Some(QualifContact),
        (PreferenceConfirm, PreferenceRejected) => Some(QualifPref),

        (QualifContact, ContactCollected) => Some(WaitConfirm),
        (QualifContact, ContactConfirmed) => Some(WaitConfirm),
        (ContactConfirm, ContactConfirmed) => Some(WaitConfirm),
        (ContactConfirm, ContactRejected) => Some(QualifContact),

        (WaitConfirm, BookingConfirmed) => Some(Confirmed),

        (CancelName, AppointmentFound) => Some(CancelConfirm),
        (CancelConfirm, DestructiveConfirmed) => Some(Transferred),
        (CancelConfirm, DestructiveDeclined) => Some(Start),

        (ModifyName, AppointmentFound) => Some(ModifyConfirm),
        (ModifyConfirm, DestructiveConfirmed) => Some(QualifPref),
        (ModifyConfirm, DestructiveDeclined) => Some(Start),

        (FaqAnswered, FaqFollowupBooking) => Some(QualifName),
        (FaqAnswered, Declined) => Some(Transferred),

        (IntentRouter, RouterChooseBooking) => Some(QualifName),
        (IntentRouter, RouterChooseCancelModify) => Some(CancelName),
        (IntentRouter, RouterChooseFaq) => Some(Start),
        (IntentRouter, RouterChooseTransfer) => Some(Transferred),
        (IntentRouter, RouterExhausted) => Some(Transferred),

        _ => None,
    }
}

/// Validate and apply a transition, or report the internal fault.
pub fn apply(from: State, trigger: Trigger) -> Result<State, TransitionError> {
    whitelisted_target(from, trigger).ok_or(TransitionError { from, trigger })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_booking_chain_is_whitelisted() {
        assert_eq!(apply(State::Start, Trigger::BookingRequested), Ok(State::QualifName));
        assert_eq!(apply(State::QualifName, Trigger::NameCollected), Ok(State::QualifMotif));
        assert_eq!(apply(State::QualifMotif, Trigger::MotifCollected), Ok(State::QualifPref));
        assert_eq!(
            apply(State::QualifPref, Trigger::PreferenceCollected),
            Ok(State::QualifContact)
        );
        assert_eq!(
            apply(State::QualifContact, Trigger::ContactCollected),
            Ok(State::WaitConfirm)
        );
        assert_eq!(apply(State::WaitConfirm, Trigger::BookingConfirmed), Ok(State::Confirmed));
    }

    #[test]
    fn voice_skips_the_motif_question() {
        assert_eq!(
            apply(State::QualifName, Trigger::NameCollectedVoiceSkipMotif),
            Ok(State::QualifPref)
        );
    }

    #[test]
    fn strong_transfer_preempts_any_nonterminal_state() {
        assert_eq!(apply(State::QualifName, Trigger::StrongTransfer), Ok(State::Transferred));
        assert_eq!(apply(State::WaitConfirm, Trigger::StrongTransfer), Ok(State::Transferred));
    }

    #[test]
    fn terminal_states_accept_no_triggers() {
        assert!(apply(State::Confirmed, Trigger::StrongTransfer).is_err());
        assert!(apply(State::Transferred, Trigger::IntentRouterTrigger).is_err());
    }

    #[test]
    fn unlisted_pair_is_a_transition_error() {
        let err = apply(State::Start, Trigger::BookingConfirmed).unwrap_err();
        assert_eq!(err.from, State::Start);
        assert_eq!(err.trigger, Trigger::BookingConfirmed);
    }
}
