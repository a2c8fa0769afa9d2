use serde::{Deserialize, Serialize};
use std::fmt;

/// Every state the dialogue can be in (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    Start,
    QualifName,
    QualifMotif,
    QualifPref,
    /// Entered when the extracted time preference is ambiguous and needs an
    /// explicit yes/no confirmation before it is accepted.
    PreferenceConfirm,
    QualifContact,
    ContactConfirm,
    WaitConfirm,
    CancelName,
    CancelConfirm,
    ModifyName,
    ModifyConfirm,
    Clarify,
    FaqAnswered,
    IntentRouter,
    /// Terminal: booking succeeded, conversation closed.
    Confirmed,
    /// Terminal: handed off to a human, conversation closed.
    Transferred,
}

impl State {
    /// Terminal states never run a handler again (§3 invariants).
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Confirmed | State::Transferred)
    }

    /// States in which collected qualification slots are meaningful; used to
    /// decide whether `pending_slots` should be non-empty (§3 invariant).
    pub fn allows_pending_slots(self) -> bool {
        matches!(self, State::WaitConfirm | State::ContactConfirm)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Start => "START",
            State::QualifName => "QUALIF_NAME",
            State::QualifMotif => "QUALIF_MOTIF",
            State::QualifPref => "QUALIF_PREF",
            State::PreferenceConfirm => "PREFERENCE_CONFIRM",
            State::QualifContact => "QUALIF_CONTACT",
            State::ContactConfirm => "CONTACT_CONFIRM",
            State::WaitConfirm => "WAIT_CONFIRM",
            State::CancelName => "CANCEL_NAME",
            State::CancelConfirm => "CANCEL_CONFIRM",
            State::ModifyName => "MODIFY_NAME",
            State::ModifyConfirm => "MODIFY_CONFIRM",
            State::Clarify => "CLARIFY",
            State::FaqAnswered => "FAQ_ANSWERED",
            State::IntentRouter => "INTENT_ROUTER",
            State::Confirmed => "CONFIRMED",
            State::Transferred => "TRANSFERRED",
        };
        f.write_str(s)
    }
}
