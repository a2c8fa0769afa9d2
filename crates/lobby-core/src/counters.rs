//! Session counters and recovery contexts (§3). Shared between `lobby-sessions`
//! (which owns them as part of a session) and `lobby-recovery` (which applies
//! policy to them) so neither crate has to depend on the other.

use serde::{Deserialize, Serialize};

/// A context in which a reply can fail to parse. Each has its own bounded
/// failure counter alongside the conversation-wide ones (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryContext {
    SlotChoice,
    Name,
    Phone,
    Preference,
    ContactConfirm,
}

impl std::fmt::Display for RecoveryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecoveryContext::SlotChoice => "slot_choice",
            RecoveryContext::Name => "name",
            RecoveryContext::Phone => "phone",
            RecoveryContext::Preference => "preference",
            RecoveryContext::ContactConfirm => "contact_confirm",
        };
        f.write_str(s)
    }
}

/// All non-negative, monotonically-increasing-between-resets counters a
/// session carries (§3). `reset()` is the only way any of these may
/// decrease, and per P4 it is called exactly at session creation and on
/// entry to `INTENT_ROUTER`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub turn_count: u32,
    pub consecutive_questions: u32,
    pub global_recovery_fails: u32,
    pub correction_count: u32,
    pub empty_message_count: u32,
    pub slot_choice_fails: u32,
    pub name_fails: u32,
    pub phone_fails: u32,
    pub preference_fails: u32,
    pub contact_confirm_fails: u32,
}

impl Counters {
    pub fn reset(&mut self) {
        *self = Counters::default();
    }

    pub fn context_fails(&self, context: RecoveryContext) -> u32 {
        match context {
            RecoveryContext::SlotChoice => self.slot_choice_fails,
            RecoveryContext::Name => self.name_fails,
            RecoveryContext::Phone => self.phone_fails,
            RecoveryContext::Preference => self.preference_fails,
            RecoveryContext::ContactConfirm => self.contact_confirm_fails,
        }
    }

    pub fn context_fails_mut(&mut self, context: RecoveryContext) -> &mut u32 {
        match context {
            RecoveryContext::SlotChoice => &mut self.slot_choice_fails,
            RecoveryContext::Name => &mut self.name_fails,
            RecoveryContext::Phone => &mut self.phone_fails,
            RecoveryContext::Preference => &mut self.preference_fails,
            RecoveryContext::ContactConfirm => &mut self.contact_confirm_fails,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_zeroes_every_field() {
        let mut c = Counters { turn_count: 5, name_fails: 2, ..Default::default() };
        c.reset();
        assert_eq!(c, Counters::default());
    }

    #[test]
    fn context_fails_mut_targets_the_right_field() {
        let mut c = Counters::default();
        *c.context_fails_mut(RecoveryContext::Phone) += 1;
        assert_eq!(c.phone_fails, 1);
        assert_eq!(c.context_fails(RecoveryContext::Phone), 1);
        assert_eq!(c.context_fails(RecoveryContext::Name), 0);
    }
}
