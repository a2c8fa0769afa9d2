//! Per-context failure counters and escalation rules (§4.6). The session
//! owns the counters; this module only applies policy to them.

use lobby_core::{Counters, RecoveryContext};

/// A graduated clarification level. Level 1 and 2 map to catalog prompts;
/// beyond that the caller escalates instead (§4.4, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClarificationLevel {
    First,
    Second,
}

/// Increments the per-context counter and the conversation-wide
/// `global_recovery_fails` counter together, returning the new per-context
/// value.
pub fn increment_recovery(counters: &mut Counters, context: RecoveryContext) -> u32 {
    counters.global_recovery_fails += 1;
    let slot = counters.context_fails_mut(context);
    *slot += 1;
    *slot
}

/// True iff the per-context counter has reached the tenant's
/// `max_context_fails` (default 3).
pub fn should_escalate(counters: &Counters, context: RecoveryContext, max_context_fails: u32) -> bool {
    counters.context_fails(context) >= max_context_fails
}

/// The clarification level for the current per-context fail count, or
/// `None` once the budget is exhausted — the caller is expected to escalate
/// to `INTENT_ROUTER` instead of asking again (§4.4 graduated messages only
/// go up to level 2; level 3 is "redirect").
pub fn clarification_for(fail_count: u32, max_context_fails: u32) -> Option<ClarificationLevel> {
    if fail_count == 0 || fail_count >= max_context_fails {
        return None;
    }
    match fail_count {
        1 => Some(ClarificationLevel::First),
        _ => Some(ClarificationLevel::Second),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_recovery_bumps_both_counters() {
        let mut c = Counters::default();
        let n = increment_recovery(&mut c, RecoveryContext::Name);
        assert_eq!(n, 1);
        assert_eq!(c.name_fails, 1);
        assert_eq!(c.global_recovery_fails, 1);

        increment_recovery(&mut c, RecoveryContext::Phone);
        assert_eq!(c.global_recovery_fails, 2);
        assert_eq!(c.name_fails, 1);
        assert_eq!(c.phone_fails, 1);
    }

    #[test]
    fn should_escalate_at_threshold() {
        let mut c = Counters::default();
        assert!(!should_escalate(&c, RecoveryContext::Name, 3));
        increment_recovery(&mut c, RecoveryContext::Name);
        increment_recovery(&mut c, RecoveryContext::Name);
        assert!(!should_escalate(&c, RecoveryContext::Name, 3));
        increment_recovery(&mut c, RecoveryContext::Name);
        assert!(should_escalate(&c, RecoveryContext::Name, 3));
    }

    #[test]
    fn clarification_level_graduates_then_exhausts() {
        assert_eq!(clarification_for(1, 3), Some(ClarificationLevel::First));
        assert_eq!(clarification_for(2, 3), Some(ClarificationLevel::Second));
        assert_eq!(clarification_for(3, 3), None);
        assert_eq!(clarification_for(0, 3), None);
    }
}
