//! The `INTENT_ROUTER` stabilisation state (§4.7): a fixed four-choice menu
//! entered whenever dialogue coherence is lost, never a functional flow.

use lobby_core::Counters;
use tracing::info;

/// Why the engine routed into `INTENT_ROUTER`. Logged verbatim in the
/// `intent_router_triggered` audit event (§4.7 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterReason {
    AntiLoop25,
    EmptyRepeated,
    CorrectionExhausted,
    GlobalRecoveryFails,
    ConsecutiveQuestions,
    ContextExhausted,
    RouterExhausted,
}

impl RouterReason {
    pub fn code(self) -> &'static str {
        match self {
            RouterReason::AntiLoop25 => "anti_loop_25",
            RouterReason::EmptyRepeated => "empty_repeated",
            RouterReason::CorrectionExhausted => "correction_exhausted",
            RouterReason::GlobalRecoveryFails => "global_recovery_fails",
            RouterReason::ConsecutiveQuestions => "consecutive_questions",
            RouterReason::ContextExhausted => "context_exhausted",
            RouterReason::RouterExhausted => "router_exhausted",
        }
    }
}

/// Evaluates the unified recovery trigger (§4.9 step 6): true whenever
/// `global_recovery_fails` or `consecutive_questions` has crossed its bound.
pub fn should_trigger_intent_router(
    counters: &Counters,
    global_recovery_max: u32,
    consecutive_questions_max: u32,
) -> Option<RouterReason> {
    if counters.global_recovery_fails >= global_recovery_max {
        return Some(RouterReason::GlobalRecoveryFails);
    }
    if counters.consecutive_questions >= consecutive_questions_max {
        return Some(RouterReason::ConsecutiveQuestions);
    }
    None
}

/// Resets the conversation-level counters and logs entry (§4.7 steps 1-2).
/// Per-context counters live inside the same `Counters` struct and are reset
/// along with everything else — there is no separate per-context budget
/// inside `INTENT_ROUTER` itself.
pub fn enter_router(counters: &mut Counters, reason: RouterReason, previous_state: &str) {
    info!(
        reason = reason.code(),
        previous_state,
        turn_count = counters.turn_count,
        global_recovery_fails = counters.global_recovery_fails,
        "intent_router_triggered"
    );
    counters.reset();
}

/// One of the four fixed menu choices (§4.7 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterChoice {
    Booking,
    CancelModify,
    Faq,
    Transfer,
}

const BOOKING_MARKERS: &[&str] = &["1", "un", "rendez-vous", "reserver"];
const CANCEL_MODIFY_MARKERS: &[&str] = &["2", "deux", "annuler", "modifier"];
const FAQ_MARKERS: &[&str] = &["3", "trois", "question"];
const TRANSFER_MARKERS: &[&str] = &["4", "quatre", "humain", "conseiller"];

/// Matches a reply against the fixed menu. Closed vocabulary, same
/// fail-closed discipline as the rest of the NLU layer: anything else is
/// `None` and the caller bumps the router's local recovery counter.
pub fn detect_router_choice(folded_text: &str) -> Option<RouterChoice> {
    if BOOKING_MARKERS.iter().any(|m| folded_text.contains(m)) {
        return Some(RouterChoice::Booking);
    }
    if CANCEL_MODIFY_MARKERS.iter().any(|m| folded_text.contains(m)) {
        return Some(RouterChoice::CancelModify);
    }
    if FAQ_MARKERS.iter().any(|m| folded_text.contains(m)) {
        return Some(RouterChoice::Faq);
    }
    if TRANSFER_MARKERS.iter().any(|m| folded_text.contains(m)) {
        return Some(RouterChoice::Transfer);
    }
    None
}

/// Maximum turns the router tolerates an unrecognised reply before
/// escalating to `TRANSFERRED` (§4.7: "maximum 3 turns"). The router reuses
/// `global_recovery_fails` as its local counter — it was just zeroed by
/// `enter_router` and nothing else touches it while `state == INTENT_ROUTER`.
pub const MAX_ROUTER_TURNS: u32 = 3;
