//! The engine's single entry point (§4.9): one inbound message in, one or
//! more outbound events out. Owns the per-conversation lock, the eight-step
//! turn contract, and the persist/audit tail — handlers never touch any of
//! these directly.

use std::time::Duration;

use tracing::warn;

use lobby_audit::EventRecord;
use lobby_channels::{EventKind, InboundMessage, OutboundEvent};
use lobby_fsm::{State, Trigger};
use lobby_nlu::{detect_correction_intent, detect_strong_intent, is_empty, is_french, is_spam_or_abuse, is_too_long, Intent};
use lobby_prompts::{render, Flow, PromptKey};
use lobby_recovery::{enter_router, should_trigger_intent_router, RouterReason};
use lobby_sessions::Role;

use crate::context::EngineContext;
use crate::handlers;
use crate::handlers::Turn;
use crate::safe_reply::ensure_non_silent;

/// Fixed platform bounds not exposed per-tenant (§4.9 step 3, step 6):
/// distinct from `TenantConfig::max_context_fails`, which governs the
/// per-context clarification budget instead.
const EMPTY_MESSAGE_MAX: u32 = 3;
const CORRECTION_MAX: u32 = 3;
const GLOBAL_RECOVERY_MAX: u32 = 3;
const CONSECUTIVE_QUESTIONS_MAX: u32 = 7;

/// How long a single turn is allowed to run before its in-flight backend
/// calls are abandoned (§5). Distinct from `backend_deadline`, which bounds
/// one calendar/FAQ call; this bounds the whole turn, including lock wait
/// and multiple sequential backend calls within a single handler.
const TURN_DEADLINE: Duration = Duration::from_secs(8);

/// Runs one turn of the conversation to completion: acquires the
/// per-conversation lock, applies the eight-step contract, then persists
/// the session and appends any audit events before returning.
///
/// If the turn overruns `TURN_DEADLINE`, `tokio::select!` drops the
/// in-progress `run_turn` future — aborting whatever backend call it was
/// awaiting — and a safe-reply fallback is returned instead. Nothing is
/// persisted in that case, so the session's state does not advance (§5).
pub async fn handle_message(ctx: &EngineContext, inbound: &InboundMessage) -> Vec<OutboundEvent> {
    let _guard = ctx.locks.lock(&inbound.tenant_id, &inbound.conv_id).await;
    let now = ctx.clock.now();

    let turn = tokio::select! {
        biased;
        result = run_turn(ctx, inbound, now) => result,
        _ = tokio::time::sleep(TURN_DEADLINE) => {
            warn!(tenant_id = %inbound.tenant_id, conv_id = %inbound.conv_id, "turn_deadline_exceeded");
            TurnOutcome::timed_out(ctx, inbound, now)
        }
    };

    if let Some(session) = &turn.session {
        if let Err(err) = ctx.sessions.save(session) {
            warn!(error = %err, "session_save_failed");
        }
    }
    for record in &turn.audit {
        ctx.audit.append(record);
    }
    turn.events
}

/// Bundles what a turn produced so the deadline race above can hand back a
/// safe-reply fallback without a session to persist when it fires first.
struct TurnOutcome {
    events: Vec<OutboundEvent>,
    audit: Vec<EventRecord>,
    session: Option<lobby_sessions::Session>,
}

impl TurnOutcome {
    /// §5: a deadline-exceeded turn aborts in-flight backend calls, emits a
    /// safe-reply fallback, and must not advance state — so nothing is
    /// persisted here at all, leaving the session exactly as last saved.
    fn timed_out(ctx: &EngineContext, inbound: &InboundMessage, _now: chrono::DateTime<chrono::Utc>) -> Self {
        let state_label = ctx
            .sessions
            .get(&inbound.tenant_id, &inbound.conv_id)
            .ok()
            .flatten()
            .map(|s| s.state.to_string())
            .unwrap_or_else(|| State::Start.to_string());
        Self {
            events: vec![OutboundEvent {
                kind: EventKind::Final,
                text: render(PromptKey::SafeReplyFallback, inbound.channel, &[]),
                new_state: state_label,
            }],
            audit: Vec::new(),
            session: None,
        }
    }
}

async fn run_turn(ctx: &EngineContext, inbound: &InboundMessage, now: chrono::DateTime<chrono::Utc>) -> TurnOutcome {
    let mut audit: Vec<EventRecord> = Vec::new();

    let mut session = match ctx.sessions.get_or_create(&inbound.tenant_id, &inbound.conv_id, inbound.channel, now) {
        Ok(s) => s,
        Err(err) => {
            warn!(error = %err, "session_load_failed");
            return TurnOutcome {
                events: vec![OutboundEvent {
                    kind: EventKind::Final,
                    text: render(PromptKey::SafeReplyFallback, inbound.channel, &[]),
                    new_state: State::Start.to_string(),
                }],
                audit,
                session: None,
            };
        }
    };
    if session.caller_id.is_none() {
        session.caller_id = inbound.caller_id.clone();
    }

    // Step 1: terminal gate. A closed conversation has no further side
    // effects at all — not even a history append (§3: terminal states never
    // run a handler again).
    if session.state.is_terminal() {
        let text = render(PromptKey::ConversationClosed, inbound.channel, &[]);
        let events = vec![OutboundEvent { kind: EventKind::Final, text, new_state: session.state.to_string() }];
        return TurnOutcome { events, audit, session: None };
    }

    let tenant_cfg = ctx.config.tenant(&inbound.tenant_id);
    let turn = Turn { tenant_id: &inbound.tenant_id, conv_id: &inbound.conv_id, user_text: &inbound.text, now };

    session.push_history(Role::User, inbound.text.clone(), now);

    // Step 2: anti-loop guard.
    session.counters.turn_count += 1;
    if session.counters.turn_count > tenant_cfg.max_turns_anti_loop {
        let events = escalate(&mut session, RouterReason::AntiLoop25, &turn, &mut audit);
        return finish(inbound, session, events, audit);
    }

    // Step 3: strong-intent override — pre-empts the current flow from any
    // non-terminal state unless it would be a no-op (§4.3, §4.8).
    if let Some(intent) = detect_strong_intent(&inbound.text) {
        let code = strong_intent_code(intent);
        let already_in_flow = matches!(
            (session.state, intent),
            (State::CancelName | State::CancelConfirm, Intent::Cancel)
                | (State::ModifyName | State::ModifyConfirm, Intent::Modify)
        );
        if !already_in_flow && session.last_intent.as_deref() != Some(code) {
            session.last_intent = Some(code.to_string());
            let events = apply_strong_intent(&mut session, intent, inbound.channel);
            return finish(inbound, session, events, audit);
        }
    }

    // Step 4: basic guards, in order: empty, too long, non-French, spam.
    if is_empty(&inbound.text) {
        session.counters.empty_message_count += 1;
        if session.counters.empty_message_count >= EMPTY_MESSAGE_MAX {
            let events = escalate(&mut session, RouterReason::EmptyRepeated, &turn, &mut audit);
            return finish(inbound, session, events, audit);
        }
        let events = vec![OutboundEvent {
            kind: EventKind::Final,
            text: render(PromptKey::EmptyInput, inbound.channel, &[]),
            new_state: session.state.to_string(),
        }];
        return finish(inbound, session, events, audit);
    }
    session.counters.empty_message_count = 0;

    if is_too_long(&inbound.text, tenant_cfg.max_message_length) {
        let events = vec![OutboundEvent {
            kind: EventKind::Final,
            text: render(PromptKey::TooLong, inbound.channel, &[]),
            new_state: session.state.to_string(),
        }];
        return finish(inbound, session, events, audit);
    }

    if !is_french(&inbound.text) {
        let events = vec![OutboundEvent {
            kind: EventKind::Final,
            text: render(PromptKey::FrenchOnly, inbound.channel, &[]),
            new_state: session.state.to_string(),
        }];
        return finish(inbound, session, events, audit);
    }

    if is_spam_or_abuse(&inbound.text) {
        turn.record(&mut audit, "spam_detected", &session.state.to_string(), Some("spam_detected"), &session.counters);
        session.state = State::Transferred;
        let events = vec![OutboundEvent {
            kind: EventKind::Final,
            text: render(PromptKey::TransferMessage, inbound.channel, &[]),
            new_state: State::Transferred.to_string(),
        }];
        return finish(inbound, session, events, audit);
    }

    // Step 5: session-expiry check.
    let ttl = chrono::Duration::minutes(tenant_cfg.session_ttl_minutes);
    if session.is_expired(now, ttl) {
        session.reset(now);
        let events = vec![OutboundEvent {
            kind: EventKind::Final,
            text: render(PromptKey::SessionExpired, inbound.channel, &[]),
            new_state: session.state.to_string(),
        }];
        return finish(inbound, session, events, audit);
    }

    // Step 6: correction intent and unified recovery triggers.
    if detect_correction_intent(&inbound.text) {
        if let Some(replay) = session.last_question_asked.clone() {
            session.counters.correction_count += 1;
            if session.counters.correction_count >= CORRECTION_MAX {
                let events = escalate(&mut session, RouterReason::CorrectionExhausted, &turn, &mut audit);
                return finish(inbound, session, events, audit);
            }
            let events = vec![OutboundEvent { kind: EventKind::Final, text: replay, new_state: session.state.to_string() }];
            return finish(inbound, session, events, audit);
        }
    }

    if let Some(reason) = should_trigger_intent_router(&session.counters, GLOBAL_RECOVERY_MAX, CONSECUTIVE_QUESTIONS_MAX) {
        let events = escalate(&mut session, reason, &turn, &mut audit);
        return finish(inbound, session, events, audit);
    }

    // Step 7: dispatch to the state handler.
    let events = dispatch(ctx, tenant_cfg, &mut session, &turn, &mut audit).await;

    finish(inbound, session, events, audit)
}

async fn dispatch(
    ctx: &EngineContext,
    cfg: &lobby_core::TenantConfig,
    session: &mut lobby_sessions::Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    match session.state {
        State::Start | State::Clarify => handlers::handle_start_or_clarify(ctx, session, turn, audit).await,
        State::QualifName => handlers::handle_qualif_name(session, cfg, turn, audit),
        State::QualifMotif => handlers::handle_qualif_motif(session, turn),
        State::QualifPref => handlers::handle_qualif_pref(ctx, cfg, session, turn, audit).await,
        State::PreferenceConfirm => handlers::handle_preference_confirm(session, cfg, turn, audit),
        State::QualifContact => handlers::handle_qualif_contact(ctx, cfg, session, turn, audit).await,
        State::ContactConfirm => handlers::handle_contact_confirm(ctx, cfg, session, turn, audit).await,
        State::WaitConfirm => handlers::handle_wait_confirm(ctx, cfg, session, turn, audit).await,
        State::CancelName => handlers::handle_destructive_name(ctx, Flow::Cancel, session, turn, audit).await,
        State::CancelConfirm => handlers::handle_destructive_confirm(ctx, Flow::Cancel, cfg, session, turn, audit).await,
        State::ModifyName => handlers::handle_destructive_name(ctx, Flow::Modify, session, turn, audit).await,
        State::ModifyConfirm => handlers::handle_destructive_confirm(ctx, Flow::Modify, cfg, session, turn, audit).await,
        State::FaqAnswered => handlers::handle_faq_answered(session, turn),
        State::IntentRouter => handlers::handle_intent_router(session, turn, audit),
        State::Confirmed | State::Transferred => unreachable!("terminal gate returns before dispatch"),
    }
}

fn strong_intent_code(intent: Intent) -> &'static str {
    match intent {
        Intent::Cancel => "cancel",
        Intent::Modify => "modify",
        Intent::Transfer => "transfer",
        _ => "other",
    }
}

fn apply_strong_intent(session: &mut lobby_sessions::Session, intent: Intent, channel: lobby_core::Channel) -> Vec<OutboundEvent> {
    let (trigger, prompt) = match intent {
        Intent::Cancel => (Trigger::StrongCancel, PromptKey::DestructiveAskName(Flow::Cancel)),
        Intent::Modify => (Trigger::StrongModify, PromptKey::DestructiveAskName(Flow::Modify)),
        Intent::Transfer => (Trigger::StrongTransfer, PromptKey::TransferMessage),
        _ => unreachable!("detect_strong_intent only yields Cancel, Modify, or Transfer"),
    };

    let next = match lobby_fsm::apply(session.state, trigger) {
        Ok(next) => {
            session.state = next;
            next
        }
        Err(_) => {
            session.state = State::Transferred;
            State::Transferred
        }
    };

    vec![OutboundEvent { kind: EventKind::Final, text: render(prompt, channel, &[]), new_state: next.to_string() }]
}

fn escalate(
    session: &mut lobby_sessions::Session,
    reason: RouterReason,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();
    turn.record(audit, "intent_router_triggered", &previous_state, Some(reason.code()), &session.counters);
    enter_router(&mut session.counters, reason, &previous_state);
    let next = match lobby_fsm::apply(session.state, Trigger::IntentRouterTrigger) {
        Ok(next) => next,
        Err(_) => State::Transferred,
    };
    session.state = next;
    vec![OutboundEvent { kind: EventKind::Final, text: render(PromptKey::RouterMenu, session.channel, &[]), new_state: next.to_string() }]
}

/// Step 8 (safe-reply barrier) plus the bookkeeping that closes out a turn:
/// history, `last_question_asked`, `consecutive_questions`, and the
/// counter-recovery detail shared by every non-empty context (§4.9 step 8,
/// §9's resolved open question on `consecutive_questions`).
fn finish(
    inbound: &InboundMessage,
    mut session: lobby_sessions::Session,
    events: Vec<OutboundEvent>,
    audit: Vec<EventRecord>,
) -> TurnOutcome {
    let new_state = session.state.to_string();
    let events = ensure_non_silent(events, inbound.channel, &new_state);

    for event in &events {
        session.push_history(Role::Agent, event.text.clone(), inbound.receipt_timestamp);
    }
    if let Some(last) = events.last() {
        let is_question = handlers::looks_like_question(&last.text);
        session.last_question_asked = Some(last.text.clone());
        if is_question {
            session.counters.consecutive_questions += 1;
        } else {
            session.counters.consecutive_questions = 0;
        }
    }
    session.last_seen_at = inbound.receipt_timestamp;

    TurnOutcome { events, audit, session: Some(session) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby_sessions::Session;

    fn session_at(state: State) -> Session {
        let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let mut s = Session::new("tenant-a", "conv-1", lobby_core::Channel::Text, now);
        s.state = state;
        s
    }

    #[test]
    fn strong_intent_code_covers_preempting_intents() {
        assert_eq!(strong_intent_code(Intent::Cancel), "cancel");
        assert_eq!(strong_intent_code(Intent::Modify), "modify");
        assert_eq!(strong_intent_code(Intent::Transfer), "transfer");
    }

    #[test]
    fn escalate_resets_counters_and_enters_router() {
        let mut session = session_at(State::QualifPref);
        session.counters.turn_count = 9;
        session.counters.name_fails = 2;
        let turn = Turn { tenant_id: "tenant-a", conv_id: "conv-1", user_text: "???", now: session.created_at };
        let mut audit = Vec::new();

        let events = escalate(&mut session, RouterReason::GlobalRecoveryFails, &turn, &mut audit);

        assert_eq!(session.state, State::IntentRouter);
        assert_eq!(session.counters.turn_count, 0);
        assert_eq!(session.counters.name_fails, 0);
        assert_eq!(audit.len(), 1);
        assert_eq!(events[0].new_state, "INTENT_ROUTER");
    }

    #[test]
    fn apply_strong_intent_routes_cancel_to_cancel_name() {
        let mut session = session_at(State::QualifPref);
        let events = apply_strong_intent(&mut session, Intent::Cancel, lobby_core::Channel::Text);
        assert_eq!(session.state, State::CancelName);
        assert_eq!(events[0].new_state, "CANCEL_NAME");
    }

    #[test]
    fn apply_strong_intent_is_whitelisted_from_any_nonterminal_state() {
        // The no-op guard against re-triggering an identical strong intent
        // lives in `run_turn`, not here — `apply_strong_intent` itself just
        // applies whichever whitelisted transition the caller already chose.
        let mut session = session_at(State::CancelName);
        let events = apply_strong_intent(&mut session, Intent::Modify, lobby_core::Channel::Voice);
        assert_eq!(session.state, State::ModifyName);
        assert_eq!(events[0].new_state, "MODIFY_NAME");
    }
}
