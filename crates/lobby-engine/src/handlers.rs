//! Per-state handlers (§4.9 step 7, §4.8 table, §4.10-4.12). Each handler
//! consumes the inbound text for the session's current state, mutates the
//! session in place, and returns the events to emit. Handlers never touch
//! the safe-reply barrier or persistence — the pipeline owns both.

use chrono::{DateTime, Datelike, Timelike, Utc};
use tracing::error;

use lobby_audit::EventRecord;
use lobby_backends::{
    BookOutcome, LookupOutcome, Preference as BackendPreference, Qualification as BackendQualification, SlotOffer,
};
use lobby_channels::{EventKind, OutboundEvent};
use lobby_core::{Channel, Counters, RecoveryContext, TenantConfig};
use lobby_fsm::{apply, State, Trigger};
use lobby_nlu::normalize::fold;
use lobby_nlu::{
    detect_intent, detect_slot_choice, extract_name, extract_phone, extract_time_preference, Intent, SlotHint,
    TimePreference,
};
use lobby_prompts::{booking_confirmation, faq_answer, render, slot_proposal, Flow, PromptKey};
use lobby_recovery::{
    clarification_for, detect_router_choice, enter_router, increment_recovery, should_escalate, ClarificationLevel,
    RouterChoice, RouterReason, MAX_ROUTER_TURNS,
};
use lobby_sessions::{PendingSlot, Preference as SessionPreference, Role, Session};

use crate::context::EngineContext;

/// Per-turn bookkeeping a handler needs besides the session itself: who the
/// turn belongs to, for audit records, and the timestamp to stamp them with.
pub(crate) struct Turn<'a> {
    pub tenant_id: &'a str,
    pub conv_id: &'a str,
    pub user_text: &'a str,
    pub now: DateTime<Utc>,
}

impl<'a> Turn<'a> {
    pub(crate) fn record(
        &self,
        audit: &mut Vec<EventRecord>,
        event_name: &str,
        previous_state: &str,
        reason: Option<&str>,
        counters: &Counters,
    ) {
        audit.push(EventRecord::new(
            self.conv_id,
            self.tenant_id,
            event_name,
            previous_state,
            reason.map(String::from),
            *counters,
            self.user_text,
            self.now,
        ));
    }
}

fn final_event(text: String, state: State) -> OutboundEvent {
    OutboundEvent { kind: EventKind::Final, text, new_state: state.to_string() }
}

/// Applies `trigger` to the session's current state. A rejected transition
/// here is always an internal fault (§4.8: "any transition not in the
/// whitelist is a programming error") — escalate rather than panic.
fn transition(session: &mut Session, trigger: Trigger) -> State {
    match apply(session.state, trigger) {
        Ok(next) => {
            session.state = next;
            next
        }
        Err(err) => {
            error!(error = %err, "invalid transition attempted, escalating");
            session.state = State::Transferred;
            State::Transferred
        }
    }
}

/// Escalates to `INTENT_ROUTER` via the canonical path (§4.7 steps 1-2):
/// logs and zeroes every counter through `enter_router`, records the audit
/// event, then applies the whitelisted transition.
fn escalate_to_router(
    session: &mut Session,
    reason: RouterReason,
    previous_state: &str,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    turn.record(audit, "intent_router_triggered", previous_state, Some(reason.code()), &session.counters);
    enter_router(&mut session.counters, reason, previous_state);
    let next = transition(session, Trigger::IntentRouterTrigger);
    vec![final_event(render(PromptKey::RouterMenu, session.channel, &[]), next)]
}

fn clarification_text(channel: Channel, context: RecoveryContext, level: ClarificationLevel) -> String {
    let n = match level {
        ClarificationLevel::First => 1,
        ClarificationLevel::Second => 2,
    };
    render(PromptKey::Clarification(context, n), channel, &[])
}

/// Shared tail of every qualification-step handler's "couldn't parse the
/// reply" branch (§4.9 step 7, §4.6): bump the per-context counter, either
/// re-ask with a graduated clarification or escalate to `INTENT_ROUTER`.
fn recover_or_escalate(
    session: &mut Session,
    cfg: &TenantConfig,
    context: RecoveryContext,
    previous_state: String,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let count = increment_recovery(&mut session.counters, context);
    if should_escalate(&session.counters, context, cfg.max_context_fails) {
        return escalate_to_router(session, RouterReason::ContextExhausted, &previous_state, turn, audit);
    }

    match clarification_for(count, cfg.max_context_fails) {
        Some(level) => vec![final_event(clarification_text(session.channel, context, level), session.state)],
        None => vec![final_event(render(PromptKey::ClarifyStillUnclear, session.channel, &[]), session.state)],
    }
}

/// Shared tail of every qualification-step handler that ends in a slot
/// proposal: fetch up to `max_slots_proposed` free slots, stash them as
/// `pending_slots`, and render the proposal prompt. A calendar failure (or
/// deadline breach) here has no defined local fallback at this layer, so it
/// escalates straight to `TRANSFERRED` (§7: "backend failures with no
/// defined fallback escalate the session to TRANSFERRED").
async fn enter_wait_confirm(
    ctx: &EngineContext,
    cfg: &TenantConfig,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();
    let preference = match session.qualification.preference {
        Some(SessionPreference::Morning) => BackendPreference::Morning,
        Some(SessionPreference::Afternoon) => BackendPreference::Afternoon,
        None => BackendPreference::Unspecified,
    };

    let slots = lobby_backends::with_deadline(
        ctx.backend_deadline,
        ctx.calendar.free_slots(&session.tenant_id, preference, cfg.max_slots_proposed),
    )
    .await;

    let offers = match slots {
        Ok(offers) if !offers.is_empty() => offers,
        _ => {
            turn.record(audit, "calendar_unavailable", &previous_state, Some("backend_unavailable"), &session.counters);
            session.state = State::Transferred;
            return vec![final_event(render(PromptKey::TransferMessage, session.channel, &[]), State::Transferred)];
        }
    };

    session.pending_slots = offers
        .iter()
        .map(|o| PendingSlot { index: o.index, start_ts: o.start_ts, label: o.label.clone() })
        .collect();
    session.state = State::WaitConfirm;

    let labels: Vec<String> = offers.iter().map(|o| o.label.clone()).collect();
    vec![final_event(slot_proposal(session.channel, &labels), State::WaitConfirm)]
}

pub(crate) async fn handle_start_or_clarify(
    ctx: &EngineContext,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state;

    if matches!(detect_intent(turn.user_text), Some(Intent::Yes) | Some(Intent::Booking)) {
        let next = transition(session, Trigger::BookingRequested);
        return vec![final_event(render(PromptKey::AskName, session.channel, &[]), next)];
    }

    let tenant_cfg = ctx.config.tenant(&session.tenant_id);
    let faq_match = lobby_backends::with_deadline(ctx.backend_deadline, ctx.faq.find_match(&session.tenant_id, turn.user_text)).await;
    if let Ok(Some(m)) = faq_match {
        if m.score >= tenant_cfg.faq_threshold {
            let next = transition(session, Trigger::FaqMatched);
            turn.record(audit, "faq_matched", &previous_state.to_string(), None, &session.counters);
            return vec![final_event(faq_answer(session.channel, &m.answer), next)];
        }
    }

    // Neither a booking/yes intent nor a confident FAQ match: first miss
    // (from START) re-asks via CLARIFY; a second consecutive miss (already
    // in CLARIFY) escalates straight to a human (§4.11). The very first
    // message of a session gets the tenant greeting instead of the generic
    // clarify prompt (§4.4).
    let is_first_turn = !session.history.iter().any(|h| h.role == Role::Agent);
    match previous_state {
        State::Start if is_first_turn => {
            let next = transition(session, Trigger::Declined);
            vec![final_event(
                render(PromptKey::Greeting, session.channel, &[("business_name", &tenant_cfg.business_name)]),
                next,
            )]
        }
        State::Start => {
            let next = transition(session, Trigger::Declined);
            vec![final_event(render(PromptKey::ClarifyLevel1, session.channel, &[]), next)]
        }
        _ => {
            turn.record(audit, "faq_exhausted", &previous_state.to_string(), Some("faq_exhausted"), &session.counters);
            session.state = State::Transferred;
            vec![final_event(render(PromptKey::TransferMessage, session.channel, &[]), State::Transferred)]
        }
    }
}

pub(crate) fn handle_qualif_name(
    session: &mut Session,
    cfg: &TenantConfig,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();

    match extract_name(turn.user_text) {
        Some(name) => {
            session.qualification.name = Some(name);
            if session.channel == Channel::Voice {
                let next = transition(session, Trigger::NameCollectedVoiceSkipMotif);
                vec![final_event(render(PromptKey::AskPreference, session.channel, &[]), next)]
            } else {
                let next = transition(session, Trigger::NameCollected);
                vec![final_event(render(PromptKey::AskMotif, session.channel, &[]), next)]
            }
        }
        None => recover_or_escalate(session, cfg, RecoveryContext::Name, previous_state, turn, audit),
    }
}

pub(crate) fn handle_qualif_motif(session: &mut Session, turn: &Turn<'_>) -> Vec<OutboundEvent> {
    session.qualification.motif = Some(turn.user_text.trim().to_string());
    let next = transition(session, Trigger::MotifCollected);
    vec![final_event(render(PromptKey::AskPreference, session.channel, &[]), next)]
}

/// True when the folded utterance names both halves of the day — a genuine
/// conflict, distinct from simply not mentioning either (§3, `PREFERENCE_CONFIRM`).
fn mentions_both_halves_of_day(folded: &str) -> bool {
    let morning = folded.contains("matin");
    let afternoon = folded.contains("apres-midi") || folded.contains("apres midi") || folded.contains("aprem");
    morning && afternoon
}

pub(crate) async fn handle_qualif_pref(
    ctx: &EngineContext,
    cfg: &TenantConfig,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();
    let preference = extract_time_preference(turn.user_text);

    match preference {
        TimePreference::Morning | TimePreference::Afternoon => {
            session.qualification.preference = Some(if preference == TimePreference::Morning {
                SessionPreference::Morning
            } else {
                SessionPreference::Afternoon
            });

            let contact_already_known = session.caller_id.is_some() && session.qualification.contact.is_none();

            if cfg.skip_contact_confirm {
                if let Some(caller_id) = session.caller_id.clone() {
                    transition(session, Trigger::PreferenceCollected); // -> QualifContact
                    session.qualification.contact = Some(caller_id);
                    session.qualification.contact_type = Some("caller_id".to_string());
                    transition(session, Trigger::ContactCollected); // -> WaitConfirm
                    return enter_wait_confirm(ctx, cfg, session, turn, audit).await;
                }
            }

            if contact_already_known {
                let next = transition(session, Trigger::PreferenceCollectedContactKnown);
                let phone = session.caller_id.clone().unwrap_or_default();
                return vec![final_event(render(PromptKey::ConfirmNumber, session.channel, &[("phone", &phone)]), next)];
            }

            let next = transition(session, Trigger::PreferenceCollected);
            vec![final_event(render(PromptKey::AskContact, session.channel, &[]), next)]
        }
        TimePreference::Unspecified if mentions_both_halves_of_day(&fold(turn.user_text)) => {
            let next = transition(session, Trigger::PreferenceAmbiguous);
            vec![final_event(
                render(PromptKey::PreferenceAmbiguousConfirm, session.channel, &[("preference_guess", "le matin")]),
                next,
            )]
        }
        TimePreference::Unspecified => recover_or_escalate(session, cfg, RecoveryContext::Preference, previous_state, turn, audit),
    }
}

pub(crate) fn handle_preference_confirm(
    session: &mut Session,
    cfg: &TenantConfig,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();

    match detect_intent(turn.user_text) {
        Some(Intent::Yes) => {
            session.qualification.preference = Some(SessionPreference::Morning);
            let next = transition(session, Trigger::PreferenceConfirmed);
            vec![final_event(render(PromptKey::AskContact, session.channel, &[]), next)]
        }
        Some(Intent::No) => {
            let count = increment_recovery(&mut session.counters, RecoveryContext::ContactConfirm);
            if count > cfg.confirm_retry_max {
                return escalate_to_router(session, RouterReason::ContextExhausted, &previous_state, turn, audit);
            }
            let next = transition(session, Trigger::PreferenceRejected);
            vec![final_event(render(PromptKey::AskPreference, session.channel, &[]), next)]
        }
        _ => recover_or_escalate(session, cfg, RecoveryContext::ContactConfirm, previous_state, turn, audit),
    }
}

pub(crate) async fn handle_qualif_contact(
    ctx: &EngineContext,
    cfg: &TenantConfig,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();

    match extract_phone(turn.user_text) {
        Some(phone) => {
            session.qualification.contact = Some(phone);
            session.qualification.contact_type = Some("declared".to_string());
            transition(session, Trigger::ContactCollected);
            enter_wait_confirm(ctx, cfg, session, turn, audit).await
        }
        None => recover_or_escalate(session, cfg, RecoveryContext::Phone, previous_state, turn, audit),
    }
}

pub(crate) async fn handle_contact_confirm(
    ctx: &EngineContext,
    cfg: &TenantConfig,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();

    match detect_intent(turn.user_text) {
        Some(Intent::Yes) => {
            session.qualification.contact = session.caller_id.clone();
            session.qualification.contact_type = Some("caller_id".to_string());
            transition(session, Trigger::ContactConfirmed);
            enter_wait_confirm(ctx, cfg, session, turn, audit).await
        }
        Some(Intent::No) => {
            let count = increment_recovery(&mut session.counters, RecoveryContext::ContactConfirm);
            if count > cfg.confirm_retry_max {
                return escalate_to_router(session, RouterReason::ContextExhausted, &previous_state, turn, audit);
            }
            let next = transition(session, Trigger::ContactRejected);
            vec![final_event(render(PromptKey::AskContact, session.channel, &[]), next)]
        }
        _ => recover_or_escalate(session, cfg, RecoveryContext::ContactConfirm, previous_state, turn, audit),
    }
}

pub(crate) async fn handle_wait_confirm(
    ctx: &EngineContext,
    cfg: &TenantConfig,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();

    let hints: Vec<SlotHint> = session
        .pending_slots
        .iter()
        .map(|s| SlotHint {
            index: s.index,
            weekday: s.start_ts.weekday().num_days_from_monday() as u8,
            hour: s.start_ts.hour(),
        })
        .collect();

    let choice = match detect_slot_choice(turn.user_text, &hints) {
        Some(n) => n,
        None => return recover_or_escalate(session, cfg, RecoveryContext::SlotChoice, previous_state, turn, audit),
    };

    let Some(pending) = session.pending_slots.iter().find(|s| s.index == choice).cloned() else {
        return recover_or_escalate(session, cfg, RecoveryContext::SlotChoice, previous_state, turn, audit);
    };

    let offer = SlotOffer { index: pending.index, start_ts: pending.start_ts, label: pending.label.clone() };
    let qualification = BackendQualification {
        name: session.qualification.name.clone(),
        motif: session.qualification.motif.clone(),
        contact: session.qualification.contact.clone(),
    };

    let outcome = lobby_backends::with_deadline(ctx.backend_deadline, ctx.calendar.book(&session.tenant_id, &offer, &qualification)).await;

    match outcome {
        Ok(BookOutcome::Ok { .. }) => {
            let next = transition(session, Trigger::BookingConfirmed);
            session.pending_slots.clear();
            let first_name = session.qualification.name.clone().unwrap_or_default();
            turn.record(audit, "booking_confirmed", &previous_state, None, &session.counters);
            vec![final_event(booking_confirmation(session.channel, &first_name, &pending.label), next)]
        }
        Ok(BookOutcome::Taken) => {
            turn.record(audit, "slot_taken", &previous_state, Some("slot_taken"), &session.counters);
            session.state = State::Transferred;
            vec![final_event(render(PromptKey::SlotAlreadyBooked, session.channel, &[]), State::Transferred)]
        }
        Ok(BookOutcome::Unavailable) | Err(_) => {
            turn.record(audit, "calendar_unavailable", &previous_state, Some("backend_unavailable"), &session.counters);
            session.state = State::Transferred;
            vec![final_event(render(PromptKey::TransferMessage, session.channel, &[]), State::Transferred)]
        }
    }
}

pub(crate) async fn handle_destructive_name(
    ctx: &EngineContext,
    flow: Flow,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();

    let Some(name) = extract_name(turn.user_text) else {
        return destructive_name_failure(session, flow, previous_state, turn, audit);
    };

    match lobby_backends::with_deadline(ctx.backend_deadline, ctx.calendar.find(&session.tenant_id, &name)).await {
        Ok(LookupOutcome::Ok { slot_label }) => {
            session.qualification.name = Some(name);
            let next = transition(session, Trigger::AppointmentFound);
            vec![final_event(render(PromptKey::DestructiveConfirm(flow), session.channel, &[("slot_label", &slot_label)]), next)]
        }
        _ => destructive_name_failure(session, flow, previous_state, turn, audit),
    }
}

/// §4.12: "After two name-lookup failures ... the recovery escalates to
/// `INTENT_ROUTER`." A literal 2, not the tenant's general
/// `max_context_fails`, since this case is spelled out explicitly.
const DESTRUCTIVE_NAME_MAX_FAILS: u32 = 2;

fn destructive_name_failure(
    session: &mut Session,
    flow: Flow,
    previous_state: String,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let count = increment_recovery(&mut session.counters, RecoveryContext::Name);
    if should_escalate(&session.counters, RecoveryContext::Name, DESTRUCTIVE_NAME_MAX_FAILS) {
        return escalate_to_router(session, RouterReason::ContextExhausted, &previous_state, turn, audit);
    }
    let level = if count <= 1 { 1 } else { 2 };
    vec![final_event(render(PromptKey::DestructiveNotFound(flow, level), session.channel, &[]), session.state)]
}

pub(crate) async fn handle_destructive_confirm(
    ctx: &EngineContext,
    flow: Flow,
    cfg: &TenantConfig,
    session: &mut Session,
    turn: &Turn<'_>,
    audit: &mut Vec<EventRecord>,
) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();

    match detect_intent(turn.user_text) {
        Some(Intent::Yes) => {
            if let Some(name) = session.qualification.name.clone() {
                let _ = lobby_backends::with_deadline(ctx.backend_deadline, ctx.calendar.cancel(&session.tenant_id, &name)).await;
            }
            turn.record(audit, "destructive_confirmed", &previous_state, None, &session.counters);

            let next = transition(session, Trigger::DestructiveConfirmed);
            session.pending_slots.clear();
            match flow {
                Flow::Cancel => vec![final_event(render(PromptKey::DestructiveDone(Flow::Cancel), session.channel, &[]), next)],
                Flow::Modify => {
                    session.qualification.preference = None;
                    vec![final_event(render(PromptKey::DestructiveDone(Flow::Modify), session.channel, &[]), next)]
                }
            }
        }
        Some(Intent::No) => {
            let next = transition(session, Trigger::DestructiveDeclined);
            let text = render(PromptKey::DestructiveKept(flow), session.channel, &[]);
            session.reset(turn.now);
            vec![final_event(text, next)]
        }
        _ => recover_or_escalate(session, cfg, RecoveryContext::ContactConfirm, previous_state, turn, audit),
    }
}

pub(crate) fn handle_faq_answered(session: &mut Session, turn: &Turn<'_>) -> Vec<OutboundEvent> {
    match detect_intent(turn.user_text) {
        Some(Intent::Yes) | Some(Intent::Booking) => {
            let next = transition(session, Trigger::FaqFollowupBooking);
            vec![final_event(render(PromptKey::AskName, session.channel, &[]), next)]
        }
        Some(Intent::No) | Some(Intent::Abandon) => {
            let next = transition(session, Trigger::Declined);
            vec![final_event(render(PromptKey::FaqGoodbye, session.channel, &[]), next)]
        }
        _ => vec![final_event(render(PromptKey::ClarifyLevel1, session.channel, &[]), session.state)],
    }
}

pub(crate) fn handle_intent_router(session: &mut Session, turn: &Turn<'_>, audit: &mut Vec<EventRecord>) -> Vec<OutboundEvent> {
    let previous_state = session.state.to_string();
    let folded = fold(turn.user_text);

    match detect_router_choice(&folded) {
        Some(RouterChoice::Booking) => {
            let next = transition(session, Trigger::RouterChooseBooking);
            vec![
                final_event(render(PromptKey::RouterChoiceBooking, session.channel, &[]), next),
                final_event(render(PromptKey::AskName, session.channel, &[]), next),
            ]
        }
        Some(RouterChoice::CancelModify) => {
            let next = transition(session, Trigger::RouterChooseCancelModify);
            vec![
                final_event(render(PromptKey::RouterChoiceCancelModify, session.channel, &[]), next),
                final_event(render(PromptKey::DestructiveAskName(Flow::Cancel), session.channel, &[]), next),
            ]
        }
        Some(RouterChoice::Faq) => {
            let next = transition(session, Trigger::RouterChooseFaq);
            vec![final_event(render(PromptKey::RouterChoiceFaq, session.channel, &[]), next)]
        }
        Some(RouterChoice::Transfer) => {
            let next = transition(session, Trigger::RouterChooseTransfer);
            vec![final_event(render(PromptKey::RouterChoiceTransfer, session.channel, &[]), next)]
        }
        None => {
            // The router's own local recovery budget reuses
            // `global_recovery_fails`: `enter_router` just zeroed it and
            // nothing else touches it while `state == INTENT_ROUTER`
            // (`lobby_recovery::MAX_ROUTER_TURNS`).
            session.counters.global_recovery_fails += 1;
            if session.counters.global_recovery_fails >= MAX_ROUTER_TURNS {
                turn.record(audit, "router_exhausted", &previous_state, Some("router_exhausted"), &session.counters);
                let next = transition(session, Trigger::RouterExhausted);
                vec![final_event(render(PromptKey::TransferMessage, session.channel, &[]), next)]
            } else {
                vec![final_event(render(PromptKey::RouterRetry, session.channel, &[]), session.state)]
            }
        }
    }
}

/// Whether a rendered prompt reads as a question (§9 resolved open
/// question: "`consecutive_questions` counts agent turns whose rendered
/// prompt ends with a question mark").
pub(crate) fn looks_like_question(text: &str) -> bool {
    text.trim_end().ends_with('?')
}
