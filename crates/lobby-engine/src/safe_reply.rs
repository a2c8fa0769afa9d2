use lobby_channels::{EventKind, OutboundEvent};
use lobby_core::Channel;
use lobby_prompts::{render, PromptKey};
use tracing::warn;

/// The last-line guarantee of P1 (§4.9 step 8, §8): whatever a handler
/// produced, the caller always gets back at least one event with non-empty
/// text. Swapping in the fallback here — and only here — means no handler
/// has to think about this invariant itself.
pub fn ensure_non_silent(
    events: Vec<OutboundEvent>,
    channel: Channel,
    new_state: &str,
) -> Vec<OutboundEvent> {
    if events.iter().any(|e| !e.text.trim().is_empty()) {
        return events;
    }

    warn!(new_state, "safe_reply_triggered");
    vec![OutboundEvent {
        kind: EventKind::Final,
        text: render(PromptKey::SafeReplyFallback, channel, &[]),
        new_state: new_state.to_string(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_non_empty_events() {
        let events = vec![OutboundEvent {
            kind: EventKind::Final,
            text: "Bonjour".to_string(),
            new_state: "START".to_string(),
        }];
        let out = ensure_non_silent(events.clone(), Channel::Text, "START");
        assert_eq!(out[0].text, "Bonjour");
    }

    #[test]
    fn replaces_empty_event_list() {
        let out = ensure_non_silent(vec![], Channel::Voice, "QUALIF_NAME");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "D'accord. Je vous écoute.");
        assert_eq!(out[0].new_state, "QUALIF_NAME");
    }

    #[test]
    fn replaces_whitespace_only_text() {
        let events = vec![OutboundEvent {
            kind: EventKind::Partial,
            text: "   ".to_string(),
            new_state: "START".to_string(),
        }];
        let out = ensure_non_silent(events, Channel::Text, "START");
        assert_eq!(out[0].text, "D'accord. Je vous écoute.");
    }
}
