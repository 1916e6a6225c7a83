use tracing::{debug, info};

use crate::world::EntityId;

use super::action::Verb;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    ActionResolved {
        target: EntityId,
        verb: Verb,
        message_key: String,
        effect_count: usize,
    },
    ActionRejected {
        target: EntityId,
        verb: Verb,
        message_key: String,
    },
}

/// Receives diagnostic events from the resolver. Passed in explicitly so the
/// core never reaches for a global logger.
pub trait DiagnosticSink {
    fn record(&mut self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`. Rejections are expected gameplay and stay at
/// debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::ActionResolved {
                target,
                verb,
                message_key,
                effect_count,
            } => info!(
                target_id = target.0,
                verb = %verb,
                message_key = %message_key,
                effect_count,
                "action_resolved"
            ),
            DiagnosticEvent::ActionRejected {
                target,
                verb,
                message_key,
            } => debug!(
                target_id = target.0,
                verb = %verb,
                message_key = %message_key,
                "action_rejected"
            ),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub events: Vec<DiagnosticEvent>,
}

impl DiagnosticSink for RecordingSink {
    fn record(&mut self, event: DiagnosticEvent) {
        self.events.push(event);
    }
}
