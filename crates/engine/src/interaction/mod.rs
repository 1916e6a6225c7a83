mod action;
mod diagnostics;
mod message;
mod outcome;
mod resolver;
mod rules;

pub use action::{Action, Verb};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, RecordingSink, TracingSink};
pub use message::{keys, Message};
pub use outcome::{ActionError, Effect, IllegalAction, Outcome};
pub use resolver::{resolve, resolve_at, InteractionContext};
pub use rules::{Rules, UseKeyRule, DEFAULT_TABLE_SHIFT_PX};
