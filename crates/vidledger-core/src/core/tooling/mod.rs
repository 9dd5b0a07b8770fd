//! CLI-facing outcome shaping and canned user-facing messages.

mod messages;
pub(crate) mod outcome;

pub(crate) use messages::*;
