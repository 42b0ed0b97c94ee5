use thiserror::Error;

use crate::{agent::AgentId, cell::Portion};

/// Errors surfaced by the collision engine.
///
/// None of these abort a frame: world-level operations route them to a [`WarningSink`]
/// and return an empty result instead.
#[derive(Debug, Error)]
pub enum CollisionError {
    #[error("agent {0:#x} is not registered in the world")]
    MissingAgent(AgentId),

    #[error("agent id {0:#x} is malformed: {1}")]
    InvalidAgentId(AgentId, &'static str),

    #[error("portion {0:?} is not loaded")]
    MissingPortion(Portion),

    #[error("invalid collision descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid collision mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid collision config: {0}")]
    Config(#[from] ron::error::SpannedError),
}

/// Non-fatal, user-facing warning channel.
pub trait WarningSink {
    fn warn(&self, error: &CollisionError);
}

/// Default sink: forwards warnings to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWarnings;

impl WarningSink for LogWarnings {
    fn warn(&self, error: &CollisionError) {
        log::warn!("{error}");
    }
}
