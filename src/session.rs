use crate::board::Position;
use crate::orchestrator::{GameError, TurnRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCredential,
    InProgress,
    Terminated,
}

/// Everything one UI session knows about its game. Created once, mutated by the
/// orchestrator, returned to the start position by `reset`.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub position: Position,
    pub history: Vec<TurnRecord>,
    pub turn_count: u32,
    credential: Option<String>,
}

impl Session {
    pub fn new() -> Self { Self::default() }

    /// Stores the API key. Blank input clears it.
    pub fn set_credential(&mut self, key: &str) {
        let key = key.trim();
        self.credential = if key.is_empty() { None } else { Some(key.to_string()) };
    }

    pub fn credential(&self) -> Option<&str> { self.credential.as_deref() }

    pub fn has_credential(&self) -> bool { self.credential.is_some() }

    pub fn require_credential(&self) -> Result<&str, GameError> {
        self.credential().ok_or(GameError::MissingCredential)
    }

    /// Back to the initial arrangement with no history. The credential survives.
    pub fn reset(&mut self) {
        self.position = Position::startpos();
        self.history.clear();
        self.turn_count = 0;
    }

    pub fn state(&self) -> SessionState {
        if !self.has_credential() {
            SessionState::AwaitingCredential
        } else if self.position.is_game_over() {
            SessionState::Terminated
        } else {
            SessionState::InProgress
        }
    }
}
