use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{CompletionError, CompletionService};
use crate::prompt::LEGAL_MOVES_LABEL;

/// Offline stand-in for a model: answers every prompt with a uniformly random move taken
/// from the prompt's legal-move line.
pub struct RandomAgent {
    rng: Mutex<SmallRng>,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self { Self { rng: Mutex::new(SmallRng::seed_from_u64(seed)) } }
}

fn legal_moves_in(prompt: &str) -> Vec<&str> {
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix(LEGAL_MOVES_LABEL))
        .map(|list| list.split(',').map(str::trim).filter(|m| !m.is_empty()).collect())
        .unwrap_or_default()
}

impl CompletionService for RandomAgent {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let moves = legal_moves_in(prompt);
        let mut rng = self.rng.lock().map_err(|_| CompletionError::Transport("rng lock poisoned".into()))?;
        moves.choose(&mut *rng).map(|m| m.to_string()).ok_or(CompletionError::EmptyResponse)
    }
}
