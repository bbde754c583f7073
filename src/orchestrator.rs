//! The alternating-turn loop: ask the side to move for a move, check it against the
//! rules, commit it, and record a snapshot.

use std::fmt;

use cozy_chess::Color;
use log::{debug, info, warn};
use thiserror::Error;

use crate::agent::{CompletionError, CompletionService};
use crate::board::{svg, Outcome, PositionError};
use crate::config::{GameConfig, ServiceErrorPolicy};
use crate::prompt::{agent_name, build_prompt, extract_candidate, side_name};
use crate::session::Session;

/// One applied move: who played it, what it was, and the board right after.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnRecord {
    pub side: Color,
    pub uci: String,
    pub svg: String,
}

#[derive(Debug, Error)]
pub enum TurnError {
    ParseFailure { side: Color, token: String },
    IllegalAction { side: Color, token: String },
    Service { side: Color, source: CompletionError },
    /// The board refused a move that was in its own legal list.
    Board { side: Color, source: PositionError },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::ParseFailure { side, token } => write!(f, "Failed to parse move from {}: {token}", side_name(*side)),
            TurnError::IllegalAction { side, token } => write!(f, "Invalid move suggested by {}: {token}", side_name(*side)),
            TurnError::Service { side, source } => write!(f, "{} could not reach the model: {source}", agent_name(*side)),
            TurnError::Board { side, source } => write!(f, "Move by {} rejected by the board: {source}", side_name(*side)),
        }
    }
}

impl TurnError {
    pub fn side(&self) -> Color {
        match self {
            TurnError::ParseFailure { side, .. }
            | TurnError::IllegalAction { side, .. }
            | TurnError::Service { side, .. }
            | TurnError::Board { side, .. } => *side,
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Enter your Gemini API key in the sidebar.")]
    MissingCredential,
    #[error(transparent)]
    Service(TurnError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoveRule,
    FivefoldRepetition,
    TurnLimitReached,
    AttemptLimitReached,
}

impl From<Outcome> for StopReason {
    fn from(o: Outcome) -> Self {
        match o {
            Outcome::Checkmate { winner } => StopReason::Checkmate { winner },
            Outcome::Stalemate => StopReason::Stalemate,
            Outcome::InsufficientMaterial => StopReason::InsufficientMaterial,
            Outcome::SeventyFiveMoveRule => StopReason::SeventyFiveMoveRule,
            Outcome::FivefoldRepetition => StopReason::FivefoldRepetition,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Game over: ")?;
        match self {
            StopReason::Checkmate { winner } => write!(f, "Checkmate. {} wins.", side_name(*winner)),
            StopReason::Stalemate => f.write_str("Stalemate."),
            StopReason::InsufficientMaterial => f.write_str("Draw due to insufficient material."),
            StopReason::SeventyFiveMoveRule => f.write_str("Draw by the seventy-five-move rule."),
            StopReason::FivefoldRepetition => f.write_str("Draw by fivefold repetition."),
            StopReason::TurnLimitReached => f.write_str("Turn limit reached."),
            StopReason::AttemptLimitReached => f.write_str("Too many failed turns."),
        }
    }
}

/// Knobs for one call to `run_game`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameParams {
    pub max_turns: u32,
    pub max_attempts: u32,
    pub service_errors: ServiceErrorPolicy,
    pub board_size: u32,
}

impl GameParams {
    pub fn with_max_turns(max_turns: u32) -> Self {
        Self { max_turns, max_attempts: max_turns.saturating_mul(3), service_errors: ServiceErrorPolicy::Abort, board_size: svg::DEFAULT_SIZE }
    }
}

impl From<&GameConfig> for GameParams {
    fn from(cfg: &GameConfig) -> Self {
        Self {
            max_turns: cfg.max_turns,
            max_attempts: cfg.attempt_budget(),
            service_errors: cfg.service_errors,
            board_size: cfg.board_size,
        }
    }
}

#[derive(Debug)]
pub struct GameReport {
    pub stop: StopReason,
    pub attempts: u32,
    pub failures: Vec<TurnError>,
}

impl GameReport {
    pub fn result_line(&self) -> String { self.stop.to_string() }
}

/// Plays one turn for the side to move. On success the move has been applied and a
/// `TurnRecord` appended; on error nothing in the session has changed.
pub fn run_turn<S: CompletionService + ?Sized>(session: &mut Session, service: &S, board_size: u32) -> Result<(), TurnError> {
    let side = session.position.side_to_move();
    let fen = session.position.fen();
    let legal = session.position.legal_moves();
    let tokens: Vec<String> = legal.iter().map(|&m| session.position.uci_token(m)).collect();
    let prompt = build_prompt(agent_name(side), &fen, &tokens);
    debug!("prompt for {}:\n{}", agent_name(side), prompt);

    let response = service.complete(&prompt).map_err(|source| TurnError::Service { side, source })?;
    debug!("{} replied {:?}", agent_name(side), response);
    let token = extract_candidate(response.trim());

    let mv = session
        .position
        .parse_token(token)
        .map_err(|_| TurnError::ParseFailure { side, token: token.to_string() })?;
    if !legal.contains(&mv) {
        return Err(TurnError::IllegalAction { side, token: token.to_string() });
    }

    let shown = session.position.standard_form(mv);
    let uci = session.position.uci_token(mv);
    session.position.apply(mv).map_err(|source| TurnError::Board { side, source })?;
    session.turn_count += 1;
    info!("move {}: {} plays {}", session.turn_count, side_name(side), uci);
    let svg = svg::render(&session.position, Some(shown), board_size);
    session.history.push(TurnRecord { side, uci, svg });
    Ok(())
}

/// Alternates turns until the game ends, `max_turns` moves have been applied, or the
/// attempt budget runs out. Callers check the credential first (`Session::require_credential`).
pub fn run_game<S: CompletionService + ?Sized>(session: &mut Session, service: &S, params: &GameParams) -> Result<GameReport, GameError> {
    run_game_observed(session, service, params, |_, _| {})
}

/// `run_game` with a callback after every turn attempt.
pub fn run_game_observed<S, F>(session: &mut Session, service: &S, params: &GameParams, mut observe: F) -> Result<GameReport, GameError>
where
    S: CompletionService + ?Sized,
    F: FnMut(&Session, Option<&TurnError>),
{
    let mut attempts = 0u32;
    let mut failures = Vec::new();
    while !session.position.is_game_over() && session.turn_count < params.max_turns && attempts < params.max_attempts {
        attempts += 1;
        match run_turn(session, service, params.board_size) {
            Ok(_) => observe(session, None),
            Err(e @ TurnError::Service { .. }) if params.service_errors == ServiceErrorPolicy::Abort => {
                warn!("{e}; stopping game");
                observe(session, Some(&e));
                return Err(GameError::Service(e));
            }
            Err(e) => {
                warn!("{e}");
                observe(session, Some(&e));
                failures.push(e);
            }
        }
    }

    let stop = match session.position.outcome() {
        Some(outcome) => StopReason::from(outcome),
        None if session.turn_count >= params.max_turns => StopReason::TurnLimitReached,
        None => StopReason::AttemptLimitReached,
    };
    info!("{} ({} moves, {} attempts)", stop, session.turn_count, attempts);
    Ok(GameReport { stop, attempts, failures })
}
