//! Browser UI: one shared session, three actions (save key, start, reset).

pub mod page;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::{get, post},
    Router,
};
use log::{error, info};
use serde::Deserialize;

use crate::agent::{CompletionError, CompletionService, GeminiClient};
use crate::config::{parse_max_turns, GameConfig};
use crate::orchestrator::{run_game, GameParams};
use crate::session::Session;
use page::Banner;

/// Builds the completion service for a game from the session's API key.
pub type ServiceFactory =
    Arc<dyn Fn(&str, &GameConfig) -> Result<Box<dyn CompletionService + Send>, CompletionError> + Send + Sync>;

pub fn gemini_factory() -> ServiceFactory {
    Arc::new(|key: &str, cfg: &GameConfig| {
        let client = GeminiClient::new(key, cfg.model.clone(), cfg.request_timeout())?;
        Ok(Box::new(client) as Box<dyn CompletionService + Send>)
    })
}

pub const GAME_RUNNING: &str = "A game is already running.";

struct UiState {
    session: Session,
    max_turns: u32,
    banners: Vec<Banner>,
    running: bool,
}

#[derive(Clone)]
pub struct AppState {
    ui: Arc<Mutex<UiState>>,
    config: Arc<GameConfig>,
    factory: ServiceFactory,
}

impl AppState {
    pub fn new(config: GameConfig, factory: ServiceFactory) -> Self {
        let ui = UiState { session: Session::new(), max_turns: config.max_turns, banners: Vec::new(), running: false };
        Self { ui: Arc::new(Mutex::new(ui)), config: Arc::new(config), factory }
    }

    fn lock(&self) -> Result<MutexGuard<'_, UiState>, StatusCode> {
        self.ui.lock().map_err(|_| {
            error!("session lock poisoned");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}

#[derive(Deserialize)]
pub struct CredentialForm {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct StartForm {
    #[serde(default)]
    pub max_turns: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/credential", post(save_credential))
        .route("/start", post(start_game))
        .route("/reset", post(reset_game))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let mut ui = state.lock()?;
    // Messages are shown once.
    let mut banners = std::mem::take(&mut ui.banners);
    if ui.running {
        banners.push(Banner::warning(GAME_RUNNING));
    }
    Ok(Html(page::render_index(&ui.session, ui.max_turns, &banners, state.config.board_size)))
}

async fn save_credential(State(state): State<AppState>, Form(form): Form<CredentialForm>) -> Result<Redirect, StatusCode> {
    let mut ui = state.lock()?;
    ui.session.set_credential(&form.api_key);
    if ui.session.has_credential() {
        info!("API key stored");
    } else {
        ui.banners.push(Banner::warning(page::MISSING_KEY_WARNING));
    }
    Ok(Redirect::to("/"))
}

async fn start_game(State(state): State<AppState>, Form(form): Form<StartForm>) -> Result<Redirect, StatusCode> {
    let max_turns = match parse_max_turns(&form.max_turns) {
        Ok(n) => n,
        Err(e) => {
            state.lock()?.banners.push(Banner::error(e.to_string()));
            return Ok(Redirect::to("/"));
        }
    };
    let worker = state.clone();
    tokio::task::spawn_blocking(move || play_blocking(&worker, max_turns))
        .await
        .map_err(|e| {
            error!("game task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })??;
    Ok(Redirect::to("/"))
}

// Runs on a blocking thread: the completion client and the game loop are synchronous.
// The game plays on a copy of the session so the page can be served meanwhile.
fn play_blocking(state: &AppState, max_turns: u32) -> Result<(), StatusCode> {
    let (mut session, key) = {
        let mut ui = state.lock()?;
        ui.max_turns = max_turns;
        if ui.running {
            ui.banners.push(Banner::warning(GAME_RUNNING));
            return Ok(());
        }
        let key = match ui.session.require_credential() {
            Ok(key) => key.to_string(),
            Err(e) => {
                ui.banners.push(Banner::warning(e.to_string()));
                return Ok(());
            }
        };
        ui.running = true;
        (ui.session.clone(), key)
    };
    session.reset();
    let banners = play_session(state, &mut session, &key, max_turns);

    let mut ui = state.lock()?;
    ui.running = false;
    // Keep a key entered while the game was running.
    let current = ui.session.credential().map(str::to_string);
    ui.session = session;
    ui.session.set_credential(current.as_deref().unwrap_or(""));
    ui.banners.extend(banners);
    Ok(())
}

fn play_session(state: &AppState, session: &mut Session, key: &str, max_turns: u32) -> Vec<Banner> {
    let service = match (state.factory)(key, &state.config) {
        Ok(s) => s,
        Err(e) => return vec![Banner::error(e.to_string())],
    };
    let cfg = GameConfig {
        max_turns,
        max_attempts: state.config.max_attempts.map(|a| a.max(max_turns)),
        ..GameConfig::clone(&state.config)
    };
    let params = GameParams::from(&cfg);
    match run_game(session, service.as_ref(), &params) {
        Ok(report) => {
            let mut banners: Vec<Banner> = report.failures.iter().map(|f| Banner::error(f.to_string())).collect();
            banners.push(Banner::success(report.result_line()));
            banners
        }
        Err(e) => vec![Banner::error(e.to_string())],
    }
}

async fn reset_game(State(state): State<AppState>) -> Result<Redirect, StatusCode> {
    let mut ui = state.lock()?;
    ui.session.reset();
    ui.banners.push(Banner::success("Game reset!"));
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::OnceLock;

    /// Plays e2e4 and records whether the shared state could be locked mid-game.
    struct LockCheck {
        ui: Arc<Mutex<UiState>>,
        unlocked: Arc<AtomicBool>,
    }

    impl CompletionService for LockCheck {
        fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            let running = self.ui.try_lock().map(|ui| ui.running).unwrap_or(false);
            self.unlocked.store(running, Ordering::SeqCst);
            Ok("e2e4".to_string())
        }
    }

    fn lock_check_state(unlocked: Arc<AtomicBool>) -> AppState {
        let slot: Arc<OnceLock<Arc<Mutex<UiState>>>> = Arc::new(OnceLock::new());
        let shared = slot.clone();
        let factory: ServiceFactory = Arc::new(move |_key: &str, _cfg: &GameConfig| {
            let ui = shared.get().cloned().ok_or(CompletionError::MissingCredential)?;
            Ok(Box::new(LockCheck { ui, unlocked: unlocked.clone() }) as Box<dyn CompletionService + Send>)
        });
        let state = AppState::new(GameConfig::default(), factory);
        let _ = slot.set(state.ui.clone());
        state.lock().unwrap().session.set_credential("key");
        state
    }

    #[test]
    fn shared_state_is_free_while_a_game_plays() {
        let unlocked = Arc::new(AtomicBool::new(false));
        let state = lock_check_state(unlocked.clone());
        play_blocking(&state, 1).unwrap();
        assert!(unlocked.load(Ordering::SeqCst), "the model was called with the session locked");
        let ui = state.lock().unwrap();
        assert!(!ui.running);
        assert_eq!(ui.session.turn_count, 1);
        assert_eq!(ui.session.credential(), Some("key"));
    }

    #[test]
    fn second_start_while_running_plays_nothing() {
        let unlocked = Arc::new(AtomicBool::new(false));
        let state = lock_check_state(unlocked.clone());
        state.lock().unwrap().running = true;
        play_blocking(&state, 3).unwrap();
        let ui = state.lock().unwrap();
        assert_eq!(ui.session.turn_count, 0);
        assert!(ui.banners.iter().any(|b| b.text == GAME_RUNNING));
        assert!(!unlocked.load(Ordering::SeqCst));
    }
}
