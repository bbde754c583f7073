use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use duelbot::agent::{CompletionService, GeminiClient, RandomAgent};
use duelbot::config::{GameConfig, ServiceErrorPolicy};
use duelbot::orchestrator::{run_game_observed, GameParams};
use duelbot::session::Session;
use duelbot::web::{self, page, AppState};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Agent White vs Agent Black: two language models play chess", long_about = None)]
struct Args {
    /// JSON file with game settings; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct Overrides {
    /// Stop after this many applied moves (1-100)
    #[arg(long, global = true)]
    max_turns: Option<u32>,

    /// Stop after this many turn attempts, failed ones included
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Gemini model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// What a failed request to the model does to the game
    #[arg(long, global = true, value_enum)]
    service_errors: Option<ServiceErrorPolicy>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the browser UI
    Serve {
        #[arg(long, default_value = "127.0.0.1:8501")]
        bind: SocketAddr,
    },
    /// Play one game in the terminal
    Play {
        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long, value_enum, default_value_t = AgentKind::Gemini)]
        agent: AgentKind,

        /// Seed for the random agent
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Write an HTML report with the move history here
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    Gemini,
    Random,
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut cfg = match &args.config {
        Some(path) => GameConfig::from_json_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => GameConfig::default(),
    };
    let o = &args.overrides;
    if let Some(n) = o.max_turns { cfg.max_turns = n; }
    if let Some(n) = o.max_attempts { cfg.max_attempts = Some(n); }
    if let Some(m) = &o.model { cfg.model = m.clone(); }
    if let Some(p) = o.service_errors { cfg.service_errors = p; }
    cfg.validate()?;
    Ok(cfg)
}

fn serve(cfg: GameConfig, bind: SocketAddr) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let app = web::router(AppState::new(cfg, web::gemini_factory()));
        let listener = tokio::net::TcpListener::bind(bind).await.with_context(|| format!("binding {bind}"))?;
        println!("Open http://{bind} in a browser");
        axum::serve(listener, app).await?;
        Ok::<(), anyhow::Error>(())
    })
}

fn play(cfg: GameConfig, api_key: Option<String>, agent: AgentKind, seed: u64, out: Option<PathBuf>) -> Result<()> {
    let mut session = Session::new();
    let service: Box<dyn CompletionService> = match agent {
        AgentKind::Gemini => {
            session.set_credential(api_key.as_deref().unwrap_or(""));
            let key = session.require_credential().context("pass --api-key or set GEMINI_API_KEY")?;
            Box::new(GeminiClient::new(key, cfg.model.clone(), cfg.request_timeout())?)
        }
        AgentKind::Random => Box::new(RandomAgent::new(seed)),
    };

    let params = GameParams::from(&cfg);
    let pb = ProgressBar::new(params.max_turns as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} moves {msg}")?);
    let result = run_game_observed(&mut session, service.as_ref(), &params, |s, failure| {
        pb.set_position(s.turn_count as u64);
        match (failure, s.history.last()) {
            (Some(e), _) => pb.println(format!("  {e}")),
            (None, Some(rec)) => pb.set_message(rec.uci.clone()),
            (None, None) => {}
        }
    });
    pb.finish_and_clear();
    let report = result?;

    for (i, rec) in session.history.iter().enumerate() {
        println!("Move {} by {}: {}", i + 1, duelbot::prompt::side_name(rec.side), rec.uci);
    }
    println!("{}", report.result_line());
    println!("Final position: {}", session.position.fen());

    if let Some(path) = out {
        let failures: Vec<String> = report.failures.iter().map(|f| f.to_string()).collect();
        let html = page::render_report(&session, &report.result_line(), &failures, cfg.board_size);
        std::fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
        info!("report written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = load_config(&args)?;

    match args.command {
        Command::Serve { bind } => serve(cfg, bind),
        Command::Play { api_key, agent, seed, out } => play(cfg, api_key, agent, seed, out),
    }
}
