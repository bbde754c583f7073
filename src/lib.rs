// Two language-model agents playing chess, refereed by cozy-chess
pub mod agent;
pub mod board;
pub mod config;
pub mod orchestrator;
pub mod prompt;
pub mod session;
pub mod web;
