//! VerseKeep server
//!
//! HTTP backend for scripture memorization: magic-link sign-in, a verse
//! library, and the gamification engine (daily streaks, word-guess streaks,
//! recitation attempts with a perfect-attempt cooldown, mastery detection,
//! and an append-only point-event ledger).

pub mod config;
pub mod email;
pub mod engine;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use email::{ConsoleEmailSender, EmailSender, SmtpConfig, SmtpEmailSender};
pub use error::ApiError;
pub use state::AppState;
pub use store::{Datastore, MemoryStore, SqliteStore};
