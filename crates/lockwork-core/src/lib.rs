//! # Lockwork Core Library
//!
//! Core business logic for Lockwork, a focus/break interval timer. All
//! operations are available through this library; the CLI binary is a thin
//! host that drives the engine and persists its state between invocations.
//!
//! ## Architecture
//!
//! - **Block timer**: a wall-clock-based state machine. Remaining time is
//!   always derived from a stored absolute end timestamp and the current
//!   wall clock, never from counting tick callbacks, so arbitrary host
//!   suspension between ticks cannot gain or lose time.
//! - **Cycle controller**: the single stateful orchestrator. Owns the open
//!   session, drives the Focus/Break alternation, and keeps the external
//!   display and scheduled alerts in sync with the timer.
//! - **Services**: injected collaborator contracts (session store, display
//!   sync, alert scheduler, haptics). No collaborator failure is fatal to
//!   the running timer.
//! - **Storage**: SQLite-based session history and TOML-based settings.
//!
//! ## Key Components
//!
//! - [`BlockTimer`]: pure timer state machine
//! - [`BlockCycleController`]: cycle orchestration
//! - [`SqliteSessionStore`]: session persistence
//! - [`Settings`]: application configuration

pub mod error;
pub mod events;
pub mod services;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use services::{AlertScheduler, DisplaySync, HapticFeedback, SessionStore};
pub use session::Session;
pub use storage::{Settings, SqliteSessionStore};
pub use timer::{
    BlockCycleController, BlockTimer, BlockType, Collaborators, CompletionEvent, CycleState,
    Phase, TimerSnapshot,
};
