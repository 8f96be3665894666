//! Collaborator contracts for the cycle controller.
//!
//! The controller calls into these; their internals (widget surfaces,
//! notification centers, haptic hardware) live in the host. Everything is
//! injected at construction so the engine is testable with fakes and has
//! no hidden shared state. No failure from any of these is fatal to the
//! running timer.

mod alerts;

pub use alerts::AlertContent;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::session::Session;
use crate::timer::BlockType;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Durable store for session records.
pub trait SessionStore: Send {
    fn create(&self, session: &Session) -> Result<(), StoreError>;

    /// Set the end timestamp of an open session.
    fn close(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// All sessions, newest started first.
    fn list(&self) -> Result<Vec<Session>, StoreError>;

    fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Ephemeral status publisher mirroring the active countdown on a
/// system-level surface (lock screen, always-on display).
///
/// Such surfaces represent only active countdowns, never a paused timer.
/// Absence of authorization is a silent no-op, not an error.
pub trait DisplaySync: Send {
    fn start(&mut self, ends_at: DateTime<Utc>, block_type: BlockType) -> Result<(), BoxError>;

    /// Idempotent: may be called with an unchanged value.
    fn update(&mut self, ends_at: DateTime<Utc>, block_type: BlockType) -> Result<(), BoxError>;

    fn end(&mut self) -> Result<(), BoxError>;
}

/// Schedules user-visible alerts at absolute times.
pub trait AlertScheduler: Send {
    /// Implementations must cancel any previously pending alert for the
    /// cycle before scheduling, so an alert never fires twice.
    fn schedule(&mut self, block_type: BlockType, fires_at: DateTime<Utc>) -> Result<(), BoxError>;

    fn cancel_all(&mut self) -> Result<(), BoxError>;
}

/// Fire-and-forget haptic feedback tagged with a block type.
pub trait HapticFeedback: Send {
    fn trigger(&mut self, block_type: BlockType);
}

// ── Host stand-ins ───────────────────────────────────────────────────
//
// The real surfaces are platform UI. These log what would be shown so a
// headless host still reflects every transition.

pub struct LoggingDisplaySync;

impl DisplaySync for LoggingDisplaySync {
    fn start(&mut self, ends_at: DateTime<Utc>, block_type: BlockType) -> Result<(), BoxError> {
        tracing::info!(%ends_at, block_type = block_type.as_str(), "display sync started");
        Ok(())
    }

    fn update(&mut self, ends_at: DateTime<Utc>, block_type: BlockType) -> Result<(), BoxError> {
        tracing::debug!(%ends_at, block_type = block_type.as_str(), "display sync updated");
        Ok(())
    }

    fn end(&mut self) -> Result<(), BoxError> {
        tracing::info!("display sync ended");
        Ok(())
    }
}

pub struct LoggingAlertScheduler;

impl AlertScheduler for LoggingAlertScheduler {
    fn schedule(&mut self, block_type: BlockType, fires_at: DateTime<Utc>) -> Result<(), BoxError> {
        let content = AlertContent::for_block(block_type);
        tracing::info!(%fires_at, title = content.title, "alert scheduled");
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<(), BoxError> {
        tracing::debug!("pending alerts cancelled");
        Ok(())
    }
}

pub struct LoggingHaptics;

impl HapticFeedback for LoggingHaptics {
    fn trigger(&mut self, block_type: BlockType) {
        tracing::debug!(block_type = block_type.as_str(), "haptic feedback");
    }
}
