//! Cycle controller: the single stateful orchestrator.
//!
//! Owns the block timer, the one open session, and everything published
//! outward (display state, scheduled alerts). Collaborators are injected
//! at construction; every collaborator failure is logged and swallowed so
//! the countdown keeps working even if all of them fail.
//!
//! Hosts must serialize access: all transitions go through `&mut self`,
//! and a host that mixes user commands with a tick source wraps the
//! controller in a mutex or pins it to one task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::BlockType;
use super::engine::{BlockTimer, Phase, TimerSnapshot};
use crate::error::ValidationError;
use crate::events::Event;
use crate::services::{AlertScheduler, DisplaySync, HapticFeedback, SessionStore};
use crate::session::Session;
use crate::storage::Settings;

/// The injected collaborator set.
pub struct Collaborators {
    pub store: Box<dyn SessionStore>,
    pub display: Box<dyn DisplaySync>,
    pub alerts: Box<dyn AlertScheduler>,
    pub haptics: Box<dyn HapticFeedback>,
}

/// Observers receive an immutable snapshot after every transition.
pub type SnapshotObserver = Box<dyn Fn(&TimerSnapshot) + Send>;

/// The serializable part of the controller, persisted by hosts that
/// re-create the controller per invocation (the CLI does).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleState {
    pub timer: BlockTimer,
    pub open_session: Option<Session>,
}

pub struct BlockCycleController {
    timer: BlockTimer,
    open_session: Option<Session>,
    settings: Settings,
    collaborators: Collaborators,
    observers: Vec<SnapshotObserver>,
    /// Last (push time, payload) sent via `publish_if_due`.
    last_publish: Option<(DateTime<Utc>, DateTime<Utc>, BlockType)>,
}

impl BlockCycleController {
    /// New controller idle on a Focus block.
    pub fn new(settings: Settings, collaborators: Collaborators) -> Result<Self, ValidationError> {
        settings.validate()?;
        let timer = BlockTimer::new(BlockType::Focus, settings.secs_for(BlockType::Focus))?;
        Ok(Self {
            timer,
            open_session: None,
            settings,
            collaborators,
            observers: Vec::new(),
            last_publish: None,
        })
    }

    /// Rebuild a controller from persisted state.
    pub fn restore(
        state: CycleState,
        settings: Settings,
        collaborators: Collaborators,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            timer: state.timer,
            open_session: state.open_session,
            settings,
            collaborators,
            observers: Vec::new(),
            last_publish: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        self.timer.sample(now)
    }

    pub fn current_block_type(&self) -> BlockType {
        self.timer.block_type()
    }

    pub fn open_session(&self) -> Option<&Session> {
        self.open_session.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The block type that will follow the current one, with its
    /// configured minutes.
    pub fn next_block_info(&self) -> (BlockType, u32) {
        let next = self.timer.block_type().next();
        (next, self.settings.minutes_for(next))
    }

    pub fn state(&self) -> CycleState {
        CycleState {
            timer: self.timer.clone(),
            open_session: self.open_session.clone(),
        }
    }

    /// Register a snapshot observer. Observers are notified after every
    /// transition; they never see partial updates.
    pub fn subscribe(&mut self, observer: SnapshotObserver) {
        self.observers.push(observer);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start (or resume) the current block. Opens a session if none is
    /// open and publishes the initial display state.
    pub fn start_block(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.timer.is_running() {
            return None;
        }
        self.timer.start(now);
        self.open_session_if_needed(now);

        if self.settings.display_sync_enabled {
            if let Some(ends_at) = self.timer.ends_at() {
                let block_type = self.timer.block_type();
                log_collab(
                    "display start",
                    self.collaborators.display.start(ends_at, block_type),
                );
                self.last_publish = Some((now, ends_at, block_type));
            }
        }

        let snapshot = self.notify(now);
        Some(Event::BlockStarted {
            block_type: snapshot.block_type,
            duration_secs: snapshot.remaining_secs,
            at: now,
        })
    }

    /// Pause the countdown. The ephemeral display ends rather than
    /// freezing: such surfaces only represent active countdowns.
    pub fn pause_block(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.timer.is_running() {
            return None;
        }
        self.timer.pause(now);
        self.end_display();

        let snapshot = self.notify(now);
        Some(Event::BlockPaused {
            block_type: snapshot.block_type,
            remaining_secs: snapshot.remaining_secs,
            at: now,
        })
    }

    /// Stop and rewind the current block. A session open at this point is
    /// closed at `now` and persisted; pending alerts are cancelled.
    pub fn reset_block(&mut self, now: DateTime<Utc>) -> Event {
        self.timer.reset();
        self.close_open_session(now);
        self.end_display();
        log_collab("alert cancel", self.collaborators.alerts.cancel_all());

        let snapshot = self.notify(now);
        Event::BlockReset {
            block_type: snapshot.block_type,
            at: now,
        }
    }

    /// Drive the cycle. Call at any cadence; correctness never depends on
    /// tick frequency. Returns the completion event when a block ends.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let completed = self.timer.complete_if_due(now)?;
        let next = completed.block_type.next();

        self.close_open_session(now);

        // Alert announces the upcoming block, firing immediately.
        if self.settings.sound_enabled {
            log_collab("alert schedule", self.collaborators.alerts.schedule(next, now));
        }
        // Haptics are tagged with the block that just completed.
        if self.settings.haptics_enabled {
            self.collaborators.haptics.trigger(completed.block_type);
        }

        if let Err(e) = self.timer.set_block(next, self.settings.secs_for(next)) {
            // Settings were validated at construction; a zero duration
            // here means they were mutated out from under us.
            tracing::error!(error = %e, "cannot advance to next block");
            return None;
        }

        if self.settings.auto_continue {
            self.timer.start(now);
            self.open_session_if_needed(now);
            if self.settings.display_sync_enabled {
                if let Some(ends_at) = self.timer.ends_at() {
                    log_collab(
                        "display start",
                        self.collaborators.display.start(ends_at, next),
                    );
                    self.last_publish = Some((now, ends_at, next));
                }
            }
        } else {
            self.end_display();
        }

        self.notify(now);
        Some(Event::BlockCompleted {
            block_type: completed.block_type,
            next_block_type: next,
            at: now,
        })
    }

    /// Throttled push to the external display: at most one push per
    /// configured minimum interval, and unchanged payloads are skipped.
    /// Publishing nothing is always safe; the display holds the absolute
    /// end timestamp and counts down on its own.
    pub fn publish_if_due(&mut self, now: DateTime<Utc>) {
        if !self.settings.display_sync_enabled {
            return;
        }
        let Some(ends_at) = self.timer.ends_at() else {
            return;
        };
        let block_type = self.timer.block_type();

        if let Some((last_at, last_ends, last_block)) = self.last_publish {
            if last_ends == ends_at && last_block == block_type {
                return;
            }
            let min_interval = chrono::Duration::seconds(self.settings.publish_min_interval_secs as i64);
            if now - last_at < min_interval {
                return;
            }
        }

        log_collab(
            "display update",
            self.collaborators.display.update(ends_at, block_type),
        );
        self.last_publish = Some((now, ends_at, block_type));
    }

    /// Swap in new settings. An idle timer picks up the new duration for
    /// its block type immediately; a running or paused one keeps counting
    /// against the durations it started with.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ValidationError> {
        settings.validate()?;
        self.settings = settings;
        if self.timer.phase() == Phase::Idle {
            let block_type = self.timer.block_type();
            self.timer.set_block(block_type, self.settings.secs_for(block_type))?;
        }
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn open_session_if_needed(&mut self, now: DateTime<Utc>) {
        if self.open_session.is_some() {
            return;
        }
        let session = Session::open(self.timer.block_type(), now);
        // Inserted speculatively at open so an abrupt kill between open
        // and close still leaves a trace in the store.
        if let Err(e) = self.collaborators.store.create(&session) {
            tracing::warn!(error = %e, "session create failed; keeping in memory");
        }
        self.open_session = Some(session);
    }

    fn close_open_session(&mut self, now: DateTime<Utc>) {
        let Some(mut session) = self.open_session.take() else {
            return;
        };
        session.ended_at = Some(now);
        if let Err(e) = self.collaborators.store.close(session.id, now) {
            tracing::warn!(error = %e, id = %session.id, "session close failed");
        }
    }

    fn end_display(&mut self) {
        log_collab("display end", self.collaborators.display.end());
        self.last_publish = None;
    }

    fn notify(&self, now: DateTime<Utc>) -> TimerSnapshot {
        let snapshot = self.timer.sample(now);
        for observer in &self.observers {
            observer(&snapshot);
        }
        snapshot
    }
}

fn log_collab(what: &str, result: Result<(), Box<dyn std::error::Error + Send + Sync>>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "{what} failed");
    }
}
