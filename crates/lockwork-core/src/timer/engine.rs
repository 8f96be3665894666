//! Block timer implementation.
//!
//! The timer is a wall-clock-based state machine with no internal thread
//! and no I/O. Every operation takes the current time explicitly, and
//! remaining time is always recomputed from the stored absolute end
//! timestamp. The host's tick source may stall for seconds or minutes
//! (process suspension); because nothing here counts tick invocations,
//! a stalled tick source cannot gain or lose time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running | completion -> Idle)
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::block::BlockType;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// Immutable view of the timer at one instant.
///
/// While running, `remaining_secs` is `max(0, ends_at - now)` computed at
/// sample time; while paused it is the value frozen at the pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub block_type: BlockType,
    pub remaining_secs: u64,
    /// Present iff the timer is running.
    pub ends_at: Option<DateTime<Utc>>,
}

impl TimerSnapshot {
    /// `mm:ss` rendering of the remaining time.
    pub fn formatted_remaining(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}

/// Emitted exactly once when a running block's end timestamp has passed.
/// The completed block type is carried so the controller can pick the
/// follow-up block; the timer itself never advances the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub block_type: BlockType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "phase")]
enum State {
    Idle,
    Running { ends_at: DateTime<Utc> },
    Paused { remaining_secs: u64 },
}

/// Pure timer state machine for one block.
///
/// Serializable so hosts can persist it between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTimer {
    block_type: BlockType,
    /// Full block duration in seconds.
    full_secs: u64,
    state: State,
}

impl BlockTimer {
    /// Create an idle timer for the given block type.
    ///
    /// Zero-length blocks are rejected here; past construction the timer
    /// has no failure modes.
    pub fn new(block_type: BlockType, full_secs: u64) -> Result<Self, ValidationError> {
        if full_secs == 0 {
            return Err(ValidationError::NonPositiveDuration { got: full_secs });
        }
        Ok(Self {
            block_type,
            full_secs,
            state: State::Idle,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn full_secs(&self) -> u64 {
        self.full_secs
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Running { .. } => Phase::Running,
            State::Paused { .. } => Phase::Paused,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            State::Running { ends_at } => Some(ends_at),
            _ => None,
        }
    }

    /// Pure read of the timer at `now`. Running remaining time is
    /// recomputed from the end timestamp on every call.
    pub fn sample(&self, now: DateTime<Utc>) -> TimerSnapshot {
        match self.state {
            State::Idle => TimerSnapshot {
                phase: Phase::Idle,
                block_type: self.block_type,
                remaining_secs: self.full_secs,
                ends_at: None,
            },
            State::Running { ends_at } => TimerSnapshot {
                phase: Phase::Running,
                block_type: self.block_type,
                remaining_secs: remaining_between(now, ends_at),
                ends_at: Some(ends_at),
            },
            State::Paused { remaining_secs } => TimerSnapshot {
                phase: Phase::Paused,
                block_type: self.block_type,
                remaining_secs,
                ends_at: None,
            },
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from Idle (full duration) or resume from Paused (frozen
    /// remainder). No-op while already running.
    pub fn start(&mut self, now: DateTime<Utc>) {
        let secs = match self.state {
            State::Idle => self.full_secs,
            State::Paused { remaining_secs } => remaining_secs,
            State::Running { .. } => return,
        };
        self.state = State::Running {
            ends_at: now + Duration::seconds(secs as i64),
        };
    }

    /// Freeze the remaining time. No-op unless running.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let State::Running { ends_at } = self.state {
            self.state = State::Paused {
                remaining_secs: remaining_between(now, ends_at),
            };
        }
    }

    /// Back to Idle at the full duration of the current block type.
    /// Does not advance the cycle.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Replace the block, returning to Idle. This is how the controller
    /// advances the cycle after a completion.
    pub fn set_block(&mut self, block_type: BlockType, full_secs: u64) -> Result<(), ValidationError> {
        if full_secs == 0 {
            return Err(ValidationError::NonPositiveDuration { got: full_secs });
        }
        self.block_type = block_type;
        self.full_secs = full_secs;
        self.state = State::Idle;
        Ok(())
    }

    /// If running and the end timestamp has passed, emit the completion
    /// event and drop to Idle. Idempotent: once emitted, further calls
    /// return `None` until the timer runs again.
    pub fn complete_if_due(&mut self, now: DateTime<Utc>) -> Option<CompletionEvent> {
        match self.state {
            State::Running { ends_at } if ends_at <= now => {
                self.state = State::Idle;
                Some(CompletionEvent {
                    block_type: self.block_type,
                })
            }
            _ => None,
        }
    }
}

fn remaining_between(now: DateTime<Utc>, ends_at: DateTime<Utc>) -> u64 {
    (ends_at - now).num_seconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn secs(n: i64) -> Duration {
        Duration::seconds(n)
    }

    #[test]
    fn zero_duration_rejected() {
        assert!(BlockTimer::new(BlockType::Focus, 0).is_err());
    }

    #[test]
    fn start_samples_full_duration() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        let snap = timer.sample(t0());
        assert_eq!(snap.phase, Phase::Running);
        assert_eq!(snap.remaining_secs, 1500);
        assert_eq!(snap.ends_at, Some(t0() + secs(1500)));
    }

    #[test]
    fn sample_derives_from_end_timestamp() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        // No intermediate samples: a 20-minute gap still reads correctly.
        assert_eq!(timer.sample(t0() + secs(1200)).remaining_secs, 300);
        assert_eq!(timer.sample(t0() + secs(2000)).remaining_secs, 0);
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        timer.start(t0() + secs(100));
        assert_eq!(timer.ends_at(), Some(t0() + secs(1500)));
    }

    #[test]
    fn pause_freezes_remainder() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        timer.pause(t0() + secs(10));
        let snap = timer.sample(t0() + secs(9999));
        assert_eq!(snap.phase, Phase::Paused);
        assert_eq!(snap.remaining_secs, 1490);
        assert_eq!(snap.ends_at, None);
    }

    #[test]
    fn resume_after_long_pause_has_no_drift() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        timer.pause(t0() + secs(10));
        // Paused for an hour; resuming still has 1490s on the clock.
        let resume_at = t0() + secs(3610);
        timer.start(resume_at);
        assert_eq!(timer.sample(resume_at).remaining_secs, 1490);
        assert_eq!(timer.ends_at(), Some(resume_at + secs(1490)));
    }

    #[test]
    fn pause_when_not_running_is_noop() {
        let mut timer = BlockTimer::new(BlockType::Break, 300).unwrap();
        timer.pause(t0());
        assert_eq!(timer.phase(), Phase::Idle);
    }

    #[test]
    fn reset_restores_full_duration_of_current_block() {
        let mut timer = BlockTimer::new(BlockType::Break, 300).unwrap();
        timer.start(t0());
        timer.pause(t0() + secs(42));
        timer.reset();
        let snap = timer.sample(t0() + secs(100));
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.block_type, BlockType::Break);
        assert_eq!(snap.remaining_secs, 300);
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        assert!(timer.complete_if_due(t0() + secs(1499)).is_none());
        let event = timer.complete_if_due(t0() + secs(1500)).unwrap();
        assert_eq!(event.block_type, BlockType::Focus);
        // Late and repeated calls after completion are silent.
        assert!(timer.complete_if_due(t0() + secs(1500)).is_none());
        assert!(timer.complete_if_due(t0() + secs(9000)).is_none());
        assert_eq!(timer.phase(), Phase::Idle);
    }

    #[test]
    fn completion_only_while_running() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        assert!(timer.complete_if_due(t0() + secs(9000)).is_none());
        timer.start(t0());
        timer.pause(t0() + secs(10));
        assert!(timer.complete_if_due(t0() + secs(9000)).is_none());
    }

    #[test]
    fn set_block_advances_and_idles() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        timer.complete_if_due(t0() + secs(1500));
        timer.set_block(BlockType::Break, 300).unwrap();
        let snap = timer.sample(t0() + secs(1500));
        assert_eq!(snap.block_type, BlockType::Break);
        assert_eq!(snap.remaining_secs, 300);
        assert_eq!(snap.phase, Phase::Idle);
    }

    #[test]
    fn serde_roundtrip_preserves_running_state() {
        let mut timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        timer.start(t0());
        let json = serde_json::to_string(&timer).unwrap();
        let restored: BlockTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, timer);
        assert_eq!(restored.sample(t0() + secs(500)).remaining_secs, 1000);
    }

    #[test]
    fn formatted_remaining_is_mm_ss() {
        let timer = BlockTimer::new(BlockType::Focus, 1500).unwrap();
        assert_eq!(timer.sample(t0()).formatted_remaining(), "25:00");
    }

    proptest! {
        /// Suspension tolerance: remaining time depends only on the wall
        /// clock, not on how many samples happened in between.
        #[test]
        fn remaining_is_pure_function_of_now(
            d in 1u64..=24 * 3600,
            offsets in proptest::collection::vec(0u64..=48 * 3600, 1..8),
        ) {
            let mut timer = BlockTimer::new(BlockType::Focus, d).unwrap();
            timer.start(t0());
            for off in offsets {
                let snap = timer.sample(t0() + secs(off as i64));
                prop_assert_eq!(snap.remaining_secs, d.saturating_sub(off));
            }
        }

        /// A pause freezes the remainder regardless of how long the pause
        /// lasts before the resume.
        #[test]
        fn paused_value_is_independent_of_pause_length(
            d in 2u64..=24 * 3600,
            pause_after in 1u64..=24 * 3600,
            pause_len in 0u64..=7 * 24 * 3600,
        ) {
            let pause_after = pause_after.min(d - 1);
            let mut timer = BlockTimer::new(BlockType::Break, d).unwrap();
            timer.start(t0());
            timer.pause(t0() + secs(pause_after as i64));
            let resume_at = t0() + secs((pause_after + pause_len) as i64);
            timer.start(resume_at);
            prop_assert_eq!(timer.sample(resume_at).remaining_secs, d - pause_after);
        }
    }
}
