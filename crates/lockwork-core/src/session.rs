//! Session records: one row per completed (or still-open) block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::BlockType;

/// The persisted record of one block. A session is open while `ended_at`
/// is `None`; the controller guarantees at most one open session exists
/// at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub block_type: BlockType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Open a new session starting now.
    pub fn open(block_type: BlockType, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            block_type,
            started_at,
            ended_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Duration in seconds, or 0 while the session is still open.
    pub fn duration_secs(&self) -> u64 {
        match self.ended_at {
            Some(end) => (end - self.started_at).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    pub fn duration_min(&self) -> u64 {
        self.duration_secs() / 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn open_session_has_no_end() {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let s = Session::open(BlockType::Focus, t0);
        assert!(s.is_open());
        assert_eq!(s.duration_secs(), 0);
    }

    #[test]
    fn duration_from_closed_session() {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let mut s = Session::open(BlockType::Break, t0);
        s.ended_at = Some(t0 + chrono::Duration::seconds(300));
        assert!(!s.is_open());
        assert_eq!(s.duration_secs(), 300);
        assert_eq!(s.duration_min(), 5);
    }
}
