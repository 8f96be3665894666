use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::BlockType;

/// Every controller transition produces an Event. Hosts render or
/// serialize these; subscribers receive snapshots separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BlockStarted {
        block_type: BlockType,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    BlockPaused {
        block_type: BlockType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    BlockReset {
        block_type: BlockType,
        at: DateTime<Utc>,
    },
    BlockCompleted {
        block_type: BlockType,
        next_block_type: BlockType,
        at: DateTime<Utc>,
    },
}
