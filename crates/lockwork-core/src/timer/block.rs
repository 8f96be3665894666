use serde::{Deserialize, Serialize};

/// The two kinds of timed block. The cycle is a fixed 2-cycle:
/// Focus alternates with Break indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Focus,
    Break,
}

impl BlockType {
    /// The block type that follows this one in the cycle.
    pub fn next(self) -> BlockType {
        match self {
            BlockType::Focus => BlockType::Break,
            BlockType::Break => BlockType::Focus,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BlockType::Focus => "Focus",
            BlockType::Break => "Break",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Focus => "focus",
            BlockType::Break => "break",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<BlockType> {
        match s {
            "focus" => Some(BlockType::Focus),
            "break" => Some(BlockType::Break),
            _ => None,
        }
    }
}
