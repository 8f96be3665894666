use crate::timer::BlockType;

/// User-facing text for the alert announcing a block. The block type is
/// the one the alert invites the user into, not the one that just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertContent {
    pub title: &'static str,
    pub body: &'static str,
}

impl AlertContent {
    pub fn for_block(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Focus => Self {
                title: "Time to focus!",
                body: "Your break is over. Time to get back to work.",
            },
            BlockType::Break => Self {
                title: "Break time!",
                body: "You've completed your focus session. Take a well-deserved break.",
            },
        }
    }
}
