mod block;
mod controller;
mod engine;

pub use block::BlockType;
pub use controller::{BlockCycleController, Collaborators, CycleState, SnapshotObserver};
pub use engine::{BlockTimer, CompletionEvent, Phase, TimerSnapshot};
