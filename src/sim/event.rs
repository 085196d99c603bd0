/// Events emitted by session operations.
/// The presentation layer consumes these for sound; nothing waits on them.

use crate::domain::grade::Grade;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    MemorizeStarted,
    CountdownTick { remaining: u32 },
    PlayStarted,
    CardFlipped { index: usize },
    PairMatched { first: usize, second: usize },
    PairMismatched { first: usize, second: usize },
    /// A mismatched pair was turned back face-down.
    PairHidden { first: usize, second: usize },
    AllPairsMatched,
    GameFinished { grade: Grade },
}
