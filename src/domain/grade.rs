/// End-of-game grading and the encouragement pool.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Grade {
    /// Every attempt was a match.
    Flawless,
    /// At least 70% of attempts matched.
    Strong,
    /// Anything below that.
    TryAgain,
}

impl Grade {
    /// Grade a finished game. No attempts counts as a perfect game.
    /// Ratios are compared in integers so the 0.7 boundary is exact.
    pub fn from_score(correct: u32, attempts: u32) -> Self {
        let (correct, attempts) = (correct as u64, attempts as u64);
        if attempts == 0 || correct == attempts {
            Grade::Flawless
        } else if correct * 10 >= attempts * 7 {
            Grade::Strong
        } else {
            Grade::TryAgain
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Grade::Flawless => "Incredible! Nobody can match a memory like yours!",
            Grade::Strong => "Great performance! Your memory is impressive!",
            Grade::TryAgain => "Nice try! Play again, you can do even better!",
        }
    }
}

/// Shown briefly after each successful match.
pub const ENCOURAGEMENTS: [&str; 10] = [
    "Wow, you're amazing!",
    "Keep going, you're the best!",
    "Brilliant, keep it up!",
    "Today's memory star!",
    "Superb recall, hats off!",
    "Flawless move!",
    "The brains of the operation!",
    "Memory maxed out!",
    "What a memory!",
    "Brain CPU overclocked!",
];
