/// Session: the complete state of a running game.
///
/// One `Session` value is the single source of truth. It is owned by the
/// game loop and passed by `&mut` to the operations in `flow` (phase
/// transitions) and `resolve` (flips and match resolution); nothing else
/// mutates it.
///
/// ## Time
///
/// The session keeps its own millisecond clock, advanced by the loop
/// once per tick. Delays (countdown, mismatch flip-back, finish, message
/// timeout) are `Deferred` tasks on the session scheduler, stamped with
/// the current `generation`. Every (re)start bumps the generation, so
/// tasks left over from an earlier game are ignored when they come due.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::TimingConfig;
use crate::domain::card::Card;
use crate::domain::deck::{self, ConfigurationError, Deck, DeckSpec};
use crate::domain::grade::Grade;
use super::particles::ParticleField;
use super::scheduler::Scheduler;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Start,
    Memorize,
    Play,
    End,
}

/// Face-up cards waiting to be compared. At most two, by construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Selection {
    #[default]
    Empty,
    One(usize),
    TwoPending(usize, usize),
}

impl Selection {
    /// Add a card. Returns None when two cards are already pending.
    pub fn push(self, index: usize) -> Option<Selection> {
        match self {
            Selection::Empty => Some(Selection::One(index)),
            Selection::One(first) => Some(Selection::TwoPending(first, index)),
            Selection::TwoPending(..) => None,
        }
    }

    pub fn is_full(self) -> bool {
        matches!(self, Selection::TwoPending(..))
    }
}

pub struct Session {
    // ── Board ──
    pub deck: Deck,
    pub spec: DeckSpec,

    // ── Timing config ──
    pub timing: TimingConfig,

    // ── State machine ──
    pub phase: Phase,
    pub memorize_remaining: u32,
    pub selection: Selection,
    pub input_locked: bool,

    // ── Score ──
    pub correct_count: u32,
    pub total_attempts: u32,
    pub matched_pairs: usize,
    pub score_text: String,
    pub grade: Option<Grade>,

    // ── UI ──
    pub message: String,
    pub message_token: u64,
    pub particles: ParticleField,
    /// Keyboard / gamepad selection: (row, col).
    pub cursor: (usize, usize),

    // ── Scheduling ──
    pub generation: u64,
    pub clock_ms: u64,
    pub scheduler: Scheduler,
    pub rng: ChaCha8Rng,
}

// ── Construction ──

impl Session {
    /// Validate the deck spec and build the first deck. The session waits
    /// in `Phase::Start` until `flow::start` is called.
    pub fn new(spec: DeckSpec, timing: TimingConfig, seed: Option<u64>) -> Result<Self, ConfigurationError> {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let deck = deck::build(&spec, &mut rng)?;
        Ok(Self::assemble(deck, spec, timing, rng))
    }

    /// Start from a prepared deck. Restarts still build from `spec`.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_deck(deck: Deck, spec: DeckSpec, timing: TimingConfig, seed: u64) -> Self {
        Self::assemble(deck, spec, timing, ChaCha8Rng::seed_from_u64(seed))
    }

    fn assemble(deck: Deck, spec: DeckSpec, timing: TimingConfig, rng: ChaCha8Rng) -> Self {
        let mut session = Session {
            deck,
            spec,
            memorize_remaining: timing.memorize_secs,
            timing,
            phase: Phase::Start,
            selection: Selection::Empty,
            input_locked: false,
            correct_count: 0,
            total_attempts: 0,
            matched_pairs: 0,
            score_text: String::new(),
            grade: None,
            message: String::new(),
            message_token: 0,
            particles: ParticleField::new(),
            cursor: (0, 0),
            generation: 0,
            clock_ms: 0,
            scheduler: Scheduler::new(),
            rng,
        };
        session.refresh_score();
        session
    }
}

// ── Queries ──

impl Session {
    pub fn cards(&self) -> &[Card] {
        self.deck.cards()
    }

    pub fn pair_count(&self) -> usize {
        self.deck.pair_count()
    }

    /// Recompute the "correct/attempts" score string.
    pub fn refresh_score(&mut self) {
        self.score_text = format!("{}/{}", self.correct_count, self.total_attempts);
    }

    pub fn timer_text(&self) -> String {
        match self.phase {
            Phase::Start => String::new(),
            Phase::Memorize => format!("Memorize: {}", self.memorize_remaining),
            Phase::Play => "Go! Find the pairs!".to_string(),
            Phase::End => "Finished".to_string(),
        }
    }

    pub fn phase_text(&self) -> &'static str {
        match self.phase {
            Phase::Start => "READY",
            Phase::Memorize => "MEMORIZE",
            Phase::Play => "PLAY",
            Phase::End => "COMPLETE",
        }
    }

    /// Would a flip request be considered at all right now?
    pub fn accepts_flips(&self) -> bool {
        self.phase == Phase::Play && !self.input_locked && !self.selection.is_full()
    }

    /// Card index under the cursor.
    pub fn cursor_index(&self) -> Option<usize> {
        self.deck.index_at(self.cursor.0, self.cursor.1)
    }
}

// ── Cursor ──

impl Session {
    /// Move the cursor, clamped to the board.
    pub fn move_cursor(&mut self, d_row: i32, d_col: i32) {
        let layout = self.deck.layout();
        if layout.rows == 0 || layout.cols == 0 { return; }
        let row = (self.cursor.0 as i32 + d_row).clamp(0, layout.rows as i32 - 1);
        let col = (self.cursor.1 as i32 + d_col).clamp(0, layout.cols as i32 - 1);
        self.cursor = (row as usize, col as usize);
    }
}

// ── Messages ──

impl Session {
    /// Show a message; returns the token a later clear must present.
    pub fn set_message(&mut self, msg: &str) -> u64 {
        self.message = msg.to_string();
        self.message_token += 1;
        self.message_token
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::domain::card::{CardFace, Suit};
    use crate::domain::deck::Layout;

    pub const A: CardFace = CardFace { suit: Suit::Spades, value: 1 };
    pub const B: CardFace = CardFace { suit: Suit::Hearts, value: 2 };

    pub fn timing() -> TimingConfig {
        TimingConfig {
            tick_rate_ms: 33,
            memorize_secs: 5,
            mismatch_delay_ms: 500,
            finish_delay_ms: 1000,
            message_ms: 2000,
        }
    }

    /// Unshuffled 2x2 board laid out A B / A B.
    pub fn two_pair_session() -> Session {
        let layout = Layout::new(2, 2);
        let deck = Deck::from_faces(&[A, B, A, B], layout).unwrap();
        let spec = DeckSpec { pair_count: 2, ..DeckSpec::standard(layout, false) };
        Session::with_deck(deck, spec, timing(), 1)
    }

    pub fn standard_session(seed: u64) -> Session {
        let spec = DeckSpec::standard(Layout::new(4, 5), true);
        Session::new(spec, timing(), Some(seed)).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::*;
    use crate::domain::deck::Layout;

    #[test]
    fn new_session_waits_at_start_with_cards_up() {
        let s = standard_session(3);
        assert_eq!(s.phase, Phase::Start);
        assert_eq!(s.cards().len(), 20);
        assert!(s.cards().iter().all(|c| c.flipped && !c.matched));
        assert_eq!(s.score_text, "0/0");
        assert!(!s.accepts_flips());
    }

    #[test]
    fn oversized_board_fails_at_construction() {
        let spec = DeckSpec::standard(Layout::new(6, 7), true);
        assert!(matches!(
            Session::new(spec, timing(), Some(0)),
            Err(ConfigurationError::NotEnoughIdentities { requested: 21, available: 20 })
        ));
    }

    #[test]
    fn selection_holds_at_most_two() {
        let s = Selection::Empty.push(3).unwrap();
        assert_eq!(s, Selection::One(3));
        let s = s.push(5).unwrap();
        assert_eq!(s, Selection::TwoPending(3, 5));
        assert!(s.is_full());
        assert_eq!(s.push(7), None);
    }

    #[test]
    fn cursor_is_clamped_to_board() {
        let mut s = two_pair_session();
        s.move_cursor(-1, -1);
        assert_eq!(s.cursor, (0, 0));
        s.move_cursor(5, 5);
        assert_eq!(s.cursor, (1, 1));
        assert_eq!(s.cursor_index(), Some(3));
    }

    #[test]
    fn same_seed_gives_same_deck() {
        let a = standard_session(42);
        let b = standard_session(42);
        let fa: Vec<_> = a.cards().iter().map(|c| c.face).collect();
        let fb: Vec<_> = b.cards().iter().map(|c| c.face).collect();
        assert_eq!(fa, fb);
    }

    #[test]
    fn message_tokens_increase() {
        let mut s = two_pair_session();
        let t1 = s.set_message("one");
        let t2 = s.set_message("two");
        assert!(t2 > t1);
        assert_eq!(s.message, "two");
    }
}
