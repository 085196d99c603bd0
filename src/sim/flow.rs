/// Phase transitions: Start → Memorize → Play → End, and restart.
///
/// Order of work in `advance`:
///   1. Advance the session clock
///   2. Tick particles
///   3. Run every deferred task that has come due, oldest first
///      (tasks from an older generation are dropped unseen)

use tracing::{debug, info};

use crate::domain::deck::{self, ConfigurationError};
use crate::domain::grade::Grade;
use super::event::GameEvent;
use super::scheduler::{Deferred, DueTask};
use super::session::{Phase, Selection, Session};

const COUNTDOWN_STEP_MS: u64 = 1000;

// ══════════════════════════════════════════════════════════════
// Commands
// ══════════════════════════════════════════════════════════════

/// Start command. Only meaningful on the start screen.
pub fn start(s: &mut Session) -> Vec<GameEvent> {
    let mut events = vec![];
    if s.phase != Phase::Start { return events; }
    begin_memorize(s, &mut events);
    events
}

/// Restart command: new deck, fresh score, countdown again.
/// Valid in every phase; anything still scheduled for the old game is
/// cancelled and its generation retired.
pub fn restart(s: &mut Session) -> Result<Vec<GameEvent>, ConfigurationError> {
    let deck = deck::build(&s.spec, &mut s.rng)?;
    s.deck = deck;
    s.cursor = (0, 0);
    info!(generation = s.generation + 1, "restarting with a new deck");

    let mut events = vec![];
    begin_memorize(s, &mut events);
    Ok(events)
}

// ══════════════════════════════════════════════════════════════
// Clock
// ══════════════════════════════════════════════════════════════

/// Advance the session by `elapsed_ms` and run whatever came due.
pub fn advance(s: &mut Session, elapsed_ms: u64) -> Vec<GameEvent> {
    let mut events = vec![];
    s.clock_ms = s.clock_ms.saturating_add(elapsed_ms);
    s.particles.update();

    while let Some(due) = s.scheduler.pop_due(s.clock_ms) {
        if due.generation != s.generation {
            debug!(task = ?due.task, stale = due.generation, current = s.generation, "dropping stale task");
            continue;
        }
        run_task(s, due, &mut events);
    }
    events
}

fn run_task(s: &mut Session, due: DueTask, events: &mut Vec<GameEvent>) {
    match due.task {
        Deferred::CountdownTick => countdown_tick(s, due.due_ms, events),
        Deferred::HidePair { first, second } => hide_pair(s, first, second, events),
        Deferred::Finish => finish(s, events),
        Deferred::ClearMessage { token } => {
            if token == s.message_token {
                s.message.clear();
            }
        }
    }
}

/// Schedule a task for the current game.
pub(crate) fn schedule(s: &mut Session, delay_ms: u64, task: Deferred) {
    s.scheduler.schedule(s.clock_ms, delay_ms, s.generation, task);
}

// ══════════════════════════════════════════════════════════════
// Transitions
// ══════════════════════════════════════════════════════════════

/// Reset the game and enter the memorize countdown.
fn begin_memorize(s: &mut Session, events: &mut Vec<GameEvent>) {
    s.generation += 1;
    if !s.scheduler.is_empty() {
        debug!(cancelled = s.scheduler.len(), "cancelling tasks from the previous game");
    }
    s.scheduler.cancel_all();

    s.correct_count = 0;
    s.total_attempts = 0;
    s.matched_pairs = 0;
    s.grade = None;
    s.selection = Selection::Empty;
    s.input_locked = false;
    s.message.clear();
    s.particles.clear();
    s.refresh_score();

    s.deck.reveal_all();
    s.memorize_remaining = s.timing.memorize_secs;
    s.phase = Phase::Memorize;
    events.push(GameEvent::MemorizeStarted);
    info!(generation = s.generation, pairs = s.pair_count(), "memorize phase started");

    if s.memorize_remaining == 0 {
        begin_play(s, events);
    } else {
        schedule(s, COUNTDOWN_STEP_MS, Deferred::CountdownTick);
    }
}

fn countdown_tick(s: &mut Session, due_ms: u64, events: &mut Vec<GameEvent>) {
    if s.phase != Phase::Memorize { return; }

    s.memorize_remaining = s.memorize_remaining.saturating_sub(1);
    events.push(GameEvent::CountdownTick { remaining: s.memorize_remaining });

    if s.memorize_remaining == 0 {
        begin_play(s, events);
    } else {
        // Anchor to the deadline, not the tick that noticed it, so the
        // countdown doesn't drift with the frame rate
        s.scheduler.schedule(due_ms, COUNTDOWN_STEP_MS, s.generation, Deferred::CountdownTick);
    }
}

fn begin_play(s: &mut Session, events: &mut Vec<GameEvent>) {
    s.deck.hide_unmatched();
    s.input_locked = false;
    s.phase = Phase::Play;
    events.push(GameEvent::PlayStarted);
    info!(generation = s.generation, "play phase started");
}

/// Mismatch display time is over: both cards go back face-down.
fn hide_pair(s: &mut Session, first: usize, second: usize, events: &mut Vec<GameEvent>) {
    if s.phase != Phase::Play { return; }

    for idx in [first, second] {
        if let Some(card) = s.deck.card_mut(idx) {
            if !card.matched {
                card.flipped = false;
            }
        }
    }
    s.input_locked = false;
    events.push(GameEvent::PairHidden { first, second });
}

fn finish(s: &mut Session, events: &mut Vec<GameEvent>) {
    if s.phase != Phase::Play { return; }

    let grade = Grade::from_score(s.correct_count, s.total_attempts);
    s.grade = Some(grade);
    s.phase = Phase::End;
    events.push(GameEvent::GameFinished { grade });
    info!(score = %s.score_text, ?grade, "game finished");
}
