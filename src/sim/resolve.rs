/// Flip requests and match resolution.
///
/// A flip is accepted only in `Phase::Play`, with input unlocked and
/// fewer than two cards pending. Off-board, matched or already face-up
/// targets are ignored. When the second card turns over the pair is
/// resolved immediately:
///
///   match    → both cards matched, input stays open, celebration
///   mismatch → input locked until the flip-back task runs

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::domain::grade::ENCOURAGEMENTS;
use super::event::GameEvent;
use super::flow::schedule;
use super::scheduler::Deferred;
use super::session::{Selection, Session};

/// Pointer input: flip the card at grid column `x`, row `y`.
pub fn request_flip(s: &mut Session, x: usize, y: usize) -> Vec<GameEvent> {
    let mut events = vec![];
    if !s.accepts_flips() { return events; }

    let index = match s.deck.index_at(y, x) {
        Some(i) => i,
        None => return events,
    };
    flip(s, index, &mut events);
    events
}

/// Keyboard / gamepad input: flip the card under the cursor.
pub fn flip_at_cursor(s: &mut Session) -> Vec<GameEvent> {
    let (row, col) = s.cursor;
    request_flip(s, col, row)
}

fn flip(s: &mut Session, index: usize, events: &mut Vec<GameEvent>) {
    let card = match s.deck.card_mut(index) {
        Some(c) if c.is_selectable() => c,
        _ => return,
    };
    let next = match s.selection.push(index) {
        Some(sel) => sel,
        None => return,
    };

    card.flipped = true;
    s.selection = next;
    events.push(GameEvent::CardFlipped { index });

    if s.selection.is_full() {
        resolve_pair(s, events);
    }
}

/// Compare the two pending cards. Runs exactly once per pair.
fn resolve_pair(s: &mut Session, events: &mut Vec<GameEvent>) {
    let (first, second) = match std::mem::take(&mut s.selection) {
        Selection::TwoPending(a, b) => (a, b),
        other => {
            s.selection = other;
            return;
        }
    };

    s.input_locked = true;
    s.total_attempts += 1;
    s.refresh_score();

    let (is_match, face) = match (s.deck.card(first), s.deck.card(second)) {
        (Some(a), Some(b)) => (a.matches(b), a.face.label()),
        _ => (false, String::new()),
    };

    if is_match {
        for idx in [first, second] {
            if let Some(card) = s.deck.card_mut(idx) {
                card.matched = true;
            }
        }
        s.matched_pairs += 1;
        s.correct_count += 1;
        s.refresh_score();
        events.push(GameEvent::PairMatched { first, second });
        celebrate(s);
        s.input_locked = false;
        info!(first, second, %face, score = %s.score_text, "pair matched");

        if s.deck.all_matched() {
            events.push(GameEvent::AllPairsMatched);
            let delay = s.timing.finish_delay_ms;
            schedule(s, delay, Deferred::Finish);
        }
    } else {
        events.push(GameEvent::PairMismatched { first, second });
        let delay = s.timing.mismatch_delay_ms;
        schedule(s, delay, Deferred::HidePair { first, second });
        debug!(first, second, score = %s.score_text, "pair mismatched");
    }
}

/// Encouragement message plus a particle burst at the board centre.
fn celebrate(s: &mut Session) {
    let msg = ENCOURAGEMENTS.choose(&mut s.rng).copied().unwrap_or_default();
    let token = s.set_message(msg);
    let delay = s.timing.message_ms;
    schedule(s, delay, Deferred::ClearMessage { token });

    let layout = s.deck.layout();
    let (cx, cy) = (layout.cols as f32 / 2.0, layout.rows as f32 / 2.0);
    s.particles.burst(cx, cy, &mut s.rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grade::Grade;
    use crate::sim::flow::{advance, restart, start};
    use crate::sim::session::test_support::*;
    use crate::sim::session::Phase;

    // Board for two_pair_session():
    //   (x=0,y=0) A   (x=1,y=0) B
    //   (x=0,y=1) A   (x=1,y=1) B

    fn playing() -> Session {
        let mut s = two_pair_session();
        start(&mut s);
        advance(&mut s, 5000);
        assert_eq!(s.phase, Phase::Play);
        s
    }

    fn face_down_unmatched(s: &Session) -> usize {
        s.cards().iter().filter(|c| !c.flipped && !c.matched).count()
    }

    #[test]
    fn flips_ignored_outside_play() {
        let mut s = two_pair_session();
        assert!(request_flip(&mut s, 0, 0).is_empty()); // Start
        start(&mut s);
        assert!(request_flip(&mut s, 0, 0).is_empty()); // Memorize
        assert_eq!(s.selection, Selection::Empty);
        assert_eq!(s.total_attempts, 0);
    }

    #[test]
    fn out_of_bounds_flip_is_a_no_op() {
        let mut s = playing();
        assert!(request_flip(&mut s, 2, 0).is_empty());
        assert!(request_flip(&mut s, 0, 2).is_empty());
        assert_eq!(s.selection, Selection::Empty);
        assert_eq!(face_down_unmatched(&s), 4);
    }

    #[test]
    fn flipping_a_face_up_card_again_is_ignored() {
        let mut s = playing();
        request_flip(&mut s, 0, 0);
        assert!(request_flip(&mut s, 0, 0).is_empty());
        assert_eq!(s.selection, Selection::One(0));
        assert_eq!(s.total_attempts, 0);
    }

    #[test]
    fn first_flip_only_buffers() {
        let mut s = playing();
        let events = request_flip(&mut s, 1, 0);
        assert_eq!(events, vec![GameEvent::CardFlipped { index: 1 }]);
        assert!(s.cards()[1].flipped);
        assert_eq!(s.selection, Selection::One(1));
        assert!(!s.input_locked);
    }

    #[test]
    fn matching_pair_resolves_once_and_stays_matched() {
        let mut s = playing();
        request_flip(&mut s, 0, 0);
        let events = request_flip(&mut s, 0, 1);
        assert_eq!(
            events,
            vec![
                GameEvent::CardFlipped { index: 2 },
                GameEvent::PairMatched { first: 0, second: 2 },
            ]
        );
        assert_eq!(s.total_attempts, 1);
        assert_eq!(s.correct_count, 1);
        assert_eq!(s.matched_pairs, 1);
        assert_eq!(s.score_text, "1/1");
        assert_eq!(s.selection, Selection::Empty);
        assert!(!s.input_locked);
        assert!(s.cards()[0].matched && s.cards()[2].matched);
        assert!(ENCOURAGEMENTS.contains(&s.message.as_str()));
        assert!(!s.particles.is_empty());

        // Matched cards ignore further flips and never revert
        assert!(request_flip(&mut s, 0, 0).is_empty());
        advance(&mut s, 10_000);
        assert!(s.cards()[0].matched && s.cards()[0].flipped);
    }

    #[test]
    fn mismatch_locks_input_then_flips_back() {
        let mut s = playing();
        request_flip(&mut s, 0, 0);
        let events = request_flip(&mut s, 1, 0);
        assert_eq!(events.last(), Some(&GameEvent::PairMismatched { first: 0, second: 1 }));
        assert_eq!(s.total_attempts, 1);
        assert_eq!(s.correct_count, 0);
        assert_eq!(s.score_text, "0/1");
        assert_eq!(s.selection, Selection::Empty);
        assert!(s.input_locked);
        assert!(s.cards()[0].flipped && s.cards()[1].flipped);

        // Locked: a third card cannot be turned
        assert!(request_flip(&mut s, 0, 1).is_empty());
        assert!(!s.cards()[2].flipped);

        assert!(advance(&mut s, 499).is_empty());
        let events = advance(&mut s, 1);
        assert_eq!(events, vec![GameEvent::PairHidden { first: 0, second: 1 }]);
        assert!(!s.input_locked);
        assert!(!s.cards()[0].flipped && !s.cards()[1].flipped);
        assert!(!s.cards()[0].matched && !s.cards()[1].matched);
    }

    #[test]
    fn clearing_the_board_finishes_after_delay() {
        let mut s = playing();
        request_flip(&mut s, 0, 0);
        request_flip(&mut s, 0, 1);
        assert_eq!(s.matched_pairs, 1);
        request_flip(&mut s, 1, 0);
        let events = request_flip(&mut s, 1, 1);
        assert_eq!(s.matched_pairs, 2);
        assert_eq!(events.last(), Some(&GameEvent::AllPairsMatched));
        assert_eq!(s.phase, Phase::Play);

        assert!(advance(&mut s, 999).iter().all(|e| !matches!(e, GameEvent::GameFinished { .. })));
        let events = advance(&mut s, 1);
        assert_eq!(events, vec![GameEvent::GameFinished { grade: Grade::Flawless }]);
        assert_eq!(s.phase, Phase::End);
        assert_eq!(s.grade, Some(Grade::Flawless));
        assert!(s.deck.all_matched());
    }

    #[test]
    fn grade_reflects_misses() {
        let mut s = playing();
        // miss, then clear the board: 2 correct of 3
        request_flip(&mut s, 0, 0);
        request_flip(&mut s, 1, 0);
        advance(&mut s, 500);
        request_flip(&mut s, 0, 0);
        request_flip(&mut s, 0, 1);
        request_flip(&mut s, 1, 0);
        request_flip(&mut s, 1, 1);
        advance(&mut s, 1000);
        assert_eq!(s.score_text, "2/3");
        assert_eq!(s.grade, Some(Grade::TryAgain)); // 2/3 is under 0.7
    }

    #[test]
    fn correct_never_exceeds_attempts() {
        let mut s = standard_session(21);
        start(&mut s);
        advance(&mut s, 5000);
        // Sweep the board in reading order, letting flip-backs run
        for _ in 0..40 {
            for y in 0..4 {
                for x in 0..5 {
                    request_flip(&mut s, x, y);
                    assert!(s.correct_count <= s.total_attempts);
                    advance(&mut s, 500);
                }
            }
        }
        assert!(s.correct_count <= s.total_attempts);
    }

    #[test]
    fn restart_during_mismatch_delay_keeps_new_deck_revealed() {
        let mut s = playing();
        request_flip(&mut s, 0, 0);
        request_flip(&mut s, 1, 0);
        assert!(s.input_locked);

        restart(&mut s).unwrap();
        assert_eq!(s.phase, Phase::Memorize);
        assert!(!s.input_locked);

        // The old flip-back was due 500 ms after the mismatch
        let events = advance(&mut s, 600);
        assert!(events.iter().all(|e| !matches!(e, GameEvent::PairHidden { .. })));
        assert!(s.cards().iter().all(|c| c.flipped));
    }

    fn clear_board(s: &mut Session) {
        request_flip(s, 0, 0);
        request_flip(s, 0, 1);
        request_flip(s, 1, 0);
        request_flip(s, 1, 1);
    }

    #[test]
    fn flips_ignored_after_the_game_ends() {
        let mut s = playing();
        clear_board(&mut s);
        advance(&mut s, 1000);
        assert_eq!(s.phase, Phase::End);

        assert!(request_flip(&mut s, 0, 0).is_empty());
        assert!(flip_at_cursor(&mut s).is_empty());
        assert_eq!(s.total_attempts, 2);
        assert_eq!(s.selection, Selection::Empty);
    }

    #[test]
    fn restart_during_finish_delay_never_reaches_end() {
        let mut s = playing();
        clear_board(&mut s);
        assert_eq!(s.phase, Phase::Play);

        restart(&mut s).unwrap();
        assert_eq!(s.phase, Phase::Memorize);

        // The old finish was due 1000 ms after the last match
        let events = advance(&mut s, 1000);
        assert!(events.iter().all(|e| !matches!(e, GameEvent::GameFinished { .. })));
        assert_eq!(s.phase, Phase::Memorize);
        assert_eq!(s.grade, None);
        assert_eq!(s.total_attempts, 0);
    }

    #[test]
    fn cursor_flip_targets_cursor_cell() {
        let mut s = playing();
        s.move_cursor(1, 1);
        let events = flip_at_cursor(&mut s);
        assert_eq!(events, vec![GameEvent::CardFlipped { index: 3 }]);
    }
}
