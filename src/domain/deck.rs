/// Deck builder: picks unique card faces, pairs them, shuffles, and lays
/// them out row-major on the board.
///
/// Face selection draws random (suit, value) combinations and rejects
/// repeats. The number of draws is capped; when the request covers more
/// than half of the combination space, faces are drawn without replacement
/// instead so the rejection loop cannot stall.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use super::card::{Card, CardFace, Suit, SUITS, VALUES};

/// Rejection-sampling budget per requested pair.
const DRAWS_PER_PAIR: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("deck needs at least one pair")]
    NoPairs,
    #[error("suit and value alphabets must not be empty")]
    EmptyAlphabet,
    #[error("{requested} pairs requested but only {available} unique cards exist")]
    NotEnoughIdentities { requested: usize, available: usize },
    #[error("a {rows}x{cols} board cannot hold {cards} cards")]
    LayoutMismatch { rows: usize, cols: usize, cards: usize },
    #[error("gave up after collecting {collected} of {requested} unique faces")]
    SamplingExhausted { collected: usize, requested: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Layout {
    pub rows: usize,
    pub cols: usize,
}

impl Layout {
    pub fn new(rows: usize, cols: usize) -> Self {
        Layout { rows, cols }
    }

    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }
}

/// Everything needed to build one deck.
#[derive(Clone, Debug)]
pub struct DeckSpec {
    pub pair_count: usize,
    pub suits: Vec<Suit>,
    pub values: Vec<u8>,
    pub layout: Layout,
    pub shuffle: bool,
}

impl DeckSpec {
    /// Standard alphabet, one pair per two board cells.
    pub fn standard(layout: Layout, shuffle: bool) -> Self {
        DeckSpec {
            pair_count: layout.cells() / 2,
            suits: SUITS.to_vec(),
            values: VALUES.to_vec(),
            layout,
            shuffle,
        }
    }

    /// Check the deck description without drawing anything.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.pair_count == 0 {
            return Err(ConfigurationError::NoPairs);
        }
        let suits = unique(&self.suits);
        let values = unique(&self.values);
        if suits.is_empty() || values.is_empty() {
            return Err(ConfigurationError::EmptyAlphabet);
        }
        let available = suits.len() * values.len();
        if self.pair_count > available {
            return Err(ConfigurationError::NotEnoughIdentities {
                requested: self.pair_count,
                available,
            });
        }
        let cards = self.pair_count * 2;
        if self.layout.cells() != cards {
            return Err(ConfigurationError::LayoutMismatch {
                rows: self.layout.rows,
                cols: self.layout.cols,
                cards,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    layout: Layout,
}

impl Deck {
    /// Lay out an explicit face sequence row-major, without shuffling.
    pub fn from_faces(faces: &[CardFace], layout: Layout) -> Result<Self, ConfigurationError> {
        if faces.len() != layout.cells() {
            return Err(ConfigurationError::LayoutMismatch {
                rows: layout.rows,
                cols: layout.cols,
                cards: faces.len(),
            });
        }
        let cards = faces
            .iter()
            .enumerate()
            .map(|(i, &face)| Card::new(face, i / layout.cols, i % layout.cols))
            .collect();
        Ok(Deck { cards, layout })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn pair_count(&self) -> usize {
        self.len() / 2
    }

    /// Index of the card at (row, col), or None when off the board.
    pub fn index_at(&self, row: usize, col: usize) -> Option<usize> {
        if self.layout.contains(row, col) {
            Some(row * self.layout.cols + col)
        } else {
            None
        }
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn card_mut(&mut self, index: usize) -> Option<&mut Card> {
        self.cards.get_mut(index)
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count()
    }

    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }

    /// Turn every card face-up (memorize phase).
    pub fn reveal_all(&mut self) {
        for card in &mut self.cards {
            card.flipped = true;
        }
    }

    /// Turn every unmatched card face-down.
    pub fn hide_unmatched(&mut self) {
        for card in self.cards.iter_mut().filter(|c| !c.matched) {
            card.flipped = false;
        }
    }
}

/// Build a fresh deck: unique faces, two cards each, optional shuffle.
pub fn build<R: Rng + ?Sized>(spec: &DeckSpec, rng: &mut R) -> Result<Deck, ConfigurationError> {
    spec.validate()?;

    let faces = pick_faces(spec, rng)?;
    let mut paired: Vec<CardFace> = faces.iter().flat_map(|&f| [f, f]).collect();
    if spec.shuffle {
        paired.shuffle(rng);
    }
    Deck::from_faces(&paired, spec.layout)
}

/// Choose `pair_count` distinct faces from the suit × value space.
fn pick_faces<R: Rng + ?Sized>(spec: &DeckSpec, rng: &mut R) -> Result<Vec<CardFace>, ConfigurationError> {
    let suits = unique(&spec.suits);
    let values = unique(&spec.values);
    let space = suits.len() * values.len();
    let wanted = spec.pair_count;

    // Dense request: rejection would mostly redraw faces already taken
    if wanted * 2 > space {
        let mut all: Vec<CardFace> = suits
            .iter()
            .flat_map(|&s| values.iter().map(move |&v| CardFace::new(s, v)))
            .collect();
        let (chosen, _) = all.partial_shuffle(rng, wanted);
        return Ok(chosen.to_vec());
    }

    let mut seen = HashSet::with_capacity(wanted);
    let mut faces = Vec::with_capacity(wanted);
    let budget = wanted * DRAWS_PER_PAIR;
    for _ in 0..budget {
        let face = CardFace::new(
            suits[rng.gen_range(0..suits.len())],
            values[rng.gen_range(0..values.len())],
        );
        if seen.insert(face) {
            faces.push(face);
            if faces.len() == wanted {
                return Ok(faces);
            }
        }
    }

    Err(ConfigurationError::SamplingExhausted {
        collected: faces.len(),
        requested: wanted,
    })
}

/// Order-preserving dedup, so repeated alphabet entries can't yield
/// more than two cards per face.
fn unique<T: Copy + Eq + std::hash::Hash>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().copied().filter(|x| seen.insert(*x)).collect()
}
