/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame is composed into `front`, compared cell by cell with
/// `back` (the previous frame), and only changed cells are emitted.
/// Commands are batched with `queue!` and flushed once, then the
/// buffers swap. No full-screen redraws means no flicker.
///
/// Screen layout while a game is running:
///
///   row 0        HUD (score, timer, phase)
///   row 2..      board, one card per CARD_STEP_X × CARD_STEP_Y block
///   below board  message line, help line

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::card::Card;
use crate::domain::grade::Grade;
use crate::sim::particles::Particle;
use crate::sim::session::{Phase, Session};

// ── Cell: the unit of the frame buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" cell, also used for Clear,
    /// so row gaps on VTE terminals match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 40, b: 30 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never produced by composition; filling `back` with it forces a
    /// full repaint.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Self::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y), one column per char, clipped at the edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Layout constants ──

const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;
const BOARD_COL: usize = 2;

const CARD_W: usize = 7;
const CARD_H: usize = 5;
const CARD_STEP_X: usize = CARD_W + 1;
const CARD_STEP_Y: usize = CARD_H;

// ── Palette ──

const FELT_TEXT: Color = Color::Rgb { r: 220, g: 230, b: 220 };
const DIM: Color = Color::Rgb { r: 110, g: 140, b: 120 };
const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const CARD_FACE: Color = Color::Rgb { r: 240, g: 238, b: 228 };
const CARD_BACK: Color = Color::Rgb { r: 40, g: 70, b: 150 };
const CARD_BACK_PATTERN: Color = Color::Rgb { r: 90, g: 120, b: 200 };
const SUIT_RED: Color = Color::Rgb { r: 210, g: 40, b: 40 };
const SUIT_BLACK: Color = Color::Rgb { r: 30, g: 30, b: 30 };
const FRAME: Color = Color::Rgb { r: 120, g: 120, b: 120 };
const MATCHED_FRAME: Color = Color::Rgb { r: 60, g: 220, b: 90 };
const CURSOR_FRAME: Color = GOLD;

const PARTICLE_PALETTE: [Color; 5] = [
    Color::Rgb { r: 255, g: 215, b: 0 },
    Color::Rgb { r: 255, g: 105, b: 180 },
    Color::Rgb { r: 0, g: 191, b: 255 },
    Color::Rgb { r: 124, g: 252, b: 0 },
    Color::Rgb { r: 255, g: 140, b: 0 },
];

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Terminal cell → board grid (x = column, y = row). None for clicks
    /// outside any card rectangle; the board's own bounds are checked by
    /// the flip request.
    pub fn hit_test(col: u16, row: u16) -> Option<(usize, usize)> {
        let dx = (col as usize).checked_sub(BOARD_COL)?;
        let dy = (row as usize).checked_sub(BOARD_ROW)?;
        if dx % CARD_STEP_X >= CARD_W || dy % CARD_STEP_Y >= CARD_H {
            return None;
        }
        Some((dx / CARD_STEP_X, dy / CARD_STEP_Y))
    }

    fn sync_size(&mut self, force: bool) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let changed = tw as usize != self.term_w || th as usize != self.term_h;
        if changed || force {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.invalidate();
        }
        changed
    }

    pub fn render(&mut self, s: &Session) -> io::Result<()> {
        let resized = self.sync_size(false);
        let phase_changed = self.last_phase != Some(s.phase);
        if resized || phase_changed {
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(s.phase);
        }

        self.front.clear();
        match s.phase {
            Phase::Start => self.compose_start(s),
            Phase::Memorize | Phase::Play => self.compose_game(s),
            Phase::End => self.compose_end(s),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        // Terminal cursor position after the last Print, if known.
        let mut at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_start(&mut self, s: &Session) {
        let banner = [
            "╔══════════════════════════════════╗",
            "║      ♠ ♥  M E M F L I P  ♣ ♦     ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, line) in banner.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, GOLD, Color::Reset);
        }

        let layout = s.deck.layout();
        let rules = [
            format!("{} pairs are dealt face up on a {}×{} board.", s.pair_count(), layout.rows, layout.cols),
            format!("You have {} seconds to memorize them.", s.timing.memorize_secs),
            "Then they turn over. Flip two at a time to find pairs.".to_string(),
            "Score is correct pairs / attempts.".to_string(),
        ];
        for (i, line) in rules.iter().enumerate() {
            self.front.put_str(6, 7 + i, line, FELT_TEXT, Color::Reset);
        }

        self.front.put_str(6, 13, "▸ ENTER: Start", MATCHED_FRAME, Color::Reset);
        self.front.put_str(6, 14, "▸ Q / ESC: Quit", DIM, Color::Reset);
    }

    fn compose_game(&mut self, s: &Session) {
        let layout = s.deck.layout();

        // HUD
        let hud = format!(
            " Score: {:<7} Pairs: {}/{}   {}",
            s.score_text,
            s.deck.matched_count() / 2,
            s.pair_count(),
            s.timer_text(),
        );
        self.front.put_str(0, HUD_ROW, &hud, FELT_TEXT, Color::Reset);
        let tag = format!("[{}]", s.phase_text());
        let tag_x = self.front.width.saturating_sub(tag.chars().count() + 1);
        self.front.put_str(tag_x, HUD_ROW, &tag, GOLD, Color::Reset);

        // Board
        let cursor = if s.phase == Phase::Play { s.cursor_index() } else { None };
        for (i, card) in s.cards().iter().enumerate() {
            self.compose_card(card, cursor == Some(i));
        }

        if !s.particles.is_empty() {
            for p in &s.particles.particles {
                self.compose_particle(p);
            }
        }

        // Message and help below the board
        let below = BOARD_ROW + layout.rows * CARD_STEP_Y;
        if !s.message.is_empty() {
            let msg = format!(" ★ {} ★", s.message);
            self.front.put_str(BOARD_COL, below, &msg, GOLD, Color::Reset);
        }
        let help = match s.phase {
            Phase::Memorize => " Memorize the cards…   R: Restart   Q: Quit",
            _ => " ←↑↓→/WASD: Move   SPACE/ENTER/Click: Flip   R: Restart   Q: Quit",
        };
        self.front.put_str(0, below + 1, help, DIM, Color::Reset);
    }

    fn compose_card(&mut self, card: &Card, under_cursor: bool) {
        let x = BOARD_COL + card.col * CARD_STEP_X;
        let y = BOARD_ROW + card.row * CARD_STEP_Y;

        let frame = if under_cursor {
            CURSOR_FRAME
        } else if card.matched {
            MATCHED_FRAME
        } else {
            FRAME
        };
        let face_up = card.flipped || card.matched;
        let inner = if face_up { CARD_FACE } else { CARD_BACK };

        // Border
        let horiz = "─".repeat(CARD_W - 2);
        self.front.put_str(x, y, &format!("╭{horiz}╮"), frame, inner);
        self.front.put_str(x, y + CARD_H - 1, &format!("╰{horiz}╯"), frame, inner);
        for row in y + 1..y + CARD_H - 1 {
            self.front.set(x, row, Cell::new('│', frame, inner));
            self.front.set(x + CARD_W - 1, row, Cell::new('│', frame, inner));
        }
        self.front.fill_rect(x + 1, y + 1, CARD_W - 2, CARD_H - 2, inner);

        if face_up {
            let ink = if card.face.suit.is_red() { SUIT_RED } else { SUIT_BLACK };
            let symbol = Cell::new(card.face.suit.symbol(), ink, inner);
            match pip_layout(card.face.value) {
                Some(pips) => {
                    for &(col, row) in pips {
                        self.front.set(x + 1 + col, y + 1 + row, symbol);
                    }
                }
                None => {
                    self.front.put_str(x + 1, y + 1, &card.face.value.to_string(), ink, inner);
                    self.front.set(x + CARD_W / 2, y + CARD_H / 2, symbol);
                }
            }
        } else {
            for row in y + 1..y + CARD_H - 1 {
                for col in x + 1..x + CARD_W - 1 {
                    let ch = if (row + col) % 2 == 0 { '▚' } else { '▞' };
                    self.front.set(col, row, Cell::new(ch, CARD_BACK_PATTERN, inner));
                }
            }
            self.front.set(x + CARD_W / 2, y + CARD_H / 2, Cell::new('?', CARD_FACE, inner));
        }
    }

    /// Particles live in grid units; one unit is one card step.
    fn compose_particle(&mut self, p: &Particle) {
        let sx = BOARD_COL as f32 + p.x * CARD_STEP_X as f32;
        let sy = BOARD_ROW as f32 + p.y * CARD_STEP_Y as f32;
        if sx < 0.0 || sy < 0.0 { return; }

        let glyph = match p.size * p.fade() {
            v if v > 0.5 => '●',
            v if v > 0.2 => '•',
            _ => '·',
        };
        let color = PARTICLE_PALETTE[p.color as usize % PARTICLE_PALETTE.len()];
        let (x, y) = (sx as usize, sy as usize);
        let bg = self.front.get(x, y).bg;
        self.front.set(x, y, Cell::new(glyph, color, bg));
    }

    fn compose_end(&mut self, s: &Session) {
        let banner = [
            "╔══════════════════════════════════╗",
            "║      ★  ALL PAIRS FOUND!  ★      ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, line) in banner.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, GOLD, Color::Reset);
        }

        let grade = s.grade.unwrap_or(Grade::from_score(s.correct_count, s.total_attempts));
        let score = format!("◈ Final score: {}", s.score_text);
        self.front.put_str(6, 7, &score, FELT_TEXT, Color::Reset);
        self.front.put_str(6, 9, grade.message(), MATCHED_FRAME, Color::Reset);

        self.front.put_str(6, 12, "▸ R / ENTER: Play again", MATCHED_FRAME, Color::Reset);
        self.front.put_str(6, 13, "▸ Q / ESC: Quit", DIM, Color::Reset);
    }
}

/// Dice-style pip positions (col, row) inside the 5×3 card interior.
/// Values without a layout get a number plus a single pip.
fn pip_layout(value: u8) -> Option<&'static [(usize, usize)]> {
    const ONE: &[(usize, usize)] = &[(2, 1)];
    const TWO: &[(usize, usize)] = &[(2, 0), (2, 2)];
    const THREE: &[(usize, usize)] = &[(2, 0), (1, 2), (3, 2)];
    const FOUR: &[(usize, usize)] = &[(1, 0), (3, 0), (1, 2), (3, 2)];
    const FIVE: &[(usize, usize)] = &[(1, 0), (3, 0), (2, 1), (1, 2), (3, 2)];
    match value {
        1 => Some(ONE),
        2 => Some(TWO),
        3 => Some(THREE),
        4 => Some(FOUR),
        5 => Some(FIVE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{CardFace, Suit};

    fn face_up_card(value: u8) -> Card {
        let mut card = Card::new(CardFace::new(Suit::Hearts, value), 0, 0);
        card.flipped = true;
        card
    }

    fn count_glyph(fb: &FrameBuffer, ch: char) -> usize {
        fb.cells.iter().filter(|c| c.ch == ch).count()
    }

    #[test]
    fn card_face_shows_one_pip_per_value() {
        for value in 1..=5u8 {
            let mut r = Renderer::new();
            r.front = FrameBuffer::new(20, 10);
            r.compose_card(&face_up_card(value), false);
            assert_eq!(count_glyph(&r.front, '♥'), value as usize, "value {value}");
        }
    }

    #[test]
    fn pips_stay_inside_the_card_frame() {
        for value in 1..=5u8 {
            let pips = pip_layout(value).unwrap();
            assert!(pips.iter().all(|&(c, r)| c < CARD_W - 2 && r < CARD_H - 2));
        }
        assert!(pip_layout(6).is_none());
    }

    #[test]
    fn face_down_card_hides_its_suit() {
        let mut r = Renderer::new();
        r.front = FrameBuffer::new(20, 10);
        let mut card = face_up_card(5);
        card.flipped = false;
        r.compose_card(&card, false);
        assert_eq!(count_glyph(&r.front, '♥'), 0);
        assert_eq!(count_glyph(&r.front, '?'), 1);
    }

    #[test]
    fn hit_test_maps_card_rectangles_to_grid() {
        assert_eq!(Renderer::hit_test(BOARD_COL as u16, BOARD_ROW as u16), Some((0, 0)));
        let x = (BOARD_COL + 2 * CARD_STEP_X + 3) as u16;
        let y = (BOARD_ROW + 3 * CARD_STEP_Y + 4) as u16;
        assert_eq!(Renderer::hit_test(x, y), Some((2, 3)));
    }

    #[test]
    fn hit_test_misses_gutters_and_margins() {
        assert_eq!(Renderer::hit_test(0, BOARD_ROW as u16), None);
        assert_eq!(Renderer::hit_test(BOARD_COL as u16, 0), None);
        let gutter = (BOARD_COL + CARD_W) as u16;
        assert_eq!(Renderer::hit_test(gutter, BOARD_ROW as u16), None);
    }

    #[test]
    fn put_str_clips_at_right_edge() {
        let mut fb = FrameBuffer::new(4, 1);
        fb.put_str(2, 0, "abcd", Color::White, Color::Reset);
        assert_eq!(fb.get(2, 0).ch, 'a');
        assert_eq!(fb.get(3, 0).ch, 'b');
        assert_eq!(fb.get(3, 0).bg, Cell::BASE_BG);
    }
}
