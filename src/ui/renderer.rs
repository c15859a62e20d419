/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screens: animal grid (title), field + HUD, pause overlay, win summary.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableFocusChange, EnableFocusChange},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::proximity::Tier;
use crate::sim::round::RoundController;
use crate::sim::world::{Screen, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16],  // up to 16 bytes (emoji with variation selectors)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // occupies 2 terminal columns
    cont: bool,    // right half of a wide cell (skip render)
}

impl Cell {
    /// Explicit background for every "empty" cell, matching the Clear
    /// colour so no gaps show between rows.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 26, b: 18 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Never equal to a real cell; forces a full repaint.
    const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    /// Wide cell from a (possibly multi-codepoint) glyph string.
    fn from_str_wide(s: &str, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let mut len = s.len().min(16);
        while !s.is_char_boundary(len) { len -= 1; }
        cell.ch[..len].copy_from_slice(&s.as_bytes()[..len]);
        cell.ch_len = len as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
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
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
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

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    /// Wide glyph at (x, y) plus its continuation cell.
    fn put_wide(&mut self, x: usize, y: usize, glyph: &str, fg: Color, bg: Color) {
        if x + 1 >= self.width { return; }
        self.set(x, y, Cell::from_str_wide(glyph, fg, bg));
        let mut cont = Cell::WIDE_CONT;
        cont.bg = Cell::norm_bg(bg);
        self.set(x + 1, y, cont);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 30, g: 40, b: 30 };
const GRASS_BG: Color = Color::Rgb { r: 34, g: 80, b: 34 };
const GRASS_FG: Color = Color::Rgb { r: 60, g: 120, b: 50 };
const FAINT_FG: Color = Color::Rgb { r: 70, g: 104, b: 62 };
const HOVER_FG: Color = Color::Rgb { r: 200, g: 230, b: 160 };
const POINTER_FG: Color = Color::Rgb { r: 255, g: 230, b: 80 };
const TITLE_FG: Color = Color::Rgb { r: 255, g: 200, b: 80 };
const HI: Color = Color::Rgb { r: 120, g: 255, b: 120 };
const DIM: Color = Color::DarkGrey;
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::VeryHot => Color::Rgb { r: 255, g: 60, b: 40 },
        Tier::Hot     => Color::Rgb { r: 255, g: 150, b: 40 },
        Tier::Warm    => Color::Rgb { r: 240, g: 220, b: 80 },
        Tier::Cold    => Color::Rgb { r: 90, g: 160, b: 255 },
    }
}

/// Stable grass texture per cell.
fn grass_char(x: usize, y: usize) -> char {
    match (x.wrapping_mul(7) ^ y.wrapping_mul(13)) % 11 {
        0 => '"',
        3 => ',',
        7 => '\'',
        _ => ' ',
    }
}

// ── Renderer ──

/// Each field cell is 2 terminal columns wide.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const FIELD_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableFocusChange,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableFocusChange,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, round: &RoundController) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_screen != Some(world.screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(world.screen);
        }

        self.front.clear();

        match world.screen {
            Screen::Title => self.compose_title(world, round),
            Screen::Field => self.compose_field(world, round),
            Screen::Paused => {
                self.compose_field(world, round);
                self.compose_pause_overlay(world);
            }
            Screen::Summary => self.compose_summary(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the
        // terminal default and leave seams.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Title: animal grid ──

    fn compose_title(&mut self, w: &WorldState, round: &RoundController) {
        let banner = [
            "╔══════════════════════════════════╗",
            "║    H I D D E N   A N I M A L S   ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, line) in banner.iter().enumerate() {
            self.front.put_str(4, 1 + i, line, TITLE_FG, Color::Reset);
        }
        self.front.put_str(4, 5, "Pick an animal, then find it hiding in the meadow.", Color::White, Color::Reset);

        const CARD_W: usize = 14;
        const CARD_H: usize = 5;
        const PER_ROW: usize = 3;
        let grid_y = 7;
        let catalog = round.catalog();
        let ledger = round.ledger();

        for (i, animal) in catalog.iter().enumerate() {
            let cx = 4 + (i % PER_ROW) * (CARD_W + 2);
            let cy = grid_y + (i / PER_ROW) * (CARD_H + 1);
            let unlocked = round.is_unlocked(i);
            let selected = i == w.select_cursor;

            let border = if selected { HI } else if unlocked { Color::White } else { DIM };
            let top = format!("┌{}┐", "─".repeat(CARD_W - 2));
            let bottom = format!("└{}┘", "─".repeat(CARD_W - 2));
            self.front.put_str(cx, cy, &top, border, Color::Reset);
            for dy in 1..CARD_H - 1 {
                self.front.put_str(cx, cy + dy, "│", border, Color::Reset);
                self.front.put_str(cx + CARD_W - 1, cy + dy, "│", border, Color::Reset);
            }
            self.front.put_str(cx, cy + CARD_H - 1, &bottom, border, Color::Reset);

            if unlocked {
                self.front.put_wide(cx + 2, cy + 1, animal.glyph, Color::White, Color::Reset);
                self.front.put_str(cx + 5, cy + 1, animal.name, border, Color::Reset);
                let found = format!("found ×{}", ledger.count_for(animal.id));
                self.front.put_str(cx + 2, cy + 3, &found, DIM, Color::Reset);
            } else {
                self.front.put_wide(cx + 2, cy + 1, "🔒", DIM, Color::Reset);
                self.front.put_str(cx + 5, cy + 1, "???", DIM, Color::Reset);
                if let (Some(need), Some(prev)) = (
                    ledger.finds_remaining(catalog, i),
                    i.checked_sub(1).and_then(|p| catalog.get(p)),
                ) {
                    let hint = format!("{} more {}", need, prev.name);
                    self.front.put_str(cx + 2, cy + 3, &hint, DIM, Color::Reset);
                }
            }
        }

        let rows = catalog.len().div_ceil(PER_ROW);
        let help_y = grid_y + rows * (CARD_H + 1) + 1;
        self.front.put_str(4, help_y, "←→↑↓  Choose    ENTER  Play    Q  Quit", Color::White, Color::Reset);

        self.compose_message(w, self.front.height.saturating_sub(1));
    }

    // ── Field + HUD ──

    fn compose_field(&mut self, w: &WorldState, round: &RoundController) {
        let hud_bg = w.hud_tier.map(tier_color).unwrap_or(HUD_BG);
        let hud_fg = if w.hud_tier.is_some() { Color::Black } else { Color::White };
        let name = round.active_animal().map(|a| a.name).unwrap_or("?");
        let tier = w.hud_tier.map(|t| t.label()).unwrap_or("");
        let hud = format!(" Score: {:<5}  Find the {:<8}  {} ", round.score(), name, tier);
        self.front.fill_row(HUD_ROW, hud_bg);
        self.front.put_str(0, HUD_ROW, &hud, hud_fg, hud_bg);

        let hovering = w.hovering();
        for gy in 0..w.height {
            let row = FIELD_ROW + gy;
            if row >= self.front.height { break; }
            for gx in 0..w.width {
                let col = gx * CELL_W;
                if col + 1 >= self.front.width { break; }
                self.compose_cell(w, gx, gy, col, row, hovering);
            }
        }

        let below = FIELD_ROW + w.height;
        if let Some(ind) = &w.indicator {
            let text = format!(" ● {} ", ind.tier.label());
            self.front.put_str(2, below + 1, &text, Color::Black, tier_color(ind.tier));
        }
        self.compose_message(w, below + 2);
        self.front.put_str(
            0, below + 3,
            " ←→↑↓/WASD Aim   ENTER/SPACE Point   ESC Pause   Q Quit",
            DIM, Color::Reset,
        );
    }

    fn compose_cell(&mut self, w: &WorldState, gx: usize, gy: usize, col: usize, row: usize, hovering: bool) {
        let pos = (gx, gy);

        if let Some(t) = w.target.as_ref().filter(|t| t.cell == pos) {
            if t.revealed {
                self.front.put_wide(col, row, t.glyph, Color::White, GRASS_BG);
                return;
            }
            // Faint until the pointer is over it
            let fg = if hovering { HOVER_FG } else { FAINT_FG };
            let (l, r) = if w.pointer == pos { ('[', ']') } else { ('░', '░') };
            self.front.set(col, row, Cell::from_char(l, fg, GRASS_BG));
            self.front.set(col + 1, row, Cell::from_char(r, fg, GRASS_BG));
            return;
        }

        if w.pointer == pos {
            self.front.set(col, row, Cell::from_char('[', POINTER_FG, GRASS_BG));
            self.front.set(col + 1, row, Cell::from_char(']', POINTER_FG, GRASS_BG));
        } else if w.viewer == pos {
            self.front.set(col, row, Cell::from_char('@', Color::White, GRASS_BG));
            self.front.set(col + 1, row, Cell::from_char(' ', Color::White, GRASS_BG));
        } else {
            self.front.set(col, row, Cell::from_char(grass_char(gx, gy), GRASS_FG, GRASS_BG));
            self.front.set(col + 1, row, Cell::from_char(' ', GRASS_FG, GRASS_BG));
        }
    }

    fn compose_message(&mut self, w: &WorldState, row: usize) {
        if w.message.is_empty() || row >= self.front.height { return; }
        self.front.fill_row(row, MSG_BG);
        self.front.put_str(0, row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
    }

    // ── Overlays ──

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        let blink = (w.anim_tick / 8) % 2 == 0;
        let field_cols = w.width * CELL_W;
        let box_w = 32_usize.min(field_cols);
        let box_h = 7_usize.min(w.height);
        let box_x = field_cols.saturating_sub(box_w) / 2;
        let box_y = FIELD_ROW + w.height.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::from_char(' ', Color::Reset, bg));
            }
        }

        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(box_x + 10, box_y + 1, label, TITLE_FG, bg);
        self.front.put_str(box_x + 3, box_y + 3, "ENTER  Resume", HI, bg);
        self.front.put_str(box_x + 3, box_y + 4, "ESC    Back to animals", Color::White, bg);
    }

    fn compose_summary(&mut self, w: &WorldState) {
        let Some(s) = w.summary.as_ref() else { return; };
        let frame = [
            "╔════════════════════════════════════╗",
            "║                                    ║",
            "╚════════════════════════════════════╝",
        ];
        for (i, line) in frame.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, TITLE_FG, Color::Reset);
        }
        let headline = format!("★ You found the {}! ★", s.animal_name);
        self.front.put_str(8, 3, &headline, TITLE_FG, Color::Reset);

        self.front.put_str(6, 6, &format!("◈ Score:        {}", s.score), Color::White, Color::Reset);
        self.front.put_str(6, 7, &format!("◈ Times found:  {}", s.found_count), Color::White, Color::Reset);

        let mut y = 9;
        for id in &s.newly_unlocked {
            self.front.put_str(6, y, &format!("✚ New animal unlocked: {id}"), HI, Color::Reset);
            y += 1;
        }

        self.front.put_str(6, y + 1, "▸ ENTER: Play again", HI, Color::Reset);
        self.front.put_str(6, y + 2, "▸ ESC:   Back to animals", DIM, Color::Reset);
    }
}
