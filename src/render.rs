use crate::anim::AnimationKind;
use crate::game::{slot_center, GameScene, SessionSummary};
use crate::model::{
    bin_pos, ItemKind, Stats, Vec2, BIN_SIZE, FIELD_H, FIELD_W, FLOOR_Y, GROUND_Y,
};
use crate::selector::{SlotPhase, SlotView};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// What occupies a cell. Emoji take two columns: a `Wide` head and a `Tail`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Sym {
    Char(char),
    Wide(&'static str),
    Tail,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) sym: Sym,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            sym: Sym::Char(' '),
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.w as i32 && y < self.h as i32
    }

    #[cfg(test)]
    fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }

    /// Writes one cell, blanking the other half of any wide glyph it cuts.
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        match self.cells[i].sym {
            Sym::Wide(_) if x + 1 < self.w => self.cells[i + 1].sym = Sym::Char(' '),
            Sym::Tail if x > 0 => self.cells[i - 1].sym = Sym::Char(' '),
            _ => {}
        }
        self.cells[i] = c;
    }

    /// Places an emoji across `x` and `x + 1`. Dropped if it would not fit.
    pub(crate) fn set_wide(&mut self, x: i32, y: i32, glyph: &'static str, fg: Color) {
        if !self.in_bounds(x, y) || !self.in_bounds(x + 1, y) {
            return;
        }
        let (x, y) = (x as u16, y as u16);
        let bg = self.cells[self.idx(x, y)].bg;
        let head = Cell {
            sym: Sym::Wide(glyph),
            fg,
            bg,
            bold: false,
        };
        self.set(x, y, head);
        self.set(x + 1, y, Cell { sym: Sym::Tail, ..head });
    }

    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            DisableMouseCapture,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c.sym == Sym::Tail || (diff_only && c == self.prev.cells[i]) {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if last_bold != Some(c.bold) {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = Some(c.bold);
                }

                match c.sym {
                    Sym::Char(ch) => queue!(self.out, Print(ch))?,
                    Sym::Wide(s) => queue!(self.out, Print(s))?,
                    Sym::Tail => {}
                }
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   World <-> cell mapping
------------------------------ */

const HUD_ROWS: u16 = 2;
const HELP_ROWS: u16 = 1;

/// Where the 360x580 play field lands on screen. Cells are about twice as
/// tall as they are wide, so a cell covers `unit_w` by `2 * unit_w` units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FieldView {
    pub(crate) x0: u16,
    pub(crate) y0: u16,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
}

impl FieldView {
    pub(crate) fn fit(term_cols: u16, term_rows: u16) -> Self {
        let rows = term_rows.saturating_sub(HUD_ROWS + HELP_ROWS).max(1);
        let want_cols = (2.0 * FIELD_W * rows as f32 / FIELD_H).round() as u16;
        let (cols, rows) = if want_cols <= term_cols {
            (want_cols.max(1), rows)
        } else {
            let cols = term_cols.max(1);
            let rows = (cols as f32 * FIELD_H / (2.0 * FIELD_W)).round() as u16;
            (cols, rows.max(1))
        };
        Self {
            x0: term_cols.saturating_sub(cols) / 2,
            y0: HUD_ROWS,
            cols,
            rows,
        }
    }

    fn unit_w(&self) -> f32 {
        FIELD_W / self.cols as f32
    }

    fn unit_h(&self) -> f32 {
        FIELD_H / self.rows as f32
    }

    pub(crate) fn to_cell(&self, p: Vec2) -> (i32, i32) {
        (
            self.x0 as i32 + (p.x / self.unit_w()).floor() as i32,
            self.y0 as i32 + (p.y / self.unit_h()).floor() as i32,
        )
    }

    /// Centre of the cell in world units. Cells outside the field map
    /// outside the world too.
    pub(crate) fn to_world(&self, col: u16, row: u16) -> Vec2 {
        let cx = col as f32 - self.x0 as f32 + 0.5;
        let cy = row as f32 - self.y0 as f32 + 0.5;
        Vec2::new(cx * self.unit_w(), cy * self.unit_h())
    }

    fn row_of(&self, y: f32) -> i32 {
        self.to_cell(Vec2::new(0.0, y)).1
    }
}

/* -----------------------------
   Glyph style
------------------------------ */

#[derive(Clone, Copy, Debug)]
pub(crate) struct Style {
    pub(crate) color: bool,
    pub(crate) emoji: bool,
}

impl Style {
    fn sky(&self) -> Color {
        self.pick(Color::Rgb { r: 96, g: 160, b: 210 }, Color::Black)
    }

    fn ground(&self) -> Color {
        self.pick(Color::Rgb { r: 68, g: 163, b: 65 }, Color::Black)
    }

    fn pick(&self, colored: Color, plain: Color) -> Color {
        if self.color {
            colored
        } else {
            plain
        }
    }

    /// Draws a two-column glyph centred on `p`, emoji or ASCII stand-in.
    fn glyph(
        &self,
        buf: &mut CellBuffer,
        view: &FieldView,
        p: Vec2,
        emoji: &'static str,
        ascii: &str,
        fg: Color,
    ) {
        let (cx, cy) = view.to_cell(p);
        if self.emoji {
            buf.set_wide(cx - 1, cy, emoji, fg);
        } else {
            put_str(buf, cx - 1, cy, ascii, fg, false);
        }
    }
}

/// Text at (x, y) that keeps whatever background is underneath.
fn put_str(buf: &mut CellBuffer, x: i32, y: i32, s: &str, fg: Color, bold: bool) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x + i as i32;
        if !buf.in_bounds(xx, y) {
            continue;
        }
        let (xx, yy) = (xx as u16, y as u16);
        let bg = buf.cells[buf.idx(xx, yy)].bg;
        buf.set(
            xx,
            yy,
            Cell {
                sym: Sym::Char(ch),
                fg,
                bg,
                bold,
            },
        );
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                sym: Sym::Char(ch),
                fg,
                bg,
                bold: false,
            },
        );
    }
}

fn draw_centered(buf: &mut CellBuffer, y: i32, s: &str, fg: Color, bg: Color) {
    let len = s.chars().count() as i32;
    let x = (buf.w as i32 - len) / 2;
    if y < 0 || x < 0 {
        return;
    }
    draw_text(buf, x as u16, y as u16, s, fg, bg);
}

/* -----------------------------
   Background
------------------------------ */

const TREES: [f32; 3] = [-60.0, 0.0, 60.0];
const CLOVERS: [(f32, f32); 5] = [
    (90.0, 125.0),
    (70.0, 110.0),
    (-60.0, 120.0),
    (-100.0, 130.0),
    (150.0, 150.0),
];
const FLOWERS: [(f32, f32); 4] = [(-70.0, 94.0), (-26.0, 110.0), (110.0, 136.0), (150.0, 110.0)];
const CLOUD_LAP_MS: u64 = 20_000;

/// Sky, a drifting cloud, trees, meadow and the bin. Depends only on its
/// arguments.
pub(crate) fn render_background(
    buf: &mut CellBuffer,
    view: &FieldView,
    style: Style,
    now_ms: u64,
    bin_scale: f32,
) {
    let ground_row = view.row_of(GROUND_Y);
    for row in view.y0..view.y0 + view.rows {
        let bg = if (row as i32) < ground_row {
            style.sky()
        } else {
            style.ground()
        };
        for col in view.x0..view.x0 + view.cols {
            buf.set(
                col,
                row,
                Cell {
                    bg,
                    ..Cell::default()
                },
            );
        }
    }

    let lap = (now_ms % CLOUD_LAP_MS) as f32 / CLOUD_LAP_MS as f32;
    let cloud = Vec2::new(-40.0 + lap * (FIELD_W + 80.0), 85.0);
    if (0.0..FIELD_W).contains(&cloud.x) {
        let (cx, cy) = view.to_cell(cloud);
        put_str(buf, cx, cy, "☁", Color::White, false);
    }

    let mid = Vec2::new(FIELD_W / 2.0, FIELD_H / 2.0);
    for dx in TREES {
        let p = Vec2::new(mid.x + dx, GROUND_Y - 10.0);
        style.glyph(buf, view, p, "🌲", "/\\", style.pick(Color::DarkGreen, Color::White));
    }
    for (dx, dy) in CLOVERS {
        let p = Vec2::new(mid.x + dx, mid.y + dy);
        style.glyph(buf, view, p, "🍀", " ,", style.pick(Color::DarkGreen, Color::White));
    }
    for (dx, dy) in FLOWERS {
        let p = Vec2::new(mid.x + dx, mid.y + dy);
        style.glyph(buf, view, p, "🌼", " *", style.pick(Color::Yellow, Color::White));
    }

    let bin = bin_pos();
    let fg = if bin_scale > 1.0 {
        style.pick(Color::Yellow, Color::White)
    } else {
        Color::White
    };
    style.glyph(buf, view, bin, "🗑️", "[U]", fg);
    if bin_scale > 1.0 {
        // swelling: flag it above the lid
        let (cx, cy) = view.to_cell(Vec2::new(bin.x, bin.y - BIN_SIZE / 2.0));
        put_str(buf, cx - 1, cy, "\\o/", fg, true);
    }
}

/* -----------------------------
   HUD
------------------------------ */

fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

pub(crate) fn stat_color(value: f32) -> Color {
    if value < 33.0 {
        Color::Red
    } else if value < 66.0 {
        Color::Rgb { r: 255, g: 165, b: 0 }
    } else {
        Color::Green
    }
}

fn draw_hud(buf: &mut CellBuffer, view: &FieldView, scene: &GameScene, style: Style) {
    let bg = Color::Black;
    let fg = Color::White;
    let Stats { health, fun } = scene.stats();
    let bar_w = ((view.cols as usize).saturating_sub(28) / 2).clamp(4, 14);

    let mut x = view.x0;
    for (name, val) in [("Health", health), ("Fun", fun)] {
        let s = format!("{name} {} {:>3.0} ", bar(val / 100.0, bar_w), val);
        let color = style.pick(stat_color(val), fg);
        draw_text(buf, x, 0, &s, color, bg);
        x = x.saturating_add(s.chars().count() as u16 + 1);
    }

    let doing = match scene.current_animation() {
        Some(AnimationKind::Feed) => "eating",
        Some(AnimationKind::Produce) => "busy",
        Some(AnimationKind::Sick) => "sick",
        None if scene.is_game_over() => "gone",
        None => "idle",
    };
    let line = format!(
        "{doing:<6} waste {}  binned {}  streak {}  queued {}",
        scene.waste().poop_count(),
        scene.bin().swallowed(),
        scene.streak_len(),
        scene.queued_animations()
    );
    draw_text(buf, view.x0, 1, &line, Color::DarkGrey, bg);
}

/* -----------------------------
   Game screen
------------------------------ */

fn item_color(kind: Option<ItemKind>, style: Style) -> Color {
    match kind {
        Some(ItemKind::Good) => style.pick(Color::Green, Color::White),
        Some(ItemKind::Bad) => style.pick(Color::Magenta, Color::White),
        None => Color::DarkGrey,
    }
}

fn draw_slot(buf: &mut CellBuffer, view: &FieldView, i: usize, slot: &SlotView, style: Style) {
    let (cx, cy) = view.to_cell(slot_center(i));
    let frame = if slot.dimmed {
        Color::DarkGrey
    } else {
        Color::White
    };
    let (open, close) = match slot.phase {
        SlotPhase::Selected => ('>', '<'),
        SlotPhase::Cycling | SlotPhase::Empty => ('(', ')'),
        SlotPhase::Idle => ('[', ']'),
    };
    put_str(buf, cx - 2, cy, &open.to_string(), frame, slot.phase == SlotPhase::Selected);
    put_str(buf, cx + 1, cy, &close.to_string(), frame, slot.phase == SlotPhase::Selected);
    match (slot.glyph, slot.kind) {
        (Some(glyph), Some(_)) if style.emoji => buf.set_wide(cx - 1, cy, glyph, Color::White),
        (Some(_), Some(kind)) => {
            put_str(buf, cx - 1, cy, kind.ascii(), item_color(Some(kind), style), false)
        }
        _ => put_str(buf, cx - 1, cy, "  ", frame, false),
    }
    put_str(buf, cx, cy + 1, &(i + 1).to_string(), frame, false);
}

pub(crate) fn draw_game(
    buf: &mut CellBuffer,
    view: &FieldView,
    scene: &GameScene,
    style: Style,
    now_ms: u64,
) {
    render_background(buf, view, style, now_ms, scene.bin().scale());
    draw_hud(buf, view, scene, style);

    if let Some(item) = scene.pending() {
        let fg = if item.alpha < 0.5 {
            Color::DarkGrey
        } else {
            item_color(Some(item.item.kind), style)
        };
        style.glyph(buf, view, item.pos, item.item.glyph, item.item.kind.ascii(), fg);
    }

    for w in scene.waste().entities() {
        style.glyph(buf, view, w.pos, "💩", "@@", style.pick(Color::DarkYellow, Color::White));
    }

    let pet = scene.pet();
    style.glyph(buf, view, pet.pos, pet.face.emoji(), pet.face.ascii(), Color::White);

    for (i, slot) in scene.slot_views().iter().enumerate() {
        draw_slot(buf, view, i, slot, style);
    }

    if scene.is_game_over() {
        let mid = view.row_of(FIELD_H / 2.0 - 80.0);
        let title = if style.emoji { "💀 GAME OVER 💀" } else { "xx GAME OVER xx" };
        draw_centered(buf, mid, title, Color::White, Color::Black);
        draw_centered(buf, mid + 1, &lasted_line(scene.summary()), Color::Grey, Color::Black);
    }

    let help = if scene.ui_blocked() {
        "wait for the pet to finish | drag waste onto the bin | esc home | q quit"
    } else {
        "click a slot, then the meadow | 1-4 slot | f feed | drag pet or waste | esc home | q quit"
    };
    draw_text(buf, 0, buf.h.saturating_sub(1), help, Color::DarkGrey, Color::Black);
}

/* -----------------------------
   Home screen
------------------------------ */

fn lasted_line(s: &SessionSummary) -> String {
    let secs = s.lasted().num_seconds().max(0);
    format!("lasted {}m {:02}s", secs / 60, secs % 60)
}

pub(crate) fn draw_home(
    buf: &mut CellBuffer,
    view: &FieldView,
    style: Style,
    now_ms: u64,
    last: Option<&SessionSummary>,
) {
    render_background(buf, view, style, now_ms, 1.0);

    let title_row = view.row_of(FIELD_H / 2.0 - 80.0);
    let title = if style.emoji { "😣EMOJI PET" } else { ">_ EMOJI PET" };
    draw_centered(buf, title_row, &format!(" {title} "), Color::White, Color::Black);
    draw_centered(buf, title_row + 2, " tap to play! ", Color::White, Color::Black);

    if let Some(s) = last {
        let lines = [
            format!(
                " last game {} ",
                s.started_at.with_timezone(&chrono::Local).format("%H:%M")
            ),
            format!(" {} ", lasted_line(s)),
            format!(" fed {}  bonuses {}  sick {} ", s.feedings, s.streak_bonuses, s.sick_events),
            format!(" waste binned {} ", s.waste_disposed),
        ];
        let top = view.row_of(FLOOR_Y) + 2;
        for (i, line) in lines.iter().enumerate() {
            draw_centered(buf, top + i as i32, line, Color::Grey, Color::Black);
        }
    }

    draw_text(
        buf,
        0,
        buf.h.saturating_sub(1),
        "any key or click to play | esc/q quit",
        Color::DarkGrey,
        Color::Black,
    );
}
