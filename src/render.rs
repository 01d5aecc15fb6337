use crate::config::Settings;
use crate::model::{
    Activity, Mood, Species, Tank, TankBounds, Vec2, CELL_H_PX, CELL_W_PX, HUD_ROWS,
};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
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
    pub(crate) fn set(&mut self, x: i32, y: i32, c: Cell) {
        if x >= 0 && y >= 0 && (x as u16) < self.w && (y as u16) < self.h {
            let i = self.idx(x as u16, y as u16);
            self.cells[i] = c;
        }
    }
    /// Overwrite the glyph and foreground, keep whatever background is
    /// already painted there.
    pub(crate) fn ink(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        if x >= 0 && y >= 0 && (x as u16) < self.w && (y as u16) < self.h {
            let i = self.idx(x as u16, y as u16);
            self.cells[i].ch = ch;
            self.cells[i].fg = fg;
        }
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
        let prev = CellBuffer::new(cols, rows);
        let cur = CellBuffer::new(cols, rows);
        Ok(Self {
            out,
            cols,
            rows,
            prev,
            cur,
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
            EndSynchronizedUpdate,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_to(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.prev = CellBuffer::new(cols, rows);
        self.cur = CellBuffer::new(cols, rows);
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.resize_to(c, r);
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
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

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Scene drawing
------------------------------ */

fn sim_to_cell(p: Vec2) -> (i32, i32) {
    (
        (p.x / CELL_W_PX).floor() as i32,
        (p.y / CELL_H_PX).floor() as i32 + HUD_ROWS as i32,
    )
}

fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Position of the cleaning hand as a function of cycle progress, in
/// simulation pixels. Enter from the top, sweep right along the upper
/// water, drop, sweep back left, leave. Pure, so the path is testable.
pub(crate) fn hand_pose(progress: f32, bounds: TankBounds) -> Vec2 {
    let w = bounds.w;
    let h = bounds.h;
    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let p = progress.clamp(0.0, 1.0);
    if p < 0.15 {
        let t = ease_in_out_cubic(p / 0.15);
        Vec2::new(0.15 * w, lerp(-0.2 * h, 0.25 * h, t))
    } else if p < 0.45 {
        let t = ease_in_out_cubic((p - 0.15) / 0.3);
        Vec2::new(lerp(0.15 * w, 0.85 * w, t), 0.25 * h)
    } else if p < 0.55 {
        let t = ease_in_out_cubic((p - 0.45) / 0.1);
        Vec2::new(0.85 * w, lerp(0.25 * h, 0.55 * h, t))
    } else if p < 0.85 {
        let t = ease_in_out_cubic((p - 0.55) / 0.3);
        Vec2::new(lerp(0.85 * w, 0.15 * w, t), 0.55 * h)
    } else {
        let t = ease_in_out_cubic((p - 0.85) / 0.15);
        Vec2::new(0.15 * w, lerp(0.55 * h, -0.2 * h, t))
    }
}

/// Cheap positional hash in [0,1) for stable dirt splotches.
fn splotch_hash(x: i32, y: i32) -> f32 {
    let v = ((x as f32 * 12.9898 + y as f32 * 78.233).sin() * 43758.547).fract();
    v.abs()
}

fn fish_sprite(species: Species, scale: f32, facing_right: bool, alive: bool) -> &'static str {
    if !alive {
        return if facing_right { "><(x>" } else { "<x)><" };
    }
    let big = scale >= 0.95;
    match (species, big, facing_right) {
        (Species::Clownfish, true, true) => "><(((o>",
        (Species::Clownfish, true, false) => "<o)))><",
        (Species::Clownfish, false, true) => "><((o>",
        (Species::Clownfish, false, false) => "<o))><",
        (Species::Basslet, _, true) => ">=((o>",
        (Species::Basslet, _, false) => "<o))=<",
    }
}

fn mood_color(mood: Mood, species: Species) -> Color {
    match (mood, species) {
        (Mood::Sos, _) => Color::DarkRed,
        (Mood::Sick, _) => Color::DarkYellow,
        (_, Species::Clownfish) => Color::Rgb {
            r: 255,
            g: 140,
            b: 60,
        },
        (_, Species::Basslet) => Color::Rgb {
            r: 170,
            g: 90,
            b: 255,
        },
    }
}

const PELLET_COLORS: [Color; 4] = [
    Color::Rgb {
        r: 230,
        g: 180,
        b: 90,
    },
    Color::Rgb {
        r: 200,
        g: 140,
        b: 70,
    },
    Color::Rgb {
        r: 240,
        g: 200,
        b: 120,
    },
    Color::Rgb {
        r: 180,
        g: 120,
        b: 60,
    },
];

pub(crate) fn draw_scene(
    buf: &mut CellBuffer,
    tank: &Tank,
    bounds: TankBounds,
    now: f64,
    settings: &Settings,
    caption: Option<&str>,
) {
    let color = settings.enable_color;
    let sand_row = sim_to_cell(Vec2::new(0.0, bounds.sand_y())).1;
    let night = tank
        .primary()
        .map(|f| f.sleep_progress)
        .unwrap_or(0.0);
    let dirt = tank.dirtiness();

    // Water, darker with depth and at night, murkier when dirty.
    for y in HUD_ROWS as i32..buf.h as i32 {
        let depth = (y - HUD_ROWS as i32) as f32 / (buf.h as i32 - HUD_ROWS as i32).max(1) as f32;
        let dim = 1.0 - 0.65 * night;
        let bg = if !color {
            Color::Black
        } else if y >= sand_row {
            Color::Rgb {
                r: (194.0 * dim) as u8,
                g: (178.0 * dim) as u8,
                b: (128.0 * dim) as u8,
            }
        } else {
            let murk = dirt * 40.0;
            Color::Rgb {
                r: (10.0 + murk) as u8,
                g: ((90.0 - depth * 40.0) * dim) as u8,
                b: ((160.0 - depth * 60.0) * dim) as u8,
            }
        };
        for x in 0..buf.w as i32 {
            let mut cell = Cell {
                ch: ' ',
                fg: Color::White,
                bg,
            };
            if y < sand_row {
                if color && night < 0.5 && (x * 2 + y * 3) % 31 == 0 {
                    // light streaks slanting through the water
                    cell.ch = '░';
                    cell.fg = Color::Rgb {
                        r: 120,
                        g: 180,
                        b: 200,
                    };
                } else if dirt > 0.15 && splotch_hash(x, y) < dirt * 0.3 {
                    cell.ch = ',';
                    cell.fg = Color::DarkGreen;
                }
            } else if (x + y) % 7 == 0 {
                cell.ch = '.';
                cell.fg = Color::DarkYellow;
            }
            buf.set(x, y, cell);
        }
    }

    // Surface ripples.
    for r in &tank.ripples {
        let (cx, cy) = sim_to_cell(r.pos);
        let half = (r.radius / CELL_W_PX).ceil() as i32;
        for dx in -half..=half {
            buf.ink(cx + dx, cy.max(HUD_ROWS as i32), '~', Color::Cyan);
        }
    }

    for b in &tank.background_bubbles {
        let (x, y) = sim_to_cell(b.pos);
        buf.ink(x, y, '·', Color::DarkCyan);
    }

    for p in &tank.poops {
        let (x, y) = sim_to_cell(p.pos);
        buf.ink(x, y, '▒', Color::Rgb { r: 120, g: 80, b: 40 });
    }

    for pellet in &tank.food {
        let (x, y) = sim_to_cell(pellet.pos);
        let fg = if color {
            PELLET_COLORS[pellet.tint as usize % PELLET_COLORS.len()]
        } else {
            Color::Yellow
        };
        buf.ink(x, y, '•', fg);
    }

    for f in &tank.fish {
        let bob_px = f.phase.sin() * f.mood.bob_amplitude();
        let (cx, cy) = sim_to_cell(Vec2::new(f.pos.x, f.pos.y + bob_px));
        let right = f.facing >= 0.0;
        let sprite = fish_sprite(f.species, f.scale, right, f.alive);
        let len = sprite.chars().count() as i32;
        let x0 = cx - len / 2;
        let fg = if color {
            mood_color(f.mood, f.species)
        } else {
            Color::White
        };
        for (i, ch) in sprite.chars().enumerate() {
            buf.ink(x0 + i as i32, cy, ch, fg);
        }
        if f.activity == Activity::Sleeping {
            buf.ink(cx + len / 2 + 1, cy - 1, 'z', Color::Grey);
            buf.ink(cx + len / 2 + 2, cy - 2, 'Z', Color::Grey);
        }
    }

    for b in &tank.bubbles {
        let (x, y) = sim_to_cell(b.pos);
        let ch = if b.r > 2.0 { 'O' } else { 'o' };
        buf.ink(x, y, ch, Color::Cyan);
    }

    if let Some(toy) = &tank.toy {
        let (x, y) = sim_to_cell(toy.pos);
        buf.ink(x, y, '◉', Color::Red);
    }

    if let Some(progress) = tank.cleaning_progress(now) {
        draw_hand(buf, hand_pose(progress, bounds));
    }

    if !tank.any_alive() {
        let msg = "the tank has gone quiet";
        let x = (buf.w as i32 - msg.len() as i32) / 2;
        let y = buf.h as i32 / 2;
        for (i, ch) in msg.chars().enumerate() {
            buf.ink(x + i as i32, y, ch, Color::Grey);
        }
    }

    draw_hud(buf, tank, caption);
}

/// Sponge block on an arm that reaches up out of the water.
fn draw_hand(buf: &mut CellBuffer, pos: Vec2) {
    let (cx, cy) = sim_to_cell(pos);
    for y in HUD_ROWS as i32..cy {
        buf.ink(cx, y, '│', Color::Grey);
    }
    let sponge = Color::Rgb {
        r: 240,
        g: 220,
        b: 100,
    };
    for dx in -1..=1 {
        buf.ink(cx + dx, cy, '▓', sponge);
    }
}

fn bar(value: f32, width: usize) -> String {
    let fill = ((value / 100.0).clamp(0.0, 1.0) * width as f32 + 0.5) as usize;
    let mut s = String::with_capacity(width);
    for i in 0..width {
        s.push(if i < fill { '█' } else { '·' });
    }
    s
}

fn hud_text(buf: &mut CellBuffer, x: i32, y: i32, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        buf.set(
            x + i as i32,
            y,
            Cell {
                ch,
                fg,
                bg: Color::Black,
            },
        );
    }
}

fn draw_hud(buf: &mut CellBuffer, tank: &Tank, caption: Option<&str>) {
    for y in 0..HUD_ROWS as i32 {
        for x in 0..buf.w as i32 {
            buf.set(x, y, Cell::default());
        }
    }

    let (name, mood_label) = match tank.primary() {
        Some(f) if f.alive => (f.name.as_str(), f.mood.label()),
        Some(f) => (f.name.as_str(), "X_X"),
        None => ("-", "X_X"),
    };
    let mute = if tank.muted { "  [muted]" } else { "" };
    let caption = if tank.muted {
        ""
    } else {
        caption.unwrap_or("")
    };
    let title = format!(" termitank  {name} [{mood_label}]{mute}  {caption}");
    hud_text(buf, 0, 0, &title, Color::White);

    if let Some(f) = tank.primary() {
        let s = &f.stats;
        let line = format!(
            " hp {} food {} joy {} nrg {} cln {}   p play  c clean  l lights  m mute  q quit",
            bar(s.health, 5),
            bar(s.hunger, 5),
            bar(s.happiness, 5),
            bar(s.energy, 5),
            bar(s.cleanliness, 5),
        );
        hud_text(buf, 0, 1, &line, Color::Grey);
    }
}
