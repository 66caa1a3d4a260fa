use crate::bounds::Geometry;
use crate::canvas::PixelCanvas;
use crate::color::{liquid_backdrop, Rgb, Theme};
use crate::config::Params;
use crate::lamp::{Lamp, Stats};
use anyhow::Context;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Sub-pixels with at least this much averaged alpha light a braille dot.
const INK_ALPHA: u32 = 32;
/// World pixels kept clear around the bottle.
const MARGIN: f64 = 12.0;

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
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    full_redraw: bool,
}

impl Terminal {
    /// Raw mode on the alternate screen with the cursor hidden.
    pub(crate) fn begin() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enabling raw mode")?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide, DisableLineWrap, Clear(ClearType::All))
            .context("entering the alternate screen")?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            full_redraw: true,
        })
    }

    /// Undo [`Terminal::begin`]. Raw mode is released even if the screen
    /// commands fail.
    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        let screen = execute!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        terminal::disable_raw_mode().context("leaving raw mode")?;
        screen.context("leaving the alternate screen")
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
        self.full_redraw = true;
        Ok(true)
    }

    /// Write changed cells only, unless the screen was just (re)sized.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.full_redraw {
            queue!(self.out, Clear(ClearType::All))?;
        }

        let mut pen: Option<(Color, Color)> = None;
        let cols = self.cols.max(1) as usize;
        for (i, (c, old)) in self.cur.cells.iter().zip(&self.prev.cells).enumerate() {
            if !self.full_redraw && c == old {
                continue;
            }
            let (x, y) = ((i % cols) as u16, (i / cols) as u16);
            queue!(self.out, cursor::MoveTo(x, y))?;
            if pen != Some((c.fg, c.bg)) {
                queue!(self.out, SetForegroundColor(c.fg), SetBackgroundColor(c.bg))?;
                pen = Some((c.fg, c.bg));
            }
            queue!(self.out, Print(c.ch))?;
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_redraw = false;
        Ok(())
    }
}

/// Braille dot bits by sub-pixel column, then row (U+2800 block layout).
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

fn braille_bit(dx: u32, dy: u32) -> u8 {
    DOT_BITS
        .get(dx as usize)
        .and_then(|col| col.get(dy as usize))
        .copied()
        .unwrap_or(0)
}

fn braille(mask: u8) -> char {
    match mask {
        0 => ' ',
        m => char::from_u32(0x2800 | u32::from(m)).unwrap_or(' '),
    }
}

/// How the world canvas maps onto the terminal: `zoom` world pixels per
/// braille dot, on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct View {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) zoom: f64,
}

impl View {
    /// Smallest zoom at which the whole bottle plus a margin fits.
    pub(crate) fn fit(cols: u16, rows: u16, geometry: &Geometry) -> Self {
        let sub_w = (cols.max(1) as f64) * 2.0;
        let sub_h = (rows.max(1) as f64) * 4.0;
        let zoom = ((geometry.height + 2.0 * MARGIN) / sub_h)
            .max((geometry.body_width + 2.0 * MARGIN) / sub_w);
        Self { cols, rows, zoom }
    }

    /// World canvas size in pixels.
    pub(crate) fn world_size(&self) -> (u32, u32) {
        let w = (self.cols as f64 * 2.0 * self.zoom).ceil().max(1.0) as u32;
        let h = (self.rows as f64 * 4.0 * self.zoom).ceil().max(1.0) as u32;
        (w, h)
    }

    /// World pixel span `[lo, hi)` covered by sub-pixel `s`; never empty.
    fn span(&self, s: u32) -> (u32, u32) {
        let lo = (s as f64 * self.zoom).floor() as u32;
        let hi = ((s + 1) as f64 * self.zoom).floor() as u32;
        (lo, hi.max(lo + 1))
    }
}

/// Box-averaged alpha and alpha-weighted colour of a block of world pixels.
fn average_block(frame: &PixelCanvas, x0: u32, x1: u32, y0: u32, y1: u32) -> (u32, Rgb) {
    let (x1, y1) = (x1.min(frame.w), y1.min(frame.h));
    if x0 >= x1 || y0 >= y1 {
        return (0, Rgb::default());
    }
    let (mut sa, mut sr, mut sg, mut sb) = (0u64, 0u64, 0u64, 0u64);
    for y in y0..y1 {
        for x in x0..x1 {
            let p = frame.px[frame.idx(x, y)];
            let a = p.a as u64;
            sa += a;
            sr += p.r as u64 * a;
            sg += p.g as u64 * a;
            sb += p.b as u64 * a;
        }
    }
    let n = ((x1 - x0) * (y1 - y0)) as u64;
    if sa == 0 {
        return (0, Rgb::default());
    }
    let rgb = Rgb::new((sr / sa) as u8, (sg / sa) as u8, (sb / sa) as u8);
    ((sa / n) as u32, rgb)
}

/// Downsample the lamp's frame into braille cells over the liquid backdrop,
/// with the glow screened into the cell backgrounds.
pub(crate) fn compose(lamp: &Lamp, view: &View, theme: &Theme, out: &mut CellBuffer) {
    let frame = lamp.frame();
    let bounds = lamp.bounds();
    let geometry = lamp.geometry();
    let glow = lamp.glow();
    let atmosphere = lamp.atmosphere();

    for cy in 0..out.h.min(view.rows) {
        for cx in 0..out.w.min(view.cols) {
            let mut mask = 0u8;
            let (mut sr, mut sg, mut sb, mut wsum) = (0u32, 0u32, 0u32, 0u32);

            for dy in 0..4 {
                let (y0, y1) = view.span(cy as u32 * 4 + dy);
                for dx in 0..2 {
                    let (x0, x1) = view.span(cx as u32 * 2 + dx);
                    let (a, rgb) = average_block(frame, x0, x1, y0, y1);
                    if a >= INK_ALPHA {
                        mask |= braille_bit(dx, dy);
                        sr += rgb.r as u32 * a;
                        sg += rgb.g as u32 * a;
                        sb += rgb.b as u32 * a;
                        wsum += a;
                    }
                }
            }

            let (wx0, _) = view.span(cx as u32 * 2);
            let (_, wx1) = view.span(cx as u32 * 2 + 1);
            let (wy0, _) = view.span(cy as u32 * 4);
            let (_, wy1) = view.span(cy as u32 * 4 + 3);
            let mid_x = (wx0 + wx1) as f64 / 2.0;
            let mid_y = (wy0 + wy1) as f64 / 2.0;

            let mut bg = if bounds.contains(mid_x, mid_y) {
                liquid_backdrop(((mid_y - bounds.top) / bounds.height) as f32, theme)
            } else if on_glass(mid_x, mid_y, lamp, geometry) {
                theme.glass_edge
            } else {
                theme.bg_global
            };
            if let Some(g) = glow {
                bg = bg.screen(g.average(wx0, wy0, wx1, wy1), 1.0);
            }
            if let Some(a) = atmosphere {
                bg = a.shade(bg, mid_x, mid_y, view.zoom);
            }

            let fg = if wsum > 0 {
                Rgb::new((sr / wsum) as u8, (sg / wsum) as u8, (sb / wsum) as u8)
            } else {
                bg
            };

            out.set(
                cx,
                cy,
                Cell {
                    ch: braille(mask),
                    fg: fg.to_color(),
                    bg: bg.to_color(),
                },
            );
        }
    }
}

fn on_glass(x: f64, y: f64, lamp: &Lamp, geometry: &Geometry) -> bool {
    let b = lamp.bounds();
    if y < b.top - geometry.lip || y > b.bottom + geometry.lip {
        return false;
    }
    (x - b.center_x).abs() <= b.half_width(y) + geometry.wall
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

pub(crate) fn status_line(params: &Params, stats: &Stats, fps: f32) -> String {
    format!(
        "Lava Lamp  heat:{:>3.0}  visc:{:.0}  smooth:{:.0}  speed:{:.0}  bloom:{:.0}  fx:{:.0}  q:{:.0}  blobs:{}  sparks:{}  bubbles:{}  {:>4.0} fps{}",
        params.heat,
        params.viscosity,
        params.smoothness,
        params.speed,
        params.bloom_intensity,
        params.particle_density,
        params.visual_quality,
        stats.blobs,
        stats.sparkles,
        stats.bubbles,
        fps,
        if params.is_on { "" } else { "  [PAUSED]" }
    )
}

const KEYS_LINE: &str = "Keys: ↑/↓ heat  ←/→ visc  [ ] smooth  - = speed  , . fx  ; ' quality  9 0 bloom  P psyche  C cycle  T theme  Space pause  R reset  H hud  Q quit";

pub(crate) fn draw_hud(buf: &mut CellBuffer, theme: &Theme, params: &Params, stats: &Stats, fps: f32) {
    if buf.h < 3 {
        return;
    }
    let bg = theme.hud_bg.to_color();
    draw_text(buf, 0, 0, &status_line(params, stats, fps), theme.hud_fg.to_color(), bg);
    draw_text(buf, 0, 1, KEYS_LINE, theme.hud_fg_dim.to_color(), bg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Pixel;
    use crate::color::theme_for;

    fn cell(buf: &CellBuffer, x: u16, y: u16) -> Cell {
        buf.cells[buf.idx(x, y)]
    }

    #[test]
    fn braille_bits_cover_the_block() {
        let mut all = 0u8;
        for dy in 0..4 {
            for dx in 0..2 {
                all |= braille_bit(dx, dy);
            }
        }
        assert_eq!(all, 0xFF);
        assert_eq!(braille(0xFF), '⣿');
        assert_eq!(braille(0), ' ');
        assert_eq!(braille(0x01), '⠁');
    }

    #[test]
    fn view_fits_the_bottle() {
        let g = Geometry::default();
        let v = View::fit(80, 24, &g);
        // height is the tight axis: (350 + 24) / 96
        assert!((v.zoom - 374.0 / 96.0).abs() < 1e-9);
        let (w, h) = v.world_size();
        assert!(h as f64 >= g.height && w as f64 >= g.body_width);

        let wide = View::fit(400, 200, &g);
        assert!(wide.zoom < 1.0);
        assert_eq!(wide.span(0), (0, 1));
    }

    #[test]
    fn block_average_weights_colour_by_alpha() {
        let mut c = PixelCanvas::new(2, 2);
        c.set(0, 0, Pixel { r: 200, g: 0, b: 0, a: 255 });
        c.set(1, 0, Pixel { r: 0, g: 0, b: 200, a: 85 });
        let (a, rgb) = average_block(&c, 0, 2, 0, 2);
        assert_eq!(a, 85);
        assert_eq!(rgb, Rgb::new(150, 0, 50));
        assert_eq!(average_block(&c, 0, 2, 1, 2), (0, Rgb::default()));
        assert_eq!(average_block(&c, 5, 9, 0, 2).0, 0);
    }

    #[test]
    fn composed_lamp_shows_wax_in_the_glass() {
        let params = Params::default();
        let view = View::fit(60, 30, &Geometry::default());
        let (w, h) = view.world_size();
        let mut lamp = Lamp::new(9, w, h, &params);
        lamp.tick(&params);
        lamp.render(&params);

        let theme = theme_for(0);
        let mut buf = CellBuffer::new(60, 30);
        compose(&lamp, &view, &theme, &mut buf);

        let inked = buf.cells.iter().filter(|c| c.ch != ' ').count();
        assert!(inked > 0);
        // the corner is far from the bottle
        assert_eq!(cell(&buf, 0, 29).ch, ' ');
        assert_eq!(cell(&buf, 0, 29).bg, theme.bg_global.to_color());
    }

    #[test]
    fn hud_writes_status_and_pause_marker() {
        let theme = theme_for(0);
        let mut buf = CellBuffer::new(200, 10);
        let params = Params {
            is_on: false,
            ..Params::default()
        };
        draw_hud(&mut buf, &theme, &params, &Stats::default(), 60.0);
        let row: String = (0..200).map(|x| cell(&buf, x, 0).ch).collect();
        assert!(row.starts_with("Lava Lamp  heat: 60"));
        assert!(row.contains("[PAUSED]"));
        assert_eq!(cell(&buf, 0, 1).ch, 'K');

        let mut tiny = CellBuffer::new(10, 2);
        draw_hud(&mut tiny, &theme, &params, &Stats::default(), 60.0);
        assert!(tiny.cells.iter().all(|c| c.ch == ' '));
    }
}
