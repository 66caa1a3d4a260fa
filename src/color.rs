use crate::blob::{TEMP_MAX, TEMP_MIN};
use crate::math::remap;
use crossterm::style::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel values outside 0..=255 are clamped, like a sketch `color()`.
    pub(crate) fn from_f32(r: f32, g: f32, b: f32) -> Self {
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        Self::new(q(r), q(g), q(b))
    }

    pub(crate) fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp1 = |x: u8, y: u8| -> u8 {
            (x as f32 + (y as f32 - x as f32) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: lerp1(a.r, b.r),
            g: lerp1(a.g, b.g),
            b: lerp1(a.b, b.b),
        }
    }

    /// Screen blend of `light` over `self`, `amount` in 0..1.
    pub(crate) fn screen(self, light: Rgb, amount: f32) -> Rgb {
        let k = amount.clamp(0.0, 1.0);
        let s = |base: u8, l: u8| -> u8 {
            let b = base as f32 / 255.0;
            let l = l as f32 / 255.0 * k;
            ((1.0 - (1.0 - b) * (1.0 - l)) * 255.0).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: s(self.r, light.r),
            g: s(self.g, light.g),
            b: s(self.b, light.b),
        }
    }

    pub(crate) fn to_color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Hue, saturation, brightness in 0..1. Hue wraps.
pub(crate) fn hsb(h: f64, s: f64, v: f64) -> Rgb {
    let h = h.rem_euclid(1.0) * 6.0;
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::from_f32((r * 255.0) as f32, (g * 255.0) as f32, (b * 255.0) as f32)
}

/// Where the colour wheel currently sits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Palette {
    pub(crate) phase: f64,
    pub(crate) time: f64,
    pub(crate) psychedelic: bool,
}

impl Palette {
    /// Wax colour for an averaged field sample.
    pub(crate) fn wax(&self, temperature: f64, density: f64) -> Rgb {
        let t = remap(temperature, TEMP_MIN, TEMP_MAX, 0.0, 1.0).clamp(0.0, 1.0);
        if self.psychedelic {
            let hue = (self.phase + t * 0.3 + density * 0.2).rem_euclid(1.0);
            let sat = 0.8 + (self.time * 2.0 + t).sin() * 0.2;
            let bri = 0.6 + t * 0.4 + (self.time + density).sin() * 0.1;
            return hsb(hue, sat, bri);
        }
        let t = t as f32;
        if t < 0.4 {
            Rgb::from_f32(150.0 + t * 100.0, 50.0 + t * 100.0, 200.0 - t * 150.0)
        } else if t < 0.7 {
            Rgb::from_f32(255.0, 100.0 + t * 100.0, 50.0)
        } else {
            Rgb::from_f32(255.0, 200.0, 50.0 + t * 50.0)
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Theme {
    pub(crate) bg_top: Rgb,
    pub(crate) bg_mid: Rgb,
    pub(crate) bg_bot: Rgb,
    pub(crate) glass_edge: Rgb,
    pub(crate) bg_global: Rgb,
    pub(crate) hud_fg: Rgb,
    pub(crate) hud_fg_dim: Rgb,
    pub(crate) hud_bg: Rgb,
}

pub(crate) const THEMES: [Theme; 4] = [
    Theme {
        bg_top: Rgb::new(10, 12, 18),
        bg_mid: Rgb::new(12, 18, 30),
        bg_bot: Rgb::new(26, 22, 40),
        glass_edge: Rgb::new(70, 90, 130),
        bg_global: Rgb::new(6, 7, 11),
        hud_fg: Rgb::new(210, 220, 245),
        hud_fg_dim: Rgb::new(170, 185, 210),
        hud_bg: Rgb::new(0, 0, 0),
    },
    Theme {
        bg_top: Rgb::new(8, 16, 12),
        bg_mid: Rgb::new(10, 24, 16),
        bg_bot: Rgb::new(14, 34, 22),
        glass_edge: Rgb::new(80, 110, 95),
        bg_global: Rgb::new(5, 10, 7),
        hud_fg: Rgb::new(210, 230, 220),
        hud_fg_dim: Rgb::new(160, 190, 175),
        hud_bg: Rgb::new(0, 0, 0),
    },
    Theme {
        bg_top: Rgb::new(14, 10, 10),
        bg_mid: Rgb::new(22, 12, 16),
        bg_bot: Rgb::new(40, 16, 20),
        glass_edge: Rgb::new(120, 90, 90),
        bg_global: Rgb::new(8, 6, 6),
        hud_fg: Rgb::new(235, 215, 200),
        hud_fg_dim: Rgb::new(190, 170, 155),
        hud_bg: Rgb::new(0, 0, 0),
    },
    Theme {
        bg_top: Rgb::new(8, 8, 16),
        bg_mid: Rgb::new(12, 10, 26),
        bg_bot: Rgb::new(18, 14, 36),
        glass_edge: Rgb::new(90, 110, 150),
        bg_global: Rgb::new(5, 5, 12),
        hud_fg: Rgb::new(210, 225, 255),
        hud_fg_dim: Rgb::new(165, 185, 215),
        hud_bg: Rgb::new(0, 0, 0),
    },
];

pub(crate) fn theme_for(idx: usize) -> Theme {
    THEMES[idx % THEMES.len()]
}

/// Liquid behind the wax: dark under the cap, warmer over the heater.
pub(crate) fn liquid_backdrop(y01: f32, theme: &Theme) -> Rgb {
    let t = y01.clamp(0.0, 1.0);
    if t < 0.6 {
        Rgb::lerp(theme.bg_top, theme.bg_mid, t / 0.6)
    } else {
        Rgb::lerp(theme.bg_mid, theme.bg_bot, (t - 0.6) / 0.4)
    }
}
