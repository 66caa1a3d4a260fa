use crate::bounds::{Bounds, Geometry};
use crate::color::{hsb, Rgb};
use crate::config::Params;
use crate::math::Vec2;
use std::f64::consts::PI;

const WARM: Rgb = Rgb::new(255, 180, 50);
const CAUSTIC: Rgb = Rgb::new(255, 255, 200);
/// Caustics need at least this visual quality.
const CAUSTIC_QUALITY: f64 = 5.0;
const CAUSTIC_LINES: usize = 8;

/// Heater light washing over the lamp, plus moving caustic streaks in
/// psychedelic mode. Rebuilt every frame from the heat and the clocks.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Atmosphere {
    center: Vec2,
    /// Semi-axes of the lit ellipse.
    radii: Vec2,
    tint: Rgb,
    /// Screen amount of the tint, 0..1.
    strength: f32,
    caustics: Vec<(Vec2, Vec2)>,
    caustic_strength: f32,
}

impl Atmosphere {
    /// `None` while the lamp is switched off.
    pub(crate) fn new(params: &Params, bounds: &Bounds, geometry: &Geometry, phase: f64, time: f64) -> Option<Self> {
        if !params.is_on {
            return None;
        }
        let center = Vec2::new(bounds.center_x, bounds.center_y);
        let glow = (params.heat / 100.0) as f32;

        let (tint, strength, size) = if params.psychedelic {
            (hsb(phase, 0.5, 0.3), glow * 3.0 / 255.0, (1.3, 0.9))
        } else {
            (WARM, glow * 6.0 / 255.0, (1.2, 0.8))
        };
        let radii = Vec2::new(geometry.body_width * size.0 / 2.0, geometry.height * size.1 / 2.0);

        let caustics = if params.psychedelic && params.visual_quality >= CAUSTIC_QUALITY {
            (0..CAUSTIC_LINES)
                .map(|i| {
                    let angle = time + i as f64 * PI / 4.0;
                    let a = center.add(Vec2::new(angle.cos() * 40.0, (angle * 1.3).sin() * 30.0));
                    let bend = angle + PI / 3.0;
                    (a, a.add(Vec2::new(bend.cos() * 20.0, bend.sin() * 15.0)))
                })
                .collect()
        } else {
            Vec::new()
        };
        let caustic_strength = ((40.0 + (time * 2.0).sin() * 20.0) / 255.0) as f32;

        Some(Self {
            center,
            radii,
            tint,
            strength,
            caustics,
            caustic_strength,
        })
    }

    /// Screen the lighting over `base` at world point `(x, y)`. `reach` is
    /// how close a caustic streak has to pass to light the point.
    pub(crate) fn shade(&self, base: Rgb, x: f64, y: f64, reach: f64) -> Rgb {
        let mut out = base;
        let (dx, dy) = ((x - self.center.x) / self.radii.x, (y - self.center.y) / self.radii.y);
        if dx * dx + dy * dy <= 1.0 {
            out = out.screen(self.tint, self.strength);
        }
        let p = Vec2::new(x, y);
        if self.caustics.iter().any(|&(a, b)| segment_distance(p, a, b) <= reach) {
            out = out.screen(CAUSTIC, self.caustic_strength);
        }
        out
    }
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b.sub(a);
    let len2 = ab.len2();
    if len2 <= f64::EPSILON {
        return p.dist(a);
    }
    let ap = p.sub(a);
    let t = ((ap.x * ab.x + ap.y * ab.y) / len2).clamp(0.0, 1.0);
    p.dist(a.add(ab.mul(t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARK: Rgb = Rgb::new(12, 18, 30);

    fn lit(params: &Params) -> Option<Atmosphere> {
        let g = Geometry::default();
        let b = Bounds::centered(&g, 200.0, 250.0);
        Atmosphere::new(params, &b, &g, 0.0, 0.0)
    }

    fn classic(heat: f64) -> Params {
        let mut p = Params { psychedelic: false, ..Params::default() };
        p.set_heat(heat);
        p
    }

    #[test]
    fn lamp_off_means_no_lighting() {
        assert!(lit(&classic(5.0)).is_none());
        assert!(lit(&Params { is_on: false, ..Params::default() }).is_none());
    }

    #[test]
    fn warm_glow_follows_the_heater() {
        let low = lit(&classic(30.0)).unwrap();
        let high = lit(&classic(100.0)).unwrap();
        let a = low.shade(DARK, 200.0, 250.0, 1.0);
        let b = high.shade(DARK, 200.0, 250.0, 1.0);
        assert!(b.r > a.r && a.r > DARK.r, "{a:?} {b:?}");
        assert!(b.r - DARK.r > b.b - DARK.b);
        // outside the ellipse nothing changes
        assert_eq!(high.shade(DARK, 200.0, 10.0, 1.0), DARK);
        assert_eq!(high.shade(DARK, 300.0, 250.0, 1.0), DARK);
    }

    #[test]
    fn caustics_need_psychedelic_mode_and_quality() {
        let rich = lit(&Params { visual_quality: 8.0, ..Params::default() }).unwrap();
        assert_eq!(rich.caustics.len(), CAUSTIC_LINES);
        assert!(lit(&Params { visual_quality: 4.0, ..Params::default() }).unwrap().caustics.is_empty());
        assert!(lit(&classic(80.0)).unwrap().caustics.is_empty());

        // first streak starts 40 px right of centre at time zero
        let (a, _) = rich.caustics[0];
        assert_eq!(a, Vec2::new(240.0, 250.0));
        let on = rich.shade(DARK, a.x, a.y, 0.5);
        let dim = lit(&Params { visual_quality: 4.0, ..Params::default() }).unwrap();
        let off = dim.shade(DARK, a.x, a.y, 0.5);
        assert!(on.r > off.r + 20, "{on:?} {off:?}");
    }

    #[test]
    fn point_to_segment_distance() {
        let (a, b) = (Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
        assert_eq!(segment_distance(Vec2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(segment_distance(Vec2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(segment_distance(Vec2::new(1.0, 1.0), a, a), 2f64.sqrt());
    }
}
