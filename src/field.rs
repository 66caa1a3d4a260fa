use crate::blob::Blob;
use crate::bounds::Bounds;
use crate::canvas::{Pixel, PixelCanvas};
use crate::color::{Palette, Rgb};
use crate::config::Params;
use crate::math::remap;

/// Blobs further than this many radii away do not contribute.
const REACH: f64 = 2.5;
/// Density at which a sample reaches full opacity.
const SATURATION: f64 = 4.0;
const MIN_ALPHA: f64 = 60.0;
const MAX_ALPHA: f64 = 255.0;
const TEMPORAL_BLEND: f32 = 0.7;
const TEMPORAL_MIN_SMOOTHNESS: f64 = 7.0;

/// Side of the square sampling cell in world pixels.
pub(crate) fn grid_step(smoothness: f64) -> u32 {
    remap(smoothness, 1.0, 10.0, 3.0, 1.0).floor().max(1.0) as u32
}

pub(crate) fn threshold(smoothness: f64) -> f64 {
    remap(smoothness, 1.0, 10.0, 0.4, 0.2)
}

fn softening(smoothness: f64) -> f64 {
    remap(smoothness, 1.0, 10.0, 1.0, 3.0)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Sample {
    pub(crate) density: f64,
    /// Influence-weighted mean temperature; zero when nothing reaches.
    pub(crate) temperature: f64,
}

/// Metaball field at one point.
pub(crate) fn sample(blobs: &[Blob], x: f64, y: f64, softening: f64) -> Sample {
    let mut density = 0.0;
    let mut weighted_temp = 0.0;
    for b in blobs {
        let dx = x - b.pos.x;
        let dy = y - b.pos.y;
        let d2 = dx * dx + dy * dy;
        let reach = b.radius * REACH;
        if d2 < reach * reach {
            let influence = b.radius * b.radius / (d2 + softening);
            density += influence;
            weighted_temp += b.temperature * influence;
        }
    }
    let temperature = if density > 0.0 {
        weighted_temp / density
    } else {
        0.0
    };
    Sample {
        density,
        temperature,
    }
}

/// Rasterises the blob population into a world-sized RGBA canvas. The
/// previous frame is kept around for the temporal blend at high smoothness.
pub(crate) struct FieldRenderer {
    prev: PixelCanvas,
    cur: PixelCanvas,
}

impl FieldRenderer {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            prev: PixelCanvas::new(w, h),
            cur: PixelCanvas::new(w, h),
        }
    }

    pub(crate) fn resize(&mut self, w: u32, h: u32) {
        self.prev = PixelCanvas::new(w, h);
        self.cur = PixelCanvas::new(w, h);
    }

    #[cfg(test)]
    pub(crate) fn canvas(&self) -> &PixelCanvas {
        &self.cur
    }

    pub(crate) fn render(
        &mut self,
        blobs: &[Blob],
        bounds: &Bounds,
        params: &Params,
        palette: &Palette,
    ) -> &PixelCanvas {
        std::mem::swap(&mut self.prev, &mut self.cur);
        self.cur.clear(Pixel::CLEAR);
        if blobs.is_empty() {
            return &self.cur;
        }

        let step = grid_step(params.smoothness);
        let k = softening(params.smoothness);
        let thr = threshold(params.smoothness);
        let temporal = params.smoothness > TEMPORAL_MIN_SMOOTHNESS;

        let mut y = bounds.top;
        while y < bounds.bottom {
            let mut x = bounds.left;
            while x < bounds.right {
                if bounds.contains(x, y) {
                    let s = sample(blobs, x, y, k);
                    if s.density > thr {
                        let rgb = palette.wax(s.temperature, s.density);
                        let alpha = remap(s.density, thr, SATURATION, MIN_ALPHA, MAX_ALPHA)
                            .clamp(MIN_ALPHA, MAX_ALPHA) as u8;
                        self.fill_cell(x, y, step, bounds, rgb, alpha, temporal);
                    }
                }
                x += step as f64;
            }
            y += step as f64;
        }
        &self.cur
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_cell(
        &mut self,
        x: f64,
        y: f64,
        step: u32,
        bounds: &Bounds,
        rgb: Rgb,
        alpha: u8,
        temporal: bool,
    ) {
        let (x0, y0) = (x.floor() as i64, y.floor() as i64);
        for py in y0..y0 + step as i64 {
            for px in x0..x0 + step as i64 {
                if px < 0 || py < 0 {
                    continue;
                }
                let (fx, fy) = (px as f64, py as f64);
                if fx >= bounds.right || fy >= bounds.bottom || !bounds.contains(fx, fy) {
                    continue;
                }
                let (ux, uy) = (px as u32, py as u32);
                let colour = match self.prev.get(ux, uy) {
                    Some(old) if temporal && old.a > 0 => blend(rgb, old.rgb(), TEMPORAL_BLEND),
                    _ => rgb,
                };
                self.cur.set(ux, uy, Pixel::from_rgb(colour, alpha));
            }
        }
    }
}

fn blend(new: Rgb, old: Rgb, k: f32) -> Rgb {
    let mix = |n: u8, o: u8| n as f32 * k + o as f32 * (1.0 - k);
    Rgb::from_f32(mix(new.r, old.r), mix(new.g, old.g), mix(new.b, old.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Geometry;

    fn bounds() -> Bounds {
        Bounds::centered(&Geometry::default(), 200.0, 250.0)
    }

    fn classic(smoothness: f64) -> (Params, Palette) {
        let p = Params {
            smoothness,
            psychedelic: false,
            ..Params::default()
        };
        (p, Palette::default())
    }

    #[test]
    fn grid_step_tracks_smoothness() {
        assert_eq!(grid_step(1.0), 3);
        assert_eq!(grid_step(5.0), 2);
        assert_eq!(grid_step(8.0), 1);
        assert_eq!(grid_step(10.0), 1);
        assert!((threshold(10.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn sample_weights_temperature_by_influence() {
        let mut a = Blob::new(90.0, 100.0, 10.0);
        a.temperature = 30.0;
        let mut b = Blob::new(110.0, 100.0, 10.0);
        b.temperature = 90.0;
        let s = sample(&[a.clone(), b], 100.0, 100.0, 1.0);
        assert!((s.temperature - 60.0).abs() < 1e-9);
        assert!((s.density - 2.0 * 100.0 / 101.0).abs() < 1e-9);

        let centre = sample(&[a.clone()], 90.0, 100.0, 3.0);
        assert!((centre.density - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(sample(&[a], 200.0, 100.0, 1.0), Sample::default());
    }

    #[test]
    fn empty_population_draws_nothing() {
        let (p, pal) = classic(10.0);
        let mut f = FieldRenderer::new(400, 500);
        assert_eq!(f.render(&[], &bounds(), &p, &pal).ink_count(), 0);
    }

    #[test]
    fn fluid_stays_inside_the_glass() {
        let bounds = bounds();
        let (p, pal) = classic(10.0);
        let mut f = FieldRenderer::new(400, 500);
        let blobs = [
            Blob::new(200.0, 380.0, 25.0),
            Blob::new(170.0, 100.0, 20.0),
            Blob::new(230.0, 250.0, 15.0),
        ];
        let c = f.render(&blobs, &bounds, &p, &pal);
        assert!(c.ink_count() > 0);
        for y in 0..c.h {
            for x in 0..c.w {
                if c.px[c.idx(x, y)].a > 0 {
                    assert!(bounds.contains(x as f64, y as f64), "ink at {x},{y}");
                }
            }
        }
    }

    #[test]
    fn blob_centre_is_opaque_and_far_field_is_empty() {
        let (p, pal) = classic(10.0);
        let mut f = FieldRenderer::new(400, 500);
        let mut b = Blob::new(200.0, 300.0, 20.0);
        b.temperature = 20.0;
        let c = f.render(&[b], &bounds(), &p, &pal);
        let centre = c.get(200, 300).unwrap();
        assert_eq!(centre.a, 255);
        assert_eq!(centre.rgb(), Rgb::new(150, 50, 200));
        assert_eq!(c.get(200, 360).unwrap().a, 0);
        let edge = c.px.iter().filter(|px| px.a > 0).map(|px| px.a).min().unwrap();
        assert!(edge >= 60);
    }

    #[test]
    fn coarse_grid_fills_whole_cells() {
        let (p, pal) = classic(1.0);
        let mut f = FieldRenderer::new(400, 500);
        let c = f.render(&[Blob::new(200.0, 300.0, 20.0)], &bounds(), &p, &pal);
        // samples start at x = 163, y = 85 and every 3px after that
        let left = bounds().left as u32;
        let top = bounds().top as u32;
        let sx = left + ((200 - left) / 3) * 3;
        let sy = top + ((300 - top) / 3) * 3;
        let base = c.get(sx, sy).unwrap();
        assert!(base.a > 0);
        for dy in 0..3 {
            for dx in 0..3 {
                assert_eq!(c.get(sx + dx, sy + dy), Some(base));
            }
        }
    }

    #[test]
    fn high_smoothness_blends_with_the_previous_frame() {
        let bounds = bounds();
        let mut cold = Blob::new(200.0, 300.0, 20.0);
        cold.temperature = 20.0;
        let mut hot = cold.clone();
        hot.temperature = 100.0;

        let (p, pal) = classic(10.0);
        let mut f = FieldRenderer::new(400, 500);
        f.render(&[cold.clone()], &bounds, &p, &pal);
        let px = f.render(&[hot.clone()], &bounds, &p, &pal).get(200, 300).unwrap();
        let near = |a: u8, b: u8| (a as i32 - b as i32).abs() <= 1;
        assert!(near(px.r, 224) && near(px.g, 155) && near(px.b, 130), "{px:?}");

        let (p, pal) = classic(5.0);
        let mut f = FieldRenderer::new(400, 500);
        f.render(&[cold], &bounds, &p, &pal);
        let px = f.render(&[hot], &bounds, &p, &pal).get(200, 300).unwrap();
        assert_eq!(px.rgb(), Rgb::new(255, 200, 100));
    }
}
