use crate::canvas::PixelCanvas;
use crate::color::Rgb;
use crate::math::remap;
use crate::particles::Sparkles;

const PASSES: u32 = 3;

/// Overall weight of the glow for a bloom knob setting; zero turns it off.
pub(crate) fn strength(bloom_intensity: f64) -> f32 {
    if bloom_intensity <= 1.0 {
        return 0.0;
    }
    remap(bloom_intensity, 1.0, 10.0, 0.1, 0.8) as f32
}

/// Screen-accumulated light, one RGB triple in 0..1 per world pixel.
#[derive(Clone, Debug)]
pub(crate) struct Glow {
    pub(crate) w: u32,
    pub(crate) h: u32,
    light: Vec<[f32; 3]>,
}

impl Glow {
    /// Blur the glowing layer at radii 2, 4 and 6 and screen the passes
    /// together with falling weights. `None` when bloom is switched off.
    pub(crate) fn build(fluid: &PixelCanvas, sparkles: &Sparkles, bloom_intensity: f64) -> Option<Glow> {
        let k = strength(bloom_intensity);
        if k <= 0.0 {
            return None;
        }

        let mut layer = fluid.clone();
        sparkles.draw_glowing(&mut layer);

        let mut light = vec![[0.0f32; 3]; layer.px.len()];
        for i in 0..PASSES {
            let radius = (i + 1) * 2;
            let weight = k * (0.6 - 0.15 * i as f32);
            let blurred = layer.box_blur(radius);
            for (acc, p) in light.iter_mut().zip(&blurred.px) {
                if p.a == 0 {
                    continue;
                }
                let cover = p.a as f32 / 255.0 * weight;
                for (c, v) in acc.iter_mut().zip([p.r, p.g, p.b]) {
                    let l = v as f32 / 255.0 * cover;
                    *c = 1.0 - (1.0 - *c) * (1.0 - l);
                }
            }
        }

        Some(Glow {
            w: layer.w,
            h: layer.h,
            light,
        })
    }

    /// Mean light over a block of world pixels, clipped to the layer.
    pub(crate) fn average(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Rgb {
        let (x1, y1) = (x1.min(self.w), y1.min(self.h));
        if x0 >= x1 || y0 >= y1 {
            return Rgb::default();
        }
        let mut sum = [0.0f32; 3];
        for y in y0..y1 {
            let row = (y as usize) * (self.w as usize);
            for x in x0..x1 {
                let px = self.light[row + x as usize];
                for c in 0..3 {
                    sum[c] += px[c];
                }
            }
        }
        let n = ((x1 - x0) * (y1 - y0)) as f32;
        Rgb::from_f32(sum[0] / n * 255.0, sum[1] / n * 255.0, sum[2] / n * 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Pixel;

    fn at(g: &Glow, x: u32, y: u32) -> Rgb {
        g.average(x, y, x + 1, y + 1)
    }

    fn spot() -> PixelCanvas {
        let mut c = PixelCanvas::new(40, 40);
        for y in 18..22 {
            for x in 18..22 {
                c.set(x, y, Pixel { r: 255, g: 120, b: 0, a: 255 });
            }
        }
        c
    }

    #[test]
    fn knob_at_one_switches_bloom_off() {
        assert_eq!(strength(1.0), 0.0);
        assert!(Glow::build(&spot(), &Sparkles::default(), 1.0).is_none());
        assert!((strength(10.0) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn glow_spreads_past_the_source_and_fades() {
        let g = Glow::build(&spot(), &Sparkles::default(), 10.0).unwrap();
        let centre = at(&g, 20, 20);
        let halo = at(&g, 25, 20);
        let far = at(&g, 0, 0);
        assert!(centre.r > halo.r && halo.r > 0);
        assert_eq!(far, Rgb::default());
        // keeps the hue of what glows
        assert!(centre.r > centre.g && centre.b == 0);
    }

    #[test]
    fn stronger_knob_glows_brighter() {
        let lo = Glow::build(&spot(), &Sparkles::default(), 3.0).unwrap();
        let hi = Glow::build(&spot(), &Sparkles::default(), 9.0).unwrap();
        assert!(at(&hi, 20, 20).r > at(&lo, 20, 20).r);
        assert!(hi.average(16, 16, 24, 24).r > lo.average(16, 16, 24, 24).r);
        assert_eq!(hi.average(50, 50, 60, 60), Rgb::default());
    }
}
