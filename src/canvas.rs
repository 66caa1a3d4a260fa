use crate::color::Rgb;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    pub(crate) const CLEAR: Pixel = Pixel { r: 0, g: 0, b: 0, a: 0 };

    pub(crate) fn from_rgb(c: Rgb, a: u8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a,
        }
    }

    pub(crate) fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// `self` with `src` composited on top.
    fn under(self, src: Pixel) -> Pixel {
        let sa = src.a as f32 / 255.0;
        let keep = self.a as f32 / 255.0 * (1.0 - sa);
        let a = sa + keep;
        if a <= 1e-6 {
            return Pixel::CLEAR;
        }
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        let mix = |s: u8, d: u8| q((s as f32 * sa + d as f32 * keep) / a);
        Pixel {
            r: mix(src.r, self.r),
            g: mix(src.g, self.g),
            b: mix(src.b, self.b),
            a: q(a * 255.0),
        }
    }
}

/// RGBA raster in world pixels.
#[derive(Clone, Debug)]
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
    }
    pub(crate) fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        if x < self.w && y < self.h {
            Some(self.px[self.idx(x, y)])
        } else {
            None
        }
    }
    pub(crate) fn set(&mut self, x: u32, y: u32, p: Pixel) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.px[i] = p;
        }
    }
    pub(crate) fn ink_count(&self) -> usize {
        self.px.iter().filter(|p| p.a > 0).count()
    }

    /// Source-over `src` onto the pixel at `(x, y)`; off-canvas writes are dropped.
    pub(crate) fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.px[i] = self.px[i].under(src);
        }
    }

    /// Filled disc of diameter `d` centred on `(cx, cy)`; always at least one pixel.
    pub(crate) fn fill_disc(&mut self, cx: f64, cy: f64, d: f64, p: Pixel) {
        let r = (d / 2.0).max(0.5);
        let x0 = (cx - r).floor() as i32;
        let x1 = (cx + r).ceil() as i32;
        let y0 = (cy - r).floor() as i32;
        let y1 = (cy + r).ceil() as i32;
        let mut hit = false;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.blend_over(x, y, p);
                    hit = true;
                }
            }
        }
        if !hit {
            self.blend_over(cx.floor() as i32, cy.floor() as i32, p);
        }
    }

    /// One-pixel outline of a circle of diameter `d`.
    pub(crate) fn stroke_circle(&mut self, cx: f64, cy: f64, d: f64, p: Pixel) {
        let r = d / 2.0;
        let (inner, outer) = ((r - 0.5).max(0.0), r + 0.5);
        let x0 = (cx - outer).floor() as i32;
        let x1 = (cx + outer).ceil() as i32;
        let y0 = (cy - outer).floor() as i32;
        let y1 = (cy + outer).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dist = (x as f64 + 0.5 - cx).hypot(y as f64 + 0.5 - cy);
                if dist >= inner && dist <= outer {
                    self.blend_over(x, y, p);
                }
            }
        }
    }

    /// Separable box blur with the given radius, premultiplied by alpha.
    pub(crate) fn box_blur(&self, radius: u32) -> PixelCanvas {
        let (w, h) = (self.w as usize, self.h as usize);
        let mut out = PixelCanvas::new(self.w, self.h);
        if w == 0 || h == 0 {
            return out;
        }
        let r = radius as i64;
        let span = (2 * r + 1) as f32;

        let mut tmp = vec![[0.0f32; 4]; w * h];
        for y in 0..h {
            let row = &self.px[y * w..(y + 1) * w];
            let mut acc = [0.0f32; 4];
            let pm = |p: &Pixel| {
                let a = p.a as f32;
                [p.r as f32 * a, p.g as f32 * a, p.b as f32 * a, a]
            };
            for k in -r..=r {
                let x = k.clamp(0, w as i64 - 1) as usize;
                let v = pm(&row[x]);
                for c in 0..4 {
                    acc[c] += v[c];
                }
            }
            for x in 0..w {
                for c in 0..4 {
                    tmp[y * w + x][c] = acc[c] / span;
                }
                let out_x = (x as i64 - r).clamp(0, w as i64 - 1) as usize;
                let in_x = (x as i64 + r + 1).clamp(0, w as i64 - 1) as usize;
                let (vo, vi) = (pm(&row[out_x]), pm(&row[in_x]));
                for c in 0..4 {
                    acc[c] += vi[c] - vo[c];
                }
            }
        }

        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for k in -r..=r {
                let y = k.clamp(0, h as i64 - 1) as usize;
                for c in 0..4 {
                    acc[c] += tmp[y * w + x][c];
                }
            }
            for y in 0..h {
                let a = acc[3] / span;
                let px = if a < 0.5 {
                    Pixel::CLEAR
                } else {
                    let un = |v: f32| (v / span / a).round().clamp(0.0, 255.0) as u8;
                    Pixel {
                        r: un(acc[0]),
                        g: un(acc[1]),
                        b: un(acc[2]),
                        a: a.round().clamp(0.0, 255.0) as u8,
                    }
                };
                out.px[y * w + x] = px;
                let out_y = (y as i64 - r).clamp(0, h as i64 - 1) as usize;
                let in_y = (y as i64 + r + 1).clamp(0, h as i64 - 1) as usize;
                for c in 0..4 {
                    acc[c] += tmp[in_y * w + x][c] - tmp[out_y * w + x][c];
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red(a: u8) -> Pixel {
        Pixel { r: 255, g: 0, b: 0, a }
    }

    #[test]
    fn blend_over_empty_keeps_source() {
        let mut c = PixelCanvas::new(2, 2);
        c.blend_over(1, 1, red(200));
        assert_eq!(c.get(1, 1), Some(red(200)));
        c.blend_over(-1, 0, red(255));
        c.blend_over(5, 0, red(255));
        assert_eq!(c.ink_count(), 1);
        assert_eq!(c.get(2, 0), None);
    }

    #[test]
    fn opaque_source_replaces_destination() {
        let mut c = PixelCanvas::new(1, 1);
        c.set(0, 0, Pixel { r: 0, g: 0, b: 255, a: 255 });
        c.blend_over(0, 0, red(255));
        assert_eq!(c.get(0, 0), Some(red(255)));
    }

    #[test]
    fn disc_covers_roughly_its_area() {
        let mut c = PixelCanvas::new(40, 40);
        c.fill_disc(20.0, 20.0, 10.0, red(255));
        let n = c.ink_count() as f64;
        let area = std::f64::consts::PI * 25.0;
        assert!((n - area).abs() < area * 0.2, "{n} vs {area}");

        let mut tiny = PixelCanvas::new(4, 4);
        tiny.fill_disc(1.2, 1.7, 0.1, red(255));
        assert_eq!(tiny.ink_count(), 1);
    }

    #[test]
    fn circle_outline_leaves_the_middle_empty() {
        let mut c = PixelCanvas::new(40, 40);
        c.stroke_circle(20.0, 20.0, 16.0, red(255));
        assert_eq!(c.get(20, 20).unwrap().a, 0);
        assert_eq!(c.get(27, 20).unwrap().a, 255);
        let n = c.ink_count() as f64;
        let perimeter = std::f64::consts::PI * 16.0;
        assert!((n - perimeter).abs() < perimeter * 0.3, "{n} vs {perimeter}");
    }

    #[test]
    fn blur_spreads_without_changing_colour() {
        let mut c = PixelCanvas::new(9, 9);
        c.set(4, 4, red(255));
        let b = c.box_blur(1);
        let centre = b.get(4, 4).unwrap();
        assert_eq!(centre.rgb(), Rgb::new(255, 0, 0));
        assert!(centre.a > 0 && centre.a < 255);
        assert!(b.get(3, 3).unwrap().a > 0);
        assert_eq!(b.get(0, 0).unwrap().a, 0);
    }
}
