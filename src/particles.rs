use crate::blob::Blob;
use crate::bounds::Bounds;
use crate::canvas::{Pixel, PixelCanvas};
use crate::color::{hsb, Rgb};
use crate::config::Params;
use crate::math::{remap, Vec2};
use crate::population::random_x;
use rand::Rng;
use std::f64::consts::TAU;

const MAX_LIFE: f64 = 255.0;

pub(crate) const MAX_SPARKLES: usize = 200;
const SPARK_TEMP: f64 = 70.0;
const SPARK_CHANCE: f64 = 0.3;
/// Sparkles hotter than this also land in the glow layer.
pub(crate) const GLOW_TEMP: f64 = 60.0;
const SPARK_FADE: f64 = 3.0;

const BUBBLE_CHANCE: f64 = 0.1;
const BUBBLE_MIN_HEAT: f64 = 40.0;
const BUBBLE_FADE: f64 = 5.0;
/// Bubbles start fading this far below the top of the liquid.
const BUBBLE_FADE_ZONE: f64 = 50.0;

#[derive(Clone, Debug)]
pub(crate) struct Sparkle {
    pub(crate) pos: Vec2,
    vel: Vec2,
    pub(crate) temperature: f64,
    life: f64,
    size: f64,
    hue: f64,
    twinkle: f64,
}

impl Sparkle {
    fn spawn<R: Rng + ?Sized>(from: &Blob, phase: f64, rng: &mut R) -> Self {
        Self {
            pos: Vec2::new(
                from.pos.x + rng.gen_range(-10.0..10.0),
                from.pos.y + rng.gen_range(-10.0..10.0),
            ),
            vel: Vec2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-1.0..-0.1)),
            temperature: from.temperature,
            life: MAX_LIFE,
            size: rng.gen_range(1.0..4.0),
            hue: (phase + rng.gen_range(-0.2..0.2)).rem_euclid(1.0),
            twinkle: rng.gen_range(0.0..TAU),
        }
    }

    fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pos = self.pos.add(self.vel);
        self.vel.y += 0.01;
        self.vel.x *= 0.98;
        self.life -= SPARK_FADE;
        self.twinkle += 0.2;
        self.vel.x += rng.gen_range(-0.02..0.02);
        self.vel.y += rng.gen_range(-0.02..0.02);
    }

    fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    fn draw(&self, canvas: &mut PixelCanvas) {
        let alpha = remap(self.life, 0.0, MAX_LIFE, 0.0, 200.0);
        let intensity = self.twinkle.sin() * 0.5 + 0.5;
        let a = (alpha * intensity).clamp(0.0, 255.0) as u8;
        if a > 0 {
            canvas.fill_disc(self.pos.x, self.pos.y, self.size, Pixel::from_rgb(hsb(self.hue, 0.8, 0.9), a));
        }

        // cross flare at the peak of the twinkle
        if intensity > 0.7 {
            let flare = Pixel::from_rgb(Rgb::new(255, 255, 255), (alpha * 0.8) as u8);
            let arm = (self.size * 2.0).round() as i32;
            let (cx, cy) = (self.pos.x.floor() as i32, self.pos.y.floor() as i32);
            for d in -arm..=arm {
                canvas.blend_over(cx + d, cy, flare);
                if d != 0 {
                    canvas.blend_over(cx, cy + d, flare);
                }
            }
        }
    }
}

/// Short-lived glints thrown off by hot wax.
#[derive(Clone, Debug, Default)]
pub(crate) struct Sparkles {
    items: Vec<Sparkle>,
}

impl Sparkles {
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    /// Emit from hot blobs, then age everything one frame.
    pub(crate) fn update<R: Rng + ?Sized>(&mut self, blobs: &[Blob], phase: f64, rng: &mut R) {
        for b in blobs {
            if b.temperature > SPARK_TEMP && rng.gen::<f64>() < SPARK_CHANCE && self.items.len() < MAX_SPARKLES {
                self.items.push(Sparkle::spawn(b, phase, rng));
            }
        }
        for s in &mut self.items {
            s.update(rng);
        }
        self.items.retain(|s| !s.is_dead());
    }

    pub(crate) fn draw(&self, canvas: &mut PixelCanvas) {
        for s in &self.items {
            s.draw(canvas);
        }
    }

    pub(crate) fn draw_glowing(&self, canvas: &mut PixelCanvas) {
        for s in self.items.iter().filter(|s| s.temperature > GLOW_TEMP) {
            s.draw(canvas);
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Bubble {
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
    pub(crate) size: f64,
    life: f64,
    wobble: f64,
    wobble_speed: f64,
}

impl Bubble {
    fn new<R: Rng + ?Sized>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: rng.gen_range(2.0..8.0),
            vel: Vec2::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.5..-0.2)),
            life: MAX_LIFE,
            wobble: rng.gen_range(0.0..TAU),
            wobble_speed: rng.gen_range(0.05..0.15),
        }
    }

    fn update(&mut self, bounds: &Bounds, blobs: &[Blob]) {
        self.pos.y += self.vel.y;
        self.pos.x += self.vel.x + self.wobble.sin() * 0.2;
        self.wobble += self.wobble_speed;
        self.vel.y *= 0.995;

        if self.pos.y < bounds.top + BUBBLE_FADE_ZONE {
            self.life -= BUBBLE_FADE;
        }

        for b in blobs {
            if self.pos.dist(b.pos) < b.radius {
                self.vel = self.vel.add(b.vel.mul(0.1));
            }
        }

        let half = bounds.half_width(self.pos.y);
        let left = bounds.center_x - half + self.size;
        let right = bounds.center_x + half - self.size;
        if self.pos.x < left {
            self.pos.x = left;
            self.vel.x *= -0.5;
        }
        if self.pos.x > right {
            self.pos.x = right;
            self.vel.x *= -0.5;
        }
    }

    fn is_dead(&self, bounds: &Bounds) -> bool {
        self.life <= 0.0 || self.pos.y < bounds.top
    }

    fn draw(&self, canvas: &mut PixelCanvas) {
        let alpha = remap(self.life, 0.0, MAX_LIFE, 0.0, 150.0);
        let white = Rgb::new(255, 255, 255);
        canvas.fill_disc(self.pos.x, self.pos.y, self.size, Pixel::from_rgb(white, (alpha * 0.3) as u8));
        canvas.stroke_circle(self.pos.x, self.pos.y, self.size, Pixel::from_rgb(white, (alpha * 0.8) as u8));
        canvas.fill_disc(
            self.pos.x - self.size * 0.3,
            self.pos.y - self.size * 0.3,
            self.size * 0.4,
            Pixel::from_rgb(white, (alpha * 0.6) as u8),
        );
    }
}

/// Air bubbles rising off the heater.
#[derive(Clone, Debug, Default)]
pub(crate) struct Bubbles {
    pub(crate) items: Vec<Bubble>,
}

impl Bubbles {
    pub(crate) fn seeded<R: Rng + ?Sized>(params: &Params, bounds: &Bounds, rng: &mut R) -> Self {
        let mut b = Self::default();
        b.reseed(params, bounds, rng);
        b
    }

    /// Fresh set near the bottom, sized by particle density.
    pub(crate) fn reseed<R: Rng + ?Sized>(&mut self, params: &Params, bounds: &Bounds, rng: &mut R) {
        self.items.clear();
        let count = remap(params.particle_density, 1.0, 10.0, 5.0, 20.0).ceil() as usize;
        for _ in 0..count {
            let y = rng.gen_range(bounds.bottom - 30.0..bounds.bottom - 10.0);
            let x = random_x(bounds, y, 5.0, rng);
            if bounds.contains(x, y) {
                self.items.push(Bubble::new(x, y, rng));
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Maybe release a bubble from the heater, then move the rest.
    pub(crate) fn update<R: Rng + ?Sized>(
        &mut self,
        params: &Params,
        bounds: &Bounds,
        blobs: &[Blob],
        rng: &mut R,
    ) {
        if params.is_on && params.heat > BUBBLE_MIN_HEAT && rng.gen::<f64>() < BUBBLE_CHANCE {
            let max = remap(params.particle_density, 1.0, 10.0, 10.0, 30.0);
            if (self.items.len() as f64) < max {
                let y = bounds.bottom - 20.0;
                let x = random_x(bounds, y, 5.0, rng);
                if bounds.contains(x, y) {
                    self.items.push(Bubble::new(x, y, rng));
                }
            }
        }

        for b in &mut self.items {
            b.update(bounds, blobs);
        }
        self.items.retain(|b| !b.is_dead(bounds));
    }

    pub(crate) fn draw(&self, canvas: &mut PixelCanvas) {
        for b in &self.items {
            b.draw(canvas);
        }
    }
}
