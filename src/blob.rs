use crate::bounds::Bounds;
use crate::config::Params;
use crate::math::{lerp, remap, Vec2};
use rand::Rng;

pub(crate) const TEMP_MIN: f64 = 20.0;
pub(crate) const TEMP_MAX: f64 = 100.0;

const BUOYANCY: f64 = 0.03;
const GRAVITY: f64 = 0.012;
const MAX_VISCOSITY_FACTOR: f64 = 0.99;

/// One soft wax particle.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Blob {
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
    pub(crate) radius: f64,
    pub(crate) temperature: f64,
    pub(crate) target_temperature: f64,
    pub(crate) density: f64,
}

impl Blob {
    pub(crate) fn new(x: f64, y: f64, radius: f64) -> Self {
        debug_assert!(radius > 0.0, "blob radius must be positive, got {radius}");
        Self {
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            radius,
            temperature: 50.0,
            target_temperature: 50.0,
            density: 1.0,
        }
    }

    /// Area-proportional weight used when blobs combine.
    pub(crate) fn mass(&self) -> f64 {
        self.radius * self.radius
    }

    pub(crate) fn speed(&self) -> f64 {
        self.vel.len()
    }

    /// Advance one frame. `others` is every other live blob, as it stands
    /// right now.
    pub(crate) fn update<'a, R, I>(&mut self, params: &Params, bounds: &Bounds, others: I, rng: &mut R)
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = &'a Blob>,
    {
        let p = params;

        // Hot at the heater, cool under the cap; the dial pulls both ways.
        let heat_from_bottom =
            remap(self.pos.y, bounds.bottom, bounds.top, TEMP_MAX, TEMP_MIN).clamp(TEMP_MIN, TEMP_MAX);
        self.target_temperature = ((heat_from_bottom + p.heat) / 2.0).clamp(TEMP_MIN, TEMP_MAX);
        let rate = remap(p.smoothness, 1.0, 10.0, 0.02, 0.005);
        self.temperature =
            lerp(self.temperature, self.target_temperature, rate).clamp(TEMP_MIN, TEMP_MAX);

        self.density = remap(self.temperature, TEMP_MIN, TEMP_MAX, 1.2, 0.8);

        let speed_mul = remap(p.speed, 1.0, 10.0, 0.3, 1.0);
        self.vel.y -= (1.0 - self.density) * BUOYANCY * speed_mul;
        self.vel.y += GRAVITY * remap(self.radius, 15.0, 60.0, 1.1, 0.9) * speed_mul;

        let damping = (remap(p.viscosity, 1.0, 10.0, 0.85, 0.98)
            + remap(p.smoothness, 1.0, 10.0, 0.0, 0.05))
        .min(MAX_VISCOSITY_FACTOR);
        self.vel = self.vel.mul(damping);

        let jitter = remap(self.temperature, TEMP_MIN, TEMP_MAX, 0.01, 0.03)
            * remap(p.smoothness, 1.0, 10.0, 1.0, 0.1);
        if jitter > 0.0 {
            self.vel.x += rng.gen_range(-jitter..jitter);
            self.vel.y += rng.gen_range(-jitter..jitter);
        }

        let max_v = remap(p.speed, 1.0, 10.0, 0.5, 2.0);
        self.vel.x = self.vel.x.clamp(-max_v, max_v);
        self.vel.y = self.vel.y.clamp(-max_v, max_v);

        self.apply_surface_tension(p, others);

        self.pos = self.pos.add(self.vel);

        self.constrain_to(p, bounds);

        debug_assert!(self.pos.is_finite() && self.vel.is_finite(), "blob went non-finite: {self:?}");
    }

    fn apply_surface_tension<'a, I>(&mut self, p: &Params, others: I)
    where
        I: IntoIterator<Item = &'a Blob>,
    {
        let base = remap(p.smoothness, 1.0, 10.0, 0.0005, 0.003);
        for other in others {
            let d = other.pos.sub(self.pos);
            let dist = d.len();
            let reach = self.radius + other.radius;
            let near = reach * 0.8;
            let far = reach * 1.8;
            if dist > near && dist < far {
                let force = base * remap(dist, near, far, 1.0, 0.1);
                self.vel = self.vel.add(d.mul(force / dist));
            }
        }
    }

    /// Keep the blob inside the glass, bouncing softly off the walls.
    pub(crate) fn constrain_to(&mut self, p: &Params, bounds: &Bounds) {
        let half = bounds.half_width(self.pos.y);
        let left = bounds.center_x - half + self.radius;
        let right = bounds.center_x + half - self.radius;
        let bounce = remap(p.smoothness, 1.0, 10.0, 0.5, 0.1);

        if self.pos.x < left {
            self.pos.x = left;
            self.vel.x = self.vel.x.abs() * bounce;
        }
        if self.pos.x > right {
            self.pos.x = right;
            self.vel.x = -self.vel.x.abs() * bounce;
        }

        if self.pos.y < bounds.top + self.radius {
            self.pos.y = bounds.top + self.radius;
            self.vel.y = self.vel.y.abs() * bounce * 0.5;
        }
        if self.pos.y > bounds.bottom - self.radius {
            self.pos.y = bounds.bottom - self.radius;
            self.vel.y = -self.vel.y.abs() * bounce * 0.5;
        }

        if !bounds.contains(self.pos.x, self.pos.y) {
            let pull = remap(p.smoothness, 1.0, 10.0, 0.05, 0.01);
            self.vel.x += (bounds.center_x - self.pos.x) * pull;
            self.vel.y += (bounds.center_y - self.pos.y) * pull * 0.5;
        }
    }
}
