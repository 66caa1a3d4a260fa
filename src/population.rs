use crate::blob::Blob;
use crate::bounds::Bounds;
use crate::config::Params;
use crate::math::{constrain, remap, Vec2};
use rand::Rng;

/// The lamp never shows fewer blobs than this.
pub(crate) const MIN_BLOBS: usize = 8;
pub(crate) const SPLIT_MIN_RADIUS: f64 = 35.0;
const SPLIT_MAX_SPEED: f64 = 1.0;
const CHILD_SCALE: f64 = 0.7;
const MERGE_DAMPING: f64 = 0.8;

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TickReport {
    pub(crate) merges: usize,
    pub(crate) splits: usize,
    pub(crate) replenished: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Population {
    blobs: Vec<Blob>,
}

impl Population {
    /// Fresh lamp: one large blob resting on the heater, medium blobs in
    /// the lower body and a few small ones spread through the column.
    pub(crate) fn seeded<R: Rng + ?Sized>(params: &Params, bounds: &Bounds, rng: &mut R) -> Self {
        let mut pop = Self::default();
        pop.reseed(params, bounds, rng);
        pop
    }

    pub(crate) fn reseed<R: Rng + ?Sized>(&mut self, params: &Params, bounds: &Bounds, rng: &mut R) {
        self.blobs.clear();

        let count = remap(params.visual_quality, 1.0, 10.0, 8.0, 16.0);

        let base_r = bounds.width(bounds.bottom - 20.0) * 0.3;
        self.blobs
            .push(Blob::new(bounds.center_x, bounds.bottom - 15.0, base_r));

        let medium = (count * 0.6).floor() as usize;
        for _ in 0..medium {
            let y = rng.gen_range(bounds.bottom - 80.0..bounds.bottom - 20.0);
            let x = random_x(bounds, y, 10.0, rng);
            let r = rng.gen_range(12.0..25.0);
            if bounds.contains(x, y) {
                self.blobs.push(Blob::new(x, y, r));
            }
        }

        let small = (count * 0.4).floor() as usize;
        for _ in 0..small {
            let y = rng.gen_range(bounds.top + 30.0..bounds.bottom - 30.0);
            let x = random_x(bounds, y, 8.0, rng);
            let r = rng.gen_range(6.0..15.0);
            if bounds.contains(x, y) {
                self.blobs.push(Blob::new(x, y, r));
            }
        }

        self.replenish(bounds, rng);
        tracing::debug!(blobs = self.blobs.len(), "population seeded");
    }

    pub(crate) fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub(crate) fn len(&self) -> usize {
        self.blobs.len()
    }

    pub(crate) fn mean_temperature(&self) -> f64 {
        if self.blobs.is_empty() {
            return 0.0;
        }
        self.blobs.iter().map(|b| b.temperature).sum::<f64>() / self.blobs.len() as f64
    }

    /// One frame of blob physics. Does nothing while the lamp is off.
    pub(crate) fn tick<R: Rng + ?Sized>(
        &mut self,
        params: &Params,
        bounds: &Bounds,
        rng: &mut R,
    ) -> TickReport {
        if !params.is_on {
            return TickReport::default();
        }

        self.update_all(params, bounds, rng);
        let merges = self.merge_pass(params, bounds);
        let splits = self.split_pass(params, bounds, rng);
        let replenished = self.replenish(bounds, rng);

        TickReport {
            merges,
            splits,
            replenished,
        }
    }

    // Blobs later in the list see the already-moved positions of earlier
    // ones. The differences are a fraction of a pixel.
    fn update_all<R: Rng + ?Sized>(&mut self, params: &Params, bounds: &Bounds, rng: &mut R) {
        for i in 0..self.blobs.len() {
            let (before, rest) = self.blobs.split_at_mut(i);
            let Some((me, after)) = rest.split_first_mut() else {
                break;
            };
            me.update(params, bounds, before.iter().chain(after.iter()), rng);
        }
    }

    /// Single scan over all pairs; each blob joins at most one merge per
    /// pass. Merges made possible by this pass wait for the next tick.
    pub(crate) fn merge_pass(&mut self, params: &Params, bounds: &Bounds) -> usize {
        let n = self.blobs.len();
        let threshold = remap(params.smoothness, 1.0, 10.0, 0.95, 0.85);

        let mut consumed = vec![false; n];
        let mut merged = Vec::new();
        for i in 0..n {
            if consumed[i] {
                continue;
            }
            for j in (i + 1)..n {
                if consumed[j] {
                    continue;
                }
                let (a, b) = (&self.blobs[i], &self.blobs[j]);
                if a.pos.dist(b.pos) < (a.radius + b.radius) * threshold {
                    merged.push(merge(a, b, bounds));
                    consumed[i] = true;
                    consumed[j] = true;
                    break;
                }
            }
        }

        let count = merged.len();
        if count > 0 {
            remove_flagged(&mut self.blobs, &consumed);
            self.blobs.extend(merged);
        }
        count
    }

    /// Large, slow blobs with room to spare occasionally break in two.
    pub(crate) fn split_pass<R: Rng + ?Sized>(
        &mut self,
        params: &Params,
        bounds: &Bounds,
        rng: &mut R,
    ) -> usize {
        let chance = remap(params.smoothness, 1.0, 10.0, 0.02, 0.005);

        let mut parents = vec![false; self.blobs.len()];
        let mut children = Vec::new();
        for (i, b) in self.blobs.iter().enumerate() {
            if b.radius <= SPLIT_MIN_RADIUS || rng.gen::<f64>() >= chance {
                continue;
            }
            let room = bounds.width(b.pos.y) * 0.8;
            if b.radius * 2.0 < room && b.speed() < SPLIT_MAX_SPEED {
                children.extend(split(b, bounds));
                parents[i] = true;
            }
        }

        let count = children.len() / 2;
        if count > 0 {
            remove_flagged(&mut self.blobs, &parents);
            self.blobs.extend(children);
        }
        count
    }

    /// Tops the population back up to [`MIN_BLOBS`] with small blobs
    /// dropped in just above the heater.
    pub(crate) fn replenish<R: Rng + ?Sized>(&mut self, bounds: &Bounds, rng: &mut R) -> usize {
        let mut added = 0;
        while self.blobs.len() < MIN_BLOBS {
            let y = bounds.bottom - 30.0;
            let x = random_x(bounds, y, 10.0, rng);
            self.blobs.push(Blob::new(x, y, rng.gen_range(8.0..15.0)));
            added += 1;
        }
        added
    }
}

pub(crate) fn random_x<R: Rng + ?Sized>(bounds: &Bounds, y: f64, margin: f64, rng: &mut R) -> f64 {
    let half = bounds.half_width(y) - margin;
    if half <= 0.0 {
        return bounds.center_x;
    }
    rng.gen_range(bounds.center_x - half..bounds.center_x + half)
}

fn remove_flagged(blobs: &mut Vec<Blob>, flagged: &[bool]) {
    let mut idx = 0;
    blobs.retain(|_| {
        let keep = !flagged[idx];
        idx += 1;
        keep
    });
}

/// Area-conserving union of two blobs.
fn merge(a: &Blob, b: &Blob, bounds: &Bounds) -> Blob {
    let (ma, mb) = (a.mass(), b.mass());
    let total = ma + mb;
    let radius = total.sqrt();

    let weighted = |va: Vec2, vb: Vec2| va.mul(ma).add(vb.mul(mb)).mul(1.0 / total);
    let pos = weighted(a.pos, b.pos);
    let vel = weighted(a.vel, b.vel).mul(MERGE_DAMPING);
    let temperature = (a.temperature * ma + b.temperature * mb) / total;

    let half = bounds.half_width(pos.y);
    let x = constrain(
        pos.x,
        bounds.center_x - half + radius,
        bounds.center_x + half - radius,
    );

    let mut out = Blob::new(x, pos.y, radius);
    out.vel = vel;
    out.temperature = temperature;
    out
}

fn split(parent: &Blob, bounds: &Bounds) -> [Blob; 2] {
    let radius = parent.radius * CHILD_SCALE;
    let offset = radius * 0.6;
    let half = bounds.half_width(parent.pos.y);
    let lo = bounds.center_x - half + radius;
    let hi = bounds.center_x + half - radius;

    let child = |dx: f64, kick: f64| {
        let mut c = Blob::new(constrain(parent.pos.x + dx, lo, hi), parent.pos.y, radius);
        c.vel = Vec2::new(parent.vel.x * 0.5 + kick, parent.vel.y * 0.5);
        c.temperature = parent.temperature;
        c.target_temperature = parent.target_temperature;
        c.density = parent.density;
        c
    };
    [child(-offset, -0.2), child(offset, 0.2)]
}
