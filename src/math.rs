#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec2 {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Vec2 {
    pub(crate) const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub(crate) fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    pub(crate) fn add(self, o: Vec2) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
    pub(crate) fn sub(self, o: Vec2) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }
    pub(crate) fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
    pub(crate) fn len2(self) -> f64 {
        self.x * self.x + self.y * self.y
    }
    pub(crate) fn len(self) -> f64 {
        self.len2().sqrt()
    }
    pub(crate) fn dist(self, o: Vec2) -> f64 {
        self.sub(o).len()
    }
    pub(crate) fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Linear re-mapping of `v` from `[a0, a1]` onto `[b0, b1]`. Not clamped:
/// values outside the source range extrapolate.
pub(crate) fn remap(v: f64, a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    let span = a1 - a0;
    if span.abs() <= f64::EPSILON {
        return b0;
    }
    b0 + (v - a0) / span * (b1 - b0)
}

pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// `max(lo)` then `min(hi)`. Unlike `f64::clamp` this never panics when the
/// range is inverted (a blob wider than the neck); `hi` wins in that case.
pub(crate) fn constrain(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remap_extrapolates_and_handles_reversed_ranges() {
        assert!((remap(5.5, 1.0, 10.0, 0.3, 1.0) - 0.65).abs() < 1e-12);
        assert!((remap(20.0, 20.0, 100.0, 1.2, 0.8) - 1.2).abs() < 1e-12);
        assert!((remap(100.0, 20.0, 100.0, 1.2, 0.8) - 0.8).abs() < 1e-12);
        assert!((remap(0.0, 15.0, 60.0, 1.1, 0.9) - (1.1 + 15.0 / 45.0 * 0.2)).abs() < 1e-12);
        assert_eq!(remap(3.0, 2.0, 2.0, 7.0, 9.0), 7.0);
    }

    #[test]
    fn constrain_prefers_upper_bound_when_inverted() {
        assert_eq!(constrain(5.0, 0.0, 10.0), 5.0);
        assert_eq!(constrain(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(constrain(11.0, 0.0, 10.0), 10.0);
        assert_eq!(constrain(5.0, 8.0, 2.0), 2.0);
    }

    #[test]
    fn vec_ops() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.len(), 5.0);
        assert_eq!(a.add(Vec2::new(1.0, 1.0)), Vec2::new(4.0, 5.0));
        assert_eq!(a.mul(2.0).sub(a), a);
        assert_eq!(Vec2::ZERO.dist(a), 5.0);
    }
}
