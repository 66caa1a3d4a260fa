// Bottle silhouette: narrow neck at the top, flared body below.

/// Outer bottle dimensions in world pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Geometry {
    pub(crate) body_width: f64,
    pub(crate) neck_width: f64,
    pub(crate) height: f64,
    /// Horizontal glass thickness, per side.
    pub(crate) wall: f64,
    /// Vertical inset at each end of the bottle.
    pub(crate) lip: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            body_width: 90.0,
            neck_width: 70.0,
            height: 350.0,
            wall: 8.0,
            lip: 10.0,
        }
    }
}

impl Geometry {
    pub(crate) fn interior_body(&self) -> f64 {
        self.body_width - 2.0 * self.wall
    }
    pub(crate) fn interior_neck(&self) -> f64 {
        self.neck_width - 2.0 * self.wall
    }
    pub(crate) fn interior_height(&self) -> f64 {
        self.height - 2.0 * self.lip
    }
}

const NECK_END: f64 = 0.15;
const SHOULDER_END: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bounds {
    pub(crate) left: f64,
    pub(crate) right: f64,
    pub(crate) top: f64,
    pub(crate) bottom: f64,
    pub(crate) center_x: f64,
    pub(crate) center_y: f64,
    pub(crate) height: f64,
    neck: f64,
    body: f64,
}

impl Bounds {
    /// Interior bounds of a bottle whose outer shape is centred on `(cx, cy)`.
    pub(crate) fn centered(geometry: &Geometry, cx: f64, cy: f64) -> Self {
        let half_w = geometry.body_width / 2.0;
        let half_h = geometry.height / 2.0;
        Self {
            left: cx - half_w + geometry.wall,
            right: cx + half_w - geometry.wall,
            top: cy - half_h + geometry.lip,
            bottom: cy + half_h - geometry.lip,
            center_x: cx,
            center_y: cy,
            height: geometry.interior_height(),
            neck: geometry.interior_neck(),
            body: geometry.interior_body(),
        }
    }

    pub(crate) fn for_canvas(geometry: &Geometry, w: f64, h: f64) -> Self {
        Self::centered(geometry, w / 2.0, h / 2.0)
    }

    /// Interior width of the bottle at height `y`.
    pub(crate) fn width(&self, y: f64) -> f64 {
        let t = ((y - self.top) / self.height).clamp(0.0, 1.0);
        if t < NECK_END {
            self.neck
        } else if t < SHOULDER_END {
            let k = (t - NECK_END) / (SHOULDER_END - NECK_END);
            self.neck + (self.body - self.neck) * k
        } else {
            self.body
        }
    }

    pub(crate) fn half_width(&self, y: f64) -> f64 {
        self.width(y) / 2.0
    }

    pub(crate) fn contains(&self, x: f64, y: f64) -> bool {
        if y < self.top || y > self.bottom {
            return false;
        }
        (x - self.center_x).abs() <= self.half_width(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_bounds() -> Bounds {
        Bounds::centered(&Geometry::default(), 200.0, 250.0)
    }

    #[test]
    fn matches_default_bottle_layout() {
        let b = default_bounds();
        assert_eq!(b.left, 163.0);
        assert_eq!(b.right, 237.0);
        assert_eq!(b.top, 85.0);
        assert_eq!(b.bottom, 415.0);
        assert_eq!(b.height, 330.0);
        assert_eq!(b.width(b.top), 54.0);
        assert_eq!(b.width(b.bottom), 74.0);
        assert!((b.width(b.top + 0.2 * b.height) - 64.0).abs() < 1e-9);
    }

    #[test]
    fn width_is_clamped_outside_the_bottle() {
        let b = default_bounds();
        assert_eq!(b.width(b.top - 100.0), 54.0);
        assert_eq!(b.width(b.bottom + 100.0), 74.0);
    }

    #[test]
    fn width_is_continuous_at_region_boundaries() {
        let b = default_bounds();
        for t in [NECK_END, SHOULDER_END] {
            let y = b.top + t * b.height;
            let eps = 1e-7;
            let below = b.width(y - eps);
            let above = b.width(y + eps);
            assert!((below - above).abs() < 1e-4, "jump at t={t}: {below} vs {above}");
        }
    }

    #[test]
    fn contains_respects_the_neck() {
        let b = default_bounds();
        let neck_y = b.top + 5.0;
        assert!(b.contains(b.center_x + 26.0, neck_y));
        assert!(!b.contains(b.center_x + 30.0, neck_y));
        let body_y = b.bottom - 5.0;
        assert!(b.contains(b.center_x + 30.0, body_y));
        assert!(b.contains(b.center_x - 37.0, body_y));
        assert!(!b.contains(b.center_x - 37.5, body_y));
    }

    fn arb_geometry() -> impl Strategy<Value = Geometry> {
        (60.0..200.0_f64, 0.3..1.0_f64, 100.0..600.0_f64, 1.0..10.0_f64, 1.0..20.0_f64)
            .prop_map(|(body, neck_ratio, height, wall, lip)| Geometry {
                body_width: body,
                neck_width: (body * neck_ratio).max(2.0 * wall + 4.0),
                height,
                wall,
                lip,
            })
    }

    proptest! {
        #[test]
        fn nothing_is_inside_above_or_below(
            g in arb_geometry(),
            cx in -500.0..500.0_f64,
            cy in -500.0..500.0_f64,
            dx in -300.0..300.0_f64,
            dy in 0.001..300.0_f64,
        ) {
            let b = Bounds::centered(&g, cx, cy);
            prop_assert!(!b.contains(cx + dx, b.top - dy));
            prop_assert!(!b.contains(cx + dx, b.bottom + dy));
        }

        #[test]
        fn width_is_positive_over_the_interior(g in arb_geometry(), t in 0.0..=1.0_f64) {
            let b = Bounds::centered(&g, 0.0, 0.0);
            prop_assert!(b.width(b.top + t * b.height) > 0.0);
        }

        #[test]
        fn centre_line_is_always_inside(g in arb_geometry(), t in 0.0..0.999_f64) {
            let b = Bounds::centered(&g, 40.0, 60.0);
            prop_assert!(b.contains(b.center_x, b.top + t * b.height));
        }
    }
}
