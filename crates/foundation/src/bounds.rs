/// Axis-aligned bounding box in 2D (lon/lat degrees or projected units).
///
/// An empty box has `min > max` and absorbs nothing until extended.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min[0] && x <= self.max[0] && y >= self.min[1] && y <= self.max[1]
    }

    pub fn center(&self) -> Option<[f64; 2]> {
        if self.is_empty() {
            return None;
        }
        Some([
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
        ])
    }
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;

    #[test]
    fn empty_box_grows_on_extend() {
        let mut b = Aabb2::empty();
        assert!(b.is_empty());
        assert_eq!(b.center(), None);

        b.extend(1.0, 2.0);
        b.extend(-1.0, 4.0);
        assert!(!b.is_empty());
        assert_eq!(b.min, [-1.0, 2.0]);
        assert_eq!(b.max, [1.0, 4.0]);
        assert_eq!(b.center(), Some([0.0, 3.0]));
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let mut b = Aabb2::empty();
        b.extend(f64::NAN, 0.0);
        assert!(b.is_empty());
    }

    #[test]
    fn union_skips_empty_sides() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        assert_eq!(a.union(&Aabb2::empty()), a);
        assert_eq!(Aabb2::empty().union(&a), a);
        let b = Aabb2::new([2.0, -1.0], [3.0, 0.5]);
        assert_eq!(a.union(&b), Aabb2::new([0.0, -1.0], [3.0, 1.0]));
        assert!(a.contains(0.5, 0.5));
        assert!(!a.contains(1.5, 0.5));
    }
}
