use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis aligned box in projected meters. `min` is the south-west corner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BoundingBox {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }
    /// degenerate box with zero extent
    pub fn from_point(point: DVec2) -> Self {
        Self {
            min: point,
            max: point,
        }
    }
    /// returns None if there are no points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut bounds = Self::from_point(first);
        for point in points {
            bounds.expand(*point);
        }
        Some(bounds)
    }
    pub fn expand(&mut self, point: DVec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
    pub fn contains(&self, point: DVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use glam::dvec2;
    use similar_asserts::assert_eq;

    #[test]
    fn bounds_from_points() {
        let points = [dvec2(3.0, -1.0), dvec2(-2.0, 4.0), dvec2(1.0, 1.0)];
        let bounds = BoundingBox::from_points(&points).expect("points are not empty");
        assert_eq!(bounds.min, dvec2(-2.0, -1.0));
        assert_eq!(bounds.max, dvec2(3.0, 4.0));
        assert_eq!(bounds.width(), 5.0);
        assert_eq!(bounds.height(), 5.0);
        assert_eq!(bounds.center(), dvec2(0.5, 1.5));
        assert!(bounds.contains(dvec2(0.0, 0.0)));
        assert!(!bounds.contains(dvec2(3.5, 0.0)));
        assert!(BoundingBox::from_points(&[] as &[DVec2]).is_none());
    }

    #[test]
    fn new_orders_corners() {
        let bounds = BoundingBox::new(dvec2(10.0, 0.0), dvec2(0.0, 5.0));
        assert_eq!(bounds.min, dvec2(0.0, 0.0));
        assert_eq!(bounds.max, dvec2(10.0, 5.0));
    }
}
