use glam::DVec2;
use indexmap::IndexMap;
use mapmark_render::BoundingBox;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryType {
    Points,
    Lines,
    Polygons,
}

/// Geometry and properties of a marker. Coordinates are projected meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry_type: GeometryType,
    /// one entry per point, per line or per polygon ring, depending on geometry type
    pub geometry: Vec<Vec<DVec2>>,
    #[serde(default)]
    pub props: IndexMap<SmolStr, Value>,
}

impl Feature {
    pub fn point(point: DVec2) -> Self {
        Self {
            geometry_type: GeometryType::Points,
            geometry: vec![vec![point]],
            props: Default::default(),
        }
    }
    pub fn polyline(points: Vec<DVec2>) -> Self {
        Self {
            geometry_type: GeometryType::Lines,
            geometry: vec![points],
            props: Default::default(),
        }
    }
    pub fn polygon(rings: Vec<Vec<DVec2>>) -> Self {
        Self {
            geometry_type: GeometryType::Polygons,
            geometry: rings,
            props: Default::default(),
        }
    }
    pub fn is_point(&self) -> bool {
        self.geometry_type == GeometryType::Points
    }
    /// None if there is no point in the geometry
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.geometry.iter().flatten())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use glam::dvec2;
    use similar_asserts::assert_eq;

    #[test]
    fn polygon_bounds_cover_all_rings() {
        let feature = Feature::polygon(vec![
            vec![dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 4.0)],
            vec![dvec2(2.0, -3.0), dvec2(3.0, 1.0)],
        ]);
        let bounds = feature.bounds().expect("polygon has points");
        assert_eq!(bounds.min, dvec2(0.0, -3.0));
        assert_eq!(bounds.max, dvec2(10.0, 4.0));
        assert!(!feature.is_point());
        assert!(Feature::polyline(vec![]).bounds().is_none());
    }
}
