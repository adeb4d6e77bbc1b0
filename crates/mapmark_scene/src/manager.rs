use glam::DVec2;
use indexmap::IndexMap;
use itertools::Itertools;
use mapmark_render::{BoundingBox, MapProjection, View};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::{
    DrawRuleData, DrawRuleError, EaseType, Feature, ManagerConfig, Marker, MarkerError, MarkerId,
    SceneLayer, StyleValue,
};

/// Owns all markers of a map and is the only place that hands out marker ids.
///
/// Positions given to the manager are longitude/latitude in degrees. They are projected to mercator meters
/// before they reach the markers.
pub struct MarkerManager {
    markers: IndexMap<MarkerId, Marker>,
    /// ids are never reused, so that stale ids held by the ui can't point to a different marker
    next_id: u32,
    config: ManagerConfig,
}

impl MarkerManager {
    /// rule name for inline stylings which don't name a style
    pub const DEFAULT_INLINE_STYLE: &'static str = "points";
    /// selection colors encode the id in the lower 24 bits, so that is also the largest id
    const SELECTION_ID_MASK: u32 = 0x00ff_ffff;
    pub const MAX_ID: u32 = Self::SELECTION_ID_MASK;
    const SELECTION_ALPHA: u32 = 0xff00_0000;

    pub fn new(config: ManagerConfig) -> Self {
        Self {
            markers: Default::default(),
            next_id: 1,
            config,
        }
    }
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Fails once [Self::MAX_ID] ids were handed out.
    pub fn add(&mut self) -> Result<MarkerId, MarkerError> {
        if self.next_id > Self::MAX_ID {
            warn!(max = Self::MAX_ID, "out of marker ids");
            return Err(MarkerError::IdsExhausted);
        }
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        let mut marker = Marker::new(id);
        marker.set_draw_order(self.config.default_draw_order);
        marker.set_selection_color(Self::SELECTION_ALPHA | id.0);
        self.markers.insert(id, marker);
        debug!(%id, "added marker");
        Ok(id)
    }
    /// false if there was no such marker
    pub fn remove(&mut self, id: MarkerId) -> bool {
        let removed = self.markers.shift_remove(&id).is_some();
        debug!(%id, removed, "removing marker");
        removed
    }
    pub fn remove_all(&mut self) {
        info!(count = self.markers.len(), "removing all markers");
        self.markers.clear();
    }
    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(&id)
    }
    pub fn get_mut(&mut self, id: MarkerId) -> Option<&mut Marker> {
        self.markers.get_mut(&id)
    }
    pub fn len(&self) -> usize {
        self.markers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
    /// in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }
    /// the order in which markers should be drawn
    pub fn markers_by_draw_order(&self) -> Vec<&Marker> {
        self.markers
            .values()
            .sorted_unstable_by(|a, b| Marker::compare_by_draw_order(a, b))
            .collect()
    }
    /// the marker that was drawn with `color` into the selection buffer
    pub fn find_by_selection_color(&self, color: u32) -> Option<&Marker> {
        self.markers
            .values()
            .find(|marker| marker.selection_color() == color)
    }

    fn marker_mut(&mut self, id: MarkerId) -> Result<&mut Marker, MarkerError> {
        self.markers.get_mut(&id).ok_or(MarkerError::NotFound(id))
    }

    /// Sets the styling of a marker and resolves its draw rule.
    ///
    /// Path stylings are resolved against `layers`. Otherwise, `styling` is an inline json object of style params,
    /// with an optional `style` param naming the draw group.
    #[tracing::instrument(skip(self, layers))]
    pub fn set_styling(
        &mut self,
        id: MarkerId,
        styling: &str,
        is_path: bool,
        layers: &[&SceneLayer],
    ) -> Result<(), MarkerError> {
        let marker = self.marker_mut(id)?;
        marker.set_styling(styling, is_path);
        if is_path {
            marker.set_draw_rule_from_layers(layers)?;
        } else {
            match parse_inline_styling(styling) {
                Ok(data) => marker.set_draw_rule(data),
                Err(e) => {
                    marker.clear_draw_rule();
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Places the marker at a single point.
    pub fn set_point(&mut self, id: MarkerId, lon_lat: DVec2) -> Result<(), MarkerError> {
        let marker = self.marker_mut(id)?;
        let meters = MapProjection::lon_lat_to_meters(lon_lat);
        marker.set_feature(Some(Feature::point(meters)));
        marker.set_bounds(BoundingBox::from_point(meters));
        Ok(())
    }

    /// Animates the marker to a new point. Markers which were never placed are placed right away.
    /// The bounds are not updated until the marker is placed again without easing.
    pub fn set_point_eased(
        &mut self,
        id: MarkerId,
        lon_lat: DVec2,
        duration: f32,
        ease: EaseType,
    ) -> Result<(), MarkerError> {
        let marker = self.marker_mut(id)?;
        if marker.feature().is_none() {
            return self.set_point(id, lon_lat);
        }
        marker.set_ease(MapProjection::lon_lat_to_meters(lon_lat), duration, ease);
        Ok(())
    }

    /// [Self::set_point_eased] with the duration and curve from the config
    pub fn ease_to(&mut self, id: MarkerId, lon_lat: DVec2) -> Result<(), MarkerError> {
        let ManagerConfig {
            default_ease,
            default_ease_duration,
            ..
        } = self.config;
        self.set_point_eased(id, lon_lat, default_ease_duration, default_ease)
    }

    pub fn set_polyline(&mut self, id: MarkerId, coordinates: &[DVec2]) -> Result<(), MarkerError> {
        let points = coordinates
            .iter()
            .copied()
            .map(MapProjection::lon_lat_to_meters)
            .collect();
        self.set_shape(id, Feature::polyline(points))
    }

    pub fn set_polygon(&mut self, id: MarkerId, rings: &[Vec<DVec2>]) -> Result<(), MarkerError> {
        let rings = rings
            .iter()
            .map(|ring| {
                ring.iter()
                    .copied()
                    .map(MapProjection::lon_lat_to_meters)
                    .collect()
            })
            .collect();
        self.set_shape(id, Feature::polygon(rings))
    }

    fn set_shape(&mut self, id: MarkerId, feature: Feature) -> Result<(), MarkerError> {
        let marker = self.marker_mut(id)?;
        let bounds = feature.bounds().ok_or(MarkerError::EmptyGeometry(id))?;
        marker.set_feature(Some(feature));
        marker.set_bounds(bounds);
        Ok(())
    }

    /// Updates all markers for this frame. Returns true if any marker is still easing,
    /// in which case the caller should request another frame.
    pub fn update(&mut self, dt: f32, view: &View) -> bool {
        let mut easing = false;
        for marker in self.markers.values_mut() {
            marker.update(dt, view);
            easing |= marker.is_easing();
        }
        easing
    }
}

fn parse_inline_styling(styling: &str) -> Result<DrawRuleData, DrawRuleError> {
    let params: IndexMap<SmolStr, StyleValue> = serde_json::from_str(styling)?;
    let name = match params.get("style") {
        Some(StyleValue::Static(Value::String(style))) => SmolStr::new(style),
        _ => SmolStr::new_inline(MarkerManager::DEFAULT_INLINE_STYLE),
    };
    Ok(DrawRuleData {
        name,
        id: 0,
        params,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::DrawRuleMergeSet;
    use glam::{dvec2, Mat4};
    use mapmark_render::StyledMesh;
    use rstest::*;
    use serde_json::json;
    use similar_asserts::assert_eq;
    use test_log::test;

    #[fixture]
    fn manager() -> MarkerManager {
        MarkerManager::new(ManagerConfig::default())
    }

    #[fixture]
    fn layers() -> Vec<SceneLayer> {
        vec![SceneLayer::new("touch").with_rule(DrawRuleData {
            name: "pins".into(),
            id: 11,
            params: [("size".into(), StyleValue::Static(json!(24)))]
                .into_iter()
                .collect(),
        })]
    }

    #[rstest]
    #[test]
    fn ids_are_unique_and_not_reused(mut manager: MarkerManager) {
        let a = manager.add().expect("ids left");
        let b = manager.add().expect("ids left");
        assert_ne!(a, b);
        assert!(manager.remove(a));
        assert!(!manager.remove(a));
        let c = manager.add().expect("ids left");
        assert_ne!(c, a);
        assert_eq!(manager.len(), 2);
        manager.remove_all();
        assert!(manager.is_empty());
        assert!(manager.get(b).is_none());
    }

    #[rstest]
    #[test]
    fn selection_color_finds_marker(mut manager: MarkerManager) {
        let a = manager.add().expect("ids left");
        let b = manager.add().expect("ids left");
        let color = manager.get(b).expect("b exists").selection_color();
        assert_ne!(color, manager.get(a).expect("a exists").selection_color());
        assert_eq!(manager.find_by_selection_color(color).map(Marker::id), Some(b));
        assert!(manager.find_by_selection_color(0).is_none());
    }

    #[rstest]
    #[test]
    fn styling_from_layers_and_inline(mut manager: MarkerManager, layers: Vec<SceneLayer>) {
        let refs: Vec<&SceneLayer> = layers.iter().collect();
        let id = manager.add().expect("ids left");
        manager
            .set_styling(id, "touch:pins", true, &refs)
            .expect("pins exist");
        assert_eq!(manager.get(id).and_then(|m| m.draw_rule()).map(|r| r.id), Some(11));

        manager
            .set_styling(id, r#"{ "style": "icons", "color": "white" }"#, false, &refs)
            .expect("valid inline styling");
        let rule = manager.get(id).and_then(|m| m.draw_rule()).expect("inline rule");
        assert_eq!(rule.name, "icons");
        assert_eq!(rule.param("color"), Some(&StyleValue::Static(json!("white"))));

        let err = manager
            .set_styling(id, "not json", false, &refs)
            .expect_err("broken inline styling");
        assert!(matches!(
            err,
            MarkerError::DrawRule(DrawRuleError::InvalidInlineStyle(_))
        ));
        let marker = manager.get(id).expect("marker exists");
        assert_eq!(marker.styling().reference().raw(), "not json");
        assert!(marker.draw_rule().is_none());
        assert!(marker.styling().rule_data().is_none());

        let err = manager
            .set_styling(id, "pins", true, &refs)
            .expect_err("no draw group");
        assert!(matches!(
            err,
            MarkerError::DrawRule(DrawRuleError::MissingDrawGroup { .. })
        ));
        assert!(manager.get(id).and_then(|m| m.draw_rule()).is_none());
    }

    #[rstest]
    #[test]
    fn inline_styling_defaults_to_points() {
        let data = parse_inline_styling(r#"{ "size": { "expr": "zoom" } }"#).expect("valid json");
        assert_eq!(data.name, MarkerManager::DEFAULT_INLINE_STYLE);
        let mut set = DrawRuleMergeSet::default();
        set.push(crate::DrawRule::from_data(&data, "", 0));
        let mut ctx = |expr: &str| (expr == "zoom").then(|| json!(12));
        assert!(set.evaluate_first_for_context(&mut ctx));
        assert_eq!(set.evaluated().get("size"), Some(&json!(12)));
    }

    #[rstest]
    #[test]
    fn broken_inline_styling_drops_previous_rule(mut manager: MarkerManager) {
        let id = manager.add().expect("ids left");
        manager
            .set_styling(id, r#"{ "color": "white" }"#, false, &[])
            .expect("valid inline styling");
        assert!(manager.get(id).and_then(|m| m.draw_rule()).is_some());

        assert!(manager.set_styling(id, "not json", false, &[]).is_err());
        let marker = manager.get(id).expect("marker exists");
        assert!(marker.draw_rule().is_none());
        assert_eq!(marker.styling().rule_set().matched_rules().len(), 0);
        let mut ctx = |_: &str| -> Option<Value> { None };
        let marker = manager.get_mut(id).expect("marker exists");
        assert!(!marker.evaluate_rule_for_context(&mut ctx));
    }

    #[rstest]
    #[test]
    fn ids_stop_at_the_selection_color_range(mut manager: MarkerManager) {
        manager.next_id = MarkerManager::MAX_ID;
        let last = manager.add().expect("the largest id is still free");
        assert_eq!(last, MarkerId(MarkerManager::MAX_ID));
        assert_eq!(
            manager.get(last).map(Marker::selection_color),
            Some(0xffff_ffff)
        );
        assert!(matches!(manager.add(), Err(MarkerError::IdsExhausted)));
        // removing doesn't make ids available again
        assert!(manager.remove(last));
        assert!(matches!(manager.add(), Err(MarkerError::IdsExhausted)));
        assert!(manager.is_empty());
    }

    #[rstest]
    #[test]
    fn missing_marker_is_reported(mut manager: MarkerManager) {
        let err = manager
            .set_point(MarkerId(42), dvec2(0.0, 0.0))
            .expect_err("marker doesn't exist");
        assert!(matches!(err, MarkerError::NotFound(MarkerId(42))));
    }

    #[rstest]
    #[test]
    fn shapes_get_bounds(mut manager: MarkerManager) {
        let id = manager.add().expect("ids left");
        manager
            .set_polyline(id, &[dvec2(0.0, 0.0), dvec2(1.0, 1.0)])
            .expect("marker exists");
        let marker = manager.get(id).expect("marker exists");
        let expected_min = MapProjection::lon_lat_to_meters(dvec2(0.0, 0.0));
        let expected_max = MapProjection::lon_lat_to_meters(dvec2(1.0, 1.0));
        assert_eq!(marker.bounds().min, expected_min);
        assert_eq!(marker.bounds().max, expected_max);
        assert_eq!(marker.origin(), expected_min);

        let err = manager.set_polygon(id, &[vec![]]).expect_err("empty ring");
        assert!(matches!(err, MarkerError::EmptyGeometry(_)));
    }

    #[rstest]
    #[test]
    fn eased_point_animates_after_first_placement(mut manager: MarkerManager) {
        let id = manager.add().expect("ids left");
        let view = View::from_parts(dvec2(0.0, 0.0), Mat4::IDENTITY);
        // first placement is immediate
        manager
            .set_point_eased(id, dvec2(10.0, 10.0), 1.0, EaseType::Linear)
            .expect("marker exists");
        let start = MapProjection::lon_lat_to_meters(dvec2(10.0, 10.0));
        assert_eq!(manager.get(id).map(Marker::origin), Some(start));
        assert!(!manager.update(0.1, &view));

        manager
            .set_point_eased(id, dvec2(20.0, 10.0), 1.0, EaseType::Linear)
            .expect("marker exists");
        assert!(manager.update(0.5, &view));
        assert!(manager.update(0.25, &view));
        assert!(!manager.update(0.25, &view));
        let end = MapProjection::lon_lat_to_meters(dvec2(20.0, 10.0));
        let marker = manager.get(id).expect("marker exists");
        assert_eq!(marker.origin(), end);
        // bounds stay where the marker was placed
        assert_eq!(marker.bounds().min, start);
    }

    #[rstest]
    #[test]
    fn ease_to_uses_config() {
        let mut manager = MarkerManager::new(ManagerConfig {
            default_ease_duration: 0.0,
            ..Default::default()
        });
        let id = manager.add().expect("ids left");
        manager.set_point(id, dvec2(0.0, 0.0)).expect("marker exists");
        manager.ease_to(id, dvec2(5.0, 5.0)).expect("marker exists");
        let marker = manager.get(id).expect("marker exists");
        assert!(!marker.is_easing());
        assert_eq!(marker.origin(), MapProjection::lon_lat_to_meters(dvec2(5.0, 5.0)));
    }

    #[rstest]
    #[test]
    fn draw_order_sorting_and_update(mut manager: MarkerManager) {
        for order in [3, 1, 2] {
            let id = manager.add().expect("ids left");
            let marker = manager.get_mut(id).expect("just added");
            marker.set_draw_order(order);
            marker.set_bounds(BoundingBox::from_point(dvec2(order as f64, 0.0)));
            marker.set_mesh(0, 0, StyledMesh::default());
        }
        let orders: Vec<i32> = manager
            .markers_by_draw_order()
            .into_iter()
            .map(Marker::draw_order)
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);

        let view = View::from_parts(dvec2(1.0, 0.0), Mat4::IDENTITY);
        manager.update(0.016, &view);
        let translations: Vec<f32> = manager
            .iter()
            .map(|m| m.model_matrix().w_axis.x)
            .collect();
        assert_eq!(translations, vec![2.0, 0.0, 1.0]);
    }
}
