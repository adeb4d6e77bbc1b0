use std::{cmp::Ordering, fmt};

use glam::{DVec2, Mat4};
use mapmark_render::{BoundingBox, MapProjection, StyledMesh, Texture, View};

use crate::{
    DrawRule, DrawRuleData, DrawRuleError, Ease, EaseType, Feature, SceneLayer, StyleContext,
    Styling,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user placed overlay on the map.
///
/// The owner fills it in step by step: bounds and feature, then styling and its draw rule,
/// and finally the mesh/texture once they are built. [Marker::update] must be called once per frame.
#[derive(Debug)]
pub struct Marker {
    id: MarkerId,
    bounds: BoundingBox,
    /// south-west corner of the bounds, unless an ease moved it since
    origin: DVec2,
    feature: Option<Feature>,
    styling: Styling,
    mesh: Option<StyledMesh>,
    /// style id and zoom that the mesh was built for
    style_id: u32,
    built_zoom_level: u32,
    texture: Option<Texture>,
    model_matrix: Mat4,
    model_view_projection_matrix: Mat4,
    ease: Option<Ease>,
    visible: bool,
    draw_order: i32,
    selection_color: u32,
}

impl Marker {
    pub fn new(id: MarkerId) -> Self {
        Self {
            id,
            bounds: Default::default(),
            origin: DVec2::ZERO,
            feature: None,
            styling: Default::default(),
            mesh: None,
            style_id: 0,
            built_zoom_level: 0,
            texture: None,
            model_matrix: Mat4::IDENTITY,
            model_view_projection_matrix: Mat4::IDENTITY,
            ease: None,
            visible: true,
            draw_order: 0,
            selection_color: 0,
        }
    }

    pub fn set_bounds(&mut self, bounds: BoundingBox) {
        self.bounds = bounds;
        self.origin = bounds.min;
    }
    pub fn set_feature(&mut self, feature: Option<Feature>) {
        self.feature = feature;
    }
    pub fn set_styling(&mut self, styling: &str, is_path: bool) {
        self.styling.set(styling, is_path);
    }
    /// Uses `data` as the only draw rule of this marker.
    pub fn set_draw_rule(&mut self, data: DrawRuleData) {
        self.styling.set_draw_rule(data);
    }
    /// Resolves the draw group of our styling against the scene layers.
    pub fn set_draw_rule_from_layers(&mut self, layers: &[&SceneLayer]) -> Result<(), DrawRuleError> {
        self.styling.set_draw_rule_from_layers(layers)
    }
    /// Drops the active draw rule. The styling string is kept.
    pub fn clear_draw_rule(&mut self) {
        self.styling.clear();
    }
    /// false if there is no draw rule, or if it doesn't apply in `ctx`
    pub fn evaluate_rule_for_context(&mut self, ctx: &mut dyn StyleContext) -> bool {
        self.styling.evaluate_rule_for_context(ctx)
    }

    /// Takes ownership of a mesh built for `style_id` at `zoom`.
    ///
    /// Point meshes are icons in unit space, so they are scaled to the size of a tile at `zoom`.
    /// Line and polygon meshes are tessellated in the unit space of their own bounds.
    /// Only the scale of the model matrix is written here, the translation belongs to [Marker::update].
    pub fn set_mesh(&mut self, style_id: u32, zoom: u32, mesh: StyledMesh) {
        self.mesh = Some(mesh);
        self.style_id = style_id;
        self.built_zoom_level = zoom;

        let scale = if self.feature.as_ref().is_some_and(Feature::is_point) {
            MapProjection::tile_size_meters(zoom)
        } else {
            self.extent()
        };
        let scale = scale as f32;
        self.model_matrix.x_axis.x = scale;
        self.model_matrix.y_axis.y = scale;
        self.model_matrix.z_axis.z = scale;
    }
    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.texture = texture;
    }

    /// Starts moving the origin to `destination`.
    /// A running ease is replaced. The new one starts wherever the previous one got to, so there is no jump.
    pub fn set_ease(&mut self, destination: DVec2, duration: f32, kind: EaseType) {
        let ease = Ease::new(self.origin, destination, duration, kind);
        if ease.finished() {
            self.origin = ease.position();
            self.ease = None;
        } else {
            self.ease = Some(ease);
        }
    }

    /// Per frame update.
    /// 1. advances the ease, which moves the origin
    /// 2. translates the model matrix by the origin, relative to the view position
    /// 3. recomputes the model view projection matrix
    pub fn update(&mut self, dt: f32, view: &View) {
        if let Some(ease) = self.ease.as_mut() {
            self.origin = ease.update(dt);
            if ease.finished() {
                self.ease = None;
            }
        }
        let relative = self.origin - view.position();
        self.model_matrix.w_axis.x = relative.x as f32;
        self.model_matrix.w_axis.y = relative.y as f32;

        self.model_view_projection_matrix = *view.view_projection_matrix() * self.model_matrix;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
    pub fn set_draw_order(&mut self, draw_order: i32) {
        self.draw_order = draw_order;
    }
    pub fn set_selection_color(&mut self, selection_color: u32) {
        self.selection_color = selection_color;
    }

    /// Drops the feature, mesh, texture, ease and draw rules. The id stays.
    pub fn clear(&mut self) {
        self.feature = None;
        self.mesh = None;
        self.texture = None;
        self.ease = None;
        self.styling.clear();
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
    pub fn origin(&self) -> DVec2 {
        self.origin
    }
    /// the longer side of the bounds
    pub fn extent(&self) -> f64 {
        self.bounds.width().max(self.bounds.height())
    }
    pub fn feature(&self) -> Option<&Feature> {
        self.feature.as_ref()
    }
    pub fn styling(&self) -> &Styling {
        &self.styling
    }
    /// None means the marker is not styled yet
    pub fn draw_rule(&self) -> Option<&DrawRule> {
        self.styling.draw_rule()
    }
    pub fn mesh(&self) -> Option<&StyledMesh> {
        self.mesh.as_ref()
    }
    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }
    pub fn style_id(&self) -> u32 {
        self.style_id
    }
    pub fn built_zoom_level(&self) -> u32 {
        self.built_zoom_level
    }
    pub fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }
    pub fn model_view_projection_matrix(&self) -> &Mat4 {
        &self.model_view_projection_matrix
    }
    pub fn is_easing(&self) -> bool {
        self.ease.as_ref().is_some_and(|e| !e.finished())
    }
    pub fn is_visible(&self) -> bool {
        self.visible
    }
    pub fn draw_order(&self) -> i32 {
        self.draw_order
    }
    pub fn selection_color(&self) -> u32 {
        self.selection_color
    }

    /// ascending draw order. markers with equal draw order have no particular order.
    pub fn compare_by_draw_order(lhs: &Marker, rhs: &Marker) -> Ordering {
        lhs.draw_order.cmp(&rhs.draw_order)
    }
}
