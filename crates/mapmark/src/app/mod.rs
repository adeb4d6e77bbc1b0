use cap_std::fs_utf8::Dir;
use mapmark_core::{
    init::{get_data_dir, load_json_or_default},
    prelude::*,
    trace::{install_miette_panic_hook, install_tracing},
};
use mapmark_render::{MapProjection, StyledMesh, Texture, View};
use mapmark_scene::{ManagerConfig, Marker, MarkerId, MarkerManager, SceneLayer};
use serde_json::json;

mod scene;
use scene::{MarkerDescription, MarkerGeometry, SceneDescription, SCENE_FILE_NAME};

/// frames per second of the simulated frame loop
const FRAME_RATE: f64 = 60.0;
/// frames to run after all animations are done, so the last positions get logged
const IDLE_FRAMES: u32 = 2;
/// hard limit on the number of frames, in case something never stops easing
const MAX_FRAMES: u32 = 60 * 60;

/// Style param holding the rgba color of a marker
const COLOR_PARAM: &str = "color";
const DEFAULT_COLOR: [u8; 4] = [255, 255, 255, 255];

pub struct MapMark {
    /// frames run so far
    frame_count: u32,
    layers: Vec<SceneLayer>,
    marker_manager: MarkerManager,
    view: View,
    /// simulated time in seconds
    time: f64,
}

impl MapMark {
    fn new(data_dir: &Dir) -> Result<Self> {
        let config = ManagerConfig::load(data_dir);
        let scene: SceneDescription = load_json_or_default(data_dir, SCENE_FILE_NAME);
        if scene.layers.is_empty() {
            bail!("{SCENE_FILE_NAME} has no layers");
        }
        Ok(Self::from_scene(config, scene))
    }

    fn from_scene(config: ManagerConfig, scene: SceneDescription) -> Self {
        let mut view = View::new(scene.view.width, scene.view.height);
        view.set_position(MapProjection::lon_lat_to_meters(scene.view.lon_lat));
        view.set_zoom(scene.view.zoom);
        view.update();

        let mut app = Self {
            frame_count: 0,
            layers: scene.layers,
            marker_manager: MarkerManager::new(config),
            view,
            time: 0.0,
        };
        for description in &scene.markers {
            if let Err(e) = app.add_marker(description) {
                // a broken marker shouldn't keep the rest of the scene from loading
                warn!(styling = %description.styling, ?e, "failed to add marker");
            }
        }
        info!(markers = app.marker_manager.len(), "loaded scene");
        app
    }

    fn add_marker(&mut self, description: &MarkerDescription) -> Result<MarkerId> {
        let Self {
            layers,
            marker_manager,
            ..
        } = self;
        let id = marker_manager.add()?;
        let layers: Vec<&SceneLayer> = layers.iter().collect();
        let result = (|| -> Result<()> {
            match &description.geometry {
                MarkerGeometry::Point { lon_lat } => marker_manager.set_point(id, *lon_lat)?,
                MarkerGeometry::Polyline { coordinates } => {
                    marker_manager.set_polyline(id, coordinates)?
                }
                MarkerGeometry::Polygon { rings } => marker_manager.set_polygon(id, rings)?,
            }
            marker_manager
                .set_styling(id, &description.styling, description.is_path, &layers)
                .wrap_err("failed to resolve marker styling")?;
            if let Some(draw_order) = description.draw_order {
                if let Some(marker) = marker_manager.get_mut(id) {
                    marker.set_draw_order(draw_order);
                }
            }
            if let Some(destination) = description.ease_to {
                marker_manager.ease_to(id, destination)?;
            }
            Ok(())
        })();
        if let Err(e) = result {
            marker_manager.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Runs one frame. Returns true while another frame is needed.
    /// Meshes are attached before the markers update, so that the matrices of this frame include them.
    fn tick(&mut self, dt: f64) -> bool {
        self.time += dt;
        self.frame_count += 1;
        self.view.update();
        self.build_meshes();
        self.marker_manager.update(dt as f32, &self.view)
    }

    /// Rebuilds the mesh of every marker whose mesh doesn't match its draw rule or the current zoom.
    fn build_meshes(&mut self) {
        let zoom = self.view.zoom().floor().max(0.0) as u32;
        let ids: Vec<MarkerId> = self.marker_manager.iter().map(Marker::id).collect();
        for id in ids {
            let Some(marker) = self.marker_manager.get_mut(id) else {
                continue;
            };
            let Some(style_id) = marker.draw_rule().map(|rule| rule.id) else {
                continue;
            };
            if marker.mesh().is_some()
                && marker.style_id() == style_id
                && marker.built_zoom_level() == zoom
            {
                continue;
            }
            let props = marker
                .feature()
                .map(|feature| feature.props.clone())
                .unwrap_or_default();
            let mut ctx = |expression: &str| -> Option<Value> {
                match expression {
                    "$zoom" => Some(json!(zoom)),
                    _ => props.get(expression.trim_start_matches('$')).cloned(),
                }
            };
            let visible = marker.evaluate_rule_for_context(&mut ctx);
            marker.set_visible(visible);
            if !visible {
                debug!(%id, "marker is hidden by its style");
                continue;
            }
            let color = marker
                .styling()
                .rule_set()
                .evaluated()
                .get(COLOR_PARAM)
                .and_then(parse_color)
                .unwrap_or(DEFAULT_COLOR);
            let is_point = marker.feature().is_some_and(|feature| feature.is_point());
            marker.set_mesh(style_id, zoom, StyledMesh::unit_quad(color));
            if is_point {
                match Texture::from_rgba8(1, 1, color.to_vec()) {
                    Ok(texture) => marker.set_texture(Some(texture)),
                    Err(e) => error!(%id, ?e, "failed to create marker texture"),
                }
            }
            debug!(%id, style_id, zoom, ?color, "built marker mesh");
        }
    }

    fn run(&mut self) {
        let dt = 1.0 / FRAME_RATE;
        let mut idle_frames = 0;
        while self.frame_count < MAX_FRAMES {
            if self.tick(dt) {
                idle_frames = 0;
            } else {
                idle_frames += 1;
                if idle_frames >= IDLE_FRAMES {
                    break;
                }
            }
        }
        for marker in self.marker_manager.markers_by_draw_order() {
            info!(
                id = %marker.id(),
                draw_order = marker.draw_order(),
                visible = marker.is_visible(),
                lon_lat = ?MapProjection::meters_to_lon_lat(marker.origin()),
                selection_color = format_args!("{:#010x}", marker.selection_color()),
                "marker"
            );
        }
        info!(
            frames = self.frame_count,
            seconds = self.time,
            "finished"
        );
    }
}

/// `[r, g, b, a]` with each channel in 0..=255
fn parse_color(value: &Value) -> Option<[u8; 4]> {
    let channels = value.as_array()?;
    let mut color = [0u8; 4];
    if channels.len() != color.len() {
        return None;
    }
    for (channel, value) in color.iter_mut().zip(channels) {
        *channel = value.as_u64()?.try_into().ok()?;
    }
    Some(color)
}

pub fn start_mapmark() {
    let data_dir = match get_data_dir() {
        Ok(data_dir) => data_dir,
        Err(e) => {
            eprintln!("failed to create data dir: {e:#?}");
            panic!("failed to create data dir: {e:#?}");
        }
    };
    let log_file_flush_guard = match install_tracing(&data_dir) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("failed to install tracing: {e:#?}");
            panic!("failed to install tracing: {e:#?}");
        }
    };
    if let Err(e) = install_miette_panic_hook() {
        error!(?e, "failed to install panic hook");
    }

    match MapMark::new(&data_dir) {
        Ok(mut app) => app.run(),
        Err(e) => {
            error!(?e, "failed to create MapMark App");
        }
    };
    std::mem::drop(log_file_flush_guard);
}

#[cfg(test)]
mod test {
    use super::*;
    use glam::{dvec2, DVec2};
    use rstest::*;
    use similar_asserts::assert_eq;

    #[rstest]
    #[case(json!([1, 2, 3, 4]), Some([1, 2, 3, 4]))]
    #[case(json!([1, 2, 3]), None)]
    #[case(json!([1, 2, 3, 256]), None)]
    #[case(json!("red"), None)]
    fn colors(#[case] value: Value, #[case] expected: Option<[u8; 4]>) {
        assert_eq!(parse_color(&value), expected);
    }

    #[fixture]
    fn app() -> MapMark {
        MapMark::from_scene(ManagerConfig::default(), SceneDescription::default())
    }

    #[rstest]
    fn demo_scene_runs_until_easing_stops(mut app: MapMark) {
        assert_eq!(app.marker_manager.len(), 4);
        app.run();
        // the default ease lasts half a second
        assert!(app.frame_count < MAX_FRAMES);
        assert!(app.marker_manager.iter().all(|m| !m.is_easing()));
        let cafe = app.marker_manager.get(MarkerId(1)).expect("cafe marker");
        let destination = MapProjection::lon_lat_to_meters(dvec2(13.4105, 52.5219));
        assert_eq!(cafe.origin(), destination);
    }

    #[rstest]
    fn meshes_follow_style_and_zoom(mut app: MapMark) {
        app.tick(1.0 / FRAME_RATE);
        let cafe = app.marker_manager.get(MarkerId(1)).expect("cafe marker");
        assert_eq!(cafe.style_id(), 1);
        assert_eq!(cafe.built_zoom_level(), 14);
        assert!(cafe.texture().is_some());
        assert_eq!(
            cafe.mesh().map(|mesh| mesh.vertices[0].color),
            Some([160, 82, 45, 255])
        );

        app.view.set_zoom(15.5);
        app.tick(1.0 / FRAME_RATE);
        let cafe = app.marker_manager.get(MarkerId(1)).expect("cafe marker");
        assert_eq!(cafe.built_zoom_level(), 15);
    }

    #[rstest]
    fn matrices_include_meshes_built_this_frame(mut app: MapMark) {
        app.tick(1.0 / FRAME_RATE);
        let view_position = app.view.position();
        let view_projection = *app.view.view_projection_matrix();
        let built: Vec<&Marker> = app
            .marker_manager
            .iter()
            .filter(|marker| marker.mesh().is_some())
            .collect();
        assert!(!built.is_empty());
        for marker in built {
            let relative = marker.origin() - view_position;
            let translation = marker.model_matrix().w_axis;
            assert_eq!(translation.x, relative.x as f32, "marker {}", marker.id());
            assert_eq!(translation.y, relative.y as f32, "marker {}", marker.id());
            assert_eq!(
                *marker.model_view_projection_matrix(),
                view_projection * *marker.model_matrix()
            );
        }
    }

    #[rstest]
    fn expression_without_value_hides_marker(mut app: MapMark) {
        app.tick(1.0 / FRAME_RATE);
        // the road has no `major` property
        let road = app.marker_manager.get(MarkerId(3)).expect("road marker");
        assert!(!road.is_visible());
        assert!(road.mesh().is_none());
    }

    #[rstest]
    fn broken_marker_is_removed(mut app: MapMark) {
        let description = MarkerDescription {
            styling: "pois:unknown".into(),
            is_path: true,
            geometry: MarkerGeometry::Point {
                lon_lat: DVec2::ZERO,
            },
            draw_order: None,
            ease_to: None,
        };
        assert!(app.add_marker(&description).is_err());
        assert_eq!(app.marker_manager.len(), 4);
    }
}
