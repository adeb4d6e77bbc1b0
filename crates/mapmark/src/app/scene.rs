use glam::{dvec2, DVec2};
use mapmark_scene::{DrawRuleData, SceneLayer, StyleValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const SCENE_FILE_NAME: &str = "scene.json";

/// The layers and markers that are loaded on startup.
/// Written to the data dir with a small demo scene if it doesn't exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub layers: Vec<SceneLayer>,
    pub markers: Vec<MarkerDescription>,
    pub view: ViewDescription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescription {
    pub styling: String,
    #[serde(default = "default_is_path")]
    pub is_path: bool,
    pub geometry: MarkerGeometry,
    #[serde(default)]
    pub draw_order: Option<i32>,
    /// longitude/latitude that the marker eases to once the scene is loaded
    #[serde(default)]
    pub ease_to: Option<DVec2>,
}

fn default_is_path() -> bool {
    true
}

/// all coordinates are longitude/latitude in degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MarkerGeometry {
    Point { lon_lat: DVec2 },
    Polyline { coordinates: Vec<DVec2> },
    Polygon { rings: Vec<Vec<DVec2>> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDescription {
    pub lon_lat: DVec2,
    pub zoom: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewDescription {
    fn default() -> Self {
        Self {
            lon_lat: dvec2(13.405, 52.52),
            zoom: 14.0,
            width: 1280,
            height: 720,
        }
    }
}

fn rule(name: &str, id: u32, params: serde_json::Value) -> DrawRuleData {
    let params = match params {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| {
                let value = match value.get("expr").and_then(|e| e.as_str()) {
                    Some(expr) => StyleValue::Expression { expr: expr.into() },
                    None => StyleValue::Static(value),
                };
                (key.into(), value)
            })
            .collect(),
        _ => Default::default(),
    };
    DrawRuleData {
        name: name.into(),
        id,
        params,
    }
}

impl Default for SceneDescription {
    fn default() -> Self {
        let pois = SceneLayer::new("pois")
            .with_rule(rule("icons", 1, json!({ "color": [255, 255, 255, 255], "size": 24 })))
            .with_sublayer(
                SceneLayer::new("cafes")
                    .with_rule(rule("icons", 1, json!({ "color": [160, 82, 45, 255] }))),
            );
        let roads = SceneLayer::new("roads").with_rule(rule(
            "lines",
            2,
            json!({ "color": [90, 90, 90, 255], "visible": { "expr": "$major" } }),
        ));
        let areas = SceneLayer::new("areas")
            .with_rule(rule("polygons", 3, json!({ "color": [34, 139, 34, 128] })));
        Self {
            layers: vec![pois, roads, areas],
            markers: vec![
                MarkerDescription {
                    styling: "pois:cafes:icons".into(),
                    is_path: true,
                    geometry: MarkerGeometry::Point {
                        lon_lat: dvec2(13.4049, 52.5200),
                    },
                    draw_order: Some(2),
                    ease_to: Some(dvec2(13.4105, 52.5219)),
                },
                MarkerDescription {
                    styling: r#"{ "style": "points", "color": [255, 0, 0, 255] }"#.into(),
                    is_path: false,
                    geometry: MarkerGeometry::Point {
                        lon_lat: dvec2(13.3777, 52.5163),
                    },
                    draw_order: Some(3),
                    ease_to: None,
                },
                MarkerDescription {
                    styling: "roads:lines".into(),
                    is_path: true,
                    geometry: MarkerGeometry::Polyline {
                        coordinates: vec![dvec2(13.37, 52.51), dvec2(13.39, 52.515), dvec2(13.41, 52.52)],
                    },
                    draw_order: Some(1),
                    ease_to: None,
                },
                MarkerDescription {
                    styling: "areas:polygons".into(),
                    is_path: true,
                    geometry: MarkerGeometry::Polygon {
                        rings: vec![vec![
                            dvec2(13.35, 52.51),
                            dvec2(13.37, 52.51),
                            dvec2(13.37, 52.52),
                            dvec2(13.35, 52.52),
                        ]],
                    },
                    draw_order: None,
                    ease_to: None,
                },
            ],
            view: Default::default(),
        }
    }
}
