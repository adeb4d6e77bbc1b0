//! Markers: user placed overlays on the map.
//!
//! A [Marker] owns its geometry, its resolved draw rule and the mesh/texture built for it.
//! Every frame, [Marker::update] advances its position animation and recomputes the matrices a renderer needs.
//! [MarkerManager] owns all markers of a map and hands out their ids.

mod config;
mod ease;
mod error;
mod feature;
mod manager;
mod marker;
mod style;
mod styling;

pub use config::{ManagerConfig, MANAGER_CONFIG_NAME};
pub use ease::{Ease, EaseType};
pub use error::{DrawRuleError, MarkerError};
pub use feature::{Feature, GeometryType};
pub use manager::MarkerManager;
pub use marker::{Marker, MarkerId};
pub use style::{DrawRule, DrawRuleData, DrawRuleMergeSet, RuleParam, SceneLayer, StyleContext, StyleValue};
pub use styling::{StyleReference, Styling};
