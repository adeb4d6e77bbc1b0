use smol_str::SmolStr;
use std::fmt;
use tracing::debug;

use crate::{DrawRule, DrawRuleData, DrawRuleError, DrawRuleMergeSet, SceneLayer, StyleContext};

/// A styling string, split into the path of layers and the draw group at its end.
/// `"roads:highway:lines"` has the layer path `["roads", "highway"]` and the draw group `"lines"`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StyleReference {
    raw: String,
    layer_path: Vec<SmolStr>,
    draw_group: Option<SmolStr>,
}

impl StyleReference {
    pub const DELIMITER: char = ':';

    pub fn parse(raw: &str) -> Self {
        let (layer_path, draw_group) = match raw.rfind(Self::DELIMITER) {
            Some(n) => (
                raw[..n].split(Self::DELIMITER).map(SmolStr::new).collect(),
                Some(SmolStr::new(&raw[n + 1..])),
            ),
            None => (vec![SmolStr::new(raw)], None),
        };
        Self {
            raw: raw.to_string(),
            layer_path,
            draw_group,
        }
    }
    pub fn raw(&self) -> &str {
        &self.raw
    }
    pub fn layer_path(&self) -> &[SmolStr] {
        &self.layer_path
    }
    /// None if the styling doesn't contain a delimiter
    pub fn draw_group(&self) -> Option<&str> {
        self.draw_group.as_deref()
    }
}

impl fmt::Display for StyleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Everything a marker knows about how it is drawn.
/// There is at most one effective draw rule, either given directly or merged from the scene layers.
#[derive(Debug)]
pub struct Styling {
    reference: StyleReference,
    /// whether `reference` is a path into the scene layers or an inline style
    is_path: bool,
    rule_set: DrawRuleMergeSet,
    /// owned rule data for rules which were given directly
    rule_data: Option<DrawRuleData>,
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            reference: Default::default(),
            is_path: true,
            rule_set: Default::default(),
            rule_data: None,
        }
    }
}

impl Styling {
    pub fn set(&mut self, styling: &str, is_path: bool) {
        self.reference = StyleReference::parse(styling);
        self.is_path = is_path;
    }
    pub fn reference(&self) -> &StyleReference {
        &self.reference
    }
    pub fn is_path(&self) -> bool {
        self.is_path
    }
    pub fn rule_set(&self) -> &DrawRuleMergeSet {
        &self.rule_set
    }
    pub fn rule_data(&self) -> Option<&DrawRuleData> {
        self.rule_data.as_ref()
    }
    /// Replaces whatever rule was active with `data`. It did not come from any layer, so it has no layer name and depth 0.
    pub fn set_draw_rule(&mut self, data: DrawRuleData) {
        self.rule_set.clear();
        self.rule_set.push(DrawRule::from_data(&data, "", 0));
        self.rule_data = Some(data);
    }
    /// Merges the rules of our draw group from `layers`.
    /// On failure, no rule is active afterwards. The previous one is gone either way.
    pub fn set_draw_rule_from_layers(&mut self, layers: &[&SceneLayer]) -> Result<(), DrawRuleError> {
        self.rule_set.clear();
        self.rule_data = None;

        let Some(group) = self.reference.draw_group() else {
            debug!(styling = %self.reference, "styling has no draw group");
            return Err(DrawRuleError::MissingDrawGroup {
                styling: self.reference.raw().to_string(),
            });
        };
        self.rule_set.merge_rules(layers, group);
        if self.rule_set.matched_rules().is_empty() {
            return Err(DrawRuleError::NoMatchingRules {
                group: group.into(),
            });
        }
        Ok(())
    }
    /// The active rule. When several rules matched, only the first one is used.
    // TODO: draw markers with multiple styles, one mesh per matched rule
    pub fn draw_rule(&self) -> Option<&DrawRule> {
        self.rule_set.matched_rules().first()
    }
    /// false if there is no active rule
    pub fn evaluate_rule_for_context(&mut self, ctx: &mut dyn StyleContext) -> bool {
        self.rule_set.evaluate_first_for_context(ctx)
    }
    pub fn clear(&mut self) {
        self.rule_set.clear();
        self.rule_data = None;
    }
}
