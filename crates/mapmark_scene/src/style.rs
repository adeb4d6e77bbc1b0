use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{debug, trace};

/// A single style parameter value, as written in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    /// evaluated per feature/zoom by the style context. written as `{"expr": "..."}`
    Expression { expr: SmolStr },
    Static(Value),
}

/// The rule definition for one draw group, as it appears in a layer or as given directly for a marker.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRuleData {
    /// name of the draw group
    pub name: SmolStr,
    /// id of the style that renders this rule
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub params: IndexMap<SmolStr, StyleValue>,
}

/// A parameter of a merged rule, with the layer it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleParam {
    pub value: StyleValue,
    pub layer_name: SmolStr,
    pub depth: usize,
}

/// The effective rule after merging all layers that contributed to a draw group.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRule {
    pub name: SmolStr,
    pub id: u32,
    /// the deepest layer that contributed to this rule. empty for rules that didn't come from layers.
    pub layer_name: SmolStr,
    pub depth: usize,
    pub params: IndexMap<SmolStr, RuleParam>,
}

impl DrawRule {
    pub fn from_data(data: &DrawRuleData, layer_name: &str, depth: usize) -> Self {
        let layer_name = SmolStr::new(layer_name);
        Self {
            name: data.name.clone(),
            id: data.id,
            params: data
                .params
                .iter()
                .map(|(key, value)| {
                    (
                        key.clone(),
                        RuleParam {
                            value: value.clone(),
                            layer_name: layer_name.clone(),
                            depth,
                        },
                    )
                })
                .collect(),
            layer_name,
            depth,
        }
    }
    /// A param from a deeper layer replaces ours. On equal depth, the layer with the greater name wins.
    fn merge(&mut self, data: &DrawRuleData, layer_name: &SmolStr, depth: usize) {
        let overrides = |existing_depth: usize, existing_layer: &SmolStr| {
            depth > existing_depth || (depth == existing_depth && layer_name > existing_layer)
        };
        if overrides(self.depth, &self.layer_name) {
            self.id = data.id;
            self.layer_name = layer_name.clone();
            self.depth = depth;
        }
        for (key, value) in data.params.iter() {
            let incoming = RuleParam {
                value: value.clone(),
                layer_name: layer_name.clone(),
                depth,
            };
            match self.params.get_mut(key) {
                Some(existing) => {
                    if overrides(existing.depth, &existing.layer_name) {
                        *existing = incoming;
                    }
                }
                None => {
                    self.params.insert(key.clone(), incoming);
                }
            }
        }
    }
    pub fn param(&self, key: &str) -> Option<&StyleValue> {
        self.params.get(key).map(|p| &p.value)
    }
}

/// A node of the scene's style hierarchy.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneLayer {
    pub name: SmolStr,
    #[serde(default)]
    pub rules: Vec<DrawRuleData>,
    #[serde(default)]
    pub sublayers: Vec<SceneLayer>,
}

impl SceneLayer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn with_rule(mut self, rule: DrawRuleData) -> Self {
        self.rules.push(rule);
        self
    }
    pub fn with_sublayer(mut self, layer: SceneLayer) -> Self {
        self.sublayers.push(layer);
        self
    }
}

/// Evaluates style expressions. Implemented by the scene's expression engine.
pub trait StyleContext {
    /// None if the expression couldn't be evaluated
    fn evaluate(&mut self, expression: &str) -> Option<Value>;
}

impl<F: FnMut(&str) -> Option<Value>> StyleContext for F {
    fn evaluate(&mut self, expression: &str) -> Option<Value> {
        self(expression)
    }
}

#[derive(Debug, Default)]
pub struct DrawRuleMergeSet {
    matched_rules: Vec<DrawRule>,
    /// params of the last evaluated rule
    evaluated: IndexMap<SmolStr, Value>,
}

impl DrawRuleMergeSet {
    pub const VISIBLE_PARAM: &'static str = "visible";

    pub fn matched_rules(&self) -> &[DrawRule] {
        &self.matched_rules
    }
    pub fn evaluated(&self) -> &IndexMap<SmolStr, Value> {
        &self.evaluated
    }
    pub fn clear(&mut self) {
        self.matched_rules.clear();
        self.evaluated.clear();
    }
    pub fn push(&mut self, rule: DrawRule) {
        self.matched_rules.push(rule);
    }
    /// Merges the rules of `group` from every layer (and their sublayers) into the matched rules.
    /// Top level layers have depth 1, depth 0 is reserved for rules which don't come from layers.
    pub fn merge_rules(&mut self, layers: &[&SceneLayer], group: &str) {
        for layer in layers {
            self.merge_layer(layer, group, 1);
        }
        debug!(group, matched = self.matched_rules.len(), "merged draw rules");
    }
    fn merge_layer(&mut self, layer: &SceneLayer, group: &str, depth: usize) {
        for data in layer.rules.iter().filter(|r| r.name == group) {
            trace!(layer = %layer.name, depth, "merging rule");
            match self.matched_rules.iter_mut().find(|r| r.name == data.name) {
                Some(rule) => rule.merge(data, &layer.name, depth),
                None => self
                    .matched_rules
                    .push(DrawRule::from_data(data, &layer.name, depth)),
            }
        }
        for sublayer in layer.sublayers.iter() {
            self.merge_layer(sublayer, group, depth + 1);
        }
    }
    /// Evaluates all params of `rule` with `ctx`.
    /// Returns false if an expression failed or the rule evaluated to invisible.
    pub fn evaluate_rule_for_context(&mut self, rule: &DrawRule, ctx: &mut dyn StyleContext) -> bool {
        evaluate_params(rule, ctx, &mut self.evaluated)
    }
    /// Same as [Self::evaluate_rule_for_context] for the first matched rule. false if there is none.
    pub fn evaluate_first_for_context(&mut self, ctx: &mut dyn StyleContext) -> bool {
        let Self {
            matched_rules,
            evaluated,
        } = self;
        match matched_rules.first() {
            Some(rule) => evaluate_params(rule, ctx, evaluated),
            None => false,
        }
    }
}

fn evaluate_params(
    rule: &DrawRule,
    ctx: &mut dyn StyleContext,
    evaluated: &mut IndexMap<SmolStr, Value>,
) -> bool {
    evaluated.clear();
    for (key, param) in rule.params.iter() {
        let value = match &param.value {
            StyleValue::Static(value) => value.clone(),
            StyleValue::Expression { expr } => match ctx.evaluate(expr) {
                Some(value) => value,
                None => {
                    debug!(rule = %rule.name, %key, %expr, "failed to evaluate style expression");
                    return false;
                }
            },
        };
        evaluated.insert(key.clone(), value);
    }
    !matches!(
        evaluated.get(DrawRuleMergeSet::VISIBLE_PARAM),
        Some(Value::Bool(false))
    )
}
