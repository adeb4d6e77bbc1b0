use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::MarkerId;

#[derive(Diagnostic, Debug, Error)]
pub enum DrawRuleError {
    #[error("styling {styling:?} doesn't name a draw group")]
    #[diagnostic(
        code(draw_rule_error::missing_draw_group),
        help("path stylings look like `layer:sublayer:draw_group`")
    )]
    MissingDrawGroup { styling: String },
    #[error("no rules of draw group {group:?} matched any layer")]
    #[diagnostic(code(draw_rule_error::no_matching_rules))]
    NoMatchingRules { group: SmolStr },
    #[error("inline styling is not a valid json object: {0}")]
    #[diagnostic(code(draw_rule_error::invalid_inline_style))]
    InvalidInlineStyle(#[from] serde_json::Error),
}

#[derive(Diagnostic, Debug, Error)]
pub enum MarkerError {
    #[error("marker {0} doesn't exist")]
    #[diagnostic(code(marker_error::not_found))]
    NotFound(MarkerId),
    #[error("geometry for marker {0} doesn't have any points")]
    #[diagnostic(code(marker_error::empty_geometry))]
    EmptyGeometry(MarkerId),
    #[error("all marker ids are in use")]
    #[diagnostic(
        code(marker_error::ids_exhausted),
        help("ids are never reused and must fit in the 24 bits of a selection color")
    )]
    IdsExhausted,
    #[error(transparent)]
    #[diagnostic(transparent)]
    DrawRule(#[from] DrawRuleError),
}
