//! Lexical extraction of directives, conditional blocks and choice lines from
//! raw page text.

mod choices;
mod conditional;
mod directives;

pub use choices::{extract_choices, is_choice_line, page_from_source, parse_choice_line};
pub use conditional::{parse_blocks, parse_blocks_lenient, IfBlock, Segment};
pub use directives::{
    extract_asset_refs, extract_side_effects, extract_variable_ops, normalize_newlines,
    parse_directives, replace_asset_refs, strip_side_effects, strip_variable_ops, DirectiveScan, SideEffects,
    DIRECTIVE_KEYWORDS,
};
