use bp_core::{Command, CompareOp, StoryError, StoryValue, VariableState};
use bp_parser::{parse_blocks, parse_blocks_lenient, IfBlock, Segment};

const DEFAULT_MAX_IF_DEPTH: usize = 16;

/// Applies variable directives in order and returns the resulting state.
/// Non-variable commands are ignored.
pub fn apply(state: &VariableState, commands: &[Command]) -> VariableState {
    let mut next = state.clone();
    for command in commands {
        apply_command(&mut next, command);
    }
    next
}

/// Returns false when `command` is not a variable directive.
pub fn apply_command(state: &mut VariableState, command: &Command) -> bool {
    match command {
        Command::SetVar { name, value } => {
            state.insert(name.clone(), value.clone());
        }
        Command::AddVar { name, delta } => {
            let current = numeric_or_zero(state, name);
            state.insert(name.clone(), StoryValue::Number(current + delta));
        }
        Command::SubVar { name, delta } => {
            let current = numeric_or_zero(state, name);
            state.insert(name.clone(), StoryValue::Number(current - delta));
        }
        _ => return false,
    }
    true
}

fn numeric_or_zero(state: &VariableState, name: &str) -> f64 {
    state
        .get(name)
        .and_then(StoryValue::as_number)
        .unwrap_or(0.0)
}

pub fn evaluate(
    state: &VariableState,
    name: &str,
    operator: CompareOp,
    compare_value: &StoryValue,
) -> bool {
    let Some(current) = state.get(name) else {
        return match operator {
            CompareOp::Ne => true,
            CompareOp::Eq => *compare_value == StoryValue::Bool(false),
            _ => false,
        };
    };

    match operator {
        CompareOp::Eq => current == compare_value,
        CompareOp::Ne => current != compare_value,
        ordering => {
            let (Some(left), Some(right)) = (current.as_number(), compare_value.as_number())
            else {
                return false;
            };
            match ordering {
                CompareOp::Gt => left > right,
                CompareOp::Lt => left < right,
                CompareOp::Ge => left >= right,
                CompareOp::Le => left <= right,
                CompareOp::Eq | CompareOp::Ne => false,
            }
        }
    }
}

pub fn resolve_conditionals(text: &str, state: &VariableState) -> String {
    resolve_conditionals_with_depth(text, state, DEFAULT_MAX_IF_DEPTH)
}

/// Keeps each block's body when its predicate holds and drops it otherwise.
/// Unbalanced tags stay in the text as literals.
pub fn resolve_conditionals_with_depth(
    text: &str,
    state: &VariableState,
    max_depth: usize,
) -> String {
    let mut out = String::with_capacity(text.len());
    write_segments(&parse_blocks_lenient(text, max_depth), state, &mut out);
    out
}

pub fn resolve_conditionals_strict(
    text: &str,
    state: &VariableState,
    max_depth: usize,
) -> Result<String, StoryError> {
    let segments = parse_blocks(text, max_depth)?;
    let mut out = String::with_capacity(text.len());
    write_segments(&segments, state, &mut out);
    Ok(out)
}

fn write_segments(segments: &[Segment], state: &VariableState, out: &mut String) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Block(block) => {
                if holds(block, state) {
                    write_segments(&block.body, state, out);
                }
            }
        }
    }
}

fn holds(block: &IfBlock, state: &VariableState) -> bool {
    evaluate(state, &block.name, block.operator, &block.compare_value)
}
