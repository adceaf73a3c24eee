//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::EngineError;

/// Map engine errors to a string for CLI output.
pub fn map_error(e: &EngineError) -> String {
    match e {
        EngineError::Decode(err) => format!("Invalid input file: {}", err),
        other => other.to_string(),
    }
}
