//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Prepare
//!
//! ```text
//! Key resources: prepared
//!     image: data/archive/2024/03/05/key-resources.jpg
//!     table: data/archive/2024/03/05/key-resources.csv
//!     Key resources prepared for the 2024-03-05.
//! ```
//!
//! A cache hit reads `cached`, a failure `FAILED` with no paths.
//!
//! ## Post
//!
//! ```text
//! Post: ok
//!     Key resources thread posted.
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::result::PipelineResult;
use crate::social::PostOutcome;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn status(result: &PipelineResult) -> &'static str {
    match (result.success, result.cached) {
        (false, _) => "FAILED",
        (true, true) => "cached",
        (true, false) => "prepared",
    }
}

// ============================================================================
// Prepare
// ============================================================================

/// Format a pipeline result, paths in artifact-kind order.
pub fn format_result(label: &str, result: &PipelineResult) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", label, status(result))];
    for (kind, path) in &result.paths {
        lines.push(format!("{}{}: {}", indent(1), kind, path.display()));
    }
    if !result.message.is_empty() {
        lines.push(format!("{}{}", indent(1), result.message));
    }
    lines
}

/// Print a pipeline result to stdout.
pub fn print_result(label: &str, result: &PipelineResult) {
    for line in format_result(label, result) {
        println!("{}", line);
    }
}

// ============================================================================
// Post
// ============================================================================

pub fn format_post_outcome(outcome: &PostOutcome) -> Vec<String> {
    let status = if outcome.success { "ok" } else { "FAILED" };
    vec![
        format!("Post: {}", status),
        format!("{}{}", indent(1), outcome.message),
    ]
}

pub fn print_post_outcome(outcome: &PostOutcome) {
    for line in format_post_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
