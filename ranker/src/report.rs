//! Human-readable ranking reports.

use std::fmt::Write;

use crate::ranker::RankedResult;

/// Render a ranking the way the interactive tool prints it.
///
/// Dot products get two decimals, cosine similarities four, and every entry
/// is followed by a blank line.
pub fn render_report(target: &str, results: &[RankedResult]) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "\nTarget: {}\n", target.trim());

    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, result.name);
        let _ = writeln!(out, "   Dot Product      : {:.2}", result.dot);
        let _ = writeln!(out, "   Cosine Similarity: {:.4}\n", result.cosine);
    }

    out
}
