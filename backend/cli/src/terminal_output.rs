//! Terminal output utilities: ANSI formatting, notes, report rendering.

use photocritic_core::{AnalysisError, AnalysisReport, Confidence};

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Width of the confidence bar in cells.
pub const BAR_WIDTH: usize = 30;

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

/// Print a formatted INFO note. Goes to stderr so `--json` output stays clean.
pub fn note_info(msg: &str) {
    if supports_color() {
        eprintln!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        eprintln!("INFO: {msg}");
    }
}

/// Print a formatted WARNING note.
pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

/// Print a formatted ERROR note.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Print a formatted SUCCESS note.
pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Report rendering
// ---------------------------------------------------------------------------

/// A fixed-width bar filled in proportion to the confidence, e.g. `█████░░░░░`.
pub fn confidence_bar(confidence: Confidence) -> String {
    let filled = (usize::from(confidence.value()) * BAR_WIDTH + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Render a full report: six sections in criterion order, then the review.
pub fn render_report(report: &AnalysisReport, color: bool) -> String {
    let (bold, dim, green, reset) = if color {
        (BOLD, DIM, GREEN, RESET)
    } else {
        ("", "", "", "")
    };

    let mut out = String::new();
    for entry in report.entries() {
        out.push_str(&format!("{bold}{}{reset}\n", entry.heading));
        out.push_str(&format!("{}\n", entry.description));
        out.push_str(&format!(
            "{green}{}{reset} {}\n\n",
            confidence_bar(entry.confidence),
            entry.confidence
        ));
    }
    out.push_str(&format!("{bold}Final review{reset}\n{}\n", report.final_review()));
    out.push_str(&format!(
        "\n{dim}Average confidence: {}%{reset}\n",
        report.average_confidence()
    ));
    out
}

/// One-line description of a failed analysis.
pub fn render_error(err: &AnalysisError) -> String {
    format!("Analysis failed [{}]: {err}", err.kind())
}
