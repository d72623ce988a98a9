//! Refinement: optional, user-triggered cleanup of the working text.
//!
//! Unlike [`super::sanitize`], refinement is never applied automatically.
//! Each call runs the enabled stages once, in a fixed order, over whatever
//! the working text currently is. Characters removed by one call are gone
//! for good; enabling a different option later does not bring them back.

use super::sanitize::{collapse_horizontal_whitespace, strip_control_chars};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Independent toggles for the refinement stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementOptions {
    /// Collapse blank-line runs to one blank line and re-collapse spaces.
    pub normalize_spacing: bool,
    /// Delete everything outside the allow-list of letters, digits and
    /// common punctuation.
    pub remove_special_chars: bool,
    /// Delete control characters and turn bullet glyphs into `-`.
    pub strip_unwanted_formatting: bool,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            normalize_spacing: true,
            remove_special_chars: false,
            strip_unwanted_formatting: true,
        }
    }
}

impl RefinementOptions {
    /// Every stage disabled.
    pub fn none() -> Self {
        Self {
            normalize_spacing: false,
            remove_special_chars: false,
            strip_unwanted_formatting: false,
        }
    }

    /// Every stage enabled.
    pub fn all() -> Self {
        Self {
            normalize_spacing: true,
            remove_special_chars: true,
            strip_unwanted_formatting: true,
        }
    }
}

/// Apply the enabled stages to `text` and trim the result.
///
/// Stages (applied in order, each only when enabled):
/// 1. Normalise spacing
/// 2. Remove special characters
/// 3. Strip unwanted formatting
pub fn refine(text: &str, options: &RefinementOptions) -> String {
    let mut s = text.to_string();
    if options.normalize_spacing {
        s = normalise_spacing(&s);
    }
    if options.remove_special_chars {
        s = remove_special_chars(&s);
    }
    if options.strip_unwanted_formatting {
        s = strip_unwanted_formatting(&s);
    }
    s.trim().to_string()
}

// ── Stage 1: Normalise spacing ───────────────────────────────────────────────

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

fn normalise_spacing(input: &str) -> String {
    let s = RE_BLANK_RUN.replace_all(input, "\n\n");
    collapse_horizontal_whitespace(&s)
}

// ── Stage 2: Remove special characters ───────────────────────────────────────

static RE_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^a-zA-Z0-9\s.,!?;:()'"\-/&@$€%]"#).unwrap());

fn remove_special_chars(input: &str) -> String {
    RE_SPECIAL.replace_all(input, "").into_owned()
}

// ── Stage 3: Strip unwanted formatting ───────────────────────────────────────

const BULLETS: [char; 5] = ['•', '●', '■', '▪', '◦'];

fn strip_unwanted_formatting(input: &str) -> String {
    strip_control_chars(input).replace(BULLETS, "-")
}

// ── Tests ────────────────────────────────────────────────────────────────────
