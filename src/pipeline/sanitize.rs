//! Sanitisation: the mandatory hygiene pass run once on every extraction.
//!
//! ## Rule Order
//!
//! Rules must run in this specific order. Control characters are stripped
//! first so that a stray `\x0B` between two spaces cannot survive as a
//! separator; line endings are normalised next so that `\r` never reaches
//! the whitespace collapse (which only knows about spaces and tabs).
//!
//! The pass is idempotent: every rule leaves text that all earlier rules
//! would leave unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all sanitisation rules and trim the result.
///
/// Rules (applied in order):
/// 1. Strip non-printable control characters (tab, LF and CR are kept)
/// 2. Normalise line endings (CRLF / CR → LF)
/// 3. Collapse runs of spaces and tabs to a single space
///
/// An empty return value means the document carried no salvageable text;
/// the orchestrator turns that into
/// [`crate::error::IngestError::NoInterpretableText`].
pub fn sanitize(input: &str) -> String {
    let s = strip_control_chars(input);
    let s = normalise_line_endings(&s);
    let s = collapse_horizontal_whitespace(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip control characters ─────────────────────────────────────────

/// C0 controls except TAB/LF/CR, DEL, and the C1 block.
pub(crate) fn is_stripped_control(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'..='\u{9F}'
    )
}

pub(crate) fn strip_control_chars(input: &str) -> String {
    input.chars().filter(|&c| !is_stripped_control(c)).collect()
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Collapse horizontal whitespace ───────────────────────────────────

static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

pub(crate) fn collapse_horizontal_whitespace(input: &str) -> String {
    RE_HORIZONTAL_WS.replace_all(input, " ").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
