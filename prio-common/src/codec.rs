//! Metadata codec
//!
//! The remote board's only writable text field is the card description,
//! which is also user-edited prose. Structured scoring fields travel through
//! it as a single trailing marker line:
//!
//! ```text
//! User notes stay untouched above the marker.
//!
//! [prio::v1] ref=uc-1a2b3c4d | impact=4 | reach=3 | effort=5
//! ```
//!
//! Decoding tolerates human edits: the *last* marker occurrence wins (stale
//! marker lines from earlier edits are ignored), unknown keys are skipped,
//! and unparsable values are dropped rather than failing the line.
//! Re-encoding replaces only the trailing marker line, never the prose.

use crate::model::ScoringScheme;
use std::collections::BTreeMap;

/// Reserved prefix token opening a metadata line
pub const MARKER: &str = "[prio::v1]";

/// Delimiter between `key=value` pairs
const PAIR_SEPARATOR: &str = " | ";

/// Fields recovered from a card description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMeta {
    /// Reference token linking the card back to its record (temporary local
    /// token until the remote short link replaces it)
    pub ref_token: Option<String>,
    /// Factor values, unknown and unparsable keys already dropped
    pub factors: BTreeMap<String, u8>,
}

/// Append a metadata line to free text
///
/// Any existing trailing marker line in `notes` is replaced, and the marker
/// is separated from the prose by a blank line. Factors are emitted in
/// scheme order so encode/decode round-trips exactly.
pub fn encode(
    notes: &str,
    factors: &BTreeMap<String, u8>,
    scheme: &ScoringScheme,
    ref_token: &str,
) -> String {
    let mut line = format!("{MARKER} ref={ref_token}");
    for f in &scheme.factors {
        if let Some(v) = factors.get(f.key) {
            line.push_str(PAIR_SEPARATOR);
            line.push_str(&format!("{}={}", f.key, v));
        }
    }

    let prose = strip(notes);
    let prose = prose.trim_end();
    if prose.is_empty() {
        line
    } else {
        format!("{prose}\n\n{line}")
    }
}

/// Recover fields from arbitrary text
///
/// Locates the last marker occurrence and parses its tail. Returns None when
/// the marker is absent or nothing on the line parses.
pub fn decode(text: &str) -> Option<DecodedMeta> {
    let line = text
        .lines()
        .filter(|l| l.trim_start().starts_with(MARKER))
        .last()?;
    let tail = line.trim_start().trim_start_matches(MARKER);

    let mut ref_token = None;
    let mut factors = BTreeMap::new();
    for pair in tail.split('|') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key == "ref" {
            if !value.is_empty() {
                ref_token = Some(value.to_string());
            }
        } else if let Ok(v) = value.parse::<u8>() {
            factors.insert(key.to_string(), v);
        }
        // Non-numeric factor values are skipped, not fatal.
    }

    if ref_token.is_none() && factors.is_empty() {
        return None;
    }
    Some(DecodedMeta { ref_token, factors })
}

/// Remove a trailing marker line (and its separating blank lines), leaving
/// the user's prose untouched. Marker lines buried inside the prose are left
/// alone; only the tail is owned by the codec.
pub fn strip(text: &str) -> String {
    let trimmed = text.trim_end();
    match trimmed.rsplit_once('\n') {
        Some((head, last)) if last.trim_start().starts_with(MARKER) => {
            head.trim_end().to_string()
        }
        None if trimmed.trim_start().starts_with(MARKER) => String::new(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reach_factors() -> BTreeMap<String, u8> {
        [("impact", 4), ("reach", 3), ("urgency", 2), ("align", 5), ("effort", 5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_roundtrip_reproduces_factors_exactly() {
        let scheme = ScoringScheme::reach();
        let f = reach_factors();
        let text = encode("Ship the triage agent.", &f, &scheme, "uc-1a2b3c4d");
        let meta = decode(&text).unwrap();
        assert_eq!(meta.factors, f);
        assert_eq!(meta.ref_token.as_deref(), Some("uc-1a2b3c4d"));
    }

    #[test]
    fn test_decode_without_marker_returns_none() {
        assert!(decode("plain prose\nwith two lines").is_none());
        assert!(decode("").is_none());
    }

    #[test]
    fn test_decode_uses_last_marker_line() {
        let text = format!(
            "{MARKER} ref=old | impact=1\n\nsome edits in between\n\n{MARKER} ref=new | impact=4"
        );
        let meta = decode(&text).unwrap();
        assert_eq!(meta.ref_token.as_deref(), Some("new"));
        assert_eq!(meta.factors.get("impact"), Some(&4));
    }

    #[test]
    fn test_decode_skips_corrupt_pairs() {
        let text = format!("{MARKER} ref=x | impact=abc | mystery=3 | reach=2 | broken");
        let meta = decode(&text).unwrap();
        assert!(!meta.factors.contains_key("impact")); // unparsable number
        assert_eq!(meta.factors.get("reach"), Some(&2));
        // Unknown keys survive decoding; ScoringScheme::sanitize drops them
        // when the record is materialized.
        assert_eq!(meta.factors.get("mystery"), Some(&3));
    }

    #[test]
    fn test_decode_marker_with_no_pairs_returns_none() {
        assert!(decode(&format!("{MARKER} garbage without pairs")).is_none());
    }

    #[test]
    fn test_reencode_preserves_prose() {
        let scheme = ScoringScheme::reach();
        let f = reach_factors();
        let once = encode("Line one.\n\nLine two.", &f, &scheme, "uc-temp");
        let twice = encode(&once, &f, &scheme, "realShortLink");
        assert!(twice.starts_with("Line one.\n\nLine two."));
        assert_eq!(twice.matches(MARKER).count(), 1);
        assert_eq!(
            decode(&twice).unwrap().ref_token.as_deref(),
            Some("realShortLink")
        );
    }

    #[test]
    fn test_encode_with_empty_notes_is_bare_marker_line() {
        let scheme = ScoringScheme::reach();
        let f = reach_factors();
        let text = encode("", &f, &scheme, "uc-temp");
        assert!(text.starts_with(MARKER));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_strip_leaves_interior_markers_alone() {
        let text = format!("prose\n{MARKER} old=1\nmore prose");
        assert_eq!(strip(&text), text);
    }

    #[test]
    fn test_strip_removes_trailing_marker_and_blank_line() {
        let text = format!("keep this\n\n{MARKER} ref=x | impact=4\n");
        assert_eq!(strip(&text), "keep this");
    }
}
