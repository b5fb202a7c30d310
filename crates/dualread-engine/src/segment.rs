//! # Segmentation
//!
//! Splits text on blank-line boundaries. A blank-line boundary is a maximal
//! run of two or more line breaks, where a line break is `\n` or `\r\n`.
//!
//! Two flavours:
//!
//! - [`segment_exact`] keeps every boundary as the trailing separator of the
//!   unit before it, so joining the segments reproduces the input byte for byte.
//! - [`segment_units`] keeps only the trimmed, non-empty units.

/// A unit of text together with the exact separator that followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Text between the previous boundary and the next one.
    pub unit: &'a str,
    /// The boundary text itself. Empty for the final segment.
    pub separator: &'a str,
}

/// Returns the byte length of the line break starting at `i`, or 0.
fn line_break_len(bytes: &[u8], i: usize) -> usize {
    match bytes[i] {
        b'\n' => 1,
        b'\r' if bytes.get(i + 1) == Some(&b'\n') => 2,
        _ => 0,
    }
}

/// Splits `document` into segments whose concatenation is `document`.
///
/// A document without any boundary yields exactly one segment holding the
/// whole document with an empty separator.
pub fn segment_exact(document: &str) -> Vec<Segment<'_>> {
    let bytes = document.as_bytes();
    let mut segments = Vec::new();
    let mut unit_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if line_break_len(bytes, i) == 0 {
            i += 1;
            continue;
        }

        let run_start = i;
        let mut breaks = 0usize;
        while i < bytes.len() {
            let n = line_break_len(bytes, i);
            if n == 0 {
                break;
            }
            i += n;
            breaks += 1;
        }

        if breaks >= 2 {
            segments.push(Segment {
                unit: &document[unit_start..run_start],
                separator: &document[run_start..i],
            });
            unit_start = i;
        }
    }

    segments.push(Segment {
        unit: &document[unit_start..],
        separator: "",
    });

    segments
}

/// Splits annotation text into trimmed, non-empty units in document order.
pub fn segment_units(text: &str) -> Vec<String> {
    segment_exact(text)
        .into_iter()
        .map(|segment| segment.unit.trim())
        .filter(|unit| !unit.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when `segments` are consecutive slices of `document` that cover it
/// from start to end, i.e. joining them would reproduce `document`.
pub fn tiles(document: &str, segments: &[Segment<'_>]) -> bool {
    let mut next = document.as_ptr() as usize;
    let end = next + document.len();

    for piece in segments.iter().flat_map(|s| [s.unit, s.separator]) {
        if piece.is_empty() {
            continue;
        }
        if piece.as_ptr() as usize != next {
            return false;
        }
        next += piece.len();
    }
    next == end
}

/// Joins segments back into a single string.
pub fn reassemble(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push_str(segment.unit);
        out.push_str(segment.separator);
    }
    out
}
