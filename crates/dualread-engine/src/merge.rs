//! # Merging
//!
//! Pairs eligible units of a primary document with annotation units by
//! position and wraps each pair in a ruby construct:
//!
//! ```text
//! leading whitespace + <ruby>core<rt>gloss</rt></ruby> + trailing whitespace
//! ```
//!
//! Separators are never touched, so the merged document keeps the exact
//! blank-line structure of the input.

use crate::classify::Classifier;
use crate::segment::{self, Segment};

pub const RUBY_OPEN: &str = "<ruby>";
pub const RUBY_CLOSE: &str = "</ruby>";
pub const RT_OPEN: &str = "<rt>";
pub const RT_CLOSE: &str = "</rt>";
pub const LINE_BREAK: &str = "<br>";

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("{segments} segments do not cover the {document_len}-byte document")]
    Reconstruction { segments: usize, document_len: usize },
}

/// The merged document plus alignment counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: String,
    /// Units that received a gloss.
    pub wrapped: usize,
    /// Annotation units left over after every eligible unit was consumed.
    pub unused: usize,
}

impl MergeOutcome {
    fn unchanged(document: &str) -> Self {
        Self {
            content: document.to_string(),
            wrapped: 0,
            unused: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Merger {
    classifier: Classifier,
}

impl Merger {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Merges `annotation` into `document`.
    ///
    /// Pairing is strictly positional: the Nth eligible unit gets the Nth
    /// annotation unit. Ineligible units never advance the cursor, including
    /// units that already carry a ruby wrapper.
    pub fn merge(&self, document: &str, annotation: &str) -> Result<MergeOutcome, MergeError> {
        let units = segment::segment_units(annotation);
        if units.is_empty() {
            return Ok(MergeOutcome::unchanged(document));
        }

        let segments = segment::segment_exact(document);
        if !segment::tiles(document, &segments) {
            return Err(MergeError::Reconstruction {
                segments: segments.len(),
                document_len: document.len(),
            });
        }

        let mut content = String::with_capacity(document.len() + annotation.len() * 2);
        let mut cursor = 0usize;

        for Segment { unit, separator } in &segments {
            match units.get(cursor) {
                Some(gloss) if self.classifier.is_eligible(unit) => {
                    content.push_str(&wrap(unit, gloss));
                    cursor += 1;
                }
                _ => content.push_str(unit),
            }
            content.push_str(separator);
        }

        let unused = units.len() - cursor;
        if unused > 0 {
            log::warn!("Unused annotation units: {unused}");
        }
        log::debug!(
            "Merged {cursor} of {} annotation units into {} segments",
            units.len(),
            segments.len()
        );

        Ok(MergeOutcome {
            content,
            wrapped: cursor,
            unused,
        })
    }
}

/// Merges with the default classifier and returns only the content.
pub fn merge(document: &str, annotation: &str) -> Result<String, MergeError> {
    Merger::default()
        .merge(document, annotation)
        .map(|outcome| outcome.content)
}

/// Wraps the trimmed core of `unit` with `gloss`, keeping surrounding whitespace.
pub fn wrap(unit: &str, gloss: &str) -> String {
    let core = unit.trim();
    if core.is_empty() {
        return unit.to_string();
    }

    let leading = &unit[..unit.len() - unit.trim_start().len()];
    let trailing = &unit[unit.trim_end().len()..];
    let gloss = sanitize_gloss(gloss);

    let mut out = String::with_capacity(unit.len() + gloss.len() + 24);
    out.push_str(leading);
    out.push_str(RUBY_OPEN);
    out.push_str(core);
    out.push_str(RT_OPEN);
    out.push_str(&gloss);
    out.push_str(RT_CLOSE);
    out.push_str(RUBY_CLOSE);
    out.push_str(trailing);
    out
}

/// Escapes markup-significant characters and stacks gloss lines with `<br>`.
pub fn sanitize_gloss(gloss: &str) -> String {
    let escaped = html_escape::encode_quoted_attribute(gloss);
    escaped
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(LINE_BREAK)
}
