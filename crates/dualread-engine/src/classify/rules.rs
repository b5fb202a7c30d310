//! Exclusion rules for structural markdown content.
//!
//! Each rule owns the syntax knowledge for one kind of block opener and
//! inspects only the start of an already-trimmed unit.

use std::sync::OnceLock;

use regex::Regex;

use super::ExclusionRule;

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Invalid exclusion rule regex"))
}

/// A unit that already carries a gloss wrapper.
pub struct AlreadyWrapped;

impl ExclusionRule for AlreadyWrapped {
    fn name(&self) -> &'static str {
        "already-wrapped"
    }

    fn excludes(&self, trimmed: &str) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        cached(&RE, r"(?i)^<ruby[\s>]").is_match(trimmed)
    }
}

/// Fenced code block opener: three or more backticks or tildes.
pub struct CodeFenceOpener;

impl CodeFenceOpener {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";
}

impl ExclusionRule for CodeFenceOpener {
    fn name(&self) -> &'static str {
        "code-fence"
    }

    fn excludes(&self, trimmed: &str) -> bool {
        trimmed.starts_with(Self::BACKTICKS) || trimmed.starts_with(Self::TILDES)
    }
}

/// ATX heading: one to six `#` followed by whitespace.
pub struct Heading;

impl ExclusionRule for Heading {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn excludes(&self, trimmed: &str) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        cached(&RE, r"^#{1,6}\s").is_match(trimmed)
    }
}

/// Bullet (`-`, `*`, `+`) or ordered (`1.`) list item.
pub struct ListItem;

impl ExclusionRule for ListItem {
    fn name(&self) -> &'static str {
        "list-item"
    }

    fn excludes(&self, trimmed: &str) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        cached(&RE, r"^(?:[-*+]|\d+\.)\s").is_match(trimmed)
    }
}

/// Block quote opener.
pub struct BlockQuote;

impl BlockQuote {
    pub const PREFIX: char = '>';
}

impl ExclusionRule for BlockQuote {
    fn name(&self) -> &'static str {
        "block-quote"
    }

    fn excludes(&self, trimmed: &str) -> bool {
        trimmed.starts_with(Self::PREFIX)
    }
}

/// Pipe table row.
pub struct TableRow;

impl TableRow {
    pub const PREFIX: char = '|';
}

impl ExclusionRule for TableRow {
    fn name(&self) -> &'static str {
        "table-row"
    }

    fn excludes(&self, trimmed: &str) -> bool {
        trimmed.starts_with(Self::PREFIX)
    }
}

/// Raw HTML block tag. An explicit `<p>` paragraph stays eligible.
pub struct RawTag;

impl ExclusionRule for RawTag {
    fn name(&self) -> &'static str {
        "raw-tag"
    }

    fn excludes(&self, trimmed: &str) -> bool {
        static TAG: OnceLock<Regex> = OnceLock::new();
        static PARAGRAPH: OnceLock<Regex> = OnceLock::new();
        cached(&TAG, r"(?i)^<[a-z]+(?:[\s>]|$)").is_match(trimmed)
            && !cached(&PARAGRAPH, r"(?i)^<p[\s>]").is_match(trimmed)
    }
}
