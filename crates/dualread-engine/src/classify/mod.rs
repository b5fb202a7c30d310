//! # Eligibility Classification
//!
//! Decides whether a unit is prose that should receive a gloss or structural
//! content that must be left alone.
//!
//! Classification works on the unit trimmed of surrounding whitespace. A unit
//! is ineligible when it is empty or when any [`ExclusionRule`] matches; the
//! first matching rule wins and rule order carries no meaning. The default
//! rule set lives in [`rules`] and can be extended with [`Classifier::with_rule`].

pub mod rules;

use std::sync::OnceLock;

pub use rules::{AlreadyWrapped, BlockQuote, CodeFenceOpener, Heading, ListItem, RawTag, TableRow};

/// A predicate over a trimmed, non-empty unit that marks it as structural.
pub trait ExclusionRule: Send + Sync {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;

    /// Returns true when the unit must not receive a gloss.
    fn excludes(&self, trimmed: &str) -> bool;
}

/// Result of classifying one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Nothing left after trimming.
    Empty,
    /// Excluded by the named rule.
    Excluded(&'static str),
}

impl Eligibility {
    #[must_use]
    pub fn is_eligible(self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

pub struct Classifier {
    rules: Vec<Box<dyn ExclusionRule>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::empty()
            .with_rule(AlreadyWrapped)
            .with_rule(CodeFenceOpener)
            .with_rule(Heading)
            .with_rule(ListItem)
            .with_rule(BlockQuote)
            .with_rule(TableRow)
            .with_rule(RawTag)
    }
}

impl Classifier {
    /// A classifier with no exclusion rules: every non-empty unit is eligible.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule to the set.
    #[must_use]
    pub fn with_rule(mut self, rule: impl ExclusionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Names of the configured rules, in insertion order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name())
    }

    pub fn classify(&self, unit: &str) -> Eligibility {
        let trimmed = unit.trim();
        if trimmed.is_empty() {
            return Eligibility::Empty;
        }

        self.rules
            .iter()
            .find(|rule| rule.excludes(trimmed))
            .map_or(Eligibility::Eligible, |rule| {
                Eligibility::Excluded(rule.name())
            })
    }

    pub fn is_eligible(&self, unit: &str) -> bool {
        self.classify(unit).is_eligible()
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("rules", &self.rule_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Classifies with the default rule set.
pub fn is_eligible(unit: &str) -> bool {
    static DEFAULT: OnceLock<Classifier> = OnceLock::new();
    DEFAULT.get_or_init(Classifier::default).is_eligible(unit)
}
