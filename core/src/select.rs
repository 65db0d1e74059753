//! Boolean pair reducers used to join rule results.
//!
//! Closed namespace with the same fallback contract as the metric registry:
//! an unrecognized configured name resolves to [`SelectOp::And`].

/// Boolean combinator over a pair of rule outcomes.
///
/// The derived ordering (And < Or < Xor) is load-bearing: resolved override
/// rules are stable-sorted by combinator so AND-joined rules are folded
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SelectOp {
    And,
    Or,
    Xor,
}

impl SelectOp {
    /// Resolve a configured name, substituting [`SelectOp::And`] for
    /// anything unrecognized.
    pub fn from_name(name: &str) -> SelectOp {
        match name {
            "and" => SelectOp::And,
            "or" => SelectOp::Or,
            "xor" => SelectOp::Xor,
            _ => SelectOp::And,
        }
    }

    /// Stable wire name used in configuration documents.
    pub fn name(self) -> &'static str {
        match self {
            SelectOp::And => "and",
            SelectOp::Or => "or",
            SelectOp::Xor => "xor",
        }
    }

    /// Reduce a pair of booleans. Xor is "exactly one".
    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            SelectOp::And => a && b,
            SelectOp::Or => a || b,
            SelectOp::Xor => a != b,
        }
    }
}
