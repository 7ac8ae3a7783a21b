//! Optimization rules.
//!
//! A rule defines an equivalent transformation of a subtree. Rules come in two flavors:
//!
//! 1. Logical rewrite rules produce an equivalent logical subtree, for example
//! [`FilterPushdownRule`] which moves a filter below a projection.
//! 2. Physical rules produce an alternative physical subtree, usually choosing an access path,
//! for example [`IndexScanRule`] which answers a filter with an index.
//!
//! Rules don't modify plans. The planner applies every rule to every node it explores, and each
//! result that differs from the input is re-rooted into a new candidate plan.
//!
//! ## Pattern
//!
//! A pattern defines what subtree the rule can operate on. The [`LimitingSortRule`] for example
//! uses the following pattern:
//! ```no
//! static ref LIMITING_SORT_PATTERN: Pattern = {
//!     pattern(|op| matches!(op, Physical(PhysicalLimit(_))))
//!         .pattern(|op| matches!(op, Physical(PhysicalSort(_))))
//!             .leaf(any)
//!         .finish()
//!     .finish()
//! };
//! ```
//!
//! A rule is only invoked for nodes matching its pattern. Checks that can't be expressed as a
//! pattern, e.g. catalogue lookups, are done in [`RewriteRule::can_apply`] or by returning `None`
//! from [`RewriteRule::apply`].
mod pattern;
pub use pattern::*;
mod conjunction;
pub use conjunction::*;
mod filter_pushdown;
pub use filter_pushdown::*;
mod index;
pub use index::*;
mod scan;
pub use scan::*;
mod sort;
pub use sort::*;

use std::fmt::{Debug, Formatter};

use enum_dispatch::enum_dispatch;
use enumset::EnumSetType;
use strum_macros::AsRefStr;

use crate::error::PlanResult;
use crate::plan::{PlanNode, PlanNodeRef};
use crate::planner::QueryContext;

#[enum_dispatch(RuleImpl)]
pub trait RewriteRule {
    /// Pattern for rule.
    fn pattern(&self) -> &Pattern;

    /// Use to identify each rule, e.g. when disabling rules for a query.
    fn rule_id(&self) -> RuleId;

    /// Tests whether this rule can be applied to `node`.
    fn can_apply(&self, node: &PlanNode, _ctx: &QueryContext) -> bool {
        self.pattern().matches(node)
    }

    /// Applies the rule to `node`, which matched the pattern. Returns the replacement for
    /// `node`, or `None` if the rule turned out to be not applicable.
    fn apply(&self, node: &PlanNodeRef, ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>>;
}

#[enum_dispatch]
#[derive(Clone, AsRefStr)]
pub enum RuleImpl {
    // Logical rules
    LeftConjunctionRule,
    RightConjunctionRule,
    FilterPushdownRule,

    // Physical rules
    FullScanRule,
    IndexScanRule,
    LimitingSortRule,
    KnnIndexScanRule,
}

#[derive(EnumSetType, Debug)]
pub enum RuleId {
    // Logical rules
    LeftConjunction,
    RightConjunction,
    FilterPushdown,

    // Physical rules
    FullScan,
    IndexScan,
    LimitingSort,
    KnnIndexScan,
}

impl Debug for RuleImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_ref())
    }
}

/// Rules applied to logical plans by default.
pub fn default_logical_rules() -> Vec<RuleImpl> {
    vec![
        LeftConjunctionRule::new().into(),
        RightConjunctionRule::new().into(),
        FilterPushdownRule::new().into(),
    ]
}

/// Rules applied to physical plans by default.
pub fn default_physical_rules() -> Vec<RuleImpl> {
    vec![
        FullScanRule::new().into(),
        IndexScanRule::new().into(),
        LimitingSortRule::new().into(),
        KnnIndexScanRule::new().into(),
    ]
}
