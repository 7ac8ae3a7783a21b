use crate::operator::Operator;
use crate::plan::PlanNode;

pub type OperatorMatcher = fn(&Operator) -> bool;

/// Shape of the subtree a rule operates on.
///
/// Patterns are built top down, nested patterns are closed by `finish`. To match a limit over a
/// sort over anything:
/// ```
/// use basalt::operator::Operator::Physical;
/// use basalt::operator::PhysicalOperator::{PhysicalLimit, PhysicalSort};
/// use basalt::rules::{any, pattern};
///
/// pattern(|op| matches!(op, Physical(PhysicalLimit(_))))
///   .pattern(|op| matches!(op, Physical(PhysicalSort(_))))
///     .leaf(any)
///   .finish()
/// .finish();
/// ```
///
/// Child patterns are matched against the first inputs of a node, remaining inputs are not
/// looked at. A pattern without children matches a node regardless of its inputs.
pub struct Pattern {
    matcher: OperatorMatcher,
    inputs: Vec<Pattern>,
}

impl Pattern {
    pub fn new(matcher: OperatorMatcher, inputs: Vec<Pattern>) -> Self {
        Self { matcher, inputs }
    }

    pub fn leaf(matcher: OperatorMatcher) -> Self {
        Self::new(matcher, vec![])
    }

    pub fn is_leaf(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Tests whether the subtree rooted at `node` has this shape.
    pub fn matches(&self, node: &PlanNode) -> bool {
        (self.matcher)(node.operator())
            && self.inputs.len() <= node.inputs().len()
            && self
                .inputs
                .iter()
                .zip(node.inputs())
                .all(|(pattern, input)| pattern.matches(input))
    }
}

pub fn any(_: &Operator) -> bool {
    true
}

/// Starts a pattern whose root matches `matcher`.
pub fn pattern(matcher: OperatorMatcher) -> PatternBuilder<Complete> {
    PatternBuilder {
        matcher,
        inputs: vec![],
        parent: Complete,
    }
}

/// Receives a pattern closed by [`PatternBuilder::finish`].
pub trait Nest {
    type Output;

    fn nest(self, pattern: Pattern) -> Self::Output;
}

/// Parent of the root pattern, hands out the finished pattern.
pub struct Complete;

impl Nest for Complete {
    type Output = Pattern;

    fn nest(self, pattern: Pattern) -> Pattern {
        pattern
    }
}

/// Builds one level of a pattern. `P` is the builder of the enclosing level.
pub struct PatternBuilder<P> {
    matcher: OperatorMatcher,
    inputs: Vec<Pattern>,
    parent: P,
}

impl<P: Nest> PatternBuilder<P> {
    /// Opens a child pattern, closed by `finish`.
    pub fn pattern(self, matcher: OperatorMatcher) -> PatternBuilder<Self> {
        PatternBuilder {
            matcher,
            inputs: vec![],
            parent: self,
        }
    }

    pub fn leaf(mut self, matcher: OperatorMatcher) -> Self {
        self.inputs.push(Pattern::leaf(matcher));
        self
    }

    /// Closes this level. Returns the enclosing builder, or the pattern for the root.
    pub fn finish(self) -> P::Output {
        self.parent.nest(Pattern::new(self.matcher, self.inputs))
    }
}

impl<P: Nest> Nest for PatternBuilder<P> {
    type Output = Self;

    fn nest(mut self, pattern: Pattern) -> Self {
        self.inputs.push(pattern);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::operator::LogicalOperator::{LogicalFilter, LogicalLimit, LogicalScan};
    use crate::operator::Operator::Logical;
    use crate::plan::LogicalPlanBuilder;
    use crate::rules::{any, pattern};
    use crate::test_utils::{eq_predicate, test_catalogue};

    #[test]
    fn test_matches() {
        let catalogue = test_catalogue();
        let t1 = catalogue.entity("t1").unwrap();
        let plan = LogicalPlanBuilder::new(catalogue.clone())
            .scan("t1")
            .filter(eq_predicate(&t1, "x", 0))
            .limit(1, 0)
            .build()
            .unwrap();

        let limit_over_filter = pattern(|op| matches!(op, Logical(LogicalLimit(_))))
            .pattern(|op| matches!(op, Logical(LogicalFilter(_))))
            .leaf(|op| matches!(op, Logical(LogicalScan(_))))
            .finish()
            .finish();
        let limit_over_scan = pattern(|op| matches!(op, Logical(LogicalLimit(_))))
            .leaf(|op| matches!(op, Logical(LogicalScan(_))))
            .finish();
        let scan_with_input = pattern(|op| matches!(op, Logical(LogicalScan(_))))
            .leaf(any)
            .finish();

        let root = plan.root();
        assert!(!limit_over_filter.is_leaf());
        assert!(limit_over_filter.matches(&root));
        assert!(!limit_over_scan.matches(&root));
        assert!(!scan_with_input.matches(root.base()));
        assert!(pattern(any).finish().matches(&root));
    }
}
