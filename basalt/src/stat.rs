//! Column statistics and selectivity estimation.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::catalog::Entity;
use crate::expr::{Binding, Comparison, ComparisonOperator, Predicate};

const DEFAULT_EQUALITY: f64 = 0.1;
const DEFAULT_RANGE: f64 = 1.0 / 3.0;
const DEFAULT_BETWEEN: f64 = 0.25;
const DEFAULT_NULL: f64 = 0.05;
const DEFAULT_LIKE: f64 = 0.1;
const DEFAULT_MATCH: f64 = 0.05;
const DEFAULT_UNKNOWN: f64 = 0.5;

/// Statistics about values stored in a column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnStatistics {
    pub distinct_values: u64,
    pub null_count: u64,
    /// Average width in bytes, only meaningful for variable sized types.
    pub avg_width: usize,
}

impl ColumnStatistics {
    pub fn new(distinct_values: u64, null_count: u64, avg_width: usize) -> Self {
        Self {
            distinct_values,
            null_count,
            avg_width,
        }
    }
}

/// Fraction of rows that pass a predicate, always in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Selectivity(f64);

impl Selectivity {
    pub const ALL: Selectivity = Selectivity(1.0);
    pub const NOTHING: Selectivity = Selectivity(0.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(DEFAULT_UNKNOWN)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Number of rows out of `rows` expected to pass.
    pub fn apply(&self, rows: u64) -> u64 {
        (rows as f64 * self.0).ceil() as u64
    }

    fn complement(self) -> Self {
        Self::new(1.0 - self.0)
    }
}

impl Eq for Selectivity {}

impl Hash for Selectivity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state)
    }
}

impl Display for Selectivity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Estimates selectivities of predicates.
pub trait StatisticsService: Send + Sync {
    /// Selectivity of `predicate` when applied to rows of `entity`. The entity is `None` if the
    /// predicate is not evaluated directly over a stored entity.
    fn selectivity(&self, predicate: &Predicate, entity: Option<&Entity>) -> Selectivity;
}

/// Textbook selectivity estimation based on distinct value and null counts.
#[derive(Copy, Clone, Debug, Default)]
pub struct NaiveSelectivityCalculator;

impl NaiveSelectivityCalculator {
    fn comparison(&self, comparison: &Comparison, entity: Option<&Entity>) -> Selectivity {
        let column = match comparison.left.column() {
            Some(column) => column,
            None => return Selectivity::new(DEFAULT_UNKNOWN),
        };
        let rows = entity.map(|e| e.row_count()).unwrap_or(0);
        let stats = entity.and_then(|e| e.statistics(column));
        let equality = stats
            .filter(|s| s.distinct_values > 0)
            .map(|s| 1.0 / s.distinct_values as f64)
            .unwrap_or(DEFAULT_EQUALITY);

        let selectivity = match comparison.operator {
            ComparisonOperator::Equal => Selectivity::new(equality),
            ComparisonOperator::NotEqual => Selectivity::new(1.0 - equality),
            ComparisonOperator::Greater
            | ComparisonOperator::GreaterEqual
            | ComparisonOperator::Less
            | ComparisonOperator::LessEqual => Selectivity::new(DEFAULT_RANGE),
            ComparisonOperator::Between => Selectivity::new(DEFAULT_BETWEEN),
            ComparisonOperator::In => {
                if comparison
                    .right
                    .iter()
                    .any(|b| matches!(b, Binding::Subquery(_)))
                {
                    Selectivity::new(DEFAULT_UNKNOWN)
                } else {
                    Selectivity::new(equality * comparison.right.len() as f64)
                }
            }
            ComparisonOperator::IsNull => match stats {
                Some(s) if rows > 0 => Selectivity::new(s.null_count as f64 / rows as f64),
                _ => Selectivity::new(DEFAULT_NULL),
            },
            ComparisonOperator::Like => Selectivity::new(DEFAULT_LIKE),
            ComparisonOperator::Match => Selectivity::new(DEFAULT_MATCH),
        };

        if comparison.negated {
            selectivity.complement()
        } else {
            selectivity
        }
    }
}

impl StatisticsService for NaiveSelectivityCalculator {
    fn selectivity(&self, predicate: &Predicate, entity: Option<&Entity>) -> Selectivity {
        match predicate {
            Predicate::Comparison(c) => self.comparison(c, entity),
            Predicate::And(left, right) => {
                let l = self.selectivity(left, entity).value();
                let r = self.selectivity(right, entity).value();
                Selectivity::new(l * r)
            }
            Predicate::Or(left, right) => {
                let l = self.selectivity(left, entity).value();
                let r = self.selectivity(right, entity).value();
                Selectivity::new(l + r - l * r)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::{Binding, ComparisonOperator, Predicate};
    use crate::stat::{NaiveSelectivityCalculator, Selectivity, StatisticsService};
    use crate::test_utils::{column, test_entity};

    #[test]
    fn test_equality_uses_distinct_values() {
        let entity = test_entity("t1", 1000);
        let predicate =
            Predicate::comparison(column(&entity, "id"), ComparisonOperator::Equal, vec![
                Binding::Literal(0),
            ]);

        let selectivity = NaiveSelectivityCalculator.selectivity(&predicate, Some(&*entity));
        assert_eq!(Selectivity::new(0.001), selectivity);
        assert_eq!(1, selectivity.apply(1000));
    }

    #[test]
    fn test_conjunction_and_disjunction() {
        let entity = test_entity("t1", 1000);
        let gt = Predicate::comparison(column(&entity, "x"), ComparisonOperator::Greater, vec![
            Binding::Literal(0),
        ]);
        let like = Predicate::comparison(column(&entity, "name"), ComparisonOperator::Like, vec![
            Binding::Literal(1),
        ]);

        let and = NaiveSelectivityCalculator.selectivity(&gt.clone().and(like.clone()), None);
        let or = NaiveSelectivityCalculator.selectivity(&gt.or(like), None);
        assert!((and.value() - 0.1 / 3.0).abs() < 1e-9);
        assert!((or.value() - (1.0 / 3.0 + 0.1 - 0.1 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_selectivity_is_clamped() {
        assert_eq!(Selectivity::ALL, Selectivity::new(3.0));
        assert_eq!(Selectivity::NOTHING, Selectivity::new(-1.0));
        assert_eq!(0, Selectivity::NOTHING.apply(1000));
    }
}
