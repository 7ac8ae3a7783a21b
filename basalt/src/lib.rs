//! ## Background
//!
//! The query planner accepts an unoptimized logical query plan, and outputs a physical plan ready
//! to be executed. Queries mix relational operations, such as filters and sorts, with nearest
//! neighbour search over vector columns, which can be answered exactly by scanning an entity or
//! approximately by an index.
//!
//! Planning is cost based. Rules propose equivalent plans, and every physical plan carries an
//! estimated cost along four dimensions: io, cpu, memory and accuracy. Accuracy is the penalty
//! of approximate access paths, so trading result quality for speed is up to the
//! [`cost::CostPolicy`] of each query. Since the dimensions have different units, costs of the
//! candidates of a query are normalized against each other before they are weighted.
//!
//! The search space is explored breadth first and memoized by a structural digest of each plan,
//! which keeps the search finite even though rules may reach the same plan in many orders.
//!
//! ## Design
//!
//! * [`catalog`] Entities, indexes and the catalogue interface used during planning.
//! * [`expr`] Predicates, functions and late bound literals.
//! * [`operator`] Logical and physical operators.
//! * [`plan`] Immutable plan trees, their construction and rendering.
//! * [`cost`] Cost vectors, the cost model of physical operators and cost policies.
//! * [`stat`] Selectivity estimation.
//! * [`rules`] Optimization rule definition and implementation.
//! * [`planner`] The planner driver and the plan cache.
//!
//! ## Reference
//!
//! 1. Selinger, P. Griffiths, et al. "Access path selection in a relational database management
//! system." Readings in Artificial Intelligence and Databases. Morgan Kaufmann, 1989. 511-522.
//! 2. Graefe, G., 1995. The cascades framework for query optimization. IEEE Data Eng. Bull., 18(3),
//! pp.19-29.
//! 3. Amdahl, G.M., 1967. Validity of the single processor approach to achieving large scale
//! computing capabilities. In Proceedings of the April 18-20, 1967, spring joint computer
//! conference (pp. 483-485).

#[macro_use]
extern crate prettytable;
#[macro_use]
extern crate lazy_static;

pub mod catalog;
pub mod config;
pub mod cost;
pub mod error;
pub mod expr;
pub mod operator;
pub mod plan;
pub mod planner;
pub mod rules;
pub mod stat;

#[cfg(test)]
pub(crate) mod test_utils;
