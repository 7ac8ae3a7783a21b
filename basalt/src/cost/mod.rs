//! Defines cost model.
//!
//! A [`Cost`] has four dimensions: `io` and `cpu` are time estimates, `memory` is the number of
//! bytes an operator holds and `accuracy` estimates the loss of accuracy of approximate
//! operators. Since the dimensions are not comparable, candidates are compared by
//! [normalizing](NormalizedCost::normalize) the costs of all candidates per dimension and
//! weighting them with a [`CostPolicy`].

mod calibration;
pub use calibration::*;
mod model;
pub use model::*;

use std::fmt::{Display, Formatter};
use std::iter::Sum;

use derive_more::{Add, AddAssign, Mul, Sub, SubAssign};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Add, Sub, AddAssign, SubAssign, Mul)]
pub struct Cost {
    pub io: f64,
    pub cpu: f64,
    pub memory: f64,
    pub accuracy: f64,
}

impl Cost {
    pub const ZERO: Cost = Cost::new(0.0, 0.0, 0.0, 0.0);

    /// Cost of operators that can't be executed. Never wins a comparison.
    pub const INVALID: Cost = Cost::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN);

    pub const fn new(io: f64, cpu: f64, memory: f64, accuracy: f64) -> Self {
        Self {
            io,
            cpu,
            memory,
            accuracy,
        }
    }

    pub const fn io(io: f64) -> Self {
        Self::new(io, 0.0, 0.0, 0.0)
    }

    pub const fn cpu(cpu: f64) -> Self {
        Self::new(0.0, cpu, 0.0, 0.0)
    }

    pub const fn memory(bytes: f64) -> Self {
        Self::new(0.0, 0.0, bytes, 0.0)
    }

    pub fn is_invalid(&self) -> bool {
        self.io.is_nan() || self.cpu.is_nan() || self.memory.is_nan() || self.accuracy.is_nan()
    }

    /// Time spent, e.g. the part of the cost that can be sped up by parallel execution.
    pub fn time(&self) -> f64 {
        self.io + self.cpu
    }

    fn dimension_max(&self, other: &Cost) -> Cost {
        Cost::new(
            self.io.max(other.io),
            self.cpu.max(other.cpu),
            self.memory.max(other.memory),
            self.accuracy.max(other.accuracy),
        )
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Self {
        iter.fold(Cost::ZERO, |acc, c| acc + c)
    }
}

impl<'a> Sum<&'a Cost> for Cost {
    fn sum<I: Iterator<Item = &'a Cost>>(iter: I) -> Self {
        iter.fold(Cost::ZERO, |acc, c| acc + *c)
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "io={:.3e} cpu={:.3e} memory={:.3e} accuracy={:.3}",
            self.io, self.cpu, self.memory, self.accuracy
        )
    }
}

/// A cost with every dimension scaled into `[0, 1]` relative to a set of candidates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCost {
    pub io: f64,
    pub cpu: f64,
    pub memory: f64,
    pub accuracy: f64,
}

impl NormalizedCost {
    /// Normalizes `costs` against each other.
    ///
    /// Each dimension is divided by the maximum of that dimension over all costs, so the
    /// candidate with the maximum ends up with `1.0`. A dimension that is zero everywhere
    /// normalizes to `0.0`. Invalid dimensions normalize to `1.0`.
    pub fn normalize(costs: &[Cost]) -> Vec<NormalizedCost> {
        let max = costs
            .iter()
            .fold(Cost::ZERO, |acc, c| acc.dimension_max(c));

        costs
            .iter()
            .map(|c| NormalizedCost {
                io: ratio(c.io, max.io),
                cpu: ratio(c.cpu, max.cpu),
                memory: ratio(c.memory, max.memory),
                accuracy: ratio(c.accuracy, max.accuracy),
            })
            .collect()
    }
}

fn ratio(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 1.0;
    }
    if max <= 0.0 {
        return 0.0;
    }
    if max.is_infinite() {
        return if value.is_infinite() { 1.0 } else { 0.0 };
    }
    (value / max).clamp(0.0, 1.0)
}

/// Weights used to turn a [`NormalizedCost`] into a single score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostPolicy {
    pub wio: f64,
    pub wcpu: f64,
    pub wmemory: f64,
    pub waccuracy: f64,
    /// Minimum speedup an additional partition has to add to be worth it.
    pub speedup_threshold: f64,
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            wio: 1.0,
            wcpu: 1.0,
            wmemory: 1.0,
            waccuracy: 1.0,
            speedup_threshold: 0.1,
        }
    }
}

impl CostPolicy {
    pub fn new(wio: f64, wcpu: f64, wmemory: f64, waccuracy: f64) -> Self {
        Self {
            wio,
            wcpu,
            wmemory,
            waccuracy,
            ..Default::default()
        }
    }

    /// Lower is better.
    pub fn to_score(&self, cost: &NormalizedCost) -> f64 {
        self.wio * cost.io
            + self.wcpu * cost.cpu
            + self.wmemory * cost.memory
            + self.waccuracy * cost.accuracy
    }

    /// Number of partitions, at most `max`, worth executing a plan with.
    ///
    /// Uses Amdahl's law: with a parallelizable share `p` of the total time, `n` partitions speed
    /// up execution by `1 / ((1 - p) + p / n)`. Partitions are added while each one adds at
    /// least `speedup_threshold` to the speedup.
    pub fn parallelisation(&self, parallelizable: &Cost, total: &Cost, max: usize) -> usize {
        let total_time = total.time();
        if max <= 1 || !total_time.is_finite() || total_time <= 0.0 {
            return 1;
        }

        let share = (parallelizable.time() / total_time).clamp(0.0, 1.0);
        let speedup = |partitions: usize| 1.0 / ((1.0 - share) + share / partitions as f64);

        let mut partitions = 1;
        for candidate in 2..=max {
            if speedup(candidate) - speedup(candidate - 1) < self.speedup_threshold {
                break;
            }
            partitions = candidate;
        }
        partitions
    }
}
