use crate::catalog::ColumnDef;
use crate::cost::{Cost, CostConstants};
use crate::expr::{ComparisonOperator, Predicate};
use crate::operator::PhysicalOperator::*;
use crate::operator::{Filter, PhysicalOperator, SubSelectFilter};
use crate::plan::{PhysicalProperties, PlanNodeRef};
use crate::stat::Selectivity;

/// Selectivity assumed for filters whose selectivity wasn't estimated.
const DEFAULT_SELECTIVITY: f64 = 0.5;

/// Estimates output size and cost of physical operators.
///
/// Costs are expressed in the [`CostConstants`] the model was created with: reading a byte from
/// disk costs `disk_access_read`, touching it in memory `memory_access`, and so on.
#[derive(Clone, Copy, Debug)]
pub struct CostModel {
    constants: &'static CostConstants,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            constants: CostConstants::calibrated(),
        }
    }
}

impl CostModel {
    pub fn new(constants: &'static CostConstants) -> Self {
        Self { constants }
    }

    /// Derives the physical properties of `operator` applied to `inputs`.
    ///
    /// The cost of the operator itself does not include the cost of its inputs, the total cost
    /// does.
    pub fn estimate(&self, operator: &PhysicalOperator, inputs: &[PlanNodeRef]) -> PhysicalProperties {
        let (output_size, cost) = self.estimate_operator(operator, inputs);
        let total_cost = cost + inputs.iter().map(|i| i.total_cost()).sum::<Cost>();

        PhysicalProperties {
            output_size,
            cost,
            total_cost,
            executable: operator.executable() && inputs.iter().all(|i| i.executable()),
            partitionable: operator.partitionable(),
        }
    }

    fn estimate_operator(&self, operator: &PhysicalOperator, inputs: &[PlanNodeRef]) -> (u64, Cost) {
        let c = self.constants;
        let input_rows = |idx: usize| inputs.get(idx).map(|i| i.output_size()).unwrap_or(0);
        let input_width = |idx: usize| {
            inputs
                .get(idx)
                .map(|i| row_width(i.columns()))
                .unwrap_or(0)
        };

        match operator {
            PhysicalUnresolvedScan(scan) => (scan.entity().row_count(), Cost::INVALID),
            PhysicalFullScan(scan) => {
                let rows = match scan.partition() {
                    Some(p) => div_ceil(scan.entity().row_count(), p.count.max(1) as u64),
                    None => scan.entity().row_count(),
                };
                let bytes = rows as f64 * scan.entity().row_width(scan.fetch()) as f64;
                (rows, (c.disk_access_read + c.memory_access) * bytes)
            }
            PhysicalSample(sample) => {
                let rows = sample.size().min(sample.entity().row_count());
                let bytes = rows as f64 * sample.entity().row_width(sample.fetch()) as f64;
                // Samples read rows at random positions.
                (rows, (c.disk_access_read * 2.0 + c.memory_access) * bytes)
            }
            PhysicalIndexScan(scan) => {
                let estimate = scan.index().estimate(scan.predicate(), scan.entity());
                (estimate.output_size, estimate.cost)
            }
            PhysicalGroupRef(_) => (0, Cost::ZERO),
            PhysicalFetch(fetch) => {
                let rows = input_rows(0);
                let bytes = rows as f64 * fetch.entity().row_width(fetch.fetch()) as f64;
                (rows, (c.disk_access_read + c.memory_access) * bytes)
            }
            PhysicalFilter(filter) => {
                let rows = input_rows(0);
                let selectivity = filter_selectivity(filter);
                (
                    selectivity.apply(rows),
                    self.predicate_cost(filter.predicate()) * rows as f64,
                )
            }
            PhysicalFilterOnSubSelect(filter) => {
                let rows = input_rows(0);
                let subquery_rows = input_rows(1) as f64;
                let selectivity = sub_select_selectivity(filter);
                let lookup = self.predicate_cost(filter.predicate()) * rows as f64;
                let materialize = c.memory_access * subquery_rows
                    + Cost::memory(subquery_rows * input_width(1) as f64);
                (selectivity.apply(rows), lookup + materialize)
            }
            PhysicalSort(sort) => {
                let rows = input_rows(0);
                let comparisons = rows as f64 * log2(rows) * sort.order().len() as f64;
                let memory = Cost::memory(rows as f64 * input_width(0) as f64);
                (rows, c.memory_access * comparisons + memory)
            }
            PhysicalLimitingSort(sort) => {
                let rows = input_rows(0);
                let kept = sort.limit().saturating_add(sort.skip()).min(rows);
                let output = kept.saturating_sub(sort.skip());
                let comparisons = rows as f64 * log2(kept) * sort.order().len() as f64;
                let memory = Cost::memory(kept as f64 * input_width(0) as f64);
                (output, c.memory_access * comparisons + memory)
            }
            PhysicalLimit(limit) => {
                let rows = input_rows(0).saturating_sub(limit.skip()).min(limit.limit());
                (rows, c.memory_access * rows as f64)
            }
            PhysicalProjection(projection) => {
                let rows = input_rows(0);
                let cells = rows as f64 * projection.columns().len() as f64;
                (rows, c.memory_access * cells)
            }
            PhysicalFunction(function) => {
                let rows = input_rows(0) as f64;
                let call = function.function();
                let per_row = c.flop * call.flops() + c.memory_access * call.memory_accesses();
                (input_rows(0), per_row * rows)
            }
            PhysicalMerge(_) => {
                let rows: u64 = inputs.iter().map(|i| i.output_size()).sum();
                (rows, c.memory_access * rows as f64)
            }
        }
    }

    /// Cost of evaluating `predicate` for a single row.
    pub fn predicate_cost(&self, predicate: &Predicate) -> Cost {
        let c = self.constants;
        predicate
            .atomics()
            .iter()
            .map(|atomic| {
                let operands = 1.0 + atomic.right.len() as f64;
                let flops = match atomic.operator {
                    ComparisonOperator::Like => 10.0,
                    ComparisonOperator::In => atomic.right.len() as f64,
                    _ => 1.0,
                };
                c.memory_access * operands + c.flop * flops
            })
            .sum()
    }
}

fn filter_selectivity(filter: &Filter) -> Selectivity {
    filter
        .selectivity()
        .unwrap_or_else(|| Selectivity::new(DEFAULT_SELECTIVITY))
}

fn sub_select_selectivity(filter: &SubSelectFilter) -> Selectivity {
    filter
        .selectivity()
        .unwrap_or_else(|| Selectivity::new(DEFAULT_SELECTIVITY))
}

fn row_width(columns: &[ColumnDef]) -> usize {
    columns.iter().map(|c| c.physical_size(None)).sum()
}

fn log2(rows: u64) -> f64 {
    (rows.max(2) as f64).log2()
}

fn div_ceil(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}
