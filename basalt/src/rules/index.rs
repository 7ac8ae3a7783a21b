use log::debug;

use crate::catalog::{ColumnDef, EntityRef, IndexPredicate, IndexRef, IndexState};
use crate::error::PlanResult;
use crate::expr::{FunctionCall, ProximityPredicate, SortOrder};
use crate::operator::Operator::Physical;
use crate::operator::PhysicalOperator::{
    PhysicalFetch, PhysicalFilter, PhysicalFullScan, PhysicalFunction, PhysicalIndexScan,
    PhysicalLimitingSort, PhysicalUnresolvedScan,
};
use crate::operator::{EntityScan, Fetch, IndexScan, Operator};
use crate::plan::{GroupId, PlanNode, PlanNodeRef};
use crate::planner::QueryContext;
use crate::rules::{pattern, Pattern, RewriteRule, RuleId};

fn is_entity_scan(op: &Operator) -> bool {
    matches!(
        op,
        Physical(PhysicalUnresolvedScan(_)) | Physical(PhysicalFullScan(_))
    )
}

/// The scan an access path can replace. Partitioned scans are left alone.
fn replaceable_scan(node: &PlanNode) -> Option<&EntityScan> {
    match node.operator() {
        Physical(PhysicalUnresolvedScan(scan)) => Some(scan),
        Physical(PhysicalFullScan(scan)) if scan.partition().is_none() => Some(scan.scan()),
        _ => None,
    }
}

/// First clean index of `entity` that can process `predicate`.
fn find_index(
    ctx: &QueryContext,
    entity: &EntityRef,
    predicate: &IndexPredicate,
) -> Option<IndexRef> {
    ctx.catalogue()
        .indexes(entity.name())
        .into_iter()
        .find(|index| index.state() == IndexState::Clean && index.can_process(predicate))
}

/// Builds an index scan producing `fetch`. Columns the index doesn't produce are looked up by
/// a `Fetch` on top of the scan. `extra` columns are produced by the index itself.
fn index_access(
    group_id: GroupId,
    entity: &EntityRef,
    fetch: &[ColumnDef],
    index: IndexRef,
    predicate: IndexPredicate,
    extra: Vec<ColumnDef>,
) -> PlanResult<PlanNodeRef> {
    let produces = index.produces(&predicate);
    let (mut covered, delta): (Vec<ColumnDef>, Vec<ColumnDef>) = fetch
        .iter()
        .cloned()
        .partition(|column| produces.contains(column));
    covered.extend(extra);

    debug!(
        "Index {} of {} covers {} of {} columns",
        index.name(),
        entity.name(),
        fetch.len() - delta.len(),
        fetch.len()
    );

    let scan = PlanNode::physical(
        group_id,
        PhysicalIndexScan(IndexScan::new(entity.clone(), index, predicate, covered)),
        vec![],
    )?;
    if delta.is_empty() {
        Ok(scan)
    } else {
        PlanNode::physical(
            group_id,
            PhysicalFetch(Fetch::new(entity.clone(), delta)),
            vec![scan],
        )
    }
}

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref INDEX_SCAN_PATTERN: Pattern = {
        pattern(|op| matches!(op, Physical(PhysicalFilter(_))))
            .leaf(is_entity_scan)
        .finish()
    };
}

/// Answers a filter over a scan with an index that can process the filter's predicate.
#[derive(Clone)]
pub struct IndexScanRule {}

impl IndexScanRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for IndexScanRule {
    fn pattern(&self) -> &Pattern {
        &INDEX_SCAN_PATTERN
    }

    fn rule_id(&self) -> RuleId {
        RuleId::IndexScan
    }

    fn apply(&self, node: &PlanNodeRef, ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>> {
        let filter = match node.operator() {
            Physical(PhysicalFilter(filter)) => filter,
            _ => return Ok(None),
        };
        let scan = match replaceable_scan(node.input(0)?) {
            Some(scan) => scan,
            None => return Ok(None),
        };

        let predicate = IndexPredicate::Boolean(filter.predicate().clone());
        match find_index(ctx, scan.entity(), &predicate) {
            Some(index) => index_access(
                node.group_id(),
                scan.entity(),
                scan.fetch(),
                index,
                predicate,
                vec![],
            )
            .map(Some),
            None => Ok(None),
        }
    }
}

#[rustfmt::skip::macros(lazy_static)]
lazy_static! {
    static ref KNN_INDEX_SCAN_PATTERN: Pattern = {
        pattern(|op| matches!(op, Physical(PhysicalLimitingSort(_))))
            .pattern(|op| matches!(op, Physical(PhysicalFunction(_))))
                .leaf(is_entity_scan)
            .finish()
        .finish()
    };
}

/// Answers a nearest neighbour search, i.e. the top `k` rows ordered by ascending distance,
/// with an index that supports proximity queries.
///
/// The limiting sort is kept on top, since indexes don't return their results in order.
#[derive(Clone)]
pub struct KnnIndexScanRule {}

impl KnnIndexScanRule {
    pub fn new() -> Self {
        Self {}
    }
}

impl RewriteRule for KnnIndexScanRule {
    fn pattern(&self) -> &Pattern {
        &KNN_INDEX_SCAN_PATTERN
    }

    fn rule_id(&self) -> RuleId {
        RuleId::KnnIndexScan
    }

    fn apply(&self, node: &PlanNodeRef, ctx: &QueryContext) -> PlanResult<Option<PlanNodeRef>> {
        let function_node = node.input(0)?;
        let (sort, function) = match (node.operator(), function_node.operator()) {
            (Physical(PhysicalLimitingSort(sort)), Physical(PhysicalFunction(function))) => {
                (sort, function)
            }
            _ => return Ok(None),
        };

        match sort.order() {
            [(column, SortOrder::Ascending)] if column == function.out() => {}
            _ => return Ok(None),
        }
        let (column, query, distance) = match function.function() {
            FunctionCall::Distance {
                column,
                query,
                distance,
            } => (column, query, distance),
        };
        let scan = match replaceable_scan(function_node.input(0)?) {
            Some(scan) => scan,
            None => return Ok(None),
        };

        let predicate = IndexPredicate::Proximity(ProximityPredicate {
            column: column.clone(),
            query: query.clone(),
            k: sort.limit().saturating_add(sort.skip()),
            distance: *distance,
            out: function.out().clone(),
        });
        let index = match find_index(ctx, scan.entity(), &predicate) {
            Some(index) => index,
            None => return Ok(None),
        };

        let access = index_access(
            node.group_id(),
            scan.entity(),
            scan.fetch(),
            index,
            predicate,
            vec![function.out().clone()],
        )?;
        node.copy_with_new_inputs(vec![access]).map(Some)
    }
}
