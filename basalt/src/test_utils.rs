use std::sync::Arc;

use arrow_schema::{DataType, Field};

use crate::catalog::{
    Catalogue, ColumnDef, Entity, EntityRef, Index, IndexEstimate, IndexPredicate, IndexRef,
    IndexState, IndexType, MemoryCatalogue,
};
use crate::cost::Cost;
use crate::expr::{Binding, ComparisonOperator, Predicate};
use crate::operator::IndexScan;
use crate::operator::PhysicalOperator::PhysicalIndexScan;
use crate::plan::{GroupId, PlanNode, PlanNodeRef};
use crate::planner::QueryContext;
use crate::stat::ColumnStatistics;

/// Entity with columns `id`, `x`, `name` and a 128 dimensional `feature` vector.
pub fn test_entity_def(name: &str, rows: u64) -> Entity {
    let columns = vec![
        ColumnDef::new("id", DataType::Int64, false),
        ColumnDef::new("x", DataType::Int64, true),
        ColumnDef::new("name", DataType::Utf8, true),
        ColumnDef::new(
            "feature",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, false)), 128),
            false,
        ),
    ];
    Entity::new(name, columns, rows)
        .with_statistics("id", ColumnStatistics::new(rows, 0, 8))
        .with_statistics("x", ColumnStatistics::new(100, rows / 10, 8))
        .with_statistics("name", ColumnStatistics::new(rows / 2, 0, 16))
}

pub fn test_entity(name: &str, rows: u64) -> EntityRef {
    EntityRef::new(test_entity_def(name, rows))
}

pub fn column(entity: &Entity, name: &str) -> ColumnDef {
    entity.column(name).unwrap().clone()
}

/// `column = :literal`
pub fn eq_predicate(entity: &Entity, name: &str, literal: usize) -> Predicate {
    Predicate::comparison(
        column(entity, name),
        ComparisonOperator::Equal,
        vec![Binding::Literal(literal)],
    )
}

/// `column IN (SELECT ... )` with the sub-query planned as `group_id`.
pub fn in_subquery_predicate(entity: &Entity, name: &str, group_id: GroupId) -> Predicate {
    Predicate::comparison(
        column(entity, name),
        ComparisonOperator::In,
        vec![Binding::Subquery(group_id)],
    )
}

/// Index on a single column with a fixed cost.
#[derive(Debug)]
pub struct TestIndex {
    name: String,
    index_type: IndexType,
    column: String,
    state: IndexState,
    cost: Cost,
    output_size: u64,
}

impl TestIndex {
    pub fn btree(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            index_type: IndexType::BTree,
            column: column.to_string(),
            state: IndexState::Clean,
            cost: Cost::io(1.0),
            output_size: 10,
        }
    }

    /// Approximate nearest neighbour index.
    pub fn knn(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            index_type: IndexType::Quantization,
            column: column.to_string(),
            state: IndexState::Clean,
            cost: Cost::new(10.0, 10.0, 1024.0, 0.2),
            output_size: 0,
        }
    }

    pub fn with_state(mut self, state: IndexState) -> Self {
        self.state = state;
        self
    }

    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    fn is_indexed(&self, binding: &Binding) -> bool {
        binding
            .column()
            .map(|c| c.name() == self.column)
            .unwrap_or(false)
    }
}

impl Index for TestIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn index_type(&self) -> IndexType {
        self.index_type
    }

    fn state(&self) -> IndexState {
        self.state
    }

    fn produces(&self, predicate: &IndexPredicate) -> Vec<ColumnDef> {
        match predicate {
            IndexPredicate::Boolean(p) => p
                .columns()
                .into_iter()
                .filter(|c| c.name() == self.column)
                .collect(),
            IndexPredicate::Proximity(p) => vec![p.out.clone()],
        }
    }

    fn can_process(&self, predicate: &IndexPredicate) -> bool {
        match (self.index_type, predicate) {
            (IndexType::BTree, IndexPredicate::Boolean(Predicate::Comparison(c))) => {
                c.operator == ComparisonOperator::Equal && self.is_indexed(&c.left)
            }
            (IndexType::Quantization, IndexPredicate::Proximity(p)) => p.column.name() == self.column,
            _ => false,
        }
    }

    fn estimate(&self, predicate: &IndexPredicate, entity: &Entity) -> IndexEstimate {
        let output_size = match predicate {
            IndexPredicate::Proximity(p) => p.k.min(entity.row_count()),
            IndexPredicate::Boolean(_) => self.output_size,
        };
        IndexEstimate {
            cost: self.cost,
            output_size,
        }
    }
}

/// Index scan answering `name = :0` with an index named `<entity>_<name>`.
pub fn index_scan(entity: &EntityRef, name: &str, cost: Cost) -> PlanNodeRef {
    let index = TestIndex::btree(&format!("{}_{}", entity.name(), name), name).with_cost(cost);
    let predicate = IndexPredicate::Boolean(eq_predicate(entity, name, 0));
    PlanNode::physical(
        0,
        PhysicalIndexScan(IndexScan::new(
            entity.clone(),
            IndexRef::new(Arc::new(index)),
            predicate,
            vec![column(entity, name)],
        )),
        vec![],
    )
    .unwrap()
}

/// `t1` with 100000 rows and an index `t1_x`, `t2` with 1000 rows and no index.
pub fn test_catalogue() -> Arc<dyn Catalogue> {
    let mut catalogue = MemoryCatalogue::new();
    catalogue.register_entity(test_entity_def("t1", 100_000));
    catalogue.register_entity(test_entity_def("t2", 1000));
    catalogue.register_index("t1", Arc::new(TestIndex::btree("t1_x", "x")));
    Arc::new(catalogue)
}

pub fn test_context(root: PlanNodeRef, catalogue: Arc<dyn Catalogue>) -> QueryContext {
    QueryContext::new(root, catalogue)
}
