use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::{DataType, Field};
use basalt::catalog::{
    Catalogue, ColumnDef, Entity, Index, IndexEstimate, IndexPredicate, IndexState, IndexType,
    MemoryCatalogue,
};
use basalt::cost::Cost;
use basalt::expr::{ComparisonOperator, Predicate};
use basalt::stat::ColumnStatistics;
use maplit::hashmap;

pub fn vector(name: &str, dimensions: i32) -> ColumnDef {
    ColumnDef::new(
        name,
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, false)), dimensions),
        false,
    )
}

pub fn create_entity(
    name: &str,
    rows: u64,
    columns: Vec<ColumnDef>,
    statistics: HashMap<&str, ColumnStatistics>,
) -> Entity {
    statistics
        .into_iter()
        .fold(Entity::new(name, columns, rows), |entity, (column, stats)| {
            entity.with_statistics(column, stats)
        })
}

/// `documents` with 100000 rows and `categories` with 50 rows.
pub fn entities() -> Vec<Entity> {
    vec![
        create_entity(
            "documents",
            100_000,
            vec![
                ColumnDef::new("id", DataType::Int64, false),
                ColumnDef::new("category", DataType::Int64, false),
                ColumnDef::new("title", DataType::Utf8, true),
                vector("embedding", 64),
            ],
            hashmap! {
                "id" => ColumnStatistics::new(100_000, 0, 8),
                "category" => ColumnStatistics::new(50, 0, 8),
                "title" => ColumnStatistics::new(100_000, 0, 32),
            },
        ),
        create_entity(
            "categories",
            50,
            vec![
                ColumnDef::new("id", DataType::Int64, false),
                ColumnDef::new("name", DataType::Utf8, false),
            ],
            hashmap! {
                "id" => ColumnStatistics::new(50, 0, 8),
                "name" => ColumnStatistics::new(50, 0, 16),
            },
        ),
    ]
}

/// Fixture catalogue, with `documents_category` and `documents_embedding` if `with_indexes`.
pub fn create_catalogue(with_indexes: bool) -> Arc<dyn Catalogue> {
    let mut catalogue = MemoryCatalogue::new();
    for entity in entities() {
        catalogue.register_entity(entity);
    }
    if with_indexes {
        catalogue.register_index(
            "documents",
            Arc::new(FixtureIndex::btree("documents_category", "category", 2000)),
        );
        catalogue.register_index(
            "documents",
            Arc::new(FixtureIndex::vector("documents_embedding", "embedding")),
        );
    }
    Arc::new(catalogue)
}

/// Index over a single column.
#[derive(Debug)]
pub struct FixtureIndex {
    name: String,
    index_type: IndexType,
    column: String,
    output_size: u64,
}

impl FixtureIndex {
    /// Equality lookups returning `output_size` rows.
    pub fn btree(name: &str, column: &str, output_size: u64) -> Self {
        Self {
            name: name.to_string(),
            index_type: IndexType::BTree,
            column: column.to_string(),
            output_size,
        }
    }

    /// Approximate nearest neighbour search.
    pub fn vector(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            index_type: IndexType::Quantization,
            column: column.to_string(),
            output_size: 0,
        }
    }
}

impl Index for FixtureIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn index_type(&self) -> IndexType {
        self.index_type
    }

    fn state(&self) -> IndexState {
        IndexState::Clean
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
                c.operator == ComparisonOperator::Equal
                    && c.left.column().map(|c| c.name() == self.column).unwrap_or(false)
            }
            (IndexType::Quantization, IndexPredicate::Proximity(p)) => {
                p.column.name() == self.column
            }
            _ => false,
        }
    }

    fn estimate(&self, predicate: &IndexPredicate, entity: &Entity) -> IndexEstimate {
        match predicate {
            IndexPredicate::Proximity(p) => IndexEstimate {
                cost: Cost::new(10.0, 10.0, 0.0, 0.2),
                output_size: p.k.min(entity.row_count()),
            },
            IndexPredicate::Boolean(_) => IndexEstimate {
                cost: Cost::new(10.0, self.output_size as f64, 0.0, 0.0),
                output_size: self.output_size,
            },
        }
    }
}
