//! Catalogue and index registry consumed by the planner.
//!
//! The storage engine and the concrete index structures are not part of this crate. The planner
//! only sees [`Entity`] snapshots (schema, row count, column statistics) and [`Index`] handles
//! that can tell whether they are able to process a predicate and what that would cost.

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use arrow_schema::DataType;
use strum_macros::AsRefStr;

use crate::cost::Cost;
use crate::expr::{Predicate, ProximityPredicate};
use crate::stat::ColumnStatistics;

/// Width assumed for variable sized values without statistics.
const DEFAULT_VARIABLE_WIDTH: usize = 32;

/// A column produced or consumed by an operator.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl ColumnDef {
    pub fn new<S: Into<String>>(name: S, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Number of dimensions for vector columns, `None` for scalars.
    pub fn dimensions(&self) -> Option<usize> {
        match &self.data_type {
            DataType::FixedSizeList(_, size) => Some(*size as usize),
            _ => None,
        }
    }

    /// Estimated size in bytes of one value of this column.
    pub fn physical_size(&self, statistics: Option<&ColumnStatistics>) -> usize {
        let avg_width = statistics
            .map(|s| s.avg_width)
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_VARIABLE_WIDTH);
        data_type_size(&self.data_type, avg_width)
    }
}

impl Display for ColumnDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn data_type_size(data_type: &DataType, avg_width: usize) -> usize {
    match data_type {
        DataType::Null => 0,
        DataType::Boolean | DataType::Int8 | DataType::UInt8 => 1,
        DataType::Int16 | DataType::UInt16 | DataType::Float16 => 2,
        DataType::Int32 | DataType::UInt32 | DataType::Float32 | DataType::Date32 => 4,
        DataType::Int64
        | DataType::UInt64
        | DataType::Float64
        | DataType::Date64
        | DataType::Timestamp(_, _) => 8,
        DataType::FixedSizeList(field, size) => {
            (*size as usize) * data_type_size(field.data_type(), avg_width)
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Binary | DataType::LargeBinary => {
            avg_width
        }
        _ => 8,
    }
}

/// Snapshot of a stored entity (table) as seen by the planner.
#[derive(Debug)]
pub struct Entity {
    name: String,
    columns: Vec<ColumnDef>,
    row_count: u64,
    statistics: HashMap<String, ColumnStatistics>,
}

impl Entity {
    pub fn new<S: Into<String>>(name: S, columns: Vec<ColumnDef>, row_count: u64) -> Self {
        Self {
            name: name.into(),
            columns,
            row_count,
            statistics: HashMap::new(),
        }
    }

    pub fn with_statistics<S: Into<String>>(
        mut self,
        column: S,
        statistics: ColumnStatistics,
    ) -> Self {
        self.statistics.insert(column.into(), statistics);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn statistics(&self, column: &ColumnDef) -> Option<&ColumnStatistics> {
        self.statistics.get(column.name())
    }

    /// Estimated width in bytes of a row consisting of `columns`.
    pub fn row_width(&self, columns: &[ColumnDef]) -> usize {
        columns
            .iter()
            .map(|c| c.physical_size(self.statistics(c)))
            .sum()
    }
}

/// Shared handle to an [`Entity`].
///
/// Two handles are equal if they name the same entity, so that plans over the same entity hash
/// to the same digest regardless of the statistics snapshot they carry.
#[derive(Clone, Debug)]
pub struct EntityRef(Arc<Entity>);

impl EntityRef {
    pub fn new(entity: Entity) -> Self {
        Self(Arc::new(entity))
    }
}

impl Deref for EntityRef {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.0
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state)
    }
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, AsRefStr)]
pub enum IndexType {
    BTree,
    Hash,
    Fulltext,
    /// Proximity graph for nearest neighbour search.
    Graph,
    /// Vector quantization for approximate nearest neighbour search.
    Quantization,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum IndexState {
    Clean,
    /// Index has pending changes and can't be used to answer queries.
    Dirty,
    /// Index is usable, but its statistics are outdated.
    Stale,
}

/// Predicate handed to an index to check whether it can process it.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum IndexPredicate {
    Boolean(Predicate),
    Proximity(ProximityPredicate),
}

impl Display for IndexPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexPredicate::Boolean(p) => write!(f, "{}", p),
            IndexPredicate::Proximity(p) => write!(f, "{}", p),
        }
    }
}

/// Cost and output size an index reports for processing a predicate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IndexEstimate {
    pub cost: Cost,
    pub output_size: u64,
}

/// An index structure registered with the catalogue.
pub trait Index: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn index_type(&self) -> IndexType;

    fn state(&self) -> IndexState {
        IndexState::Clean
    }

    /// Columns the index produces when processing `predicate`.
    fn produces(&self, predicate: &IndexPredicate) -> Vec<ColumnDef>;

    /// Tests whether this index can answer `predicate`.
    fn can_process(&self, predicate: &IndexPredicate) -> bool;

    /// Cost and output size of answering `predicate` for `entity`.
    fn estimate(&self, predicate: &IndexPredicate, entity: &Entity) -> IndexEstimate;
}

/// Shared handle to an [`Index`]; equality and hashing use the index name.
#[derive(Clone, Debug)]
pub struct IndexRef(Arc<dyn Index>);

impl IndexRef {
    pub fn new(index: Arc<dyn Index>) -> Self {
        Self(index)
    }
}

impl Deref for IndexRef {
    type Target = dyn Index;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for IndexRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name() == other.0.name()
    }
}

impl Eq for IndexRef {}

impl Hash for IndexRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name().hash(state)
    }
}

/// Catalogue lookups needed during planning.
pub trait Catalogue: Send + Sync {
    fn entity(&self, name: &str) -> Option<EntityRef>;

    /// Indexes registered for an entity, in registration order.
    fn indexes(&self, entity: &str) -> Vec<IndexRef>;
}

/// A catalogue that lives in memory, mostly useful for embedding and tests.
#[derive(Default)]
pub struct MemoryCatalogue {
    entities: HashMap<String, EntityRef>,
    indexes: HashMap<String, Vec<IndexRef>>,
}

impl MemoryCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_entity(&mut self, entity: Entity) -> EntityRef {
        let entity = EntityRef::new(entity);
        self.entities
            .insert(entity.name().to_string(), entity.clone());
        entity
    }

    pub fn register_index(&mut self, entity: &str, index: Arc<dyn Index>) {
        self.indexes
            .entry(entity.to_string())
            .or_default()
            .push(IndexRef::new(index));
    }

    /// Removes an index, returns whether it existed.
    pub fn drop_index(&mut self, entity: &str, index: &str) -> bool {
        match self.indexes.get_mut(entity) {
            Some(indexes) => {
                let before = indexes.len();
                indexes.retain(|i| i.name() != index);
                before != indexes.len()
            }
            None => false,
        }
    }
}

impl Catalogue for MemoryCatalogue {
    fn entity(&self, name: &str) -> Option<EntityRef> {
        self.entities.get(name).cloned()
    }

    fn indexes(&self, entity: &str) -> Vec<IndexRef> {
        self.indexes.get(entity).cloned().unwrap_or_default()
    }
}
