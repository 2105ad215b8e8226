use crate::model::{Column, Entity, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    OneToMany,
    ManyToOne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipEnd {
    pub cardinality: Cardinality,
    pub relative: Point,
    pub absolute: Point,
    pub table_name: String,
    pub column_name: String,
}

impl RelationshipEnd {
    fn new(cardinality: Cardinality, entity: &Entity, column: &Column) -> Self {
        Self {
            cardinality,
            relative: column.position,
            absolute: entity.position.offset(column.position),
            table_name: entity.table_name.clone(),
            column_name: column.name.clone(),
        }
    }
}

/// Edge between a join column and the column it references.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub kind: RelationshipType,
    pub start: RelationshipEnd,
    pub end: RelationshipEnd,
}

impl Relationship {
    pub fn new(
        source: &Entity,
        source_column: &Column,
        target: &Entity,
        target_column: &Column,
    ) -> Self {
        // The many end goes on the referenced column unless the source box
        // sits to the right of the target.
        let (start, end) = if source.table_name == target.table_name
            || source.position.x <= target.position.x
        {
            (
                RelationshipEnd::new(Cardinality::Many, target, target_column),
                RelationshipEnd::new(Cardinality::One, source, source_column),
            )
        } else {
            (
                RelationshipEnd::new(Cardinality::One, source, source_column),
                RelationshipEnd::new(Cardinality::Many, target, target_column),
            )
        };

        Self {
            source_table: source.table_name.clone(),
            source_column: source_column.name.clone(),
            target_table: target.table_name.clone(),
            target_column: target_column.name.clone(),
            kind: RelationshipType::OneToMany,
            start,
            end,
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.source_table == self.target_table
    }

    /// End sitting on the given table/column, if any.
    pub fn end_at(&self, table: &str, column: &str) -> Option<&RelationshipEnd> {
        [&self.start, &self.end]
            .into_iter()
            .find(|e| e.table_name == table && e.column_name == column)
    }
}
