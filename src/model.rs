//! Entity boxes and the column rows inside them.

use crate::descriptor::ColumnDescriptor;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, other: Point) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// Target of a join column, filled in once the referenced entity resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnReference {
    pub entity_name: Option<String>,
    pub table_name: Option<String>,
    pub column_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub data_length: Option<u32>,
    pub nullable: Option<String>,
    pub extra: Option<String>,
    pub primary_key: bool,
    pub reference_column: bool,
    pub reference: ColumnReference,
    /// Relative to the owning entity's top-left corner.
    pub position: Point,
}

impl Column {
    pub fn new(descriptor: &ColumnDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            data_type: descriptor.data_type.clone(),
            data_length: descriptor.length.filter(|&len| len > 0),
            nullable: descriptor.nullable.clone(),
            extra: descriptor.extra.clone(),
            primary_key: false,
            reference_column: false,
            reference: ColumnReference::default(),
            position: Point::default(),
        }
    }

    pub fn set_join(&mut self, entity_name: &str, table_name: &str, column_name: &str) {
        self.reference = ColumnReference {
            entity_name: Some(entity_name.to_string()),
            table_name: Some(table_name.to_string()),
            column_name: Some(column_name.to_string()),
        };
    }

    pub fn has_reference(&self) -> bool {
        self.reference_column || self.reference.column_name.is_some()
    }

    pub fn has_reference_entity(&self) -> bool {
        self.reference.table_name.is_some() && self.reference.column_name.is_some()
    }
}

/// One table box. `height` always follows the column count.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub entity_name: String,
    pub namespace: String,
    pub table_name: String,
    pub id: String,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub header_height: f64,
    pub column_height: f64,
    pub columns: IndexMap<String, Column>,
}

impl Entity {
    pub fn new(
        entity_name: impl Into<String>,
        namespace: impl Into<String>,
        table_name: impl Into<String>,
        position: Point,
        width: f64,
    ) -> Self {
        let table_name = table_name.into();
        let header_height = 20.0;
        Self {
            entity_name: entity_name.into(),
            namespace: namespace.into(),
            id: table_name.clone(),
            table_name,
            position,
            width,
            height: header_height,
            header_height,
            column_height: 20.0,
            columns: IndexMap::new(),
        }
    }

    pub fn with_row_heights(mut self, header_height: f64, column_height: f64) -> Self {
        self.header_height = header_height;
        self.column_height = column_height;
        self.update_height();
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns false when a column with this name already exists.
    pub fn add_column(&mut self, descriptor: &ColumnDescriptor) -> bool {
        if self.has_column(&descriptor.name) {
            return false;
        }
        self.columns
            .insert(descriptor.name.clone(), Column::new(descriptor));
        self.update_height();
        true
    }

    pub fn set_primary_key_column(&mut self, name: &str) {
        if let Some(column) = self.columns.get_mut(name) {
            column.primary_key = true;
        }
    }

    pub fn set_reference_column(&mut self, name: &str) {
        if let Some(column) = self.columns.get_mut(name) {
            column.reference_column = true;
        }
    }

    pub fn set_join_column(
        &mut self,
        name: &str,
        reference_entity: &str,
        reference_table: &str,
        reference_column: &str,
    ) {
        if let Some(column) = self.columns.get_mut(name) {
            column.set_join(reference_entity, reference_table, reference_column);
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn max_x(&self) -> f64 {
        self.position.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.position.y + self.height
    }

    /// Lay the columns out top to bottom below the header.
    pub fn position_columns(&mut self) {
        let header_height = self.header_height;
        let column_height = self.column_height;
        for (index, column) in self.columns.values_mut().enumerate() {
            column.position = Point::new(0.0, header_height + index as f64 * column_height);
        }
    }

    fn update_height(&mut self) {
        self.height = self.header_height + self.column_height * self.columns.len() as f64;
    }
}
