use crate::config::DiagramConfig;
use crate::diagram::Diagram;
use crate::model::{Entity, Point};
use crate::relationship::Relationship;
use indexmap::IndexMap;

/// One row of entity boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub top: f64,
    /// Height of the tallest entity in this row.
    pub height: f64,
    pub tables: Vec<String>,
}

/// Positioned entities and relationships, ready to be rendered.
#[derive(Debug, Clone)]
pub struct Layout {
    pub entities: IndexMap<String, Entity>,
    pub relationships: Vec<Relationship>,
    pub rows: Vec<LayoutRow>,
    pub width: f64,
    pub height: f64,
    pub zoom: f64,
    pub column_height: f64,
    pub marker_ends: bool,
}

impl Layout {
    pub fn entity(&self, table_name: &str) -> Option<&Entity> {
        self.entities.get(table_name)
    }

    pub fn scaled_width(&self) -> f64 {
        self.width * self.zoom
    }

    pub fn scaled_height(&self) -> f64 {
        self.height * self.zoom
    }

    /// Index of the row the entity was placed in.
    pub fn row_of(&self, table_name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.tables.iter().any(|t| t == table_name))
    }

    /// Screen coordinates of the line drawn for `relationship`.
    ///
    /// The line leaves the left edge of the start column and reaches the
    /// right edge of the end column, both at the vertical middle of the row.
    pub fn line_of(&self, relationship: &Relationship) -> (Point, Point) {
        let y_offset = (self.column_height / 2.0).trunc();
        let width = self
            .entity(&relationship.source_table)
            .map(|e| e.width)
            .unwrap_or_default();
        let start = relationship.start.absolute;
        let end = relationship.end.absolute;
        (
            Point::new(start.x + LINE_OFFSET_X, start.y + y_offset),
            Point::new(end.x + width - LINE_OFFSET_X, end.y + y_offset),
        )
    }
}

pub const LINE_OFFSET_X: f64 = 3.0;

pub struct LayoutEngine {
    config: DiagramConfig,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(DiagramConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: DiagramConfig) -> Self {
        Self { config }
    }

    pub fn for_diagram(diagram: &Diagram) -> Self {
        Self::new(diagram.config().clone())
    }

    /// Compute the final layout. The diagram itself is left untouched.
    pub fn layout(&self, diagram: &Diagram) -> Layout {
        let mut entities = diagram.entities().clone();

        let (rows, width, height) = if self.config.needs_wrap(entities.len()) {
            self.wrap(&mut entities)
        } else {
            self.single_row(&entities)
        };

        for entity in entities.values_mut() {
            entity.position_columns();
        }
        let relationships = derive_relationships(&entities);

        Layout {
            entities,
            relationships,
            rows,
            width,
            height,
            zoom: self.config.zoom,
            column_height: self.config.column_height,
            marker_ends: self.config.marker_ends,
        }
    }

    fn single_row(&self, entities: &IndexMap<String, Entity>) -> (Vec<LayoutRow>, f64, f64) {
        let max_x = entities.values().map(Entity::max_x).fold(0.0, f64::max);
        let max_y = entities.values().map(Entity::max_y).fold(0.0, f64::max);

        let rows = if entities.is_empty() {
            Vec::new()
        } else {
            vec![LayoutRow {
                top: self.config.margin_y,
                height: entities.values().map(|e| e.height).fold(0.0, f64::max),
                tables: entities.keys().cloned().collect(),
            }]
        };

        (rows, max_x + self.config.margin_x, max_y + self.config.margin_y)
    }

    /// Re-flow entities into rows of at most `maximum_columns_per_row`.
    fn wrap(&self, entities: &mut IndexMap<String, Entity>) -> (Vec<LayoutRow>, f64, f64) {
        let per_row = self.config.maximum_columns_per_row;
        let mut rows: Vec<LayoutRow> = Vec::new();
        let mut row_top = self.config.margin_y;

        for (index, (table, entity)) in entities.iter_mut().enumerate() {
            let col = index % per_row;
            if col == 0 {
                if let Some(previous) = rows.last() {
                    row_top = previous.top + previous.height + self.config.entity_margin_y;
                }
                rows.push(LayoutRow {
                    top: row_top,
                    height: 0.0,
                    tables: Vec::new(),
                });
            }

            entity.position = Point::new(
                self.config.margin_x
                    + col as f64 * (entity.width + self.config.entity_margin_x),
                row_top,
            );

            if let Some(row) = rows.last_mut() {
                row.height = row.height.max(entity.height);
                row.tables.push(table.clone());
            }
        }

        let max_x = entities.values().map(Entity::max_x).fold(0.0, f64::max);
        let bottom = rows.last().map(|r| r.top + r.height).unwrap_or(0.0);
        (rows, max_x + self.config.margin_x, bottom + self.config.margin_y)
    }
}

/// Build a relationship for every resolved join column whose target table and
/// column are both present.
fn derive_relationships(entities: &IndexMap<String, Entity>) -> Vec<Relationship> {
    let mut relationships = Vec::new();

    for entity in entities.values() {
        for column in entity.columns.values() {
            if !column.has_reference_entity() {
                continue;
            }
            let (Some(table), Some(column_name)) = (
                column.reference.table_name.as_deref(),
                column.reference.column_name.as_deref(),
            ) else {
                continue;
            };

            let Some(target) = entities.get(table) else {
                tracing::debug!(
                    table = %entity.table_name,
                    column = %column.name,
                    target = table,
                    "referenced table is not in the diagram"
                );
                continue;
            };
            let Some(target_column) = target.column(column_name) else {
                tracing::debug!(
                    table = %entity.table_name,
                    column = %column.name,
                    target = table,
                    target_column = column_name,
                    "referenced column is not in the diagram"
                );
                continue;
            };

            relationships.push(Relationship::new(entity, column, target, target_column));
        }
    }

    relationships
}
