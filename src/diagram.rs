//! Entity registry. Entities are registered from descriptors and pull in the
//! entities their join columns reference, up to the configured nesting level.

use crate::config::DiagramConfig;
use crate::descriptor::{EntityDescriptor, EntityResolver, JoinColumnDescriptor};
use crate::model::{Entity, Point};
use indexmap::IndexMap;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Diagram {
    config: DiagramConfig,
    entities: IndexMap<String, Entity>,
    /// Lowest level each table has been expanded at.
    expanded_at: HashMap<String, u32>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new(DiagramConfig::default())
    }
}

impl Diagram {
    pub fn new(config: DiagramConfig) -> Self {
        Self {
            config,
            entities: IndexMap::new(),
            expanded_at: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn entities(&self) -> &IndexMap<String, Entity> {
        &self.entities
    }

    pub fn entity(&self, table_name: &str) -> Option<&Entity> {
        self.entities.get(table_name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn add_entities<'a>(
        &mut self,
        descriptors: impl IntoIterator<Item = &'a EntityDescriptor>,
        resolver: &dyn EntityResolver,
    ) -> &mut Self {
        for descriptor in descriptors {
            self.add_entity(descriptor, resolver, 1);
        }
        self
    }

    /// Register `descriptor` at nesting `level` (1 for entities supplied by
    /// the caller) and follow its join columns.
    pub fn add_entity(
        &mut self,
        descriptor: &EntityDescriptor,
        resolver: &dyn EntityResolver,
        level: u32,
    ) -> &mut Self {
        let table_name = descriptor.table_name.as_str();

        // A revisit at the same or a deeper level only follows joins that are
        // not resolved yet, which bounds recursion on cyclic references.
        let revisit = self
            .expanded_at
            .get(table_name)
            .is_some_and(|&previous| previous <= level);
        if !revisit {
            self.expanded_at.insert(table_name.to_string(), level);
        }

        self.merge(descriptor);
        for join in &descriptor.join_columns {
            let Some(joined) = self
                .entities
                .get(table_name)
                .and_then(|e| e.column(&join.name))
                .map(|c| c.has_reference_entity())
            else {
                continue;
            };
            if revisit && joined {
                continue;
            }
            self.process_reference(descriptor, join, resolver, level);
        }
        self
    }

    /// Create the box if needed, then merge columns and primary keys.
    fn merge(&mut self, descriptor: &EntityDescriptor) {
        let table_name = descriptor.table_name.as_str();
        if !self.entities.contains_key(table_name) {
            let count = self.entities.len() as f64;
            let x = self.config.margin_x
                + count * (self.config.entity_width + self.config.entity_margin_x);
            let entity = Entity::new(
                descriptor.entity_name.as_str(),
                descriptor.namespace.as_str(),
                table_name,
                Point::new(x, self.config.margin_y),
                self.config.entity_width,
            )
            .with_row_heights(self.config.header_height, self.config.column_height);
            tracing::debug!(table = table_name, x, "registered entity");
            self.entities.insert(table_name.to_string(), entity);
        }

        let Some(entity) = self.entities.get_mut(table_name) else {
            return;
        };
        for column in &descriptor.columns {
            entity.add_column(column);
        }
        for key in &descriptor.primary_keys {
            entity.set_primary_key_column(key);
        }
    }

    fn process_reference(
        &mut self,
        descriptor: &EntityDescriptor,
        join: &JoinColumnDescriptor,
        resolver: &dyn EntityResolver,
        level: u32,
    ) {
        let table_name = descriptor.table_name.as_str();
        if let Some(entity) = self.entities.get_mut(table_name) {
            entity.set_reference_column(&join.name);
        }

        if !self.config.allows_nesting(level) {
            return;
        }

        match resolver.resolve(&join.property_type, &descriptor.namespace) {
            Ok(referenced) => {
                if let Some(entity) = self.entities.get_mut(table_name) {
                    entity.set_join_column(
                        &join.name,
                        &join.property_type,
                        &referenced.table_name,
                        join.reference_column(),
                    );
                }
                self.add_entity(&referenced, resolver, level + 1);
            }
            Err(e) => {
                tracing::warn!(
                    table = table_name,
                    column = %join.name,
                    error = %e,
                    "unable to resolve referenced entity"
                );
            }
        }
    }
}
