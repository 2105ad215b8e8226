//! Entity descriptors supplied by the metadata provider, and the resolver used
//! to follow join columns to the entities they reference.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const NAMESPACE_SEPARATOR: char = '\\';

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid entity descriptors: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Entity not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            length: None,
            nullable: None,
            extra: None,
        }
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinColumnDescriptor {
    /// Column on the referencing entity.
    pub name: String,
    /// Referenced entity type, bare or namespace-qualified.
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_column_name: Option<String>,
}

impl JoinColumnDescriptor {
    pub fn new(
        name: impl Into<String>,
        property_type: impl Into<String>,
        reference_column_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            property_type: property_type.into(),
            reference_column_name: Some(reference_column_name.into()),
        }
    }

    pub fn reference_column(&self) -> &str {
        self.reference_column_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    pub entity_name: String,
    #[serde(default)]
    pub namespace: String,
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub join_columns: Vec<JoinColumnDescriptor>,
}

impl EntityDescriptor {
    pub fn new(entity_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            namespace: String::new(),
            table_name: table_name.into(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            join_columns: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn column(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnDescriptor::new(name, data_type));
        self
    }

    pub fn primary_key(mut self, name: &str, data_type: &str) -> Self {
        self.columns.push(ColumnDescriptor::new(name, data_type));
        self.primary_keys.push(name.to_string());
        self
    }

    pub fn join(mut self, name: &str, property_type: &str, reference_column: &str) -> Self {
        self.join_columns
            .push(JoinColumnDescriptor::new(name, property_type, reference_column));
        self
    }

    /// `Namespace\Name`, or the bare name when there is no namespace.
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.entity_name)
    }
}

/// Qualify a property type with the namespace of the entity declaring it,
/// unless it already carries one.
pub fn qualify(namespace: &str, property_type: &str) -> String {
    if property_type.contains(NAMESPACE_SEPARATOR) || namespace.is_empty() {
        property_type.trim_start_matches(NAMESPACE_SEPARATOR).to_string()
    } else {
        format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, property_type)
    }
}

/// Looks up the descriptor of an entity referenced by a join column.
pub trait EntityResolver {
    fn resolve(&self, property_type: &str, namespace: &str) -> Result<EntityDescriptor, ResolveError>;
}

/// Resolver that never finds anything; expansion stops at the given entities.
pub struct NoResolver;

impl EntityResolver for NoResolver {
    fn resolve(&self, property_type: &str, namespace: &str) -> Result<EntityDescriptor, ResolveError> {
        Err(ResolveError::NotFound(qualify(namespace, property_type)))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    entities: Vec<EntityDescriptor>,
    #[serde(default)]
    include: Option<Vec<String>>,
}

/// In-memory set of known entity descriptors.
#[derive(Debug, Default, Clone)]
pub struct DescriptorCatalog {
    entities: Vec<EntityDescriptor>,
    by_name: HashMap<String, usize>,
    include: Option<Vec<String>>,
}

impl DescriptorCatalog {
    pub fn new(entities: Vec<EntityDescriptor>) -> Self {
        let mut catalog = Self::default();
        for entity in entities {
            catalog.insert(entity);
        }
        catalog
    }

    pub fn from_json(source: &str) -> Result<Self, DescriptorError> {
        let file: CatalogFile = serde_json::from_str(source)?;
        let mut catalog = Self::new(file.entities);
        catalog.include = file.include;
        Ok(catalog)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&source)
    }

    pub fn insert(&mut self, entity: EntityDescriptor) {
        let index = self.entities.len();
        self.by_name.insert(entity.qualified_name(), index);
        self.by_name.entry(entity.entity_name.clone()).or_insert(index);
        self.entities.push(entity);
    }

    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.by_name.get(name).map(|&i| &self.entities[i])
    }

    /// Descriptors the diagram starts from: the `include` list when present,
    /// otherwise every known entity.
    pub fn selected(&self) -> Vec<EntityDescriptor> {
        match &self.include {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let found = self.get(name.trim()).cloned();
                    if found.is_none() {
                        tracing::warn!(entity = %name, "included entity is not in the catalog");
                    }
                    found
                })
                .collect(),
            None => self.entities.clone(),
        }
    }
}

impl EntityResolver for DescriptorCatalog {
    fn resolve(&self, property_type: &str, namespace: &str) -> Result<EntityDescriptor, ResolveError> {
        let qualified = qualify(namespace, property_type);
        self.get(&qualified)
            .or_else(|| self.get(property_type))
            .cloned()
            .ok_or(ResolveError::NotFound(qualified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("App\\Entity", "Admin"), "App\\Entity\\Admin");
        assert_eq!(qualify("App\\Entity", "Other\\Role"), "Other\\Role");
        assert_eq!(qualify("", "Admin"), "Admin");
    }

    #[test]
    fn test_reference_column_defaults_to_name() {
        let join = JoinColumnDescriptor {
            name: "admin_level_id".to_string(),
            property_type: "AdminLevel".to_string(),
            reference_column_name: None,
        };
        assert_eq!(join.reference_column(), "admin_level_id");
    }

    #[test]
    fn test_catalog_from_json() {
        let input = r#"{
            "entities": [
                {
                    "entityName": "Admin",
                    "namespace": "Data",
                    "tableName": "admin",
                    "columns": [
                        { "name": "admin_id", "type": "varchar", "length": 40 },
                        { "name": "admin_level_id", "type": "varchar", "length": 40 }
                    ],
                    "primaryKeys": ["admin_id"],
                    "joinColumns": [
                        { "name": "admin_level_id", "propertyType": "AdminLevel", "referenceColumnName": "admin_level_id" }
                    ]
                },
                { "entityName": "AdminLevel", "namespace": "Data", "tableName": "admin_level" }
            ],
            "include": ["Admin", "Missing"]
        }"#;
        let catalog = DescriptorCatalog::from_json(input).unwrap();
        assert_eq!(catalog.entities().len(), 2);
        assert_eq!(catalog.entities()[0].columns[0].length, Some(40));

        let selected = catalog.selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].table_name, "admin");

        let level = catalog.resolve("AdminLevel", "Data").unwrap();
        assert_eq!(level.table_name, "admin_level");
    }

    #[test]
    fn test_resolve_not_found() {
        let catalog = DescriptorCatalog::new(vec![EntityDescriptor::new("Admin", "admin")]);
        assert_eq!(
            catalog.resolve("Role", "Data"),
            Err(ResolveError::NotFound("Data\\Role".to_string()))
        );
        assert!(NoResolver.resolve("Admin", "").is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            DescriptorCatalog::from_json("{}"),
            Err(DescriptorError::Json(_))
        ));
    }
}
