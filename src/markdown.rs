//! Markdown explanation of a diagram: DDL and a column table per entity.

use crate::layout::Layout;
use crate::measure::pad_display;
use crate::model::Entity;

const FIELD_WIDTHS: [usize; 6] = [40, 15, 6, 8, 5, 14];

#[derive(Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn render(&self, layout: &Layout) -> String {
        let mut lines: Vec<String> = vec!["# Diagram Explanation".to_string(), String::new()];

        for entity in layout.entities.values() {
            lines.push(format!("## Table `{}`", entity.table_name));
            lines.push(String::new());
            lines.push("### CREATE TABLE Statement".to_string());
            lines.push(String::new());
            lines.push("```sql".to_string());
            lines.push(create_table_sql(entity));
            lines.push("```".to_string());
            lines.push(String::new());
            lines.push("### Table Columns Description".to_string());
            lines.push(String::new());
            lines.push(table_row(&["Field", "Type", "Length", "Nullable", "PK", "Extra"]));
            lines.push(format!(
                "| {} |",
                FIELD_WIDTHS
                    .iter()
                    .map(|&w| "-".repeat(w))
                    .collect::<Vec<_>>()
                    .join(" | ")
            ));
            for (name, column) in &entity.columns {
                let length = column.data_length.map(|l| l.to_string()).unwrap_or_default();
                lines.push(table_row(&[
                    name.as_str(),
                    column.data_type.as_str(),
                    length.as_str(),
                    column.nullable.as_deref().unwrap_or(""),
                    if column.primary_key { "true" } else { "false" },
                    column.extra.as_deref().unwrap_or(""),
                ]));
            }
            lines.push(String::new());
        }

        lines.join("\r\n")
    }
}

fn table_row(cells: &[&str; 6]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(FIELD_WIDTHS)
        .map(|(cell, width)| pad_display(cell, width))
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// `CREATE TABLE` statement for one entity.
pub fn create_table_sql(entity: &Entity) -> String {
    let mut definitions: Vec<String> = Vec::new();
    let mut primary_keys: Vec<String> = Vec::new();

    for (name, column) in &entity.columns {
        let mut definition = format!("`{}` {}", name, column.data_type.to_uppercase());
        if let Some(length) = column.data_length {
            if !column.data_type.contains('(') {
                definition.push_str(&format!("({})", length));
            }
        }
        if column.nullable.as_deref() == Some("NO") {
            definition.push_str(" NOT NULL");
        } else {
            definition.push_str(" NULL");
        }
        if let Some(extra) = column.extra.as_deref().filter(|e| !e.is_empty()) {
            definition.push(' ');
            definition.push_str(&extra.to_uppercase());
        }
        definitions.push(definition);

        if column.primary_key {
            primary_keys.push(format!("`{}`", name));
        }
    }

    if !primary_keys.is_empty() {
        definitions.push(format!("PRIMARY KEY ({})", primary_keys.join(", ")));
    }

    format!(
        "CREATE TABLE `{}` (\n    {}\n);",
        entity.table_name,
        definitions.join(",\n    ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ColumnDescriptor, EntityDescriptor, NoResolver};
    use crate::diagram::Diagram;
    use crate::layout::LayoutEngine;

    fn admin() -> EntityDescriptor {
        let mut admin = EntityDescriptor::new("Admin", "admin");
        admin.columns = vec![
            ColumnDescriptor {
                nullable: Some("NO".to_string()),
                ..ColumnDescriptor::new("admin_id", "varchar").with_length(40)
            },
            ColumnDescriptor::new("name", "varchar(100)").with_length(100),
            ColumnDescriptor {
                extra: Some("auto_increment".to_string()),
                ..ColumnDescriptor::new("sort_order", "int")
            },
        ];
        admin.primary_keys = vec!["admin_id".to_string()];
        admin
    }

    fn layout() -> Layout {
        let mut diagram = Diagram::default();
        diagram.add_entities(&[admin()], &NoResolver);
        LayoutEngine::default().layout(&diagram)
    }

    #[test]
    fn test_create_table_sql() {
        let layout = layout();
        let sql = create_table_sql(layout.entity("admin").unwrap());
        assert_eq!(
            sql,
            "CREATE TABLE `admin` (\n    `admin_id` VARCHAR(40) NOT NULL,\n    `name` VARCHAR(100) NULL,\n    `sort_order` INT NULL AUTO_INCREMENT,\n    PRIMARY KEY (`admin_id`)\n);"
        );
    }

    #[test]
    fn test_create_table_without_keys() {
        let mut diagram = Diagram::default();
        diagram.add_entities(&[EntityDescriptor::new("Log", "log").column("message", "text")], &NoResolver);
        let sql = create_table_sql(diagram.entity("log").unwrap());
        assert!(!sql.contains("PRIMARY KEY"));
        assert!(sql.contains("`message` TEXT NULL"));
    }

    #[test]
    fn test_render_markdown() {
        let md = MarkdownRenderer.render(&layout());
        let lines: Vec<&str> = md.split("\r\n").collect();
        assert_eq!(lines[0], "# Diagram Explanation");
        assert_eq!(lines[2], "## Table `admin`");
        assert!(md.contains("```sql"));

        let header = lines.iter().find(|l| l.starts_with("| Field")).unwrap();
        assert_eq!(header.len(), 2 + 40 + 3 + 15 + 3 + 6 + 3 + 8 + 3 + 5 + 3 + 14 + 2);
        let row = lines.iter().find(|l| l.starts_with("| admin_id")).unwrap();
        assert!(row.contains("| true  |"));
        assert!(row.contains("| 40     |"));
    }
}
