use crate::layout::Layout;
use crate::marker::{self, MarkerKind};
use crate::measure::TextMetrics;
use crate::model::{Column, Entity, Point};
use crate::relationship::{Cardinality, Relationship, RelationshipEnd};
use std::fmt::Write;

pub const STROKE_DIAGRAM: &str = "#8496B1";
pub const STROKE_LINE: &str = "#2E4C95";
pub const STROKE_ICON: &str = "#2A56BD";
pub const TRANSPARENT: &str = "transparent";
pub const HEADER_BACKGROUND_COLOR: &str = "#E0EDFF";
pub const ENTITY_BACKGROUND_COLOR: &str = "#FFFFFF";
pub const TEXT_COLOR_COLUMN: &str = "#3a4255";
pub const TEXT_COLOR_TABLE: &str = "#1d3c86";
pub const ICON_COLUMN_PRIMARY_KEY_COLOR: &str = "#CC0088";
pub const ICON_COLUMN_COLOR: &str = "#2A56BD";

const TEXT_OFFSET_X: f64 = 20.0;
const TEXT_OFFSET_Y: f64 = 14.0;
const FONT: &str = "font-family:Arial;font-size:8pt";
const ICON_OFFSET_X: f64 = 3.0;
const DOT_RADIUS: f64 = 2.0;

/// How the icon in front of a column name is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnIcon {
    PrimaryKey,
    Reference,
    Plain,
}

impl ColumnIcon {
    pub fn of(column: &Column) -> Self {
        if column.primary_key {
            ColumnIcon::PrimaryKey
        } else if column.has_reference() {
            ColumnIcon::Reference
        } else {
            ColumnIcon::Plain
        }
    }

    /// (fill, stroke)
    pub fn colors(self) -> (&'static str, &'static str) {
        match self {
            ColumnIcon::PrimaryKey => (ICON_COLUMN_PRIMARY_KEY_COLOR, ICON_COLUMN_PRIMARY_KEY_COLOR),
            ColumnIcon::Reference => (ICON_COLUMN_COLOR, ICON_COLUMN_COLOR),
            ColumnIcon::Plain => (TRANSPARENT, ICON_COLUMN_COLOR),
        }
    }
}

pub fn dot_color(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::Many => ICON_COLUMN_PRIMARY_KEY_COLOR,
        Cardinality::One => ICON_COLUMN_COLOR,
    }
}

fn marker_for(end: &RelationshipEnd) -> MarkerKind {
    match end.cardinality {
        Cardinality::Many => MarkerKind::Many,
        Cardinality::One => MarkerKind::One,
    }
}

pub struct SvgRenderer {
    metrics: TextMetrics,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
        }
    }
}

impl SvgRenderer {
    pub fn render(&self, layout: &Layout) -> String {
        let mut svg = String::new();

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            layout.scaled_width(),
            layout.scaled_height(),
            layout.width,
            layout.height
        )
        .unwrap();

        marker::render_defs(&mut svg);

        for entity in layout.entities.values() {
            self.render_entity(&mut svg, entity);
        }

        // Relationship lines go on top of the boxes
        svg.push_str("<g class=\"relationships\">\n");
        for relationship in &layout.relationships {
            self.render_relationship(&mut svg, layout, relationship);
        }
        svg.push_str("</g>\n");

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    fn render_entity(&self, svg: &mut String, entity: &Entity) {
        let w = entity.width;
        let h = entity.height;

        writeln!(
            svg,
            r#"<g class="entity" transform="translate({}, {})" data-entity="{}" data-table-name="{}">"#,
            entity.position.x,
            entity.position.y,
            escape_xml(&entity.entity_name),
            escape_xml(&entity.table_name)
        )
        .unwrap();

        // 1. Body, header band and frame
        writeln!(
            svg,
            r#"<rect x="0" y="0" width="{}" height="{}" style="fill:{}" />"#,
            w, h, ENTITY_BACKGROUND_COLOR
        )
        .unwrap();
        writeln!(
            svg,
            r#"<rect x="0" y="0" width="{}" height="{}" style="fill:{}" />"#,
            w,
            entity.header_height - 1.0,
            HEADER_BACKGROUND_COLOR
        )
        .unwrap();
        writeln!(
            svg,
            r#"<rect x="0" y="0" width="{}" height="{}" style="fill:{};stroke:{}" />"#,
            w, h, TRANSPARENT, STROKE_DIAGRAM
        )
        .unwrap();

        // 2. Title and table icon
        writeln!(
            svg,
            r#"<text x="{}" y="{}" style="{};fill:{}">{}</text>"#,
            TEXT_OFFSET_X,
            TEXT_OFFSET_Y,
            FONT,
            TEXT_COLOR_TABLE,
            escape_xml(&self.metrics.fit_label(&entity.table_name, w))
        )
        .unwrap();
        render_table_icon(svg);

        // 3. Column rows
        for column in entity.columns.values() {
            self.render_column(svg, entity, column);
        }

        writeln!(svg, "</g>").unwrap();
    }

    fn render_column(&self, svg: &mut String, entity: &Entity, column: &Column) {
        let w = entity.width;

        write!(
            svg,
            r#"<g class="{}_{}" transform="translate({}, {})""#,
            escape_xml(&entity.id),
            escape_xml(&column.name),
            column.position.x,
            column.position.y - 1.0
        )
        .unwrap();
        if let (Some(table), Some(col)) = (
            column.reference.table_name.as_deref(),
            column.reference.column_name.as_deref(),
        ) {
            write!(
                svg,
                r#" reference-table-name="{}" reference-column-name="{}" reference-name="{}_{}""#,
                escape_xml(table),
                escape_xml(col),
                escape_xml(table),
                escape_xml(col)
            )
            .unwrap();
        }
        svg.push_str(">\n");

        writeln!(
            svg,
            r#"<rect x="1" y="1" width="{}" height="{}" style="fill:{}" />"#,
            w - 2.0,
            entity.column_height,
            TRANSPARENT
        )
        .unwrap();
        writeln!(
            svg,
            r#"<line x1="0" y1="0" x2="{}" y2="0" style="stroke:{}" />"#,
            w, STROKE_DIAGRAM
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text x="{}" y="{}" style="{};fill:{}">{}</text>"#,
            TEXT_OFFSET_X,
            TEXT_OFFSET_Y,
            FONT,
            TEXT_COLOR_COLUMN,
            escape_xml(&self.metrics.fit_label(&column.name, w))
        )
        .unwrap();

        let (fill, stroke) = ColumnIcon::of(column).colors();
        let diamond = [(8.0, 6.0), (12.0, 10.0), (8.0, 14.0), (4.0, 10.0)];
        writeln!(
            svg,
            r#"<g class="entity-icon icon-column"><path d="{}" style="fill:{};stroke:{}" /></g>"#,
            path_description(&diamond, true, ICON_OFFSET_X, 0.0),
            fill,
            stroke
        )
        .unwrap();

        writeln!(svg, "</g>").unwrap();
    }

    fn render_relationship(&self, svg: &mut String, layout: &Layout, relationship: &Relationship) {
        let (p1, p2) = layout.line_of(relationship);

        write!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" style="stroke:{}""#,
            p1.x, p1.y, p2.x, p2.y, STROKE_LINE
        )
        .unwrap();
        if layout.marker_ends {
            write!(
                svg,
                r#" marker-start="url(#{})" marker-end="url(#{})""#,
                marker_for(&relationship.start).id(),
                marker_for(&relationship.end).id()
            )
            .unwrap();
        }
        svg.push_str(" />\n");

        render_dot(svg, p1, dot_color(relationship.start.cardinality));
        render_dot(svg, p2, dot_color(relationship.end.cardinality));
    }
}

fn render_dot(svg: &mut String, at: Point, color: &str) {
    writeln!(
        svg,
        r#"<circle cx="{}" cy="{}" r="{}" style="fill:{}" />"#,
        at.x, at.y, DOT_RADIUS, color
    )
    .unwrap();
}

fn render_table_icon(svg: &mut String) {
    let frame = [
        (4.0, 9.0),
        (4.0, 7.0),
        (12.0, 7.0),
        (12.0, 13.0),
        (4.0, 13.0),
        (4.0, 9.0),
        (12.0, 9.0),
        (12.0, 11.0),
        (4.0, 11.0),
    ];
    let grid = [
        (6.0, 13.0),
        (6.0, 7.0),
        (8.0, 7.0),
        (8.0, 13.0),
        (10.0, 13.0),
        (10.0, 7.0),
    ];
    writeln!(
        svg,
        r#"<g class="entity-icon icon-table"><path d="{}" style="fill:white;stroke:{}" stroke-width="0.5" /><path d="{}" style="fill:{};stroke:{}" stroke-width="0.5" /></g>"#,
        path_description(&frame, true, ICON_OFFSET_X, 0.0),
        STROKE_ICON,
        path_description(&grid, false, ICON_OFFSET_X, 0.0),
        TRANSPARENT,
        STROKE_ICON
    )
    .unwrap();
}

/// `M x y L x y ... [Z]` with every point shifted by the offset.
fn path_description(points: &[(f64, f64)], closed: bool, offset_x: f64, offset_y: f64) -> String {
    let coords: Vec<String> = points
        .iter()
        .map(|(x, y)| format!("{} {}", x + offset_x, y + offset_y))
        .collect();
    format!("M{}{}", coords.join(" L"), if closed { " Z" } else { "" })
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiagramConfig;
    use crate::descriptor::{DescriptorCatalog, EntityDescriptor, NoResolver};
    use crate::diagram::Diagram;
    use crate::layout::LayoutEngine;

    fn admin_layout(config: DiagramConfig) -> Layout {
        let admin = EntityDescriptor::new("Admin", "admin")
            .primary_key("admin_id", "varchar")
            .column("name", "varchar")
            .column("admin_level_id", "varchar")
            .join("admin_level_id", "AdminLevel", "admin_level_id");
        let level = EntityDescriptor::new("AdminLevel", "admin_level")
            .primary_key("admin_level_id", "varchar");
        let catalog = DescriptorCatalog::new(vec![admin.clone(), level]);
        let mut diagram = Diagram::new(config);
        diagram.add_entities(&[admin], &catalog);
        LayoutEngine::for_diagram(&diagram).layout(&diagram)
    }

    #[test]
    fn test_render_basic() {
        let layout = admin_layout(DiagramConfig::default());
        let svg = SvgRenderer::default().render(&layout);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches(r#"<g class="entity""#).count(), 2);
        assert!(svg.contains(">admin_level</text>"));
        assert!(svg.contains(r#"class="admin_admin_level_id""#));
        assert!(svg.contains(r#"reference-name="admin_level_admin_level_id""#));
        assert!(svg.contains("<defs>"));
    }

    #[test]
    fn test_render_zoom() {
        let layout = admin_layout(DiagramConfig {
            zoom: 2.0,
            ..Default::default()
        });
        let svg = SvgRenderer::default().render(&layout);
        let header = format!(
            r#"width="{}" height="{}" viewBox="0 0 {} {}""#,
            layout.width * 2.0,
            layout.height * 2.0,
            layout.width,
            layout.height
        );
        assert!(svg.contains(&header));
    }

    #[test]
    fn test_column_icon_policy() {
        let layout = admin_layout(DiagramConfig::default());
        let admin = layout.entity("admin").unwrap();
        assert_eq!(ColumnIcon::of(admin.column("admin_id").unwrap()), ColumnIcon::PrimaryKey);
        assert_eq!(ColumnIcon::of(admin.column("admin_level_id").unwrap()), ColumnIcon::Reference);
        assert_eq!(ColumnIcon::of(admin.column("name").unwrap()), ColumnIcon::Plain);

        let svg = SvgRenderer::default().render(&layout);
        assert!(svg.contains("style=\"fill:#CC0088;stroke:#CC0088\""));
        assert!(svg.contains("style=\"fill:#2A56BD;stroke:#2A56BD\""));
        assert!(svg.contains("style=\"fill:transparent;stroke:#2A56BD\""));
    }

    #[test]
    fn test_relationship_line_and_dots() {
        let layout = admin_layout(DiagramConfig::default());
        let svg = SvgRenderer::default().render(&layout);

        // admin at x=20, admin_level at x=260: many end on admin_level.admin_level_id
        assert!(svg.contains(
            r##"<line x1="263" y1="50" x2="217" y2="90" style="stroke:#2E4C95" />"##
        ));
        assert!(svg.contains(r##"<circle cx="263" cy="50" r="2" style="fill:#CC0088" />"##));
        assert!(svg.contains(r##"<circle cx="217" cy="90" r="2" style="fill:#2A56BD" />"##));
        assert!(!svg.contains("marker-start"));
    }

    #[test]
    fn test_marker_ends() {
        let layout = admin_layout(DiagramConfig {
            marker_ends: true,
            ..Default::default()
        });
        let svg = SvgRenderer::default().render(&layout);
        assert!(svg.contains(r##"marker-start="url(#M)" marker-end="url(#1)""##));
    }

    #[test]
    fn test_render_escapes() {
        let mut diagram = Diagram::default();
        diagram.add_entities(
            &[EntityDescriptor::new("A", "a<b>").column("x&y", "int")],
            &NoResolver,
        );
        let layout = LayoutEngine::default().layout(&diagram);
        let svg = SvgRenderer::default().render(&layout);
        assert!(svg.contains("a&lt;b&gt;"));
        assert!(svg.contains("x&amp;y"));
    }

    #[test]
    fn test_path_description() {
        assert_eq!(
            path_description(&[(1.0, 2.0), (3.0, 4.0)], true, 3.0, 0.0),
            "M4 2 L6 4 Z"
        );
        assert_eq!(path_description(&[(1.0, 2.0)], false, 0.0, 0.0), "M1 2");
    }
}
