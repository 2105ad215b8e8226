//! Clickable `<area>` regions laid over a raster copy of the diagram.

use crate::layout::Layout;
use crate::model::{Entity, Point};
use crate::relationship::Relationship;
use crate::svg::escape_xml;
use std::fmt;

/// Half-width of the clickable band around a relationship line.
const LINE_HIT_DISTANCE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { x1: f64, y1: f64, x2: f64, y2: f64 },
    Poly(Vec<Point>),
}

impl Shape {
    fn name(&self) -> &'static str {
        match self {
            Shape::Rect { .. } => "rect",
            Shape::Poly(_) => "poly",
        }
    }

    fn coords(&self, zoom: f64) -> Vec<i64> {
        let scale = |v: f64| (v * zoom) as i64;
        match self {
            Shape::Rect { x1, y1, x2, y2 } => vec![scale(*x1), scale(*y1), scale(*x2), scale(*y2)],
            Shape::Poly(points) => points
                .iter()
                .flat_map(|p| [scale(p.x), scale(p.y)])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub shape: Shape,
    pub zoom: f64,
    pub href: String,
    pub attributes: Vec<(&'static str, String)>,
}

impl Area {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coords: Vec<String> = self
            .shape
            .coords(self.zoom)
            .iter()
            .map(|c| c.to_string())
            .collect();
        write!(
            f,
            r#"<area shape="{}" coords="{}" href="{}""#,
            self.shape.name(),
            coords.join(","),
            escape_xml(&self.href)
        )?;
        for (name, value) in &self.attributes {
            write!(f, r#" {}="{}""#, name, escape_xml(value))?;
        }
        write!(f, " />")
    }
}

#[derive(Default)]
pub struct ImageMapRenderer;

impl ImageMapRenderer {
    pub fn render(&self, layout: &Layout) -> String {
        self.areas(layout)
            .iter()
            .map(|area| area.to_string())
            .collect::<Vec<_>>()
            .join("\r\n")
    }

    /// Entity areas first, then relationship areas.
    pub fn areas(&self, layout: &Layout) -> Vec<Area> {
        let mut areas: Vec<Area> = layout
            .entities
            .values()
            .map(|entity| entity_area(entity, layout.zoom))
            .collect();

        for relationship in &layout.relationships {
            let (Some(source), Some(target)) = (
                layout.entity(&relationship.source_table),
                layout.entity(&relationship.target_table),
            ) else {
                continue;
            };
            let (p1, p2) = layout.line_of(relationship);
            areas.push(relationship_area(relationship, source, target, p1, p2, layout.zoom));
        }

        areas
    }
}

fn entity_area(entity: &Entity, zoom: f64) -> Area {
    Area {
        shape: Shape::Rect {
            x1: entity.position.x,
            y1: entity.position.y,
            x2: entity.max_x(),
            y2: entity.max_y(),
        },
        zoom,
        href: format!("#{}", entity.table_name),
        attributes: vec![
            ("data-type", "area-entity".to_string()),
            ("data-namespace", entity.namespace.clone()),
            ("data-entity", entity.entity_name.clone()),
            ("data-table-name", entity.table_name.clone()),
            ("data-title", entity.entity_name.clone()),
        ],
    }
}

fn relationship_area(
    relationship: &Relationship,
    source: &Entity,
    target: &Entity,
    p1: Point,
    p2: Point,
    zoom: f64,
) -> Area {
    Area {
        shape: Shape::Poly(line_band(p1, p2, LINE_HIT_DISTANCE)),
        zoom,
        href: format!(
            "#{}-{}-{}-{}",
            relationship.source_table,
            relationship.source_column,
            relationship.target_table,
            relationship.target_column
        ),
        attributes: vec![
            ("data-type", "area-relation".to_string()),
            ("data-namespace", source.namespace.clone()),
            ("data-entity", source.entity_name.clone()),
            ("data-table-name", source.table_name.clone()),
            ("data-column-name", relationship.source_column.clone()),
            ("data-reference-namespace", target.namespace.clone()),
            ("data-reference-entity", target.entity_name.clone()),
            ("data-reference-table-name", target.table_name.clone()),
            ("data-reference-column-name", relationship.target_column.clone()),
            (
                "data-title",
                format!("{} \u{2794} {}", source.entity_name, target.entity_name),
            ),
        ],
    }
}

/// Quadrilateral around the segment `p1`–`p2`, offset by `distance` along
/// the unit normal, with integer corners.
pub fn line_band(p1: Point, p2: Point, distance: f64) -> Vec<Point> {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let length = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if length > 0.0 {
        (-dy / length, dx / length)
    } else {
        (0.0, 1.0)
    };
    let (ox, oy) = (distance * nx, distance * ny);
    let corner = |x: f64, y: f64| Point::new(x.trunc(), y.trunc());

    vec![
        corner(p1.x + ox, p1.y + oy),
        corner(p1.x - ox, p1.y - oy),
        corner(p2.x - ox, p2.y - oy),
        corner(p2.x + ox, p2.y + oy),
    ]
}
