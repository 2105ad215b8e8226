//! Line-end glyphs for relationship lines.

use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    One,
    OneAndOnlyOne,
    Many,
    OneOrMany,
    ZeroOrMany,
    ZeroOrOne,
    Arrow,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 7] = [
        MarkerKind::One,
        MarkerKind::OneAndOnlyOne,
        MarkerKind::Many,
        MarkerKind::OneOrMany,
        MarkerKind::ZeroOrMany,
        MarkerKind::ZeroOrOne,
        MarkerKind::Arrow,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MarkerKind::One => "1",
            MarkerKind::OneAndOnlyOne => "11",
            MarkerKind::Many => "M",
            MarkerKind::OneOrMany => "1M",
            MarkerKind::ZeroOrMany => "0M",
            MarkerKind::ZeroOrOne => "01",
            MarkerKind::Arrow => "arrow",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn marker(self) -> &'static Marker {
        &CATALOG[self as usize]
    }
}

#[derive(Debug, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub view_box: &'static str,
    pub width: f64,
    pub height: f64,
    pub ref_x: f64,
    pub ref_y: f64,
    pub class: &'static str,
    pub path: &'static str,
}

impl Marker {
    pub fn by_id(id: &str) -> Option<&'static Marker> {
        MarkerKind::from_id(id).map(MarkerKind::marker)
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }
}

/// Indexed by `MarkerKind as usize`.
static CATALOG: [Marker; 7] = [
    Marker {
        kind: MarkerKind::One,
        view_box: "0 0 130 130",
        width: 8.0,
        height: 5.0,
        ref_x: 60.0,
        ref_y: 60.0,
        class: "polymarker",
        path: "M83.3,69.7 M51.8,0.1L36.9,0.1l0.3,130h15.1 M48.4,45.9 M-0.4,59.3l-0.5,13.2l90.3,0.4l0.4-13.4 M51.3,69.6",
    },
    Marker {
        kind: MarkerKind::OneAndOnlyOne,
        view_box: "0 0 130 130",
        width: 8.0,
        height: 5.0,
        ref_x: 40.0,
        ref_y: 60.0,
        class: "polymarker",
        path: "M83.5,69.7 M68,0.1L53.2,0.1l0.3,130h15.1 M48.6,45.9 M-0.2,59.3l-0.5,13.2l90.3,0.4l0.4-13.4 M51.5,69.6 M36,0L21.2-0.2 l0.3,130h15.1",
    },
    Marker {
        kind: MarkerKind::Many,
        view_box: "0 0 90 130",
        width: 8.0,
        height: 5.0,
        ref_x: 60.0,
        ref_y: 60.0,
        class: "polymarker",
        path: "M89.7,114.5L29.4,69.7H90l-0.3-11.3l-60,0.5l60-43.7L90,0.5L3,65l87,64.5L89.7,114.5z",
    },
    Marker {
        kind: MarkerKind::OneOrMany,
        view_box: "0 0 90 130",
        width: 8.0,
        height: 5.0,
        ref_x: 100.0,
        ref_y: 60.0,
        class: "polymarker",
        path: "M96.4,114.5L36.1,69.7h60.6l-0.3-11.3l-60,0.5l60-43.7l0.3-14.7L9.7,65l87,64.5L96.4,114.5z M12.6,0.3L0.4,0.1l0.2,130h12.5",
    },
    Marker {
        kind: MarkerKind::ZeroOrMany,
        view_box: "0 0 215 130",
        width: 7.0,
        height: 7.0,
        ref_x: 200.0,
        ref_y: 65.0,
        class: "polymarker",
        path: "M214.4,114.5l-60.3-44.8h60.6l-0.3-11.3l-60,0.5l60-43.7l0.3-14.7l-87,64.5l87,64.5L214.4,114.5z M129.8,65.4 c0,35.3-28.6,63.9-63.9,63.9S2,100.7,2,65.4S30.6,1.5,65.9,1.5S129.8,30.1,129.8,65.4z M65.9,11.3c-29.9,0-54.1,24.2-54.1,54.1 s24.2,54.1,54.1,54.1S120,95.3,120,65.4S95.8,11.3,65.9,11.3z",
    },
    Marker {
        kind: MarkerKind::ZeroOrOne,
        view_box: "0 0 215 130",
        width: 7.0,
        height: 7.0,
        ref_x: 200.0,
        ref_y: 65.0,
        class: "polymarker",
        path: "M130.8,65.4c0,35.3-28.6,63.9-63.9,63.9S3,100.7,3,65.4S31.6,1.5,66.9,1.5S130.8,30.1,130.8,65.4z M66.7,14 c-28.3,0-51.3,22.9-51.3,51.3s22.9,51.3,51.3,51.3S118,93.6,118,65.2S95.1,14,66.7,14z M130.1,59.3l-0.5,13.2l98.6,0.5l0.4-13.4 M183.6,5.1l-14.8-0.1l0.3,119.4h15.1",
    },
    Marker {
        kind: MarkerKind::Arrow,
        view_box: "0 0 20 20",
        width: 7.0,
        height: 7.0,
        ref_x: 0.0,
        ref_y: 5.0,
        class: "arrow",
        path: "M0,0 L10,5 L0,10 L2,5 L0,0",
    },
];

pub fn catalog() -> &'static [Marker] {
    &CATALOG
}

/// `<defs>` block declaring every marker.
pub fn render_defs(svg: &mut String) {
    svg.push_str("<defs>\n");
    for marker in catalog() {
        writeln!(
            svg,
            r#"<marker id="{}" viewBox="{}" markerWidth="{}" markerHeight="{}" refX="{}" refY="{}" orient="auto" class="{}"><path d="{}" /></marker>"#,
            marker.id(),
            marker.view_box,
            marker.width,
            marker.height,
            marker.ref_x,
            marker.ref_y,
            marker.class,
            marker.path
        )
        .unwrap();
    }
    svg.push_str("</defs>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_seven_markers() {
        assert_eq!(catalog().len(), 7);
        for kind in MarkerKind::ALL {
            assert_eq!(kind.marker().kind, kind);
        }
    }

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(Marker::by_id("0M").unwrap().kind, MarkerKind::ZeroOrMany);
        assert_eq!(Marker::by_id("arrow").unwrap().ref_y, 5.0);
        assert!(Marker::by_id("2").is_none());
    }

    #[test]
    fn test_ids_unique() {
        let mut ids: Vec<&str> = catalog().iter().map(|m| m.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn test_render_defs() {
        let mut svg = String::new();
        render_defs(&mut svg);
        assert!(svg.starts_with("<defs>"));
        assert_eq!(svg.matches("<marker ").count(), 7);
        assert!(svg.contains(r#"id="1M""#));
        assert!(svg.contains(r#"class="arrow""#));
    }
}
