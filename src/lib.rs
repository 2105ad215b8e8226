pub mod config;
pub mod descriptor;
pub mod diagram;
pub mod image_map;
pub mod layout;
pub mod marker;
pub mod markdown;
pub mod measure;
pub mod model;
pub mod relationship;
pub mod svg;
pub mod tooltip;

use wasm_bindgen::prelude::*;

use config::DiagramConfig;
use descriptor::{DescriptorCatalog, DescriptorError};
use diagram::Diagram;
use image_map::ImageMapRenderer;
use layout::{Layout, LayoutEngine};
use markdown::MarkdownRenderer;
use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Register the selected entities of a catalog (and whatever they reference)
/// and lay them out.
pub fn layout_catalog(catalog: &DescriptorCatalog, config: DiagramConfig) -> Layout {
    let mut diagram = Diagram::new(config);
    diagram.add_entities(&catalog.selected(), catalog);
    LayoutEngine::for_diagram(&diagram).layout(&diagram)
}

pub fn layout_from_json(source: &str, config: DiagramConfig) -> Result<Layout, DescriptorError> {
    let catalog = DescriptorCatalog::from_json(source)?;
    Ok(layout_catalog(&catalog, config))
}

fn layout_for_js(source: &str, config: Option<String>) -> Result<Layout, String> {
    let config = match config.as_deref() {
        Some(json) => DiagramConfig::from_json(json).map_err(|e| e.to_string())?,
        None => DiagramConfig::default(),
    };
    layout_from_json(source, config.sanitized()).map_err(|e| e.to_string())
}

/// Render entity descriptors (JSON) to SVG
#[wasm_bindgen(js_name = "erdToSvg")]
pub fn render_svg(source: &str, config: Option<String>) -> Result<String, String> {
    let layout = layout_for_js(source, config)?;
    Ok(SvgRenderer::default().render(&layout))
}

/// Render entity descriptors (JSON) to an HTML image map body
#[wasm_bindgen(js_name = "erdToImageMap")]
pub fn render_image_map(source: &str, config: Option<String>) -> Result<String, String> {
    let layout = layout_for_js(source, config)?;
    Ok(ImageMapRenderer.render(&layout))
}

#[wasm_bindgen(js_name = "erdToMarkdown")]
pub fn render_markdown(source: &str, config: Option<String>) -> Result<String, String> {
    let layout = layout_for_js(source, config)?;
    Ok(MarkdownRenderer.render(&layout))
}

/// Lay out once and return `{ svg, imageMap }`
#[wasm_bindgen(js_name = "erdRender")]
pub fn render_all(source: &str, config: Option<String>) -> Result<js_sys::Object, String> {
    let layout = layout_for_js(source, config)?;
    let svg = SvgRenderer::default().render(&layout);
    let map = ImageMapRenderer.render(&layout);

    let result = js_sys::Object::new();
    for (key, value) in [("svg", svg), ("imageMap", map)] {
        js_sys::Reflect::set(&result, &JsValue::from_str(key), &JsValue::from_str(&value))
            .map_err(|_| format!("Failed to set {}", key))?;
    }
    Ok(result)
}
