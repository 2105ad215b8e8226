use erdraw::config::DiagramConfig;
use erdraw::descriptor::DescriptorCatalog;
use erdraw::image_map::ImageMapRenderer;
use erdraw::layout_catalog;
use erdraw::markdown::MarkdownRenderer;
use erdraw::svg::SvgRenderer;
use erdraw::descriptor::EntityDescriptor;
use erdraw::tooltip::{FileTooltipCache, TooltipService, format_tooltip};
use std::env;
use std::fs;
use std::process;
use std::time::UNIX_EPOCH;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy)]
enum Format {
    Svg,
    Map,
    Markdown,
    Tooltip,
}

impl Format {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "svg" => Some(Self::Svg),
            "map" => Some(Self::Map),
            "markdown" | "md" => Some(Self::Markdown),
            "tooltip" => Some(Self::Tooltip),
            _ => None,
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <entities.json> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <file>        Output file (default: stdout)");
    eprintln!("  -f, --format <format>      svg, map, markdown, tooltip (default: svg)");
    eprintln!("  -c, --config <file>        Diagram config (JSON)");
    eprintln!("      --max-level <n>        Maximum reference nesting level (0 = unlimited)");
    eprintln!("      --max-columns <n>      Entities per row before wrapping (0 = single row)");
    eprintln!("      --zoom <factor>        Output scale (default: 1)");
    eprintln!("      --markers              Draw cardinality markers on relationship lines");
    eprintln!("      --tooltip-cache <dir>  Cache tooltips in this directory");
    process::exit(1);
}

fn parse_or_exit<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> T {
    match value.and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => {
            eprintln!("Invalid value for {}", flag);
            process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = program_name(&args);
    if args.len() < 2 {
        usage(program);
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;
    let mut format = Format::Svg;
    let mut config_path: Option<String> = None;
    let mut max_level: Option<u32> = None;
    let mut max_columns: Option<usize> = None;
    let mut zoom: Option<f64> = None;
    let mut markers = false;
    let mut tooltip_cache: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                output_path = args.get(i).cloned();
            }
            "-f" | "--format" => {
                i += 1;
                format = args.get(i).and_then(|f| Format::parse(f)).unwrap_or_else(|| {
                    eprintln!("Invalid format: {}", args.get(i).map_or("", |s| s.as_str()));
                    process::exit(1);
                });
            }
            "-c" | "--config" => {
                i += 1;
                config_path = args.get(i).cloned();
            }
            "--max-level" => {
                i += 1;
                max_level = Some(parse_or_exit("--max-level", args.get(i)));
            }
            "--max-columns" => {
                i += 1;
                max_columns = Some(parse_or_exit("--max-columns", args.get(i)));
            }
            "--zoom" => {
                i += 1;
                zoom = Some(parse_or_exit("--zoom", args.get(i)));
            }
            "--markers" => markers = true,
            "--tooltip-cache" => {
                i += 1;
                tooltip_cache = args.get(i).cloned();
            }
            "-h" | "--help" => usage(program),
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => match DiagramConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
        None => DiagramConfig::default(),
    };
    if let Some(level) = max_level {
        config.maximum_nesting_level = level;
    }
    if let Some(columns) = max_columns {
        config.maximum_columns_per_row = columns;
    }
    if let Some(zoom) = zoom {
        config.zoom = zoom;
    }
    config.marker_ends |= markers;
    let config = config.sanitized();

    let catalog = match DescriptorCatalog::from_file(input_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let output = match format {
        Format::Svg => SvgRenderer::default().render(&layout_catalog(&catalog, config)),
        Format::Map => ImageMapRenderer.render(&layout_catalog(&catalog, config)),
        Format::Markdown => MarkdownRenderer.render(&layout_catalog(&catalog, config)),
        Format::Tooltip => {
            let file_time = modified_secs(input_path);
            match tooltip_cache {
                Some(dir) => {
                    let service = TooltipService::new(FileTooltipCache::new(dir));
                    tooltips(&catalog, |entity| {
                        let source = format!("{}#{}", input_path, entity.qualified_name());
                        service.entity_tooltip(&source, file_time, entity, true)
                    })
                }
                None => tooltips(&catalog, |entity| format_tooltip(entity, file_time)),
            }
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &output) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", output),
    }
}

fn program_name(args: &[String]) -> &str {
    args.first().map_or("erdraw", String::as_str)
}

/// Tooltips of the selected entities as a JSON object keyed by table name.
fn tooltips(catalog: &DescriptorCatalog, tooltip: impl Fn(&EntityDescriptor) -> String) -> String {
    let mut map = serde_json::Map::new();
    for entity in catalog.selected() {
        map.insert(entity.table_name.clone(), serde_json::Value::String(tooltip(&entity)));
    }
    let mut out = serde_json::to_string_pretty(&map).unwrap_or_default();
    out.push('\n');
    out
}

fn modified_secs(path: &str) -> i64 {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
