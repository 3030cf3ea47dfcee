use anyhow::{Context, Result};
use clap::Parser;
use rbxm_lib::{Document, Instance, PropertyValue};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "rbxm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect binary scene-graph documents", long_about = None)]
struct Cli {
    /// Input document (.rbxm / .rbxl)
    input: PathBuf,

    /// Print properties of all instances of this type
    #[arg(short = 't', long, value_name = "NAME")]
    r#type: Option<String>,

    /// Print the instance hierarchy
    #[arg(long)]
    tree: bool,
}

fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Unknown => "<unknown>".to_string(),
        PropertyValue::String(s) => format!("'{s}'"),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Int32(v) => v.to_string(),
        PropertyValue::Int64(v) => v.to_string(),
        PropertyValue::Float(v) => format!("{v:.3}"),
        PropertyValue::Double(v) => format!("{v:.3}"),
        PropertyValue::Vector2(v) => format!("{{{:.2}, {:.2}}}", v.x, v.y),
        PropertyValue::Vector3(v) => format!("{{{:.2}, {:.2}, {:.2}}}", v.x, v.y, v.z),
        PropertyValue::Color3(c) => format!("{{{:.2}, {:.2}, {:.2}}}", c.r, c.g, c.b),
        PropertyValue::CFrame(cf) => format!(
            "t {{{:.2}, {:.2}, {:.2}}}",
            cf.translation.x, cf.translation.y, cf.translation.z
        ),
        PropertyValue::OptionalCFrame(opt) if opt.has_data => format!(
            "t {{{:.2}, {:.2}, {:.2}}}",
            opt.frame.translation.x, opt.frame.translation.y, opt.frame.translation.z
        ),
        PropertyValue::OptionalCFrame(_) => "<empty>".to_string(),
        PropertyValue::BrickColor(c) => format!("palette {}", c.index),
        PropertyValue::UniqueId(id) => format!("{}:{}:{}", id.index, id.timestamp, id.raw),
        PropertyValue::NumberSequence(seq) => format!("{} keypoints", seq.keypoints.len()),
        PropertyValue::ColorSequence(seq) => format!("{} keypoints", seq.keypoints.len()),
        PropertyValue::NumberRange(r) => format!("{:.2}..{:.2}", r.min, r.max),
        PropertyValue::UDim2(u) => format!(
            "{{{:.2}, {}}}, {{{:.2}, {}}}",
            u.scale_x, u.offset_x, u.scale_y, u.offset_y
        ),
        PropertyValue::Rect2D(r) => {
            format!("{{{:.2}, {:.2}}}..{{{:.2}, {:.2}}}", r.x0, r.y0, r.x1, r.y1)
        }
        PropertyValue::PhysicalProperties(p) => {
            format!("density {:.2}, friction {:.2}", p.density, p.friction)
        }
        PropertyValue::Font(f) => format!("'{}' weight {}", f.family, f.weight),
        PropertyValue::Enum(v) => format!("enum {v}"),
        PropertyValue::Ref(id) => format!("ref {id}"),
    }
}

/// Display name: the Name property when present, else the type name.
fn instance_label<'a>(doc: &'a Document, instance: &'a Instance) -> &'a str {
    instance
        .properties()
        .iter()
        .find(|p| p.name() == "Name")
        .map(|p| p.as_str(""))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| doc.type_name(instance))
}

fn print_tree(doc: &Document, instance: &Instance, depth: usize) {
    println!(
        "{}{} [{}]",
        "  ".repeat(depth),
        instance_label(doc, instance),
        doc.type_name(instance)
    );
    for &child in instance.child_ids() {
        if let Some(child) = doc.instances().get(child as usize) {
            print_tree(doc, child, depth + 1);
        }
    }
}

fn print_type(doc: &Document, type_name: &str) {
    for instance in doc.instances() {
        if !doc.type_name(instance).eq_ignore_ascii_case(type_name) {
            continue;
        }
        println!("{} -------- (id {})", doc.type_name(instance), instance.id());
        for prop in instance.properties() {
            println!("  {} = {}", prop.name(), format_value(prop.value()));
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let doc = Document::load_file(&cli.input)
        .with_context(|| format!("Failed to load {:?}", cli.input))?;

    let declared = doc.instances().iter().filter(|i| i.id() >= 0).count();
    info!(
        types = doc.types().len(),
        instances = declared,
        shared_strings = doc.shared_strings().len(),
        "document loaded"
    );

    for (name, value) in doc.metadata() {
        println!("meta {name} = '{value}'");
    }

    if cli.tree {
        for instance in doc.instances() {
            if instance.id() >= 0 && instance.parent_id() < 0 {
                print_tree(&doc, instance, 0);
            }
        }
    }

    if let Some(type_name) = &cli.r#type {
        print_type(&doc, type_name);
    }

    Ok(())
}
