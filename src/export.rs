//! RDLT text export and PNG image export.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::drawing::{DrawingView, RenderOptions};
use crate::error::ExportError;
use crate::geometry::{ArcGeometry, Bounds, ComponentGeometry};
use crate::style::{OutlineStyle, TextStyle};
use crate::utils::{format_number, sanitize_file_stem};
use crate::visual::{VisualArc, VisualComponent, VisualModel};

/// Margin added around the diagram bounds in exported images.
pub const IMAGE_MARGIN: f64 = 30.0;

fn needs_quotes(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_]").expect("quoting regex must compile"));
    re.is_match(value)
}

/// A file produced by an export, ready to be written or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub contents: Vec<u8>,
}

/// Emits `value` bare when it only holds word characters, quoted otherwise.
pub fn serialize_string(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "\"\"".to_string();
    }
    if needs_quotes(value) {
        return format!("\"{}\"", value.replace('"', "\\\""));
    }
    value.to_string()
}

pub fn serialize_font_class(style: &TextStyle) -> String {
    let weight = if style.weight.is_normal() {
        String::new()
    } else {
        style.weight.to_string()
    };
    format!(
        "{} {} {} {}",
        style.font_family,
        format_number(style.size),
        style.color,
        weight
    )
    .trim()
    .to_string()
}

pub fn serialize_outline_class(style: &OutlineStyle) -> String {
    format!("{} {}", format_number(style.width), style.color)
}

fn serialize_component(component: &VisualComponent) -> String {
    format!(
        "{} {} {} {}",
        component.uid(),
        serialize_string(&component.identifier),
        component.kind.initial(),
        u8::from(component.is_rbs_center)
    )
}

fn serialize_arc(arc: &VisualArc) -> String {
    format!(
        "{} {}-{} {} {}",
        arc.uid(),
        arc.from_vertex(),
        arc.to_vertex(),
        serialize_string(&arc.c),
        arc.l
    )
}

fn serialize_component_geometry(component: &VisualComponent) -> String {
    let ComponentGeometry { position, size } = component.geometry;
    format!(
        "{} {} {},{}",
        component.uid(),
        format_number(size),
        format_number(position.x),
        format_number(position.y)
    )
}

fn serialize_arc_geometry(arc: &VisualArc) -> String {
    let ArcGeometry {
        is_auto_draw,
        arc_label,
        waypoints,
        ..
    } = &arc.geometry;

    let mut line = format!(
        "{} {} {}/{}/{}",
        arc.uid(),
        u8::from(*is_auto_draw),
        arc_label.base_segment_index,
        format_number(arc_label.foot_frac_distance),
        format_number(arc_label.perp_distance)
    );
    for point in waypoints {
        line.push_str(&format!(
            " {},{}",
            format_number(point.x),
            format_number(point.y)
        ));
    }
    line
}

/// Style class registry: ids are handed out on first encounter.
#[derive(Default)]
struct StyleClasses {
    fonts: IndexMap<String, usize>,
    outlines: IndexMap<String, usize>,
}

impl StyleClasses {
    fn font_id(&mut self, style: &TextStyle) -> usize {
        let next = self.fonts.len() + 1;
        *self.fonts.entry(serialize_font_class(style)).or_insert(next)
    }

    fn outline_id(&mut self, style: &OutlineStyle) -> usize {
        let next = self.outlines.len() + 1;
        *self
            .outlines
            .entry(serialize_outline_class(style))
            .or_insert(next)
    }
}

fn join_uids(uids: &[String]) -> String {
    uids.join(" ")
}

/// Serializes the whole model into the sectioned RDLT text format.
pub fn to_rdlt_text(model: &VisualModel) -> String {
    let mut classes = StyleClasses::default();
    let mut vertices = Vec::new();
    let mut vertex_geometry = Vec::new();
    let mut vertex_styles: IndexMap<String, Vec<String>> = IndexMap::new();

    for component in model.all_components() {
        vertices.push(serialize_component(component));
        vertex_geometry.push(serialize_component_geometry(component));

        let inner = classes.font_id(&component.styles.inner_label);
        let outer = classes.font_id(&component.styles.outer_label);
        let outline = classes.outline_id(&component.styles.outline);
        vertex_styles
            .entry(format!("C=f{inner} L=f{outer} O=o{outline}"))
            .or_default()
            .push(component.uid().to_string());
    }

    let mut arcs = Vec::new();
    let mut arc_geometry = Vec::new();
    let mut arc_styles: IndexMap<String, Vec<String>> = IndexMap::new();

    for arc in model.all_arcs() {
        arcs.push(serialize_arc(arc));
        arc_geometry.push(serialize_arc_geometry(arc));

        let label = classes.font_id(&arc.styles.label);
        let outline = classes.outline_id(&arc.styles.outline);
        arc_styles
            .entry(format!("L=f{label} O=o{outline}"))
            .or_default()
            .push(arc.uid().to_string());
    }

    let fonts = classes
        .fonts
        .iter()
        .map(|(class, id)| format!("{id} {class}"))
        .collect();
    let outlines = classes
        .outlines
        .iter()
        .map(|(class, id)| format!("{id} {class}"))
        .collect();
    let vertex_styles = vertex_styles
        .iter()
        .map(|(style, uids)| format!("{style} V={}", join_uids(uids)))
        .collect();
    let arc_styles = arc_styles
        .iter()
        .map(|(style, uids)| format!("{style} A={}", join_uids(uids)))
        .collect();

    let sections: [(&str, Vec<String>); 8] = [
        ("VERTICES", vertices),
        ("ARCS", arcs),
        ("GEOMETRY: VERTICES", vertex_geometry),
        ("GEOMETRY: ARCS", arc_geometry),
        ("STYLECLASSES: FONTS", fonts),
        ("STYLECLASSES: OUTLINES", outlines),
        ("STYLES: VERTICES", vertex_styles),
        ("STYLES: ARCS", arc_styles),
    ];

    sections
        .into_iter()
        .map(|(header, lines)| {
            std::iter::once(header.to_string())
                .chain(lines)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn export_rdlt(model: &VisualModel) -> ExportedFile {
    let text = to_rdlt_text(model);
    log::info!(
        "exported model '{}' ({} vertices, {} arcs)",
        model.name(),
        model.component_count(),
        model.arc_count()
    );
    ExportedFile {
        filename: format!("{}.txt", model.name()),
        contents: text.into_bytes(),
    }
}

/// Diagram extent used for image export: vertex circles and arc waypoints,
/// each widened by its outline.
pub fn image_bounds(model: &VisualModel) -> Option<Bounds> {
    let mut bounds = Bounds::empty();
    for component in model.all_components() {
        bounds.include(
            component.geometry.position,
            component.geometry.radius() + component.styles.outline.width,
        );
    }
    for arc in model.all_arcs() {
        for waypoint in &arc.geometry.waypoints {
            bounds.include(*waypoint, arc.styles.outline.width);
        }
    }
    (!bounds.is_empty()).then_some(bounds)
}

pub fn png_filename(model_name: &str) -> String {
    format!("{}.png", sanitize_file_stem(model_name))
}

/// SVG of the diagram layer only, framed for image export.
pub fn render_export_svg(
    model: &VisualModel,
    view: &DrawingView,
    background: &str,
) -> Result<String, ExportError> {
    let bounds =
        image_bounds(model).ok_or_else(|| ExportError::EmptyModel(model.name().to_string()))?;

    view.render_svg(&RenderOptions {
        background: background.to_string(),
        include_chrome: false,
        view_box: Some(bounds.inflate(IMAGE_MARGIN)),
    })
}

pub fn export_png(
    model: &VisualModel,
    view: &DrawingView,
    background: &str,
    scale: f32,
) -> Result<ExportedFile, ExportError> {
    let svg = render_export_svg(model, view, background)?;
    let contents = rasterize_svg(&svg, scale)?;
    let filename = png_filename(model.name());
    log::info!("rendered {filename} ({} bytes)", contents.len());
    Ok(ExportedFile { filename, contents })
}

#[cfg(feature = "png")]
pub fn rasterize_svg(svg: &str, scale: f32) -> Result<Vec<u8>, ExportError> {
    use resvg::usvg;
    use tiny_skia::{Pixmap, Transform};

    if !scale.is_finite() || scale <= 0.0 {
        return Err(ExportError::InvalidScale(scale));
    }

    let mut options = usvg::Options::default();
    options.font_family = "Arial".to_string();
    options.fontdb_mut().load_system_fonts();

    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|err| ExportError::Svg(err.to_string()))?;

    let size = tree.size().to_int_size();
    let scaled_width = ((size.width() as f32) * scale).ceil();
    let scaled_height = ((size.height() as f32) * scale).ceil();

    if !(scaled_width >= 1.0 && scaled_height >= 1.0)
        || scaled_width > u32::MAX as f32
        || scaled_height > u32::MAX as f32
    {
        return Err(ExportError::InvalidScale(scale));
    }

    let width = scaled_width as u32;
    let height = scaled_height as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Surface { width, height })?;

    resvg::render(
        &tree,
        Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    pixmap
        .encode_png()
        .map_err(|err| ExportError::Encode(err.to_string()))
}

#[cfg(not(feature = "png"))]
pub fn rasterize_svg(_svg: &str, _scale: f32) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::Unsupported)
}
