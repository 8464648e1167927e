//! Rendered primitives and the SVG renderer.
//!
//! The drawing view holds read-only copies of component and arc state, written
//! only by the editor. Label cutouts are applied in a separate frame pass after
//! the anchor and text are set, so a freshly routed arc shows its cutout one
//! frame late.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::assets::{TEMPLATE_SIZE, Templates};
use crate::error::ExportError;
use crate::geometry::{Bounds, ComponentGeometry, Point};
use crate::graph::{ArcUid, ComponentUid};
use crate::measure::TextMeasure;
use crate::routing::{ArcRoute, ArrowHead, LabelCutout, label_cutout};
use crate::style::{ArcStyles, ComponentStyles, ConnectorType, TextStyle};
use crate::utils::escape_xml;
use crate::visual::{ComponentType, VisualArc, VisualComponent};

pub const VIEW_MARGIN: f64 = 30.0;
pub const TRACING_COLOR: &str = "#aaaaaa";
const SELECTION_COLOR: &str = "#3182ce";

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentPrimitive {
    pub uid: ComponentUid,
    pub kind: ComponentType,
    pub label: String,
    pub geometry: ComponentGeometry,
    pub styles: ComponentStyles,
    pub selected: bool,
}

impl ComponentPrimitive {
    fn from_component(component: &VisualComponent) -> Self {
        ComponentPrimitive {
            uid: component.uid(),
            kind: component.kind,
            label: component.identifier.clone(),
            geometry: component.geometry,
            styles: component.styles.clone(),
            selected: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcPrimitive {
    pub uid: ArcUid,
    /// `None` until the arc has been routed successfully once.
    pub route: Option<ArcRoute>,
    pub label: String,
    pub styles: ArcStyles,
    pub cutout: Option<LabelCutout>,
    pub selected: bool,
}

impl ArcPrimitive {
    fn from_arc(arc: &VisualArc) -> Self {
        ArcPrimitive {
            uid: arc.uid(),
            route: None,
            label: arc.label_text(),
            styles: arc.styles.clone(),
            cutout: None,
            selected: false,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.route.as_ref().and_then(ArcRoute::bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGhost {
    pub kind: ComponentType,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub background: String,
    /// Draws selection, marquee, drag ghost and tracing preview.
    pub include_chrome: bool,
    /// Region to render; defaults to the diagram bounds plus a margin.
    pub view_box: Option<Bounds>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: "white".to_string(),
            include_chrome: true,
            view_box: None,
        }
    }
}

#[derive(Debug)]
pub struct DrawingView {
    templates: Arc<Templates>,
    components: BTreeMap<ComponentUid, ComponentPrimitive>,
    arcs: IndexMap<ArcUid, ArcPrimitive>,
    pending_cutouts: IndexSet<ArcUid>,
    highlight: Option<Bounds>,
    drag_ghost: Option<DragGhost>,
    tracing_preview: Option<ArcRoute>,
}

impl DrawingView {
    pub fn new(templates: Arc<Templates>) -> Self {
        DrawingView {
            templates,
            components: BTreeMap::new(),
            arcs: IndexMap::new(),
            pending_cutouts: IndexSet::new(),
            highlight: None,
            drag_ghost: None,
            tracing_preview: None,
        }
    }

    pub fn component(&self, uid: ComponentUid) -> Option<&ComponentPrimitive> {
        self.components.get(&uid)
    }

    pub fn arc(&self, uid: ArcUid) -> Option<&ArcPrimitive> {
        self.arcs.get(&uid)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentPrimitive> {
        self.components.values()
    }

    pub fn arcs(&self) -> impl Iterator<Item = &ArcPrimitive> {
        self.arcs.values()
    }

    /// Inserts or refreshes a component primitive, keeping its selection flag.
    pub fn sync_component(&mut self, component: &VisualComponent) {
        let mut primitive = ComponentPrimitive::from_component(component);
        if let Some(previous) = self.components.get(&primitive.uid) {
            primitive.selected = previous.selected;
        }
        self.components.insert(primitive.uid, primitive);
    }

    pub fn remove_component(&mut self, uid: ComponentUid) -> bool {
        self.components.remove(&uid).is_some()
    }

    pub fn insert_arc(&mut self, arc: &VisualArc) {
        let primitive = ArcPrimitive::from_arc(arc);
        self.arcs.insert(primitive.uid, primitive);
    }

    /// Replaces the routed geometry and schedules a cutout pass.
    pub fn set_arc_route(&mut self, uid: ArcUid, route: ArcRoute) -> bool {
        let Some(primitive) = self.arcs.get_mut(&uid) else {
            return false;
        };
        primitive.route = Some(route);
        self.pending_cutouts.insert(uid);
        true
    }

    /// Refreshes label text and styles without touching the route.
    pub fn refresh_arc_label(&mut self, arc: &VisualArc) -> bool {
        let Some(primitive) = self.arcs.get_mut(&arc.uid()) else {
            return false;
        };
        primitive.label = arc.label_text();
        primitive.styles = arc.styles.clone();
        self.pending_cutouts.insert(arc.uid());
        true
    }

    pub fn remove_arc(&mut self, uid: ArcUid) -> bool {
        self.pending_cutouts.shift_remove(&uid);
        self.arcs.shift_remove(&uid).is_some()
    }

    pub fn pending_cutouts(&self) -> usize {
        self.pending_cutouts.len()
    }

    /// Measures every label queued since the last frame and updates its
    /// cutout. Returns how many cutouts were applied.
    pub fn run_frame(&mut self, measurer: &impl TextMeasure) -> usize {
        let mut applied = 0;
        for uid in std::mem::take(&mut self.pending_cutouts) {
            let Some(primitive) = self.arcs.get_mut(&uid) else {
                continue;
            };
            let Some(anchor) = primitive.route.as_ref().and_then(|route| route.label_anchor)
            else {
                log::debug!("arc {uid} has no label anchor; keeping previous cutout");
                continue;
            };

            let measured = measurer.measure(&primitive.label, &primitive.styles.label);
            match label_cutout(anchor, measured.width, measured.height) {
                Some(cutout) => {
                    primitive.cutout = Some(cutout);
                    applied += 1;
                }
                None => log::debug!("arc {uid} label cutout is not finite; skipped"),
            }
        }
        applied
    }

    pub fn set_component_selected(&mut self, uid: ComponentUid, selected: bool) -> bool {
        match self.components.get_mut(&uid) {
            Some(primitive) => {
                primitive.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn set_arc_selected(&mut self, uid: ArcUid, selected: bool) -> bool {
        match self.arcs.get_mut(&uid) {
            Some(primitive) => {
                primitive.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        for primitive in self.components.values_mut() {
            primitive.selected = false;
        }
        for primitive in self.arcs.values_mut() {
            primitive.selected = false;
        }
    }

    pub fn selected_components(&self) -> Vec<ComponentUid> {
        self.components
            .values()
            .filter(|primitive| primitive.selected)
            .map(|primitive| primitive.uid)
            .collect()
    }

    pub fn selected_arcs(&self) -> Vec<ArcUid> {
        self.arcs
            .values()
            .filter(|primitive| primitive.selected)
            .map(|primitive| primitive.uid)
            .collect()
    }

    pub fn set_highlight(&mut self, area: Option<Bounds>) {
        self.highlight = area;
    }

    pub fn highlight(&self) -> Option<Bounds> {
        self.highlight
    }

    pub fn set_drag_ghost(&mut self, ghost: Option<DragGhost>) {
        self.drag_ghost = ghost;
    }

    pub fn drag_ghost(&self) -> Option<DragGhost> {
        self.drag_ghost
    }

    pub fn set_tracing_preview(&mut self, route: Option<ArcRoute>) {
        self.tracing_preview = route;
    }

    pub fn tracing_preview(&self) -> Option<&ArcRoute> {
        self.tracing_preview.as_ref()
    }

    pub fn arc_bounds(&self, uid: ArcUid) -> Option<Bounds> {
        self.arcs.get(&uid).and_then(ArcPrimitive::bounds)
    }

    /// Extent of the diagram layer: component outlines and routed arcs.
    pub fn content_bounds(&self) -> Option<Bounds> {
        let mut bounds = Bounds::empty();
        for primitive in self.components.values() {
            bounds.include(
                primitive.geometry.position,
                primitive.geometry.radius() + primitive.styles.outline.width,
            );
        }
        for primitive in self.arcs.values() {
            let Some(route) = &primitive.route else {
                continue;
            };
            let pad = primitive.styles.outline.width;
            for point in &route.stroke {
                bounds.include(*point, pad);
            }
            if let Some(head) = &route.connector {
                for point in head.points() {
                    bounds.include(point, pad);
                }
            }
        }
        (!bounds.is_empty()).then_some(bounds)
    }

    pub fn render_svg(&self, options: &RenderOptions) -> Result<String, ExportError> {
        let view = options
            .view_box
            .or_else(|| self.content_bounds().map(|bounds| bounds.inflate(VIEW_MARGIN)))
            .unwrap_or_else(|| {
                Bounds::from_corners(
                    Point::new(0.0, 0.0),
                    Point::new(VIEW_MARGIN * 2.0, VIEW_MARGIN * 2.0),
                )
            });

        let mut svg = String::new();
        write!(
            svg,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="{:.2} {:.2} {:.2} {:.2}">
"#,
            view.width().ceil(),
            view.height().ceil(),
            view.min_x,
            view.min_y,
            view.width(),
            view.height()
        )?;

        self.write_masks(&mut svg, &view)?;

        if !options.background.is_empty() {
            writeln!(
                svg,
                "  <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" />",
                view.min_x,
                view.min_y,
                view.width(),
                view.height(),
                escape_xml(&options.background)
            )?;
        }

        svg.push_str("  <g class=\"diagram\">\n");
        for primitive in self.arcs.values() {
            self.write_arc(&mut svg, primitive)?;
        }
        for primitive in self.components.values() {
            self.write_component(&mut svg, primitive)?;
        }
        svg.push_str("  </g>\n");

        if options.include_chrome {
            self.write_chrome(&mut svg)?;
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }

    fn write_masks(&self, svg: &mut String, view: &Bounds) -> std::fmt::Result {
        let masked: Vec<(&ArcUid, &LabelCutout)> = self
            .arcs
            .iter()
            .filter(|(_, primitive)| primitive.route.is_some())
            .filter_map(|(uid, primitive)| primitive.cutout.as_ref().map(|cutout| (uid, cutout)))
            .collect();

        if masked.is_empty() {
            return Ok(());
        }

        svg.push_str("  <defs>\n");
        for (uid, cutout) in masked {
            writeln!(
                svg,
                "    <mask id=\"arc-mask-{uid}\" maskUnits=\"userSpaceOnUse\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\">",
                view.min_x,
                view.min_y,
                view.width(),
                view.height()
            )?;
            writeln!(
                svg,
                "      <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"white\" />",
                view.min_x,
                view.min_y,
                view.width(),
                view.height()
            )?;
            writeln!(
                svg,
                "      <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"black\" />",
                cutout.x,
                cutout.y,
                cutout.width,
                cutout.height,
                cutout.corner_radius,
                cutout.corner_radius
            )?;
            svg.push_str("    </mask>\n");
        }
        svg.push_str("  </defs>\n");
        Ok(())
    }

    fn write_arc(&self, svg: &mut String, primitive: &ArcPrimitive) -> std::fmt::Result {
        let Some(route) = &primitive.route else {
            return Ok(());
        };

        let outline = &primitive.styles.outline;
        let mask_attr = if primitive.cutout.is_some() {
            format!(" mask=\"url(#arc-mask-{})\"", primitive.uid)
        } else {
            String::new()
        };

        writeln!(svg, "    <g class=\"arc\" data-uid=\"{}\">", primitive.uid)?;
        writeln!(
            svg,
            "      <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\"{} />",
            route.svg_path_data(),
            escape_xml(&outline.color),
            outline.width,
            mask_attr
        )?;

        if let Some(head) = &route.connector {
            write_connector(svg, head, &outline.color, outline.width)?;
        }

        if let Some(anchor) = route.label_anchor {
            write_text(svg, anchor, &primitive.label, &primitive.styles.label, "      ")?;
        }

        svg.push_str("    </g>\n");
        Ok(())
    }

    fn write_component(&self, svg: &mut String, primitive: &ComponentPrimitive) -> std::fmt::Result {
        writeln!(
            svg,
            "    <g class=\"component\" data-uid=\"{}\">",
            primitive.uid
        )?;
        write_glyph(
            svg,
            self.templates.component(primitive.kind),
            primitive.geometry,
            &primitive.styles.outline.color,
            primitive.styles.outline.width,
            None,
        )?;
        write_text(
            svg,
            primitive.geometry.position,
            &primitive.label,
            &primitive.styles.inner_label,
            "      ",
        )?;
        svg.push_str("    </g>\n");
        Ok(())
    }

    fn write_chrome(&self, svg: &mut String) -> std::fmt::Result {
        svg.push_str("  <g class=\"chrome\">\n");

        for primitive in self.components.values().filter(|p| p.selected) {
            write_glyph(
                svg,
                self.templates.component_selected(),
                primitive.geometry,
                SELECTION_COLOR,
                2.0,
                None,
            )?;
        }

        for primitive in self.arcs.values().filter(|p| p.selected) {
            if let Some(route) = &primitive.route {
                writeln!(
                    svg,
                    "    <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-opacity=\"0.4\" />",
                    route.svg_path_data(),
                    SELECTION_COLOR,
                    primitive.styles.outline.width + 6.0
                )?;
            }
        }

        if let Some(route) = &self.tracing_preview {
            writeln!(
                svg,
                "    <path class=\"tracing\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2.00\" />",
                route.svg_path_data(),
                TRACING_COLOR
            )?;
            if let Some(head) = &route.connector {
                write_connector(svg, head, TRACING_COLOR, 2.0)?;
            }
        }

        if let Some(ghost) = self.drag_ghost {
            write_glyph(
                svg,
                self.templates.component(ghost.kind),
                ComponentGeometry::at(ghost.position),
                "black",
                2.0,
                Some(0.5),
            )?;
        }

        if let Some(area) = self.highlight {
            writeln!(
                svg,
                "    <rect class=\"highlight\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"0.1\" stroke=\"{}\" stroke-dasharray=\"4 3\" />",
                area.min_x,
                area.min_y,
                area.width(),
                area.height(),
                SELECTION_COLOR,
                SELECTION_COLOR
            )?;
        }

        svg.push_str("  </g>\n");
        Ok(())
    }
}

/// Places a template authored at `TEMPLATE_SIZE` so it fills `geometry`,
/// keeping the stroke width constant under scaling.
fn write_glyph(
    svg: &mut String,
    body: &str,
    geometry: ComponentGeometry,
    stroke: &str,
    stroke_width: f64,
    opacity: Option<f64>,
) -> std::fmt::Result {
    let scale = geometry.size / TEMPLATE_SIZE;
    let opacity_attr = opacity
        .map(|value| format!(" opacity=\"{value:.2}\""))
        .unwrap_or_default();

    writeln!(
        svg,
        "      <g transform=\"translate({:.2} {:.2}) scale({:.4})\" fill=\"white\" stroke=\"{}\" stroke-width=\"{:.4}\"{}>",
        geometry.position.x,
        geometry.position.y,
        scale,
        escape_xml(stroke),
        stroke_width / scale,
        opacity_attr
    )?;
    writeln!(svg, "        {body}")?;
    svg.push_str("      </g>\n");
    Ok(())
}

fn write_connector(
    svg: &mut String,
    head: &ArrowHead,
    color: &str,
    width: f64,
) -> std::fmt::Result {
    let t = head.thickness;
    let color = escape_xml(color);
    match head.kind {
        ConnectorType::None => Ok(()),
        ConnectorType::ArrowClosedFilled => writeln!(
            svg,
            "      <polygon class=\"connector {}\" points=\"{:.2},0 0,{t:.2} {t:.2},{t:.2}\" transform=\"{}\" fill=\"{color}\" stroke=\"{color}\" stroke-width=\"{width:.2}\" stroke-linejoin=\"round\" />",
            head.kind.as_str(),
            t / 2.0,
            head.svg_transform()
        ),
        ConnectorType::ArrowClosed => writeln!(
            svg,
            "      <polygon class=\"connector {}\" points=\"{:.2},0 0,{t:.2} {t:.2},{t:.2}\" transform=\"{}\" fill=\"white\" stroke=\"{color}\" stroke-width=\"{width:.2}\" stroke-linejoin=\"round\" />",
            head.kind.as_str(),
            t / 2.0,
            head.svg_transform()
        ),
        ConnectorType::ArrowOpen => writeln!(
            svg,
            "      <polyline class=\"connector {}\" points=\"0,{t:.2} {:.2},0 {t:.2},{t:.2}\" transform=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{width:.2}\" stroke-linecap=\"round\" />",
            head.kind.as_str(),
            t / 2.0,
            head.svg_transform()
        ),
    }
}

fn write_text(
    svg: &mut String,
    at: Point,
    text: &str,
    style: &TextStyle,
    indent: &str,
) -> std::fmt::Result {
    if text.is_empty() {
        return Ok(());
    }

    let weight_attr = if style.weight.is_normal() {
        String::new()
    } else {
        format!(" font-weight=\"{}\"", style.weight)
    };

    writeln!(
        svg,
        "{indent}<text x=\"{:.2}\" y=\"{:.2}\" fill=\"{}\" stroke=\"none\" font-family=\"{}\" font-size=\"{}\"{} text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
        at.x,
        at.y,
        escape_xml(&style.color),
        escape_xml(&style.font_family),
        style.size,
        weight_attr,
        escape_xml(text)
    )
}
