//! Synchronization layer between the visual model and the drawing view.
//!
//! Every mutation goes through [`Editor`], which writes the model first and
//! then tells the view what changed. Nothing observes the model on its own:
//! moving a vertex reroutes exactly the arcs incident to it, and editing an
//! arc's text only refreshes its label.

use crate::assets::AssetRepository;
use crate::drawing::{DragGhost, DrawingView, RenderOptions};
use crate::error::{EditorError, ExportError, RouteError};
use crate::export::{self, ExportedFile};
use crate::geometry::{ArcGeometry, Bounds, ComponentGeometry, PathType, Point};
use crate::graph::{ArcUid, ComponentUid};
use crate::measure::{ApproxTextMeasurer, TextMeasure};
use crate::routing::{ArcRoute, Endpoint, RouteRequest, route_arc};
use crate::style::{ArcStyles, ComponentStyles, ConnectorStyle};
use crate::visual::{
    ArcPatch, ArcProps, ComponentPatch, ComponentProps, ComponentType, VisualArc,
    VisualComponent, VisualModel,
};

/// Radius given to the cursor while tracing, i.e. a vertex of size 1.
const CURSOR_RADIUS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TracingState {
    source: ComponentUid,
    target: Option<ComponentUid>,
}

#[derive(Debug)]
pub struct Editor<M = ApproxTextMeasurer> {
    model: VisualModel,
    view: DrawingView,
    measurer: M,
    tracing: Option<TracingState>,
}

impl Editor<ApproxTextMeasurer> {
    pub fn new(assets: &AssetRepository, name: impl Into<String>) -> Result<Self, EditorError> {
        Self::with_measurer(assets, name, ApproxTextMeasurer)
    }
}

impl<M: TextMeasure> Editor<M> {
    /// Fails with [`EditorError::Assets`] until the repository is ready.
    pub fn with_measurer(
        assets: &AssetRepository,
        name: impl Into<String>,
        measurer: M,
    ) -> Result<Self, EditorError> {
        let templates = assets.templates()?;
        Ok(Editor {
            model: VisualModel::new(name),
            view: DrawingView::new(templates),
            measurer,
            tracing: None,
        })
    }

    pub fn model(&self) -> &VisualModel {
        &self.model
    }

    pub fn view(&self) -> &DrawingView {
        &self.view
    }

    pub fn set_model_name(&mut self, name: impl Into<String>) {
        self.model.set_name(name);
    }

    pub fn add_component(
        &mut self,
        kind: ComponentType,
        props: ComponentProps,
        geometry: Option<ComponentGeometry>,
        styles: Option<ComponentStyles>,
    ) -> Result<ComponentUid, EditorError> {
        let component = self.model.add_component(kind, props, geometry, styles)?;
        self.view.sync_component(component);
        Ok(component.uid())
    }

    /// Adds and routes a new arc. Returns `None` when an endpoint is unknown.
    /// Arcs whose route is degenerate (a self-loop without waypoints) are
    /// still added and stay unrouted.
    pub fn add_arc(
        &mut self,
        from: ComponentUid,
        to: ComponentUid,
        props: ArcProps,
        geometry: Option<ArcGeometry>,
        styles: Option<ArcStyles>,
    ) -> Option<ArcUid> {
        let uid = match self.model.add_arc(from, to, props, geometry, styles) {
            Ok(arc) => {
                self.view.insert_arc(arc);
                arc.uid()
            }
            Err(err) => {
                log::warn!("rejected arc {from}->{to}: {err}");
                return None;
            }
        };
        self.reroute(uid);
        Some(uid)
    }

    /// Moves a vertex and reroutes every incident arc. Returns the arcs that
    /// were recomputed, or `None` when the vertex does not exist.
    pub fn update_component_position(
        &mut self,
        uid: ComponentUid,
        x: f64,
        y: f64,
    ) -> Option<Vec<ArcUid>> {
        self.model.update_component_position(uid, x, y)?;
        self.sync_component(uid);
        Some(self.reroute_incident(uid))
    }

    pub fn update_component_props(&mut self, uid: ComponentUid, patch: ComponentPatch) -> bool {
        let reroute = patch.affects_geometry();
        if self.model.update_component_props(uid, patch).is_none() {
            return false;
        }
        self.sync_component(uid);
        if reroute {
            self.reroute_incident(uid);
        }
        true
    }

    /// Applies an arc patch. Text and style edits only refresh the label;
    /// geometry and connector edits reroute the arc as well.
    pub fn update_arc_props(&mut self, uid: ArcUid, patch: ArcPatch) -> bool {
        let reroute = patch.affects_route();
        let Some(arc) = self.model.update_arc_props(uid, patch) else {
            return false;
        };
        self.view.refresh_arc_label(arc);
        if reroute {
            self.reroute(uid);
        }
        true
    }

    /// Removes a vertex together with every arc incident to it.
    pub fn remove_component(&mut self, uid: ComponentUid) -> Option<VisualComponent> {
        let removed = self.model.remove_component(uid)?;
        for arc in &removed.arcs {
            self.view.remove_arc(arc.uid());
        }
        self.view.remove_component(uid);

        if self
            .tracing
            .is_some_and(|state| state.source == uid || state.target == Some(uid))
        {
            self.cancel_tracing();
        }
        Some(removed.component)
    }

    pub fn remove_arc(&mut self, uid: ArcUid) -> Option<VisualArc> {
        let arc = self.model.remove_arc(uid)?;
        self.view.remove_arc(uid);
        Some(arc)
    }

    /// Route for `arc` against the current endpoint geometry.
    pub fn compute_route(&self, arc: &VisualArc) -> Option<Result<ArcRoute, RouteError>> {
        let from = self.model.component(arc.from_vertex())?;
        let to = self.model.component(arc.to_vertex())?;
        let waypoints: &[Point] = match arc.geometry.path_type {
            PathType::Straight => &[],
            PathType::Elbowed => &arc.geometry.waypoints,
        };

        Some(route_arc(&RouteRequest {
            start: Endpoint::from(&from.geometry),
            end: Endpoint::from(&to.geometry),
            waypoints,
            label: arc.geometry.arc_label,
            connector: arc.styles.connector_end,
        }))
    }

    fn reroute(&mut self, uid: ArcUid) -> bool {
        let Some(result) = self.model.arc(uid).and_then(|arc| self.compute_route(arc)) else {
            return false;
        };
        match result {
            Ok(route) => self.view.set_arc_route(uid, route),
            Err(err) => {
                log::debug!("arc {uid} left unrouted: {err}");
                false
            }
        }
    }

    fn reroute_incident(&mut self, uid: ComponentUid) -> Vec<ArcUid> {
        let incident: Vec<ArcUid> = self
            .model
            .arcs_incident_to(uid)
            .into_iter()
            .map(VisualArc::uid)
            .collect();
        for arc in &incident {
            self.reroute(*arc);
        }
        incident
    }

    fn sync_component(&mut self, uid: ComponentUid) {
        if let Some(component) = self.model.component(uid) {
            self.view.sync_component(component);
        }
    }

    pub fn start_tracing(&mut self, source: ComponentUid) -> bool {
        if self.model.component(source).is_none() {
            return false;
        }
        self.tracing = Some(TracingState {
            source,
            target: None,
        });
        self.view.set_tracing_preview(None);
        true
    }

    pub fn is_tracing(&self) -> bool {
        self.tracing.is_some()
    }

    /// Previews the new arc ending at the cursor.
    pub fn trace_to_point(&mut self, point: Point) {
        let Some(state) = self.tracing.as_mut() else {
            return;
        };
        state.target = None;
        let source = state.source;
        self.show_preview(source, Endpoint::new(point, CURSOR_RADIUS));
    }

    /// Previews the new arc ending at a hovered vertex.
    pub fn trace_to_vertex(&mut self, target: ComponentUid) {
        let Some(end) = self
            .model
            .component(target)
            .map(|component| Endpoint::from(&component.geometry))
        else {
            return;
        };
        let Some(state) = self.tracing.as_mut() else {
            return;
        };
        state.target = Some(target);
        let source = state.source;
        self.show_preview(source, end);
    }

    /// The cursor left the hovered vertex; the next move traces to a point.
    pub fn leave_vertex(&mut self) {
        if let Some(state) = self.tracing.as_mut() {
            state.target = None;
        }
    }

    /// Ends tracing, committing a new arc when a target vertex is hovered.
    pub fn end_tracing(&mut self) -> Option<ArcUid> {
        let state = self.tracing.take()?;
        self.view.set_tracing_preview(None);
        let target = state.target?;
        self.add_arc(state.source, target, ArcProps::default(), None, None)
    }

    pub fn cancel_tracing(&mut self) {
        self.tracing = None;
        self.view.set_tracing_preview(None);
    }

    fn show_preview(&mut self, source: ComponentUid, end: Endpoint) {
        let Some(start) = self
            .model
            .component(source)
            .map(|component| Endpoint::from(&component.geometry))
        else {
            return;
        };

        let preview = route_arc(&RouteRequest {
            start,
            end,
            waypoints: &[],
            label: Default::default(),
            connector: ConnectorStyle::default(),
        });
        self.view.set_tracing_preview(preview.ok());
    }

    /// Selects a vertex. Returns `false` for unknown uids.
    pub fn select_component(&mut self, uid: ComponentUid) -> bool {
        self.view.set_component_selected(uid, true)
    }

    pub fn deselect_component(&mut self, uid: ComponentUid) -> bool {
        self.view.set_component_selected(uid, false)
    }

    pub fn select_arc(&mut self, uid: ArcUid) -> bool {
        self.view.set_arc_selected(uid, true)
    }

    pub fn deselect_arc(&mut self, uid: ArcUid) -> bool {
        self.view.set_arc_selected(uid, false)
    }

    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
    }

    pub fn is_component_selected(&self, uid: ComponentUid) -> bool {
        self.view
            .component(uid)
            .is_some_and(|primitive| primitive.selected)
    }

    pub fn selected_components(&self) -> Vec<ComponentUid> {
        self.view.selected_components()
    }

    pub fn selected_arcs(&self) -> Vec<ArcUid> {
        self.view.selected_arcs()
    }

    pub fn set_highlight(&mut self, area: Option<Bounds>) {
        self.view.set_highlight(area);
    }

    pub fn set_drag_ghost(&mut self, ghost: Option<DragGhost>) {
        self.view.set_drag_ghost(ghost);
    }

    /// Runs the deferred label measurement pass.
    pub fn run_frame(&mut self) -> usize {
        self.view.run_frame(&self.measurer)
    }

    pub fn render_svg(&self, options: &RenderOptions) -> Result<String, ExportError> {
        self.view.render_svg(options)
    }

    pub fn export_rdlt(&self) -> ExportedFile {
        export::export_rdlt(&self.model)
    }

    /// Flushes pending label cutouts, then rasterizes the diagram layer.
    pub fn export_png(&mut self, background: &str, scale: f32) -> Result<ExportedFile, ExportError> {
        self.run_frame();
        export::export_png(&self.model, &self.view, background, scale)
    }

    /// Diagram-only SVG framed like the PNG export.
    pub fn export_svg(&mut self, background: &str) -> Result<String, ExportError> {
        self.run_frame();
        export::render_export_svg(&self.model, &self.view, background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Editor {
        let assets = AssetRepository::bundled().unwrap();
        Editor::new(&assets, "test").unwrap()
    }

    fn add(editor: &mut Editor, kind: ComponentType, x: f64, y: f64) -> ComponentUid {
        editor.add_component(
            kind,
            ComponentProps::default(),
            Some(ComponentGeometry::at(Point::new(x, y))),
            None,
        )
        .unwrap()
    }

    #[test]
    fn editor_requires_ready_assets() {
        let err = Editor::new(&AssetRepository::new(), "x").unwrap_err();
        assert!(matches!(
            err,
            EditorError::Assets(crate::error::AssetError::NotInitialized)
        ));
    }

    #[test]
    fn new_arcs_are_routed_immediately() {
        let mut editor = editor();
        let a = add(&mut editor, ComponentType::Boundary, 0.0, 0.0);
        let b = add(&mut editor, ComponentType::Entity, 200.0, 0.0);
        let arc = editor
            .add_arc(a, b, ArcProps::default(), None, None)
            .unwrap();

        let route = editor.view().arc(arc).unwrap().route.clone().unwrap();
        assert_eq!(route.trimmed[0], Point::new(35.0, 0.0));
        assert!(editor.add_arc(a, ComponentUid(42), ArcProps::default(), None, None).is_none());
    }

    #[test]
    fn moving_a_vertex_reroutes_only_incident_arcs() {
        let mut editor = editor();
        let hub = add(&mut editor, ComponentType::Controller, 0.0, 0.0);
        let left = add(&mut editor, ComponentType::Boundary, -200.0, 0.0);
        let right = add(&mut editor, ComponentType::Entity, 200.0, 0.0);
        let far = add(&mut editor, ComponentType::Entity, 200.0, 300.0);

        let a1 = editor.add_arc(left, hub, ArcProps::default(), None, None).unwrap();
        let a2 = editor.add_arc(hub, right, ArcProps::default(), None, None).unwrap();
        let untouched = editor.add_arc(right, far, ArcProps::default(), None, None).unwrap();
        let before = editor.view().arc(untouched).unwrap().route.clone();

        let rerouted = editor.update_component_position(hub, 0.0, 100.0).unwrap();
        assert_eq!(rerouted, vec![a1, a2]);

        let end = editor.view().arc(a1).unwrap().route.as_ref().unwrap().trimmed[1];
        assert!((end.distance_to(Point::new(0.0, 100.0)) - 35.0).abs() < 1e-9);
        assert_eq!(editor.view().arc(untouched).unwrap().route, before);
        assert!(editor.update_component_position(ComponentUid(99), 0.0, 0.0).is_none());
    }

    #[test]
    fn label_only_edits_keep_the_route() {
        let mut editor = editor();
        let a = add(&mut editor, ComponentType::Boundary, 0.0, 0.0);
        let b = add(&mut editor, ComponentType::Entity, 200.0, 0.0);
        let arc = editor.add_arc(a, b, ArcProps::default(), None, None).unwrap();
        editor.run_frame();

        let before = editor.view().arc(arc).unwrap().route.clone();
        assert!(editor.update_arc_props(
            arc,
            ArcPatch {
                c: Some("x".into()),
                l: Some(3),
                ..ArcPatch::default()
            }
        ));

        let primitive = editor.view().arc(arc).unwrap();
        assert_eq!(primitive.label, "x:3");
        assert_eq!(primitive.route, before);
        assert_eq!(editor.view().pending_cutouts(), 1);
    }

    #[test]
    fn self_loop_is_added_but_left_unrouted() {
        let mut editor = editor();
        let a = add(&mut editor, ComponentType::Boundary, 0.0, 0.0);
        let b = add(&mut editor, ComponentType::Entity, 200.0, 0.0);
        let looped = editor.add_arc(a, a, ArcProps::default(), None, None).unwrap();
        let normal = editor.add_arc(a, b, ArcProps::default(), None, None).unwrap();

        assert!(editor.view().arc(looped).unwrap().route.is_none());
        assert!(editor.view().arc(normal).unwrap().route.is_some());

        let rerouted = editor.update_component_position(a, 10.0, 10.0).unwrap();
        assert_eq!(rerouted.len(), 2);
        editor.run_frame();
        assert!(editor.render_svg(&RenderOptions::default()).is_ok());
    }

    #[test]
    fn removing_a_vertex_drops_its_arcs_from_the_view() {
        let mut editor = editor();
        let a = add(&mut editor, ComponentType::Boundary, 0.0, 0.0);
        let b = add(&mut editor, ComponentType::Entity, 200.0, 0.0);
        let arc = editor.add_arc(a, b, ArcProps::default(), None, None).unwrap();

        assert!(editor.remove_component(b).is_some());
        assert!(editor.view().arc(arc).is_none());
        assert!(editor.view().component(b).is_none());
        assert!(editor.remove_component(b).is_none());
        assert_eq!(editor.model().arc_count(), 0);
    }

    #[test]
    fn tracing_commits_only_over_a_target() {
        let mut editor = editor();
        let a = add(&mut editor, ComponentType::Boundary, 0.0, 0.0);
        let b = add(&mut editor, ComponentType::Entity, 200.0, 0.0);

        assert!(editor.start_tracing(a));
        editor.trace_to_point(Point::new(120.0, 40.0));
        assert!(editor.view().tracing_preview().is_some());
        assert!(editor.end_tracing().is_none());
        assert!(editor.view().tracing_preview().is_none());
        assert_eq!(editor.model().arc_count(), 0);

        editor.start_tracing(a);
        editor.trace_to_vertex(b);
        let preview = editor.view().tracing_preview().unwrap();
        assert!((preview.trimmed[1].x - 165.0).abs() < 1e-9);

        let arc = editor.end_tracing().unwrap();
        assert_eq!(editor.model().connections(a, b), vec![arc]);
        assert!(!editor.is_tracing());
    }

    #[test]
    fn tracing_preview_hides_on_degenerate_cursor() {
        let mut editor = editor();
        let a = add(&mut editor, ComponentType::Boundary, 50.0, 50.0);

        editor.start_tracing(a);
        editor.trace_to_point(Point::new(50.0, 50.0));
        assert!(editor.view().tracing_preview().is_none());
        editor.leave_vertex();
        assert!(editor.end_tracing().is_none());
    }
}
