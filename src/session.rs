//! Pointer-driven modelling session.
//!
//! Translates pointer events on components, arcs and the empty drawing into
//! editor calls. The sub-states are independent flags, but in practice only one
//! is active at a time. View mode ignores pointer input entirely.

use crate::drawing::DragGhost;
use crate::editor::Editor;
use crate::geometry::{Bounds, ComponentGeometry, Point};
use crate::graph::{ArcUid, ComponentUid};
use crate::measure::TextMeasure;
use crate::visual::{ComponentProps, ComponentType};

/// Where the drag ghost waits before the pointer first moves.
const GHOST_PARKING: Point = Point::new(-100.0, -100.0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    View,
    #[default]
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Move,
    Up,
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionEvents {
    pub moving: bool,
    pub highlighting: bool,
    pub multi_selecting: bool,
    pub dragging: bool,
    pub arc_tracing: bool,
}

/// Zoom and scroll of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f64,
    pub offset: Point,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset: Point::default(),
        }
    }
}

impl ViewTransform {
    /// Converts a drawing-space position into canvas coordinates.
    pub fn to_absolute(&self, point: Point) -> Point {
        Point::new(
            (point.x + self.offset.x) / self.zoom,
            (point.y + self.offset.y) / self.zoom,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Movement {
    start: Point,
    initial: Vec<(ComponentUid, Point)>,
}

#[derive(Debug, Clone, Default)]
pub struct ModellingSession {
    mode: Mode,
    events: SessionEvents,
    view: ViewTransform,
    highlight_start: Option<Point>,
    movement: Option<Movement>,
    dragging: Option<ComponentType>,
}

impl ModellingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn events(&self) -> SessionEvents {
        self.events
    }

    pub fn view_transform(&self) -> ViewTransform {
        self.view
    }

    pub fn set_view_transform(&mut self, view: ViewTransform) {
        self.view = view;
    }

    /// While set, pointer-down on a component or arc toggles it in the
    /// selection instead of replacing the selection.
    pub fn set_multi_selecting(&mut self, multi_selecting: bool) {
        self.events.multi_selecting = multi_selecting;
    }

    pub fn on_component_event<M: TextMeasure>(
        &mut self,
        editor: &mut Editor<M>,
        event: PointerEvent,
        uid: ComponentUid,
        at: Point,
    ) {
        if self.mode != Mode::Select || editor.model().component(uid).is_none() {
            return;
        }

        match event {
            PointerEvent::Down => {
                let selected = editor.is_component_selected(uid);
                if self.events.multi_selecting {
                    if selected {
                        editor.deselect_component(uid);
                    } else {
                        editor.select_component(uid);
                    }
                } else if !selected {
                    editor.clear_selection();
                    editor.select_component(uid);
                }
                self.start_movement(editor, at);
            }
            PointerEvent::Up => {
                if self.events.moving {
                    self.end_movement();
                }
            }
            PointerEvent::Enter => {
                if self.events.arc_tracing {
                    editor.trace_to_vertex(uid);
                }
            }
            PointerEvent::Leave => {
                if self.events.arc_tracing {
                    editor.leave_vertex();
                }
            }
            PointerEvent::Move => {}
        }
    }

    pub fn on_arc_event<M: TextMeasure>(
        &mut self,
        editor: &mut Editor<M>,
        event: PointerEvent,
        uid: ArcUid,
    ) {
        if self.mode != Mode::Select || event != PointerEvent::Down {
            return;
        }
        let selected = editor.selected_arcs().contains(&uid);
        if self.events.multi_selecting {
            if selected {
                editor.deselect_arc(uid);
            } else {
                editor.select_arc(uid);
            }
        } else if !selected {
            editor.clear_selection();
            editor.select_arc(uid);
        }
    }

    pub fn on_drawing_event<M: TextMeasure>(
        &mut self,
        editor: &mut Editor<M>,
        event: PointerEvent,
        at: Point,
    ) {
        if self.mode != Mode::Select {
            return;
        }

        match event {
            PointerEvent::Down => {
                editor.clear_selection();
                self.events.highlighting = true;
                self.highlight_start = Some(at);
            }
            PointerEvent::Move => {
                if self.events.moving {
                    self.move_to(editor, at);
                }
                if self.events.highlighting {
                    self.highlight_to(editor, at);
                }
                if let Some(kind) = self.dragging {
                    editor.set_drag_ghost(Some(DragGhost { kind, position: at }));
                }
                if self.events.arc_tracing {
                    editor.trace_to_point(at);
                }
            }
            PointerEvent::Up => {
                if self.events.moving {
                    self.end_movement();
                }
                if self.events.highlighting {
                    self.stop_highlighting(editor, at);
                }
                if self.events.dragging {
                    self.drop_at(editor, at);
                }
                if self.events.arc_tracing {
                    self.events.arc_tracing = false;
                    editor.end_tracing();
                }
            }
            PointerEvent::Enter | PointerEvent::Leave => {}
        }
    }

    /// Pointer went down on a component's tracing handle.
    pub fn start_arc_tracing<M: TextMeasure>(&mut self, editor: &mut Editor<M>, source: ComponentUid) {
        if self.mode != Mode::Select {
            return;
        }
        editor.clear_selection();
        if editor.start_tracing(source) {
            self.events.arc_tracing = true;
        }
    }

    /// A palette entry started being dragged onto the drawing.
    pub fn start_drag_and_drop<M: TextMeasure>(&mut self, editor: &mut Editor<M>, kind: ComponentType) {
        self.events.dragging = true;
        self.dragging = Some(kind);
        editor.set_drag_ghost(Some(DragGhost {
            kind,
            position: GHOST_PARKING,
        }));
    }

    fn start_movement<M: TextMeasure>(&mut self, editor: &Editor<M>, at: Point) {
        let initial = editor
            .selected_components()
            .into_iter()
            .filter_map(|uid| {
                editor
                    .model()
                    .component(uid)
                    .map(|component| (uid, component.geometry.position))
            })
            .collect();

        self.events.moving = true;
        self.movement = Some(Movement { start: at, initial });
    }

    fn move_to<M: TextMeasure>(&mut self, editor: &mut Editor<M>, at: Point) {
        let Some(movement) = &self.movement else {
            return;
        };
        let dx = (at.x - movement.start.x) / self.view.zoom;
        let dy = (at.y - movement.start.y) / self.view.zoom;

        for (uid, initial) in &movement.initial {
            editor.update_component_position(*uid, initial.x + dx, initial.y + dy);
        }
    }

    fn end_movement(&mut self) {
        self.events.moving = false;
        self.movement = None;
    }

    fn highlight_to<M: TextMeasure>(&mut self, editor: &mut Editor<M>, at: Point) {
        if let Some(start) = self.highlight_start {
            editor.set_highlight(Some(Bounds::from_corners(start, at)));
        }
    }

    /// Selects everything lying completely inside the marquee.
    fn stop_highlighting<M: TextMeasure>(&mut self, editor: &mut Editor<M>, at: Point) {
        self.events.highlighting = false;
        editor.set_highlight(None);
        let Some(start) = self.highlight_start.take() else {
            return;
        };

        let drawn = Bounds::from_corners(start, at);
        let area = Bounds::from_corners(
            self.view.to_absolute(Point::new(drawn.min_x, drawn.min_y)),
            self.view.to_absolute(Point::new(drawn.max_x, drawn.max_y)),
        );

        editor.clear_selection();

        let components: Vec<ComponentUid> = editor
            .model()
            .all_components()
            .filter(|component| area.contains_bounds(&component.geometry.bounds()))
            .map(|component| component.uid())
            .collect();
        for uid in components {
            editor.select_component(uid);
        }

        let arcs: Vec<ArcUid> = editor
            .model()
            .all_arcs()
            .iter()
            .map(|arc| arc.uid())
            .filter(|uid| {
                editor
                    .view()
                    .arc_bounds(*uid)
                    .is_some_and(|bounds| area.contains_bounds(&bounds))
            })
            .collect();
        for uid in arcs {
            editor.select_arc(uid);
        }
    }

    fn drop_at<M: TextMeasure>(&mut self, editor: &mut Editor<M>, at: Point) {
        self.events.dragging = false;
        editor.set_drag_ghost(None);
        let Some(kind) = self.dragging.take() else {
            return;
        };

        if at.x < 0.0 || at.y < 0.0 {
            return;
        }
        if let Err(err) = editor.add_component(
            kind,
            ComponentProps::default(),
            Some(ComponentGeometry::at(at)),
            None,
        ) {
            log::warn!("dropped {} was not added: {err}", kind.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetRepository;
    use crate::visual::ArcProps;

    fn setup() -> (Editor, ComponentUid, ComponentUid) {
        let assets = AssetRepository::bundled().unwrap();
        let mut editor = Editor::new(&assets, "session").unwrap();
        let a = editor.add_component(
            ComponentType::Boundary,
            ComponentProps::default(),
            Some(ComponentGeometry::at(Point::new(100.0, 100.0))),
            None,
        )
        .unwrap();
        let b = editor.add_component(
            ComponentType::Entity,
            ComponentProps::default(),
            Some(ComponentGeometry::at(Point::new(300.0, 100.0))),
            None,
        )
        .unwrap();
        (editor, a, b)
    }

    #[test]
    fn dragging_a_component_moves_it_by_zoomed_offset() {
        let (mut editor, a, b) = setup();
        let mut session = ModellingSession::new();
        session.set_view_transform(ViewTransform {
            zoom: 2.0,
            offset: Point::default(),
        });

        session.on_component_event(&mut editor, PointerEvent::Down, a, Point::new(10.0, 10.0));
        assert!(session.events().moving);
        assert_eq!(editor.selected_components(), vec![a]);

        session.on_drawing_event(&mut editor, PointerEvent::Move, Point::new(50.0, 30.0));
        session.on_drawing_event(&mut editor, PointerEvent::Up, Point::new(50.0, 30.0));

        let moved = editor.model().component(a).unwrap().geometry.position;
        assert_eq!(moved, Point::new(120.0, 110.0));
        assert_eq!(
            editor.model().component(b).unwrap().geometry.position,
            Point::new(300.0, 100.0)
        );
        assert!(!session.events().moving);
    }

    #[test]
    fn multi_selecting_toggles_membership() {
        let (mut editor, a, b) = setup();
        let arc = editor.add_arc(a, b, ArcProps::default(), None, None).unwrap();
        let mut session = ModellingSession::new();

        session.on_component_event(&mut editor, PointerEvent::Down, a, Point::new(100.0, 100.0));
        session.on_component_event(&mut editor, PointerEvent::Up, a, Point::new(100.0, 100.0));
        session.set_multi_selecting(true);
        session.on_component_event(&mut editor, PointerEvent::Down, b, Point::new(300.0, 100.0));
        session.on_component_event(&mut editor, PointerEvent::Up, b, Point::new(300.0, 100.0));
        session.on_arc_event(&mut editor, PointerEvent::Down, arc);
        assert_eq!(editor.selected_components(), vec![a, b]);
        assert_eq!(editor.selected_arcs(), vec![arc]);

        session.on_component_event(&mut editor, PointerEvent::Down, a, Point::new(100.0, 100.0));
        session.on_component_event(&mut editor, PointerEvent::Up, a, Point::new(100.0, 100.0));
        session.on_arc_event(&mut editor, PointerEvent::Down, arc);
        assert_eq!(editor.selected_components(), vec![b]);
        assert!(editor.selected_arcs().is_empty());

        session.set_multi_selecting(false);
        session.on_component_event(&mut editor, PointerEvent::Down, a, Point::new(100.0, 100.0));
        assert_eq!(editor.selected_components(), vec![a]);
    }

    #[test]
    fn marquee_selects_fully_enclosed_items() {
        let (mut editor, a, b) = setup();
        let arc = editor.add_arc(a, b, ArcProps::default(), None, None).unwrap();
        let mut session = ModellingSession::new();

        session.on_drawing_event(&mut editor, PointerEvent::Down, Point::new(0.0, 0.0));
        session.on_drawing_event(&mut editor, PointerEvent::Move, Point::new(200.0, 200.0));
        assert!(editor.view().highlight().is_some());
        session.on_drawing_event(&mut editor, PointerEvent::Up, Point::new(200.0, 200.0));

        assert!(editor.view().highlight().is_none());
        assert_eq!(editor.selected_components(), vec![a]);
        assert!(editor.selected_arcs().is_empty());

        session.on_drawing_event(&mut editor, PointerEvent::Down, Point::new(400.0, 400.0));
        session.on_drawing_event(&mut editor, PointerEvent::Up, Point::new(0.0, 0.0));
        assert_eq!(editor.selected_components(), vec![a, b]);
        assert_eq!(editor.selected_arcs(), vec![arc]);
    }

    #[test]
    fn drop_creates_component_only_on_canvas() {
        let (mut editor, _, _) = setup();
        let mut session = ModellingSession::new();

        session.start_drag_and_drop(&mut editor, ComponentType::Controller);
        assert!(editor.view().drag_ghost().is_some());
        session.on_drawing_event(&mut editor, PointerEvent::Move, Point::new(-5.0, 40.0));
        session.on_drawing_event(&mut editor, PointerEvent::Up, Point::new(-5.0, 40.0));
        assert_eq!(editor.model().component_count(), 2);
        assert!(editor.view().drag_ghost().is_none());

        session.start_drag_and_drop(&mut editor, ComponentType::Controller);
        session.on_drawing_event(&mut editor, PointerEvent::Up, Point::new(60.0, 40.0));
        assert_eq!(editor.model().component_count(), 3);
    }

    #[test]
    fn arc_tracing_commits_on_release_over_target() {
        let (mut editor, a, b) = setup();
        let mut session = ModellingSession::new();

        session.start_arc_tracing(&mut editor, a);
        session.on_drawing_event(&mut editor, PointerEvent::Move, Point::new(200.0, 150.0));
        assert!(editor.view().tracing_preview().is_some());

        session.on_component_event(&mut editor, PointerEvent::Enter, b, Point::new(300.0, 100.0));
        session.on_drawing_event(&mut editor, PointerEvent::Up, Point::new(300.0, 100.0));

        assert!(!session.events().arc_tracing);
        assert_eq!(editor.model().connections(a, b).len(), 1);
        assert!(editor.view().tracing_preview().is_none());
    }

    #[test]
    fn view_mode_ignores_pointer_input() {
        let (mut editor, a, _) = setup();
        let mut session = ModellingSession::new();
        session.set_mode(Mode::View);

        session.on_component_event(&mut editor, PointerEvent::Down, a, Point::new(0.0, 0.0));
        session.on_drawing_event(&mut editor, PointerEvent::Down, Point::new(0.0, 0.0));
        assert_eq!(session.events(), SessionEvents::default());
        assert!(editor.selected_components().is_empty());
    }
}
