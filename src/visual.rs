use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::geometry::{ArcGeometry, ArcLabelPlacement, ComponentGeometry, PathType, Point};
use crate::graph::{ArcUid, ComponentUid, Edge, Graph, RemovedComponent, UidSequence, Vertex};
use crate::style::{ArcStyles, ComponentStyles, ConnectorStyle, OutlineStyle, TextStyle};

pub const DEFAULT_MODEL_NAME: &str = "Untitled Model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Boundary,
    Entity,
    Controller,
}

impl ComponentType {
    pub const ALL: [ComponentType; 3] = [
        ComponentType::Boundary,
        ComponentType::Entity,
        ComponentType::Controller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Boundary => "boundary",
            ComponentType::Entity => "entity",
            ComponentType::Controller => "controller",
        }
    }

    /// Single-letter code used by the RDLT text format.
    pub fn initial(&self) -> char {
        match self {
            ComponentType::Boundary => 'b',
            ComponentType::Entity => 'e',
            ComponentType::Controller => 'c',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualComponent {
    uid: ComponentUid,
    pub identifier: String,
    pub kind: ComponentType,
    pub is_rbs_center: bool,
    pub geometry: ComponentGeometry,
    pub styles: ComponentStyles,
}

impl VisualComponent {
    pub fn uid(&self) -> ComponentUid {
        self.uid
    }
}

impl Vertex for VisualComponent {
    fn uid(&self) -> ComponentUid {
        self.uid
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualArc {
    uid: ArcUid,
    from_vertex: ComponentUid,
    to_vertex: ComponentUid,
    pub c: String,
    pub l: u32,
    pub geometry: ArcGeometry,
    pub styles: ArcStyles,
}

impl VisualArc {
    pub fn uid(&self) -> ArcUid {
        self.uid
    }

    pub fn from_vertex(&self) -> ComponentUid {
        self.from_vertex
    }

    pub fn to_vertex(&self) -> ComponentUid {
        self.to_vertex
    }

    pub fn is_self_loop(&self) -> bool {
        self.from_vertex == self.to_vertex
    }

    /// Text shown next to the arc: `C:L`.
    pub fn label_text(&self) -> String {
        format!("{}:{}", self.c, self.l)
    }
}

impl Edge for VisualArc {
    fn uid(&self) -> ArcUid {
        self.uid
    }

    fn from_vertex(&self) -> ComponentUid {
        self.from_vertex
    }

    fn to_vertex(&self) -> ComponentUid {
        self.to_vertex
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentProps {
    pub identifier: String,
    #[serde(rename = "isRBSCenter")]
    pub is_rbs_center: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcProps {
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "L")]
    pub l: u32,
}

impl Default for ArcProps {
    fn default() -> Self {
        Self {
            c: String::new(),
            l: 1,
        }
    }
}

/// Partial update for a component; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentPatch {
    pub identifier: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ComponentType>,
    #[serde(rename = "isRBSCenter")]
    pub is_rbs_center: Option<bool>,
    pub position: Option<Point>,
    pub size: Option<f64>,
    pub outline: Option<OutlineStyle>,
    pub inner_label: Option<TextStyle>,
    pub outer_label: Option<TextStyle>,
}

impl ComponentPatch {
    /// Whether applying the patch can move the vertex boundary.
    pub fn affects_geometry(&self) -> bool {
        self.position.is_some() || self.size.is_some()
    }
}

/// Partial update for an arc; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcPatch {
    #[serde(rename = "C")]
    pub c: Option<String>,
    #[serde(rename = "L")]
    pub l: Option<u32>,
    pub path_type: Option<PathType>,
    pub is_auto_draw: Option<bool>,
    pub waypoints: Option<Vec<Point>>,
    pub arc_label: Option<ArcLabelPlacement>,
    pub outline: Option<OutlineStyle>,
    pub label: Option<TextStyle>,
    pub connector_end: Option<ConnectorStyle>,
}

impl ArcPatch {
    /// Whether applying the patch changes the routed path, connector or label anchor.
    pub fn affects_route(&self) -> bool {
        self.waypoints.is_some()
            || self.arc_label.is_some()
            || self.connector_end.is_some()
            || self.path_type.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct VisualModel {
    name: String,
    graph: Graph<VisualComponent, VisualArc>,
    component_uids: UidSequence,
    arc_uids: UidSequence,
}

impl Default for VisualModel {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_NAME)
    }
}

impl VisualModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: Graph::new(),
            component_uids: UidSequence::default(),
            arc_uids: UidSequence::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn add_component(
        &mut self,
        kind: ComponentType,
        props: ComponentProps,
        geometry: Option<ComponentGeometry>,
        styles: Option<ComponentStyles>,
    ) -> Result<&VisualComponent, GraphError> {
        let uid = ComponentUid(self.component_uids.next_value());
        let component = VisualComponent {
            uid,
            identifier: props.identifier,
            kind,
            is_rbs_center: props.is_rbs_center,
            geometry: geometry.unwrap_or_default(),
            styles: styles.unwrap_or_default(),
        };

        self.graph.add_component(component)
    }

    /// Adds an arc between two existing components. The uid is only consumed
    /// when the arc is accepted.
    pub fn add_arc(
        &mut self,
        from: ComponentUid,
        to: ComponentUid,
        props: ArcProps,
        geometry: Option<ArcGeometry>,
        styles: Option<ArcStyles>,
    ) -> Result<&VisualArc, GraphError> {
        let uid = ArcUid(self.arc_uids.peek());
        for endpoint in [from, to] {
            if self.graph.component(endpoint).is_none() {
                return Err(GraphError::DanglingEndpoint {
                    arc: uid,
                    component: endpoint,
                });
            }
        }

        let mut geometry = geometry.unwrap_or_default();
        geometry.arc_label = geometry.arc_label.clamped();

        let uid = ArcUid(self.arc_uids.next_value());
        let arc = VisualArc {
            uid,
            from_vertex: from,
            to_vertex: to,
            c: props.c,
            l: props.l,
            geometry,
            styles: styles.unwrap_or_default(),
        };

        self.graph.add_arc(arc)
    }

    pub fn component(&self, uid: ComponentUid) -> Option<&VisualComponent> {
        self.graph.component(uid)
    }

    pub fn arc(&self, uid: ArcUid) -> Option<&VisualArc> {
        self.graph.arc(uid)
    }

    pub fn all_components(&self) -> impl Iterator<Item = &VisualComponent> {
        self.graph.components()
    }

    pub fn all_arcs(&self) -> &[VisualArc] {
        self.graph.arcs()
    }

    pub fn arcs_incident_to(&self, uid: ComponentUid) -> Vec<&VisualArc> {
        self.graph.arcs_incident_to(uid)
    }

    pub fn connections(&self, from: ComponentUid, to: ComponentUid) -> Vec<ArcUid> {
        self.graph.connections(from, to)
    }

    pub fn component_count(&self) -> usize {
        self.graph.component_count()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.arc_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.component_count() == 0
    }

    pub fn update_component_position(
        &mut self,
        uid: ComponentUid,
        x: f64,
        y: f64,
    ) -> Option<ComponentGeometry> {
        let component = self.graph.component_mut(uid)?;
        component.geometry.position = Point::new(x, y);
        Some(component.geometry)
    }

    pub fn update_component_props(
        &mut self,
        uid: ComponentUid,
        patch: ComponentPatch,
    ) -> Option<&VisualComponent> {
        let component = self.graph.component_mut(uid)?;

        if let Some(identifier) = patch.identifier {
            component.identifier = identifier;
        }
        if let Some(kind) = patch.kind {
            component.kind = kind;
        }
        if let Some(is_rbs_center) = patch.is_rbs_center {
            component.is_rbs_center = is_rbs_center;
        }
        if let Some(position) = patch.position {
            component.geometry.position = position;
        }
        if let Some(size) = patch.size {
            component.geometry.size = size;
        }
        if let Some(outline) = patch.outline {
            component.styles.outline = outline;
        }
        if let Some(inner_label) = patch.inner_label {
            component.styles.inner_label = inner_label;
        }
        if let Some(outer_label) = patch.outer_label {
            component.styles.outer_label = outer_label;
        }

        Some(&*component)
    }

    pub fn update_arc_props(&mut self, uid: ArcUid, patch: ArcPatch) -> Option<&VisualArc> {
        let arc = self.graph.arc_mut(uid)?;

        if let Some(c) = patch.c {
            arc.c = c;
        }
        if let Some(l) = patch.l {
            arc.l = l;
        }
        if let Some(path_type) = patch.path_type {
            arc.geometry.path_type = path_type;
        }
        if let Some(is_auto_draw) = patch.is_auto_draw {
            arc.geometry.is_auto_draw = is_auto_draw;
        }
        if let Some(waypoints) = patch.waypoints {
            arc.geometry.waypoints = waypoints;
        }
        if let Some(arc_label) = patch.arc_label {
            arc.geometry.arc_label = arc_label.clamped();
        }
        if let Some(outline) = patch.outline {
            arc.styles.outline = outline;
        }
        if let Some(label) = patch.label {
            arc.styles.label = label;
        }
        if let Some(connector_end) = patch.connector_end {
            arc.styles.connector_end = connector_end;
        }

        Some(&*arc)
    }

    pub fn remove_component(
        &mut self,
        uid: ComponentUid,
    ) -> Option<RemovedComponent<VisualComponent, VisualArc>> {
        self.graph.take_component(uid)
    }

    pub fn remove_arc(&mut self, uid: ArcUid) -> Option<VisualArc> {
        self.graph.remove_arc(uid)
    }
}
