//! Geometry, routing and rendering core for RDLT (Robustness Diagram with
//! Loop and Time controls) models.
//!
//! The [`Editor`] owns a [`VisualModel`] and keeps its [`DrawingView`] in
//! step with every edit. Models can be exported as RDLT text, SVG or PNG.

pub mod assets;
pub mod cli;
pub mod drawing;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod graph;
pub mod measure;
pub mod routing;
pub mod scene;
pub mod session;
pub mod style;
pub mod utils;
pub mod visual;

pub use assets::{AssetRepository, Templates};
pub use drawing::{DragGhost, DrawingView, RenderOptions};
pub use editor::Editor;
pub use error::{AssetError, EditorError, ExportError, GraphError, RouteError, SceneError};
pub use export::{ExportedFile, export_png, export_rdlt, to_rdlt_text};
pub use geometry::{ArcGeometry, ArcLabelPlacement, Bounds, ComponentGeometry, PathType, Point};
pub use graph::{ArcUid, ComponentUid};
pub use measure::{ApproxTextMeasurer, LabelBox, TextMeasure};
pub use routing::{ArcRoute, RouteRequest, route_arc};
pub use scene::Scene;
pub use session::{Mode, ModellingSession, PointerEvent};
pub use style::{ArcStyles, ComponentStyles, ConnectorStyle, ConnectorType, OutlineStyle, TextStyle};
pub use visual::{
    ArcPatch, ArcProps, ComponentPatch, ComponentProps, ComponentType, VisualArc, VisualComponent,
    VisualModel,
};
