use std::path::PathBuf;

use crate::{ArcUid, ComponentUid};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("component {0} is already present in the model")]
    DuplicateComponent(ComponentUid),

    #[error("arc {0} is already present in the model")]
    DuplicateArc(ArcUid),

    #[error("arc {arc} references unknown component {component}")]
    DanglingEndpoint { arc: ArcUid, component: ComponentUid },
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("route needs at least two points, got {0}")]
    TooFewPoints(usize),

    #[error("point of contact is undefined because the adjacent point coincides with the vertex center")]
    CoincidentEndpoints,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset repository has not been initialized")]
    NotInitialized,

    #[error("failed to read template '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template '{name}' is not a well-formed <svg> document")]
    InvalidTemplate { name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("model '{0}' has no components to export")]
    EmptyModel(String),

    #[error("failed to write SVG markup")]
    Format(#[from] std::fmt::Error),

    #[error("failed to parse generated SVG for PNG export: {0}")]
    Svg(String),

    #[error("failed to allocate {width}x{height} surface for PNG export")]
    Surface { width: u32, height: u32 },

    #[error("scale must be a finite value greater than zero, got {0}")]
    InvalidScale(f32),

    #[error("failed to encode PNG output: {0}")]
    Encode(String),

    #[error("PNG export requires the 'png' feature")]
    Unsupported,
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Assets(#[from] AssetError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid scene description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arc {index} references unknown component key '{key}'")]
    UnknownComponent { index: usize, key: String },

    #[error("component key '{0}' is declared more than once")]
    DuplicateKey(String),

    #[error(transparent)]
    Editor(#[from] EditorError),
}
