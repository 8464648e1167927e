//! SVG glyph templates for component shapes and selection chrome.
//!
//! Templates are loaded once before editing starts. The repository moves from
//! uninitialized to ready exactly once; editors refuse to start against an
//! uninitialized repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AssetError;
use crate::visual::ComponentType;

/// Directory the bundled templates were verified in at build time.
pub const BUNDLED_TEMPLATE_DIR: &str = env!("RDLT_BUNDLED_TEMPLATES");

const BUNDLED_BOUNDARY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/templates/components/boundary.svg"
));
const BUNDLED_ENTITY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/templates/components/entity.svg"
));
const BUNDLED_CONTROLLER: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/templates/components/controller.svg"
));
const BUNDLED_SELECTED: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/templates/selection/component-selected.svg"
));

/// Diameter the component templates are authored at.
pub const TEMPLATE_SIZE: f64 = 70.0;

/// Inner markup of each template, with the outer `<svg>` element stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Templates {
    boundary: String,
    entity: String,
    controller: String,
    component_selected: String,
}

impl Templates {
    fn from_sources(
        boundary: &str,
        entity: &str,
        controller: &str,
        component_selected: &str,
    ) -> Result<Self, AssetError> {
        Ok(Templates {
            boundary: extract_svg_body("components/boundary.svg", boundary)?,
            entity: extract_svg_body("components/entity.svg", entity)?,
            controller: extract_svg_body("components/controller.svg", controller)?,
            component_selected: extract_svg_body(
                "selection/component-selected.svg",
                component_selected,
            )?,
        })
    }

    pub fn component(&self, kind: ComponentType) -> &str {
        match kind {
            ComponentType::Boundary => &self.boundary,
            ComponentType::Entity => &self.entity,
            ComponentType::Controller => &self.controller,
        }
    }

    pub fn component_selected(&self) -> &str {
        &self.component_selected
    }
}

#[derive(Debug, Clone, Default)]
enum AssetState {
    #[default]
    Uninitialized,
    Ready(Arc<Templates>),
}

#[derive(Debug, Clone, Default)]
pub struct AssetRepository {
    state: AssetState,
}

impl AssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository backed by the templates compiled into the binary.
    pub fn bundled() -> Result<Self, AssetError> {
        let templates = Templates::from_sources(
            BUNDLED_BOUNDARY,
            BUNDLED_ENTITY,
            BUNDLED_CONTROLLER,
            BUNDLED_SELECTED,
        )?;
        Ok(AssetRepository {
            state: AssetState::Ready(Arc::new(templates)),
        })
    }

    /// Reads every template under `dir`. A repository that is already ready is
    /// left untouched.
    pub async fn initialize_from_dir(&mut self, dir: impl AsRef<Path>) -> Result<(), AssetError> {
        if self.is_ready() {
            return Ok(());
        }

        let dir = dir.as_ref();
        let (boundary, entity, controller, selected) = tokio::try_join!(
            read_template(dir.join("components/boundary.svg")),
            read_template(dir.join("components/entity.svg")),
            read_template(dir.join("components/controller.svg")),
            read_template(dir.join("selection/component-selected.svg")),
        )?;

        let templates = Templates::from_sources(&boundary, &entity, &controller, &selected)?;
        self.state = AssetState::Ready(Arc::new(templates));
        log::info!("loaded component templates from {}", dir.display());
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, AssetState::Ready(_))
    }

    pub fn templates(&self) -> Result<Arc<Templates>, AssetError> {
        match &self.state {
            AssetState::Ready(templates) => Ok(Arc::clone(templates)),
            AssetState::Uninitialized => Err(AssetError::NotInitialized),
        }
    }
}

async fn read_template(path: PathBuf) -> Result<String, AssetError> {
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| AssetError::Io { path, source })
}

fn extract_svg_body(name: &str, source: &str) -> Result<String, AssetError> {
    let invalid = || AssetError::InvalidTemplate {
        name: name.to_string(),
    };

    let open = source.find("<svg").ok_or_else(invalid)?;
    let body_start = source[open..]
        .find('>')
        .map(|offset| open + offset + 1)
        .ok_or_else(invalid)?;
    let body_end = source.rfind("</svg>").ok_or_else(invalid)?;

    if body_end < body_start {
        return Err(invalid());
    }

    Ok(source[body_start..body_end].trim().to_string())
}
