//! JSON scene descriptions for batch rendering.
//!
//! A scene lists components under local string keys and arcs that refer to
//! those keys. Replaying a scene goes through the editor, so the result is the
//! same as placing every item by hand.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::editor::Editor;
use crate::error::SceneError;
use crate::geometry::{ArcGeometry, ArcLabelPlacement, ComponentGeometry, PathType, Point};
use crate::graph::ComponentUid;
use crate::measure::TextMeasure;
use crate::style::{ArcStyles, ComponentStyles};
use crate::visual::{ArcProps, ComponentProps, ComponentType, DEFAULT_MODEL_NAME};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    pub name: String,
    pub components: Vec<SceneComponent>,
    pub arcs: Vec<SceneArc>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL_NAME.to_string(),
            components: Vec::new(),
            arcs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneComponent {
    /// Reference used by arcs; falls back to the identifier.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    #[serde(default)]
    pub identifier: String,
    #[serde(default, rename = "isRBSCenter")]
    pub is_rbs_center: bool,
    pub position: Point,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub styles: ComponentStyles,
}

impl SceneComponent {
    fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneArc {
    pub from: String,
    pub to: String,
    #[serde(default, rename = "C")]
    pub c: String,
    #[serde(default = "default_l", rename = "L")]
    pub l: u32,
    /// Inferred from `waypoints` when omitted.
    #[serde(default)]
    pub path_type: Option<PathType>,
    #[serde(default)]
    pub is_auto_draw: bool,
    #[serde(default)]
    pub waypoints: Vec<Point>,
    #[serde(default)]
    pub arc_label: ArcLabelPlacement,
    #[serde(default)]
    pub styles: ArcStyles,
}

fn default_l() -> u32 {
    1
}

impl Scene {
    pub fn parse(source: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Adds every component, then every arc, to `editor`. The scene is
    /// validated first, so a failing scene leaves the editor untouched.
    pub fn apply<M: TextMeasure>(
        &self,
        editor: &mut Editor<M>,
    ) -> Result<IndexMap<String, ComponentUid>, SceneError> {
        self.validate()?;
        editor.set_model_name(self.name.clone());

        let mut keys = IndexMap::with_capacity(self.components.len());
        for component in &self.components {
            let mut geometry = ComponentGeometry::at(component.position);
            if let Some(size) = component.size {
                geometry.size = size;
            }

            let uid = editor.add_component(
                component.kind,
                ComponentProps {
                    identifier: component.identifier.clone(),
                    is_rbs_center: component.is_rbs_center,
                },
                Some(geometry),
                Some(component.styles.clone()),
            )?;
            keys.insert(component.key().to_string(), uid);
        }

        for arc in &self.arcs {
            let (Some(from), Some(to)) = (keys.get(&arc.from), keys.get(&arc.to)) else {
                continue;
            };

            let path_type = arc.path_type.unwrap_or(if arc.waypoints.is_empty() {
                PathType::Straight
            } else {
                PathType::Elbowed
            });

            editor.add_arc(
                *from,
                *to,
                ArcProps {
                    c: arc.c.clone(),
                    l: arc.l,
                },
                Some(ArcGeometry {
                    path_type,
                    is_auto_draw: arc.is_auto_draw,
                    waypoints: arc.waypoints.clone(),
                    arc_label: arc.arc_label,
                }),
                Some(arc.styles.clone()),
            );
        }

        log::debug!(
            "applied scene '{}' ({} components, {} arcs)",
            self.name,
            self.components.len(),
            self.arcs.len()
        );
        Ok(keys)
    }

    fn validate(&self) -> Result<(), SceneError> {
        let mut seen = std::collections::HashSet::new();
        for component in &self.components {
            if !seen.insert(component.key()) {
                return Err(SceneError::DuplicateKey(component.key().to_string()));
            }
        }

        for (index, arc) in self.arcs.iter().enumerate() {
            for key in [&arc.from, &arc.to] {
                if !seen.contains(key.as_str()) {
                    return Err(SceneError::UnknownComponent {
                        index,
                        key: key.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
