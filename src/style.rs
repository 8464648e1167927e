use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(u16),
    Named(NamedWeight),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedWeight {
    Thin,
    Normal,
    Medium,
    Bold,
}

impl Default for FontWeight {
    fn default() -> Self {
        FontWeight::Named(NamedWeight::Normal)
    }
}

impl FontWeight {
    pub fn is_normal(&self) -> bool {
        matches!(self, FontWeight::Named(NamedWeight::Normal))
    }

    pub fn is_bold(&self) -> bool {
        match self {
            FontWeight::Numeric(value) => *value >= 600,
            FontWeight::Named(named) => *named == NamedWeight::Bold,
        }
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontWeight::Numeric(value) => write!(f, "{value}"),
            FontWeight::Named(NamedWeight::Thin) => f.write_str("thin"),
            FontWeight::Named(NamedWeight::Normal) => f.write_str("normal"),
            FontWeight::Named(NamedWeight::Medium) => f.write_str("medium"),
            FontWeight::Named(NamedWeight::Bold) => f.write_str("bold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub size: f64,
    pub color: String,
    pub weight: FontWeight,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            size: 17.0,
            color: "black".to_string(),
            weight: FontWeight::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineStyle {
    pub width: f64,
    pub color: String,
}

impl Default for OutlineStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            color: "black".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentStyles {
    pub outline: OutlineStyle,
    pub inner_label: TextStyle,
    pub outer_label: TextStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorType {
    None,
    ArrowOpen,
    #[default]
    ArrowClosedFilled,
    ArrowClosed,
}

impl ConnectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::None => "none",
            ConnectorType::ArrowOpen => "arrow-open",
            ConnectorType::ArrowClosedFilled => "arrow-closed-filled",
            ConnectorType::ArrowClosed => "arrow-closed",
        }
    }

    pub fn is_visible(&self) -> bool {
        *self != ConnectorType::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorStyle {
    #[serde(rename = "type")]
    pub kind: ConnectorType,
    pub thickness: f64,
}

impl Default for ConnectorStyle {
    fn default() -> Self {
        Self {
            kind: ConnectorType::default(),
            thickness: 15.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcStyles {
    pub outline: OutlineStyle,
    pub label: TextStyle,
    pub connector_end: ConnectorStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_editor_conventions() {
        let text = TextStyle::default();
        assert_eq!(text.font_family, "Arial");
        assert_eq!(text.size, 17.0);
        assert_eq!(text.color, "black");
        assert!(text.weight.is_normal());

        let outline = OutlineStyle::default();
        assert_eq!(outline.width, 2.0);
        assert_eq!(outline.color, "black");

        let arc = ArcStyles::default();
        assert_eq!(arc.connector_end.kind, ConnectorType::ArrowClosedFilled);
        assert_eq!(arc.connector_end.thickness, 15.0);
    }

    #[test]
    fn font_weight_parses_names_and_numbers() -> serde_json::Result<()> {
        let bold: FontWeight = serde_json::from_str("\"bold\"")?;
        let heavy: FontWeight = serde_json::from_str("700")?;

        assert_eq!(bold.to_string(), "bold");
        assert_eq!(heavy.to_string(), "700");
        assert!(bold.is_bold() && heavy.is_bold());
        Ok(())
    }

    #[test]
    fn connector_type_uses_kebab_case_names() -> serde_json::Result<()> {
        let style: ConnectorStyle =
            serde_json::from_str(r#"{ "type": "arrow-open", "thickness": 9 }"#)?;
        assert_eq!(style.kind, ConnectorType::ArrowOpen);
        assert_eq!(style.kind.as_str(), "arrow-open");
        assert_eq!(style.thickness, 9.0);
        Ok(())
    }
}
