use crate::style::TextStyle;

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_RATIO: f64 = 0.55;
const BOLD_WIDTH_RATIO: f64 = 0.6;
const LINE_HEIGHT_RATIO: f64 = 1.2;

/// Bounding box of a laid-out label, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub width: f64,
    pub height: f64,
}

/// Layout pass used when cutting labels out of arc strokes.
pub trait TextMeasure {
    fn measure(&self, text: &str, style: &TextStyle) -> LabelBox;
}

/// Estimates label extents from character counts without shaping text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTextMeasurer;

impl TextMeasure for ApproxTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> LabelBox {
        let lines: Vec<&str> = text.split('\n').collect();
        let max_chars = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let ratio = if style.weight.is_bold() {
            BOLD_WIDTH_RATIO
        } else {
            CHAR_WIDTH_RATIO
        };

        LabelBox {
            width: style.size * ratio * max_chars as f64,
            height: style.size * LINE_HEIGHT_RATIO * lines.len() as f64,
        }
    }
}
