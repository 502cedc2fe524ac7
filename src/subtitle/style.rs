use serde::{Deserialize, Serialize};

use crate::error::{Result, SubburnError};
use super::color::AssColor;

/// Visual style of a single cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleStyle {
    pub text_color: String,
    pub bg_color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub bg_opaque: bool,
    pub bg_opacity: f32,
    pub font_size: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            text_color: "#FFFFFF".to_string(),
            bg_color: "#000000".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 2,
            bg_opaque: false,
            bg_opacity: 0.5,
            font_size: 48,
        }
    }
}

impl SubtitleStyle {
    /// Stable key covering every field, used to deduplicate styles.
    ///
    /// Floats are keyed by their bit pattern so two styles collide only when
    /// they are field-for-field identical.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{:08x}|{}",
            self.text_color,
            self.bg_color,
            self.stroke_color,
            self.stroke_width,
            self.bg_opaque,
            self.bg_opacity.to_bits(),
            self.font_size,
        )
    }

    /// Apply a single field change, validating the new value.
    pub fn apply(&mut self, change: StyleChange) -> Result<()> {
        match change {
            StyleChange::TextColor(hex) => self.text_color = checked_color(hex)?,
            StyleChange::BgColor(hex) => self.bg_color = checked_color(hex)?,
            StyleChange::StrokeColor(hex) => self.stroke_color = checked_color(hex)?,
            StyleChange::StrokeWidth(width) => self.stroke_width = width,
            StyleChange::BgOpaque(opaque) => self.bg_opaque = opaque,
            StyleChange::BgOpacity(opacity) => {
                if !(0.0..=1.0).contains(&opacity) {
                    return Err(SubburnError::Validation(format!(
                        "background opacity {} is outside [0, 1]",
                        opacity
                    )));
                }
                self.bg_opacity = opacity;
            }
            StyleChange::FontSize(size) => {
                if size == 0 {
                    return Err(SubburnError::Validation("font size must be positive".to_string()));
                }
                self.font_size = size;
            }
        }
        Ok(())
    }
}

fn checked_color(hex: String) -> Result<String> {
    if AssColor::from_hex(&hex).is_none() {
        return Err(SubburnError::Validation(format!("'{}' is not a hex color", hex)));
    }
    Ok(hex)
}

/// One edited style field, addressed by variant rather than by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum StyleChange {
    TextColor(String),
    BgColor(String),
    StrokeColor(String),
    StrokeWidth(u32),
    BgOpaque(bool),
    BgOpacity(f32),
    FontSize(u32),
}
