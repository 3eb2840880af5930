use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for the engine. Every field has a default, so a host config file
/// only needs to name what it changes.
///
/// Units are logical pixels, pixels per frame, and milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Height of one lane. The lane count is `floor(viewport_height / lane_height)`.
    pub lane_height: f64,
    /// Glyph size of an overlay with no likes.
    pub base_font_size: f64,
    pub font_family: String,
    pub bold: bool,
    /// Horizontal distance an overlay travels per frame.
    pub speed: f64,
    /// Minimum horizontal gap kept between consecutive overlays in one lane.
    pub min_gap: f64,
    /// A lane that has not accepted an overlay for this long is treated as empty.
    pub staleness_ms: f64,
    /// How long a hovered overlay stays frozen after the pointer leaves it.
    pub hover_grace_ms: f64,
    /// Width reserved at the leading edge of voice overlays for the play toggle.
    pub voice_button_width: f64,
    pub toast_ms: f64,
    pub toast_font_size: f64,
    pub panel: PanelConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lane_height: 30.0,
            base_font_size: 24.0,
            font_family: "Arial".to_string(),
            bold: true,
            speed: 3.0,
            min_gap: 50.0,
            staleness_ms: 3000.0,
            hover_grace_ms: 300.0,
            voice_button_width: 28.0,
            toast_ms: 1500.0,
            toast_font_size: 14.0,
            panel: PanelConfig::default(),
        }
    }
}

/// Geometry of the like / copy / report surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    pub button_width: f64,
    pub button_height: f64,
    pub spacing: f64,
    pub padding: f64,
    /// Vertical distance between the hovered overlay and the panel.
    pub offset: f64,
    pub font_size: f64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            button_width: 56.0,
            button_height: 24.0,
            spacing: 4.0,
            padding: 4.0,
            offset: 4.0,
            font_size: 13.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make lane geometry or motion meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("laneHeight", self.lane_height),
            ("baseFontSize", self.base_font_size),
            ("speed", self.speed),
            ("panel.buttonWidth", self.panel.button_width),
            ("panel.buttonHeight", self.panel.button_height),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        let non_negative = [
            ("minGap", self.min_gap),
            ("stalenessMs", self.staleness_ms),
            ("hoverGraceMs", self.hover_grace_ms),
            ("voiceButtonWidth", self.voice_button_width),
            ("toastMs", self.toast_ms),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(br#"{"speed": 2.5, "panel": {"offset": 0}}"#)
            .unwrap_or_default();
        assert!((config.speed - 2.5).abs() < f64::EPSILON);
        assert!((config.lane_height - 30.0).abs() < f64::EPSILON);
        assert!(config.panel.offset.abs() < f64::EPSILON);
        assert!((config.panel.button_width - 56.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_zero_lane_height() {
        let err = EngineConfig::from_json(br#"{"laneHeight": 0}"#);
        assert!(matches!(
            err,
            Err(ConfigError::Invalid {
                field: "laneHeight",
                ..
            })
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json(b"{speed: fast}"),
            Err(ConfigError::Json(_))
        ));
    }
}
