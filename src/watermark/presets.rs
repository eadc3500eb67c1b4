use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::types::{Anchor, Color, WatermarkConfig, WatermarkMode};

/// Identifier into the fixed preset table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetId {
    #[default]
    IdentityVerification,
    DocumentCopy,
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetDefinition {
    pub id: PresetId,
    pub text: &'static str,
    pub font_size_px: u32,
    pub color: Color,
    pub opacity: f32,
    pub anchor: Anchor,
    pub description: &'static str,
}

pub const PRESETS: [PresetDefinition; 3] = [
    PresetDefinition {
        id: PresetId::IdentityVerification,
        text: "僅供身分驗證使用",
        font_size_px: 20,
        color: Color::rgb(0xff, 0x00, 0x00),
        opacity: 0.6,
        anchor: Anchor::Center,
        description: "Identity document verification stamp",
    },
    PresetDefinition {
        id: PresetId::DocumentCopy,
        text: "僅供文件備份使用",
        font_size_px: 18,
        color: Color::rgb(0x00, 0x66, 0xcc),
        opacity: 0.5,
        anchor: Anchor::BottomRight,
        description: "Document backup copy stamp",
    },
    PresetDefinition {
        id: PresetId::Sample,
        text: "SAMPLE",
        font_size_px: 32,
        color: Color::rgb(0x88, 0x88, 0x88),
        opacity: 0.4,
        anchor: Anchor::Center,
        description: "Sample marking stamp",
    },
];

impl PresetId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetId::IdentityVerification => "identity-verification",
            PresetId::DocumentCopy => "document-copy",
            PresetId::Sample => "sample",
        }
    }

    pub fn definition(&self) -> &'static PresetDefinition {
        match self {
            PresetId::IdentityVerification => &PRESETS[0],
            PresetId::DocumentCopy => &PRESETS[1],
            PresetId::Sample => &PRESETS[2],
        }
    }
}

impl FromStr for PresetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PRESETS
            .iter()
            .map(|preset| preset.id)
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown preset: {}", s))
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overwrite the style fields of `config` with a preset's stored values
pub fn apply_preset(config: &mut WatermarkConfig, id: PresetId) {
    let preset = id.definition();
    config.mode = WatermarkMode::Preset;
    config.preset_id = id;
    config.text = preset.text.to_string();
    config.font_size_px = preset.font_size_px;
    config.color = preset.color;
    config.opacity = preset.opacity;
    config.set_anchor(preset.anchor);
    debug!("Applied preset {} ({})", id, preset.description);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_ids_round_trip_through_names() {
        for preset in PRESETS.iter() {
            assert_eq!(preset.id.as_str().parse::<PresetId>().unwrap(), preset.id);
            assert_eq!(preset.id.definition(), preset);
        }
        assert!("taiwan-id".parse::<PresetId>().is_err());
    }

    #[test]
    fn test_apply_sample_preset_matches_table() {
        let mut config = WatermarkConfig::custom("my own text");
        apply_preset(&mut config, PresetId::Sample);

        let sample = PresetId::Sample.definition();
        assert_eq!(config.mode, WatermarkMode::Preset);
        assert_eq!(config.preset_id, PresetId::Sample);
        assert_eq!(config.text, sample.text);
        assert_eq!(config.font_size_px, sample.font_size_px);
        assert_eq!(config.color, sample.color);
        assert_eq!(config.opacity, sample.opacity);
        assert_eq!(config.anchor, sample.anchor);
    }

    #[test]
    fn test_apply_preset_clears_drag_offset() {
        let mut config = WatermarkConfig {
            offset: Some(crate::watermark::Offset::new(120.0, 40.0)),
            ..WatermarkConfig::default()
        };
        apply_preset(&mut config, PresetId::DocumentCopy);
        assert_eq!(config.offset, None);
        assert_eq!(config.anchor, Anchor::BottomRight);
        assert_eq!(config.color.to_hex(), "#0066cc");
    }

    #[test]
    fn test_switching_presets_leaves_no_stale_fields() {
        let mut config = WatermarkConfig::default();
        apply_preset(&mut config, PresetId::Sample);
        apply_preset(&mut config, PresetId::IdentityVerification);

        let identity = PresetId::IdentityVerification.definition();
        assert_eq!(config.text, identity.text);
        assert_eq!(config.font_size_px, 20);
        assert_eq!(config.opacity, 0.6);
        assert_eq!(config.anchor, Anchor::Center);
    }
}
