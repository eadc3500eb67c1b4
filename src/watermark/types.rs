use image::{DynamicImage, ImageFormat, Rgba};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::presets::PresetId;

pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 100;

/// Whether the watermark text comes from the preset table or from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkMode {
    #[default]
    Preset,
    Custom,
}

impl WatermarkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatermarkMode::Preset => "preset",
            WatermarkMode::Custom => "custom",
        }
    }
}

impl FromStr for WatermarkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preset" => Ok(WatermarkMode::Preset),
            "custom" => Ok(WatermarkMode::Custom),
            other => Err(format!("unknown watermark type: {}", other)),
        }
    }
}

/// Named placement rule used when no drag offset is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }

    /// Parse an anchor name, falling back to bottom-right for anything unknown
    pub fn from_name_or_default(name: &str) -> Anchor {
        name.parse().unwrap_or_default()
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Anchor::ALL
            .iter()
            .copied()
            .find(|anchor| anchor.as_str() == s)
            .ok_or_else(|| format!("unknown anchor: {}", s))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RGB watermark color, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Pixel value with the given alpha in [0, 1]
    pub fn with_alpha(&self, alpha: f32) -> Rgba<u8> {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([self.r, self.g, self.b, a])
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color: {}", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("invalid color: {}", e))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Top-left corner of the watermark's bounding box, set by dragging
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// A zero offset means "not set" and anchor placement applies.
    pub fn is_unset(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn scaled(&self, factor: f32) -> Offset {
        Offset::new(self.x * factor, self.y * factor)
    }
}

/// Advance width and line height of a measured string
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
}

impl TextMetrics {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    pub mode: WatermarkMode,
    pub preset_id: PresetId,
    pub text: String,
    pub anchor: Anchor,
    #[serde(default)]
    pub offset: Option<Offset>,
    pub opacity: f32,
    pub font_size_px: u32,
    pub color: Color,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        let preset = PresetId::default().definition();
        Self {
            mode: WatermarkMode::Preset,
            preset_id: PresetId::default(),
            text: preset.text.to_string(),
            anchor: Anchor::BottomRight,
            offset: None,
            opacity: 0.5,
            font_size_px: 24,
            color: Color::rgb(0xff, 0x00, 0x00),
        }
    }
}

impl WatermarkConfig {
    /// Custom-text configuration with the default style
    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            mode: WatermarkMode::Custom,
            text: text.into(),
            ..Self::default()
        }
    }

    /// The drag offset, if one is in effect
    pub fn effective_offset(&self) -> Option<Offset> {
        self.offset.filter(|offset| !offset.is_unset())
    }

    pub fn clamped_font_size(&self) -> u32 {
        self.font_size_px.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    }

    pub fn clamped_opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            return 0.0;
        }
        self.opacity.clamp(0.0, 1.0)
    }

    /// Switch to a new anchor and forget any drag offset
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
        self.offset = None;
    }

    /// Store the rendered bounding box origin so the next drag continues from it
    pub fn pin_to(&mut self, geometry: &WatermarkGeometry) {
        if geometry.is_empty() {
            return;
        }
        self.offset = Some(Offset::new(geometry.bounding_box.x, geometry.bounding_box.y));
    }
}

/// Where the watermark lands on a canvas. Recomputed on every render.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WatermarkGeometry {
    pub anchor_point: Point,
    pub bounding_box: Rect,
}

impl WatermarkGeometry {
    pub const EMPTY: WatermarkGeometry = WatermarkGeometry {
        anchor_point: Point { x: 0.0, y: 0.0 },
        bounding_box: Rect::ZERO,
    };

    pub fn is_empty(&self) -> bool {
        self.bounding_box.is_empty()
    }
}

/// A decoded image together with its preview sizing
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
    pub original_width: u32,
    pub original_height: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub scale_factor: f32,
}

impl ImageSource {
    pub fn new(
        image: DynamicImage,
        format: Option<ImageFormat>,
        display_width: u32,
        display_height: u32,
    ) -> Self {
        let original_width = image.width();
        let original_height = image.height();
        let mut source = Self {
            image,
            format,
            original_width,
            original_height,
            display_width: 0,
            display_height: 0,
            scale_factor: 1.0,
        };
        source.set_display_size(display_width, display_height);
        source
    }

    /// Resize the preview. The scale factor always comes from the original width.
    pub fn set_display_size(&mut self, display_width: u32, display_height: u32) {
        self.display_width = display_width;
        self.display_height = display_height;
        self.scale_factor = if self.original_width == 0 {
            1.0
        } else {
            display_width as f32 / self.original_width as f32
        };
    }
}
