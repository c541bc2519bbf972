//! Detections reported by the OCR collaborator and the value types they carry.

use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};

use crate::error::ResponseError;

/// An opaque 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Format as `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` or `rrggbb`, case-insensitive
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Sum of the three channels, used to rank darkness
    pub fn channel_sum(self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }

    pub fn to_color32(self) -> Color32 {
        Color32::from_rgb(self.r, self.g, self.b)
    }
}

impl From<RgbColor> for Color32 {
    fn from(color: RgbColor) -> Self {
        color.to_color32()
    }
}

/// Axis-aligned rectangle in source-image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Inclusive on all four edges
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Grow by `fraction` of the width on the left and right, and of the
    /// height on the top and bottom.
    pub fn expanded_by_fraction(&self, fraction: f32) -> Self {
        let dx = self.width * fraction;
        let dy = self.height * fraction;
        Self::new(
            self.x - dx,
            self.y - dy,
            self.width + dx * 2.0,
            self.height + dy * 2.0,
        )
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.x, self.y),
            egui::vec2(self.width, self.height),
        )
    }
}

/// One OCR-reported text region. Treated as immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub index: usize,
    #[serde(rename = "bbox")]
    pub polygon: Vec<[f32; 2]>,
    pub text: String,
    pub confidence: f32,
    pub text_color: RgbColor,
    pub bg_color: RgbColor,
    pub font_size: f32,
    pub bounds: BoundingBox,
}

impl Detection {
    /// Copy of this detection with freshly sampled colors
    pub fn with_colors(&self, bg_color: RgbColor, text_color: RgbColor) -> Self {
        Self {
            bg_color,
            text_color,
            ..self.clone()
        }
    }
}

/// Envelope the OCR collaborator wraps its detections in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub count: usize,
}

/// Parse the collaborator's JSON response into detections
pub fn parse_detection_response(json: &str) -> Result<Vec<Detection>, ResponseError> {
    let response: DetectionResponse = serde_json::from_str(json)?;
    if !response.success {
        log::warn!("Detection response reported failure");
        return Err(ResponseError::Unsuccessful);
    }
    if response.count != response.detections.len() {
        log::debug!(
            "Detection response count {} differs from {} detections received",
            response.count,
            response.detections.len()
        );
    }
    Ok(response.detections)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "success": true,
        "count": 1,
        "detections": [{
            "index": 3,
            "bbox": [[10, 10], [60, 10], [60, 30], [10, 30]],
            "text": "hello",
            "confidence": 0.92,
            "textColor": { "r": 0, "g": 0, "b": 255 },
            "bgColor": { "r": 255, "g": 255, "b": 255 },
            "fontSize": 18,
            "bounds": { "x": 10, "y": 10, "width": 50, "height": 20 }
        }]
    }"#;

    #[test]
    fn test_parse_response() {
        let detections = parse_detection_response(RESPONSE).unwrap();
        assert_eq!(detections.len(), 1);

        let detection = &detections[0];
        assert_eq!(detection.index, 3);
        assert_eq!(detection.polygon.len(), 4);
        assert_eq!(detection.text_color, RgbColor::new(0, 0, 255));
        assert_eq!(detection.bounds, BoundingBox::new(10.0, 10.0, 50.0, 20.0));
    }

    #[test]
    fn test_unsuccessful_response() {
        let result = parse_detection_response(r#"{ "success": false }"#);
        assert!(matches!(result, Err(ResponseError::Unsuccessful)));
    }

    #[test]
    fn test_malformed_response() {
        let result = parse_detection_response("{ not json");
        assert!(matches!(result, Err(ResponseError::Malformed(_))));
    }

    #[test]
    fn test_hex_conversion() {
        let color = RgbColor::new(18, 171, 255);
        assert_eq!(color.to_hex(), "#12abff");
        assert_eq!(RgbColor::from_hex("#12ABFF"), Some(color));
        assert_eq!(RgbColor::from_hex("12abff"), Some(color));
        assert_eq!(RgbColor::from_hex("#12ab"), None);
        assert_eq!(RgbColor::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_cover_expansion() {
        let bounds = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
        let cover = bounds.expanded_by_fraction(0.1);
        assert_eq!(cover, BoundingBox::new(0.0, 15.0, 120.0, 60.0));
        assert!(cover.contains(0.0, 15.0));
        assert!(cover.contains(120.0, 75.0));
        assert!(!cover.contains(120.5, 75.0));
    }
}
