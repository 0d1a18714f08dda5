/// Where a layer takes its colour from.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// `#rrggbb`.
    Fixed(String),
    /// Read per feature from a string property.
    Attribute(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    pub color: Paint,
    pub opacity: f32,
    /// Line width or circle radius, in pixels.
    pub size_px: f32,
}

impl LayerStyle {
    pub fn new(color: Paint, opacity: f32, size_px: f32) -> Self {
        Self {
            visible: true,
            color,
            opacity,
            size_px,
        }
    }

    /// Colour read from each feature's `color` property.
    pub fn by_attribute(opacity: f32, size_px: f32) -> Self {
        Self::new(Paint::Attribute("color"), opacity, size_px)
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            color: Paint::Fixed("#ffffff".to_string()),
            opacity: 1.0,
            size_px: 1.0,
        }
    }
}
