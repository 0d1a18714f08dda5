use std::fmt;

use crate::symbology::LayerStyle;

macro_rules! host_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

host_id!(SourceId);
host_id!(LayerId);
host_id!(MarkerId);

/// Host-native renderer for a source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Fill,
    FillExtrusion,
    Line,
    Circle,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::FillExtrusion => "fill-extrusion",
            LayerKind::Line => "line",
            LayerKind::Circle => "circle",
        }
    }
}

/// A named style applied to one source.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: LayerId,
    pub source: SourceId,
    pub kind: LayerKind,
    pub style: LayerStyle,
}

impl LayerSpec {
    pub fn new(id: LayerId, source: SourceId, kind: LayerKind, style: LayerStyle) -> Self {
        Self {
            id,
            source,
            kind,
            style,
        }
    }
}
