use std::fmt;

use formats::{DesignError, DesignIssue, ElementKind};

/// Everything that can go wrong between a design document and a scene.
///
/// Only [`SceneError::InvalidAnchor`] and [`SceneError::InvalidDocument`]
/// abort a build. The rest reduce what is shown and are reported alongside
/// the scene that was built anyway.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    InvalidDocument {
        reason: String,
    },
    InvalidAnchor {
        lat_deg: f64,
        lon_deg: f64,
    },
    /// Building geometry cannot be synthesized. Other elements still render.
    InvalidFootprint {
        reason: String,
    },
    MalformedElement {
        element: ElementKind,
        index: Option<usize>,
        reason: String,
    },
    /// Embedded 3D is unsupported; the scene falls back to host-native 2D.
    RendererUnavailable {
        reason: String,
    },
    /// An external asset failed; a procedural placeholder is used instead.
    AssetLoadFailure {
        asset: String,
        reason: String,
    },
}

impl SceneError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SceneError::InvalidAnchor { .. } | SceneError::InvalidDocument { .. }
        )
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::InvalidDocument { reason } => {
                write!(f, "invalid design document: {reason}")
            }
            SceneError::InvalidAnchor { lat_deg, lon_deg } => {
                write!(f, "invalid anchor: lat={lat_deg} lon={lon_deg}")
            }
            SceneError::InvalidFootprint { reason } => write!(f, "invalid footprint: {reason}"),
            SceneError::MalformedElement {
                element,
                index: Some(index),
                reason,
            } => write!(f, "malformed {} #{index}: {reason}", element.as_str()),
            SceneError::MalformedElement {
                element,
                index: None,
                reason,
            } => write!(f, "malformed {}: {reason}", element.as_str()),
            SceneError::RendererUnavailable { reason } => {
                write!(f, "3D renderer unavailable: {reason}")
            }
            SceneError::AssetLoadFailure { asset, reason } => {
                write!(f, "asset {asset} failed to load: {reason}")
            }
        }
    }
}

impl std::error::Error for SceneError {}

impl From<DesignError> for SceneError {
    fn from(err: DesignError) -> Self {
        match err {
            DesignError::InvalidAnchor { lat_deg, lon_deg } => {
                SceneError::InvalidAnchor { lat_deg, lon_deg }
            }
            DesignError::Parse(e) => SceneError::InvalidDocument {
                reason: e.to_string(),
            },
        }
    }
}

impl From<&DesignIssue> for SceneError {
    fn from(issue: &DesignIssue) -> Self {
        match issue.element {
            ElementKind::Footprint => SceneError::InvalidFootprint {
                reason: issue.reason.clone(),
            },
            element => SceneError::MalformedElement {
                element,
                index: issue.index,
                reason: issue.reason.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SceneError;
    use formats::{Design, ElementKind};

    #[test]
    fn only_anchor_and_document_errors_are_fatal() {
        let anchor = Design::from_json_str("{}").map_err(SceneError::from).unwrap_err();
        assert!(anchor.is_fatal());
        assert!(matches!(anchor, SceneError::InvalidAnchor { .. }));

        let doc = Design::from_json_str("nope").map_err(SceneError::from).unwrap_err();
        assert!(doc.is_fatal());

        let bay = SceneError::MalformedElement {
            element: ElementKind::Bay,
            index: Some(3),
            reason: "rect missing".into(),
        };
        assert!(!bay.is_fatal());
        assert_eq!(bay.to_string(), "malformed bay #3: rect missing");
        assert!(!SceneError::RendererUnavailable { reason: "x".into() }.is_fatal());
    }
}
