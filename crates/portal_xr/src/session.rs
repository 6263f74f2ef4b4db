//! Session request descriptors

use serde::{Deserialize, Serialize};

/// XR session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    /// Non-immersive, rendered in page
    Inline,
    /// Fully immersive VR
    ImmersiveVr,
    /// Immersive AR (passthrough)
    ImmersiveAr,
}

impl SessionMode {
    /// WebXR session mode string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::ImmersiveVr => "immersive-vr",
            Self::ImmersiveAr => "immersive-ar",
        }
    }

    pub fn is_immersive(&self) -> bool {
        !matches!(self, Self::Inline)
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Features a session can be requested with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionFeature {
    /// Compositor layers (quad, media and projection layers)
    Layers,
    Local,
    LocalFloor,
    HandTracking,
}

impl SessionFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Layers => "layers",
            Self::Local => "local",
            Self::LocalFloor => "local-floor",
            Self::HandTracking => "hand-tracking",
        }
    }
}

/// Required and optional features of a session request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInit {
    pub required_features: Vec<SessionFeature>,
    pub optional_features: Vec<SessionFeature>,
}

impl SessionInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, feature: SessionFeature) -> Self {
        if !self.required_features.contains(&feature) {
            self.required_features.push(feature);
        }
        self
    }

    pub fn optional(mut self, feature: SessionFeature) -> Self {
        if !self.optional_features.contains(&feature) {
            self.optional_features.push(feature);
        }
        self
    }

    /// True if the feature is requested either way
    pub fn requests(&self, feature: SessionFeature) -> bool {
        self.required_features.contains(&feature) || self.optional_features.contains(&feature)
    }
}

/// Reference space types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpaceType {
    Viewer,
    Local,
    LocalFloor,
    BoundedFloor,
    Unbounded,
}

impl ReferenceSpaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Local => "local",
            Self::LocalFloor => "local-floor",
            Self::BoundedFloor => "bounded-floor",
            Self::Unbounded => "unbounded",
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The application asked for it
    User,
    /// The runtime ended it (headset removed, system menu, ...)
    Platform,
    /// The runtime failed
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_strings() {
        assert_eq!(SessionMode::ImmersiveAr.as_str(), "immersive-ar");
        assert_eq!(SessionMode::ImmersiveVr.to_string(), "immersive-vr");
        assert!(!SessionMode::Inline.is_immersive());
    }

    #[test]
    fn test_init_builder_dedups() {
        let init = SessionInit::new()
            .require(SessionFeature::LocalFloor)
            .require(SessionFeature::LocalFloor)
            .optional(SessionFeature::Layers);
        assert_eq!(init.required_features.len(), 1);
        assert!(init.requests(SessionFeature::Layers));
        assert!(!init.requests(SessionFeature::HandTracking));
    }
}
