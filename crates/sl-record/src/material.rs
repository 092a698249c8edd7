//! Fixed pipe-material vocabulary

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Pipe material on one side of a service line
///
/// Serialized as the lowercase canonical name. Decoding is strict: only the
/// five canonical names are accepted. Alias resolution (`Cu`, `PVC`, ...)
/// belongs to the ingest normalizer, not to the model.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    /// Lead pipe
    Lead,
    /// Copper pipe
    Copper,
    /// Galvanized steel pipe
    Galvanized,
    /// Any plastic (PVC, PE, ...)
    Plastic,
    /// Not determined
    #[default]
    Unknown,
}

impl Material {
    /// Every member of the vocabulary
    pub const ALL: [Material; 5] = [
        Material::Lead,
        Material::Copper,
        Material::Galvanized,
        Material::Plastic,
        Material::Unknown,
    ];

    /// Canonical lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Lead => "lead",
            Material::Copper => "copper",
            Material::Galvanized => "galvanized",
            Material::Plastic => "plastic",
            Material::Unknown => "unknown",
        }
    }

    /// Whether this side still needs field investigation
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Material::Unknown)
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RecordError::UnknownMaterial(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for m in Material::ALL {
            assert_eq!(m.as_str().parse::<Material>().unwrap(), m);
        }
    }

    #[test]
    fn strict_parse_rejects_aliases() {
        assert!("Cu".parse::<Material>().is_err());
        assert!("COPPER".parse::<Material>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Material::Galvanized).unwrap();
        assert_eq!(json, "\"galvanized\"");
        assert!(serde_json::from_str::<Material>("\"pvc\"").is_err());
    }
}
