//! Free-text canonicalization and material alias resolution

use crate::candidate::CandidateRecord;
use sha2::{Digest, Sha256};
use sl_record::Material;

/// Collapse whitespace and strip punctuation other than `,` `.` `-`
///
/// Applied to every raw line before pattern matching and to address and
/// locality fields during normalization.
#[must_use]
pub fn canonical_text(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | ',' | '.' | '-')
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map an arbitrary material spelling onto the fixed vocabulary
///
/// Case-insensitive; abbreviations are accepted. Anything unrecognized maps
/// to [`Material::Unknown`] rather than failing.
#[must_use]
pub fn normalize_material(raw: &str) -> Material {
    let token = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_ascii_lowercase();

    match token.as_str() {
        "lead" | "ld" | "pb" => Material::Lead,
        "copper" | "cu" | "cop" => Material::Copper,
        "galvanized" | "galvanised" | "galv" | "gs" | "galvanized steel" => Material::Galvanized,
        "plastic" | "plast" | "pvc" | "pe" | "hdpe" | "pex" | "poly" | "polyethylene" => {
            Material::Plastic
        }
        _ => Material::Unknown,
    }
}

/// Deterministic identifier derived from address and postal code
///
/// Re-ingesting the same source yields the same ids, so merges update in
/// place instead of duplicating.
#[must_use]
pub fn stable_id(address: &str, zip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_text(address).to_lowercase().as_bytes());
    hasher.update([0]);
    hasher.update(zip.trim().as_bytes());
    let digest = hasher.finalize();
    format!("sl-{}", &hex::encode(digest)[..12])
}

fn normalize_zip(raw: &str) -> String {
    let trimmed = raw.trim();
    // ZIP+4 collapses to the five-digit prefix
    match trimmed.split_once('-') {
        Some((head, tail))
            if head.len() == 5
                && tail.len() == 4
                && head.bytes().chain(tail.bytes()).all(|b| b.is_ascii_digit()) =>
        {
            head.to_string()
        }
        _ => trimmed.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Canonicalizes candidate fields ahead of validation
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Create normalizer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Normalize one candidate
    ///
    /// Absent fields stay absent so the validator can name them; present
    /// material tokens always land in the vocabulary.
    #[must_use]
    pub fn normalize(&self, candidate: CandidateRecord) -> CandidateRecord {
        let address = non_blank(candidate.address.as_deref().map(canonical_text));
        let town = non_blank(candidate.town.as_deref().map(canonical_text));
        let zip = non_blank(candidate.zip.as_deref().map(normalize_zip));
        let private_type = candidate
            .private_type
            .as_deref()
            .map(|m| normalize_material(m).as_str().to_string());
        let public_type = candidate
            .public_type
            .as_deref()
            .map(|m| normalize_material(m).as_str().to_string());

        let id = non_blank(candidate.id.map(|id| id.trim().to_string())).or_else(|| {
            address
                .as_deref()
                .map(|a| stable_id(a, zip.as_deref().unwrap_or_default()))
        });

        CandidateRecord {
            id,
            address,
            town,
            zip,
            private_type,
            public_type,
            last_verified: candidate.last_verified.map(|d| d.trim().to_string()),
            ..candidate
        }
    }

    /// Normalize a sequence of candidates
    pub fn normalize_all(
        &self,
        candidates: impl IntoIterator<Item = CandidateRecord>,
    ) -> Vec<CandidateRecord> {
        candidates.into_iter().map(|c| self.normalize(c)).collect()
    }
}
