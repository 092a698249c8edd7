//! Candidate extraction from document text and tabular exports
//!
//! Text extraction matches each canonicalized line against a strict
//! primary pattern (street number, street, locality, zip, two materials)
//! and then a permissive fallback where everything after the street is
//! optional. Lines matching neither are dropped: extraction failure is
//! exclusion, never an error.

use crate::candidate::{CandidateRecord, MatchKind};
use crate::error::IngestError;
use crate::normalizer::canonical_text;
use chrono::{NaiveDate, Utc};
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Intrinsic confidence for full primary-pattern matches and tabular rows
pub const PRIMARY_CONFIDENCE: f64 = 0.8;

/// Intrinsic confidence for partial fallback-pattern matches
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Material tokens recognised inside document text, longest first so the
/// alternation prefers full words over their abbreviations
const MATERIAL_TOKENS: &[&str] = &[
    "polyethylene",
    "galvanized",
    "galvanised",
    "plastic",
    "unknown",
    "copper",
    "plast",
    "lead",
    "galv",
    "hdpe",
    "poly",
    "pvc",
    "pex",
    "cu",
    "ld",
];

/// Source-to-candidate extraction
pub trait Extractor: Send + Sync + std::fmt::Debug {
    /// Extract every recognisable candidate from `input`
    ///
    /// # Errors
    /// Only for source-level problems (unreadable table, missing column);
    /// individual unmatched lines or rows are dropped silently.
    fn extract(&self, input: &str) -> Result<Vec<CandidateRecord>, IngestError>;

    /// Extractor name (for logging)
    fn name(&self) -> &'static str;
}

/// Extraction settings shared by text and tabular extractors
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Locality names the primary pattern recognises between street and zip
    pub localities: Vec<String>,
    /// Town assigned when a fallback match carries none
    pub default_town: Option<String>,
    /// Zip assigned when a fallback match carries none
    pub default_zip: Option<String>,
    /// Lines this short or shorter are ignored
    pub min_line_len: usize,
    /// Date stamped into `last_verified` for new candidates
    pub as_of: NaiveDate,
}

impl ExtractorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With recognised localities
    #[must_use]
    pub fn with_localities<I, S>(mut self, localities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.localities = localities.into_iter().map(Into::into).collect();
        self
    }

    /// With fallback town
    #[inline]
    #[must_use]
    pub fn with_default_town(mut self, town: impl Into<String>) -> Self {
        self.default_town = Some(town.into());
        self
    }

    /// With fallback zip
    #[inline]
    #[must_use]
    pub fn with_default_zip(mut self, zip: impl Into<String>) -> Self {
        self.default_zip = Some(zip.into());
        self
    }

    /// With verification date
    #[inline]
    #[must_use]
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = date;
        self
    }

    fn as_of_string(&self) -> String {
        self.as_of.format("%Y-%m-%d").to_string()
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            localities: Vec::new(),
            default_town: None,
            default_zip: None,
            min_line_len: 10,
            as_of: Utc::now().date_naive(),
        }
    }
}

/// Pattern-based extractor for decoded document text (one record per line)
#[derive(Debug, Clone)]
pub struct TextExtractor {
    config: ExtractorConfig,
    primary: Regex,
    fallback: Regex,
}

impl TextExtractor {
    /// Compile patterns for the given configuration
    ///
    /// # Errors
    /// `IngestError::Pattern` if the locality alternation fails to compile
    pub fn new(config: ExtractorConfig) -> Result<Self, IngestError> {
        let materials = MATERIAL_TOKENS.join("|");
        let town = if config.localities.is_empty() {
            "(?P<town>)".to_string()
        } else {
            let mut names: Vec<String> = config
                .localities
                .iter()
                .map(|l| regex::escape(l.trim()))
                .collect();
            names.sort_by_key(|n| std::cmp::Reverse(n.len()));
            format!(r"(?:,\s*|\s+)(?P<town>{})", names.join("|"))
        };
        let street = r"(?P<number>\d+)\s+(?P<street>[a-z][a-z0-9\s.\-]*?)";

        let primary = Regex::new(&format!(
            r"(?i)^{street}{town},?\s+(?P<zip>\d{{5}})\s*(?P<private>{materials})\s*(?P<public>{materials})$"
        ))?;
        // Materials start a new word unless they run on directly from the zip
        let fallback = Regex::new(&format!(
            r"(?i)^{street}(?:{town})?(?:(?:,?\s*(?P<zip>\d{{5}})|,?\s)\s*(?P<private>{materials})?(?:\s*(?P<public>{materials}))?)?\s*$"
        ))?;

        Ok(Self {
            config,
            primary,
            fallback,
        })
    }

    /// Extract candidate from a single raw line
    #[must_use]
    pub fn extract_line(&self, raw: &str) -> Option<CandidateRecord> {
        let line = canonical_text(raw);
        if line.len() <= self.config.min_line_len {
            return None;
        }

        if let Some(caps) = self.primary.captures(&line) {
            return Some(self.candidate(&caps, MatchKind::Primary));
        }

        let caps = self.fallback.captures(&line)?;
        Some(self.candidate(&caps, MatchKind::Fallback))
    }

    fn candidate(&self, caps: &Captures<'_>, kind: MatchKind) -> CandidateRecord {
        let group = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let address = format!(
            "{} {}",
            group("number").unwrap_or_default(),
            group("street").unwrap_or_default()
        );
        let town = group("town").or_else(|| self.config.default_town.clone());
        let zip = group("zip").or_else(|| self.config.default_zip.clone());
        let private = group("private").unwrap_or_else(|| "unknown".to_string());
        let public = group("public").unwrap_or_else(|| "unknown".to_string());
        let confidence = match kind {
            MatchKind::Fallback => FALLBACK_CONFIDENCE,
            MatchKind::Primary | MatchKind::Tabular => PRIMARY_CONFIDENCE,
        };

        CandidateRecord {
            town,
            zip,
            ..CandidateRecord::new(kind)
                .with_address(address)
                .with_materials(private, public)
                .with_verification(false, confidence, self.config.as_of_string())
        }
    }
}

impl Extractor for TextExtractor {
    fn extract(&self, input: &str) -> Result<Vec<CandidateRecord>, IngestError> {
        let mut candidates = Vec::new();
        let mut dropped = 0usize;

        for raw in input.lines().filter(|l| !l.trim().is_empty()) {
            match self.extract_line(raw) {
                Some(candidate) => candidates.push(candidate),
                None => dropped += 1,
            }
        }

        tracing::debug!(
            extracted = candidates.len(),
            dropped,
            "text extraction complete"
        );
        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

/// Column roles recognised in tabular exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Id,
    Address,
    Town,
    Zip,
    Private,
    Public,
    Verified,
    Confidence,
    LastVerified,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let key = header
            .trim()
            .trim_matches('"')
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        match key.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "id" => Some(Self::Id),
            "street address" | "address" => Some(Self::Address),
            "town" | "city" | "locality" => Some(Self::Town),
            "zip" | "zip code" | "postal code" => Some(Self::Zip),
            "private side" | "private type" => Some(Self::Private),
            "road side" | "public side" | "public type" => Some(Self::Public),
            "verified" => Some(Self::Verified),
            "confidence" => Some(Self::Confidence),
            "last verified" => Some(Self::LastVerified),
            _ => None,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// Extractor for CSV exports with a header row
#[derive(Debug, Clone)]
pub struct TabularExtractor {
    config: ExtractorConfig,
}

impl TabularExtractor {
    /// Create tabular extractor
    #[inline]
    #[must_use]
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn row_candidate(
        &self,
        row: &csv::StringRecord,
        columns: &HashMap<Column, usize>,
    ) -> CandidateRecord {
        let cell = |col: Column| {
            columns
                .get(&col)
                .and_then(|&i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let verified = cell(Column::Verified).is_some_and(|v| is_truthy(&v));
        let confidence = cell(Column::Confidence)
            .and_then(|c| c.parse::<f64>().ok())
            .unwrap_or(PRIMARY_CONFIDENCE);
        let last_verified =
            cell(Column::LastVerified).unwrap_or_else(|| self.config.as_of_string());

        CandidateRecord {
            id: cell(Column::Id),
            address: cell(Column::Address),
            town: cell(Column::Town).or_else(|| self.config.default_town.clone()),
            zip: cell(Column::Zip),
            private_type: Some(cell(Column::Private).unwrap_or_else(|| "unknown".into())),
            public_type: Some(cell(Column::Public).unwrap_or_else(|| "unknown".into())),
            verified: Some(verified),
            confidence: Some(confidence),
            last_verified: Some(last_verified),
            match_kind: MatchKind::Tabular,
        }
    }
}

impl Extractor for TabularExtractor {
    fn extract(&self, input: &str) -> Result<Vec<CandidateRecord>, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input.as_bytes());

        let mut columns = HashMap::new();
        for (index, header) in reader.headers()?.iter().enumerate() {
            if let Some(col) = Column::from_header(header) {
                columns.entry(col).or_insert(index);
            }
        }
        if !columns.contains_key(&Column::Address) {
            return Err(IngestError::MissingColumn("street address"));
        }

        let mut candidates = Vec::new();
        for (line, row) in reader.records().enumerate() {
            match row {
                Ok(row) => candidates.push(self.row_candidate(&row, &columns)),
                Err(e) => tracing::warn!(row = line + 1, error = %e, "dropping unreadable row"),
            }
        }

        tracing::debug!(extracted = candidates.len(), "tabular extraction complete");
        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "tabular"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ExtractorConfig {
        ExtractorConfig::new()
            .with_localities(["Niskayuna"])
            .with_default_town("Niskayuna")
            .with_as_of(NaiveDate::from_ymd_opt(2025, 4, 29).unwrap())
    }

    #[test]
    fn primary_pattern_full_line() {
        let ex = TextExtractor::new(config()).unwrap();
        let c = ex.extract_line("671 ACORN DRIVE Niskayuna  12309 Copper Copper").unwrap();

        assert_eq!(c.match_kind, MatchKind::Primary);
        assert_eq!(c.address.as_deref(), Some("671 ACORN DRIVE"));
        assert_eq!(c.town.as_deref(), Some("Niskayuna"));
        assert_eq!(c.zip.as_deref(), Some("12309"));
        assert_eq!(c.private_type.as_deref(), Some("Copper"));
        assert_eq!(c.public_type.as_deref(), Some("Copper"));
        assert_eq!(c.confidence, Some(PRIMARY_CONFIDENCE));
        assert_eq!(c.last_verified.as_deref(), Some("2025-04-29"));
    }

    #[test]
    fn primary_pattern_run_together_tokens() {
        let ex = TextExtractor::new(config()).unwrap();
        let c = ex
            .extract_line("12 BALLTOWN ROAD Niskayuna 12309LeadGalvanized")
            .unwrap();
        assert_eq!(c.match_kind, MatchKind::Primary);
        assert_eq!(c.private_type.as_deref(), Some("Lead"));
        assert_eq!(c.public_type.as_deref(), Some("Galvanized"));
    }

    #[test]
    fn fallback_pattern_partial_line() {
        let ex = TextExtractor::new(config()).unwrap();
        let c = ex.extract_line("2210 RIVER ROAD 12309 Lead").unwrap();

        assert_eq!(c.match_kind, MatchKind::Fallback);
        assert_eq!(c.address.as_deref(), Some("2210 RIVER ROAD"));
        assert_eq!(c.town.as_deref(), Some("Niskayuna"));
        assert_eq!(c.zip.as_deref(), Some("12309"));
        assert_eq!(c.private_type.as_deref(), Some("Lead"));
        assert_eq!(c.public_type.as_deref(), Some("unknown"));
        assert_eq!(c.confidence, Some(FALLBACK_CONFIDENCE));
    }

    #[test]
    fn fallback_without_zip_leaves_zip_absent() {
        let ex = TextExtractor::new(config()).unwrap();
        let c = ex.extract_line("45 VAN ANTWERP ROAD").unwrap();
        assert_eq!(c.match_kind, MatchKind::Fallback);
        assert_eq!(c.zip, None);
    }

    #[test]
    fn fallback_keeps_whole_street_words() {
        let ex = TextExtractor::new(config()).unwrap();

        let c = ex.extract_line("12 GREENFIELD Copper").unwrap();
        assert_eq!(c.address.as_deref(), Some("12 GREENFIELD"));
        assert_eq!(c.private_type.as_deref(), Some("Copper"));
        assert_eq!(c.public_type.as_deref(), Some("unknown"));

        let c = ex.extract_line("88 WESTFIELD LEAD").unwrap();
        assert_eq!(c.address.as_deref(), Some("88 WESTFIELD"));
        assert_eq!(c.private_type.as_deref(), Some("LEAD"));
        assert_eq!(c.public_type.as_deref(), Some("unknown"));

        let c = ex.extract_line("5 OLD GOLD ROAD 12309 Cu").unwrap();
        assert_eq!(c.address.as_deref(), Some("5 OLD GOLD ROAD"));
        assert_eq!(c.private_type.as_deref(), Some("Cu"));
    }

    #[test]
    fn fallback_without_materials_keeps_address() {
        let ex = TextExtractor::new(config()).unwrap();
        let c = ex.extract_line("88 WESTFIELD").unwrap();
        assert_eq!(c.address.as_deref(), Some("88 WESTFIELD"));
        assert_eq!(c.private_type.as_deref(), Some("unknown"));
    }

    #[test]
    fn commas_before_locality_and_zip() {
        let ex = TextExtractor::new(config()).unwrap();

        let c = ex
            .extract_line("671 ACORN DRIVE, Niskayuna 12309 Copper Copper")
            .unwrap();
        assert_eq!(c.match_kind, MatchKind::Primary);
        assert_eq!(c.address.as_deref(), Some("671 ACORN DRIVE"));
        assert_eq!(c.town.as_deref(), Some("Niskayuna"));

        let c = ex
            .extract_line("671 ACORN DRIVE, Niskayuna, 12309 Copper Copper")
            .unwrap();
        assert_eq!(c.match_kind, MatchKind::Primary);
        assert_eq!(c.zip.as_deref(), Some("12309"));

        let c = ex.extract_line("2210 RIVER ROAD, 12309 Lead").unwrap();
        assert_eq!(c.match_kind, MatchKind::Fallback);
        assert_eq!(c.address.as_deref(), Some("2210 RIVER ROAD"));
        assert_eq!(c.zip.as_deref(), Some("12309"));
    }

    #[test]
    fn non_matching_lines_are_dropped() {
        let ex = TextExtractor::new(config()).unwrap();
        let text = [
            "Service Line Inventory",
            "Page 1 of 40",
            "",
            "671 ACORN DRIVE Niskayuna 12309 Copper Copper",
            "short",
        ]
        .join("\n");
        let candidates = ex.extract(&text).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn tabular_rows_map_headers() {
        let csv = "\"street address\",\"town\",\"zip\",\"road side\",\"private side\"\n\
                   \"123 Main St\",\"Example\",\"12309\",\"PVC\",\"Cu\"\n\
                   \"9 Elm Ave\",\"Example\",\"\",\"Lead\",\"Lead\"\n";
        let ex = TabularExtractor::new(config());
        let rows = ex.extract(csv).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].address.as_deref(), Some("123 Main St"));
        assert_eq!(rows[0].private_type.as_deref(), Some("Cu"));
        assert_eq!(rows[0].public_type.as_deref(), Some("PVC"));
        assert_eq!(rows[0].match_kind, MatchKind::Tabular);
        assert_eq!(rows[1].zip, None);
    }

    #[test]
    fn tabular_requires_address_column() {
        let ex = TabularExtractor::new(config());
        let err = ex.extract("town,zip\nExample,12309\n").unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(_)));
    }
}
