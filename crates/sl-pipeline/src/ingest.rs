//! Source ingestion: extract → normalize → validate → merge

use crate::cancel::CancellationToken;
use crate::error::PipelineError;
use sl_ingest::{
    Extractor, ExtractorConfig, Field, Normalizer, TabularExtractor, TextExtractor, Validator,
};
use sl_store::{MergeOutcome, RecordStore};
use std::collections::BTreeMap;
use std::path::Path;

/// How to read an ingest source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Decoded document text, one record per line
    Text,
    /// CSV with a header row
    Csv,
}

impl SourceFormat {
    /// Guess from the file extension (`.csv` is tabular, anything else text)
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Text,
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "csv" | "tabular" => Ok(Self::Csv),
            other => Err(PipelineError::config(format!("unknown format '{other}'"))),
        }
    }
}

/// Outcome of one ingest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Non-blank lines (text) or data rows (CSV) in the source
    pub lines: usize,
    /// Candidates produced by extraction
    pub candidates: usize,
    /// Candidates that passed validation
    pub accepted: usize,
    /// Rejections per field name
    pub rejected_by_field: BTreeMap<&'static str, usize>,
    /// Store merge statistics
    pub merge: MergeOutcome,
}

impl IngestReport {
    /// Total rejected candidates
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected_by_field.values().sum()
    }
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ingest complete")?;
        writeln!(f, "  Lines:      {}", self.lines)?;
        writeln!(f, "  Candidates: {}", self.candidates)?;
        writeln!(f, "  Accepted:   {}", self.accepted)?;
        writeln!(f, "  Rejected:   {}", self.rejected())?;
        for (field, count) in &self.rejected_by_field {
            writeln!(f, "    {field}: {count}")?;
        }
        write!(
            f,
            "  Store:      {} appended, {} updated, {} preserved",
            self.merge.appended, self.merge.updated, self.merge.preserved
        )
    }
}

/// Ingest `source` into `store`
///
/// # Errors
/// - `MissingInput` if `source` does not exist
/// - `Ingest` if the source cannot be parsed as `format`
/// - `Cancelled` if cancellation was requested before the merge
/// - store errors from the merge
pub fn ingest_source(
    source: &Path,
    format: SourceFormat,
    extractor_config: ExtractorConfig,
    store: &RecordStore,
    cancel: &CancellationToken,
) -> Result<IngestReport, PipelineError> {
    let text = std::fs::read_to_string(source).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PipelineError::MissingInput(source.to_path_buf()),
        _ => PipelineError::UnreadableInput {
            path: source.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    let extractor: Box<dyn Extractor> = match format {
        SourceFormat::Text => Box::new(TextExtractor::new(extractor_config)?),
        SourceFormat::Csv => Box::new(TabularExtractor::new(extractor_config)),
    };
    tracing::info!(source = %source.display(), extractor = extractor.name(), "ingesting");

    let non_blank = text.lines().filter(|l| !l.trim().is_empty()).count();
    let lines = match format {
        SourceFormat::Text => non_blank,
        SourceFormat::Csv => non_blank.saturating_sub(1),
    };

    let candidates = extractor.extract(&text)?;
    let normalized = Normalizer::new().normalize_all(candidates);
    let validation = Validator::new().validate_all(&normalized);

    let mut report = IngestReport {
        lines,
        candidates: normalized.len(),
        accepted: validation.accepted.len(),
        ..IngestReport::default()
    };
    for field in Field::REQUIRED {
        let count = validation.rejected_on(field);
        if count > 0 {
            report.rejected_by_field.insert(field.as_str(), count);
        }
    }

    if cancel.is_cancelled() {
        tracing::warn!("ingest cancelled before merge; store untouched");
        return Err(PipelineError::Cancelled);
    }

    report.merge = store.merge(validation.accepted)?;
    tracing::info!(
        candidates = report.candidates,
        accepted = report.accepted,
        rejected = report.rejected(),
        appended = report.merge.appended,
        "ingest finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config() -> ExtractorConfig {
        ExtractorConfig::new()
            .with_localities(["Niskayuna"])
            .with_default_town("Niskayuna")
            .with_as_of(NaiveDate::from_ymd_opt(2025, 4, 29).unwrap())
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            SourceFormat::detect(Path::new("rows.CSV")),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::detect(Path::new("inventory.txt")),
            SourceFormat::Text
        );
        assert_eq!("csv".parse::<SourceFormat>().unwrap(), SourceFormat::Csv);
        assert!("pdf".parse::<SourceFormat>().is_err());
    }

    #[test]
    fn missing_source_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("markers.json"));
        let err = ingest_source(
            &dir.path().join("absent.txt"),
            SourceFormat::Text,
            config(),
            &store,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
        assert!(err.is_fatal());
        assert!(!store.path().exists());
    }

    #[test]
    fn text_source_counts_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("inventory.txt");
        std::fs::write(
            &source,
            "Service Line Inventory\n\
             671 ACORN DRIVE Niskayuna 12309 Copper Copper\n\
             45 VAN ANTWERP ROAD Lead\n",
        )
        .unwrap();
        let store = RecordStore::new(dir.path().join("markers.json"));

        let token = CancellationToken::new();
        let report = ingest_source(&source, SourceFormat::Text, config(), &store, &token).unwrap();

        assert_eq!(report.lines, 3);
        assert_eq!(report.candidates, 2);
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected_by_field.get("zip"), Some(&1));
        assert_eq!(report.merge.appended, 1);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn cancelled_ingest_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("rows.csv");
        std::fs::write(&source, "street address,town,zip\n1 A St,Example,12309\n").unwrap();
        let store = RecordStore::new(dir.path().join("markers.json"));
        let token = CancellationToken::new();
        token.cancel();

        let err = ingest_source(&source, SourceFormat::Csv, config(), &store, &token).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
        assert!(!store.path().exists());
    }
}
