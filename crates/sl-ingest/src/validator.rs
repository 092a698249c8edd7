//! Schema enforcement for normalized candidates
//!
//! A candidate is admissible iff every required field is present, `zip` is
//! exactly five digits, both materials are in the fixed vocabulary, the
//! confidence lies in `[0, 1]` and the verification date is `YYYY-MM-DD`.

use crate::candidate::CandidateRecord;
use crate::error::{Field, SchemaViolation};
use chrono::NaiveDate;
use sl_record::{Confidence, Material, RecordError, RecordId, ServiceLineRecord, ZipCode};

/// Validation outcome for a whole batch of candidates
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Admissible records, in input order
    pub accepted: Vec<ServiceLineRecord>,
    /// Input index and violation for every rejected candidate
    pub rejected: Vec<(usize, SchemaViolation)>,
}

impl ValidationReport {
    /// Number of rejections naming `field`
    #[must_use]
    pub fn rejected_on(&self, field: Field) -> usize {
        self.rejected
            .iter()
            .filter(|(_, v)| v.field == field)
            .count()
    }
}

/// Record schema validator
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate one candidate
    ///
    /// Fields are checked in [`Field::REQUIRED`] order; presence and format
    /// are checked together so the error names the *first* bad field.
    ///
    /// # Errors
    /// [`SchemaViolation`] naming the first missing or invalid field
    pub fn validate(
        &self,
        candidate: &CandidateRecord,
    ) -> Result<ServiceLineRecord, SchemaViolation> {
        let id = required(&candidate.id, Field::Id)?;
        let id = RecordId::new(id).map_err(invalid(Field::Id))?;

        let address = required(&candidate.address, Field::Address)?.to_string();
        let town = candidate
            .town
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let zip = required(&candidate.zip, Field::Zip)?;
        let zip = ZipCode::parse(zip).map_err(invalid(Field::Zip))?;

        let private_type = material(&candidate.private_type, Field::PrivateType)?;
        let public_type = material(&candidate.public_type, Field::PublicType)?;

        let verified = candidate
            .verified
            .ok_or_else(|| SchemaViolation::missing(Field::Verified))?;

        let confidence = candidate
            .confidence
            .ok_or_else(|| SchemaViolation::missing(Field::Confidence))?;
        let confidence = Confidence::new(confidence).map_err(invalid(Field::Confidence))?;

        let raw_date = required(&candidate.last_verified, Field::LastVerified)?;
        let Some(last_verified) = parse_iso_date(raw_date) else {
            return Err(SchemaViolation::invalid(Field::LastVerified, raw_date));
        };

        Ok(ServiceLineRecord {
            id,
            address,
            town,
            zip,
            private_type,
            public_type,
            verified,
            confidence,
            last_verified,
            position: None,
            geocode_source: None,
            geocode_confidence: None,
        })
    }

    /// Validate a batch, skipping and logging inadmissible candidates
    ///
    /// A violation removes exactly one candidate; the batch always completes.
    pub fn validate_all<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a CandidateRecord>,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        for (index, candidate) in candidates.into_iter().enumerate() {
            match self.validate(candidate) {
                Ok(record) => report.accepted.push(record),
                Err(violation) => {
                    tracing::warn!(
                        index,
                        address = candidate.address.as_deref().unwrap_or("<none>"),
                        field = %violation.field,
                        "skipping candidate: {}",
                        violation.reason
                    );
                    report.rejected.push((index, violation));
                }
            }
        }
        tracing::debug!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "validation complete"
        );
        report
    }
}

fn required(value: &Option<String>, field: Field) -> Result<&str, SchemaViolation> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SchemaViolation::missing(field)),
    }
}

fn invalid(field: Field) -> impl Fn(RecordError) -> SchemaViolation {
    move |e| SchemaViolation::invalid(field, e.to_string())
}

fn material(value: &Option<String>, field: Field) -> Result<Material, SchemaViolation> {
    required(value, field)?
        .parse::<Material>()
        .map_err(invalid(field))
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    // Strict YYYY-MM-DD; chrono alone would accept unpadded components
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::MatchKind;
    use crate::error::ViolationReason;

    fn first_bad_field(candidate: &CandidateRecord) -> Field {
        Validator::new().validate(candidate).unwrap_err().field
    }

    fn valid() -> CandidateRecord {
        CandidateRecord {
            id: Some("sl-000000000001".into()),
            ..CandidateRecord::new(MatchKind::Primary)
                .with_address("123 Main St")
                .with_town("Example")
                .with_zip("12309")
                .with_materials("copper", "plastic")
                .with_verification(false, 0.8, "2025-04-29")
        }
    }

    #[test]
    fn accepts_complete_candidate() {
        let record = Validator::new().validate(&valid()).unwrap();
        assert_eq!(record.zip.as_str(), "12309");
        assert_eq!(record.private_type, Material::Copper);
        assert!(record.position.is_none());
    }

    #[test]
    fn missing_zip_is_named() {
        let mut c = valid();
        c.zip = None;
        let err = Validator::new().validate(&c).unwrap_err();
        assert_eq!(err.field, Field::Zip);
        assert_eq!(err.reason, ViolationReason::Missing);
    }

    #[test]
    fn missing_town_is_accepted() {
        let mut c = valid();
        c.town = None;
        let record = Validator::new().validate(&c).unwrap();
        assert_eq!(record.town, None);
    }

    #[test]
    fn missing_town_and_zip_names_zip() {
        let mut c = valid();
        c.town = Some("  ".into());
        c.zip = None;
        let err = Validator::new().validate(&c).unwrap_err();
        assert_eq!(err.field, Field::Zip);
    }

    #[test]
    fn malformed_zip_is_invalid() {
        let mut c = valid();
        c.zip = Some("1230".into());
        let err = Validator::new().validate(&c).unwrap_err();
        assert_eq!(err.field, Field::Zip);
        assert!(matches!(err.reason, ViolationReason::Invalid(_)));
    }

    #[test]
    fn non_vocabulary_material_rejected() {
        let mut c = valid();
        c.public_type = Some("pvc".into());
        let err = Validator::new().validate(&c).unwrap_err();
        assert_eq!(err.field, Field::PublicType);
    }

    #[test]
    fn first_bad_field_wins() {
        let mut c = valid();
        c.address = None;
        c.zip = None;
        assert_eq!(first_bad_field(&c), Field::Address);
    }

    #[test]
    fn date_must_be_padded_iso() {
        let mut c = valid();
        c.last_verified = Some("2025-4-29".into());
        assert_eq!(first_bad_field(&c), Field::LastVerified);
        c.last_verified = Some("2025-02-30".into());
        assert_eq!(first_bad_field(&c), Field::LastVerified);
    }

    #[test]
    fn batch_skips_only_bad_candidates() {
        let mut bad = valid();
        bad.zip = None;
        let batch = vec![valid(), bad, valid()];

        let report = Validator::new().validate_all(&batch);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, 1);
        assert_eq!(report.rejected_on(Field::Zip), 1);
    }
}
