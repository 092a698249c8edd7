//! Address queries and the simplified-query rewrite

use sl_record::ServiceLineRecord;

/// Street-type and directional tokens dropped by [`AddressQuery::simplified`]
const SUFFIX_TOKENS: &[&str] = &[
    "AVE", "AVENUE", "ST", "STREET", "RD", "ROAD", "DR", "DRIVE", "LN", "LANE", "WAY", "PL",
    "PLACE", "CT", "COURT", "TER", "TERRACE", "BLVD", "BOULEVARD", "HWY", "HIGHWAY", "CIR",
    "CIRCLE", "PKWY", "PARKWAY", "NO", "NORTH", "SOUTH", "EAST", "WEST", "N", "S", "E", "W",
];

/// Address to resolve, with its locality context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    /// Street-level address
    pub address: String,
    /// Locality
    pub town: String,
    /// Postal code
    pub zip: String,
    /// State or region code appended to free-text queries
    pub region: String,
}

impl AddressQuery {
    /// Create query
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        town: impl Into<String>,
        zip: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            town: town.into(),
            zip: zip.into(),
            region: region.into(),
        }
    }

    /// Build query from a stored record
    #[must_use]
    pub fn from_record(record: &ServiceLineRecord, region: &str) -> Self {
        Self::new(
            record.address.clone(),
            record.town.clone().unwrap_or_default(),
            record.zip.as_str(),
            region,
        )
    }

    /// Single-line free-text form: `address, town, REGION zip, USA`
    #[must_use]
    pub fn single_line(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        if !self.address.trim().is_empty() {
            parts.push(self.address.trim().to_string());
        }
        if !self.town.trim().is_empty() {
            parts.push(self.town.trim().to_string());
        }
        let region_zip = format!("{} {}", self.region.trim(), self.zip.trim());
        if !region_zip.trim().is_empty() {
            parts.push(region_zip.trim().to_string());
        }
        parts.push("USA".to_string());
        parts.join(", ")
    }

    /// Query with the leading house number and street-suffix tokens removed
    ///
    /// Returns `None` when nothing would change or nothing would remain, so
    /// the simplified strategy never repeats the primary request.
    #[must_use]
    pub fn simplified(&self) -> Option<Self> {
        let mut tokens: Vec<&str> = self.address.split_whitespace().collect();
        if tokens
            .first()
            .is_some_and(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))
        {
            tokens.remove(0);
        }
        let kept: Vec<&str> = tokens
            .into_iter()
            .filter(|t| {
                let bare = t.trim_end_matches(['.', ',']).to_ascii_uppercase();
                !SUFFIX_TOKENS.contains(&bare.as_str())
            })
            .collect();

        let street = kept.join(" ");
        let original = self.address.split_whitespace().collect::<Vec<_>>().join(" ");
        if street.is_empty() || street == original {
            return None;
        }
        Some(Self {
            address: street,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn query(address: &str) -> AddressQuery {
        AddressQuery::new(address, "Niskayuna", "12309", "NY")
    }

    #[test]
    fn single_line_format() {
        assert_eq!(
            query("671 ACORN DRIVE").single_line(),
            "671 ACORN DRIVE, Niskayuna, NY 12309, USA"
        );
    }

    #[test]
    fn single_line_skips_missing_town() {
        let q = AddressQuery::new("671 ACORN DRIVE", "", "12309", "NY");
        assert_eq!(q.single_line(), "671 ACORN DRIVE, NY 12309, USA");
    }

    #[test]
    fn simplified_strips_number_and_suffix() {
        let s = query("671 ACORN DRIVE").simplified().unwrap();
        assert_eq!(s.address, "ACORN");
        assert_eq!(s.zip, "12309");

        let s = query("1200 Balltown Rd. North").simplified().unwrap();
        assert_eq!(s.address, "Balltown");
    }

    #[test]
    fn simplified_none_when_unchanged_or_empty() {
        assert_eq!(query("Balltown").simplified(), None);
        assert_eq!(query("12 ST").simplified(), None);
    }
}
