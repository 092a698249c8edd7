//! Static locality-centroid tables

use crate::error::SetupError;
use sl_record::Position;
use std::collections::BTreeMap;

/// Postal code → approximate locality centroid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CentroidTable {
    entries: BTreeMap<String, Position>,
}

impl CentroidTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Four-zip table covering the Niskayuna service area and neighbours
    #[must_use]
    pub fn extended() -> Self {
        Self::from_static(&[
            ("12309", -73.8292, 42.8136),
            ("12304", -73.8792, 42.7836),
            ("12302", -73.9292, 42.8336),
            ("12308", -73.9192, 42.8136),
        ])
    }

    /// Two-zip table used by unattended batch runs
    #[must_use]
    pub fn compact() -> Self {
        Self::from_static(&[("12309", -73.895, 42.815), ("12304", -73.885, 42.785)])
    }

    fn from_static(rows: &[(&str, f64, f64)]) -> Self {
        let entries = rows
            .iter()
            .filter_map(|&(zip, lng, lat)| {
                Position::new(lng, lat).ok().map(|p| (zip.to_string(), p))
            })
            .collect();
        Self { entries }
    }

    /// Build from `zip → [longitude, latitude]` pairs
    ///
    /// # Errors
    /// [`SetupError::Centroid`] for an out-of-range coordinate
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, SetupError>
    where
        I: IntoIterator<Item = (S, [f64; 2])>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (zip, [lng, lat]) in pairs {
            let zip = zip.into();
            let position = Position::new(lng, lat).map_err(|e| SetupError::Centroid {
                zip: zip.clone(),
                reason: e.to_string(),
            })?;
            table.insert(zip, position);
        }
        Ok(table)
    }

    /// Add or replace an entry
    pub fn insert(&mut self, zip: impl Into<String>, centroid: Position) {
        self.entries.insert(zip.into(), centroid);
    }

    /// Centroid for `zip`
    #[inline]
    #[must_use]
    pub fn get(&self, zip: &str) -> Option<Position> {
        self.entries.get(zip.trim()).copied()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables() {
        let extended = CentroidTable::extended();
        assert_eq!(extended.len(), 4);
        let c = extended.get("12309").unwrap();
        assert_eq!((c.longitude(), c.latitude()), (-73.8292, 42.8136));

        let compact = CentroidTable::compact();
        assert_eq!(compact.len(), 2);
        assert!(compact.get("12302").is_none());
    }

    #[test]
    fn custom_pairs_are_validated() {
        let table = CentroidTable::from_pairs([("99999", [-70.0, 40.0])]).unwrap();
        assert!(table.get("99999").is_some());
        let out_of_range = CentroidTable::from_pairs([("99999", [40.0, -700.0])]);
        assert!(out_of_range.is_err());
    }
}
