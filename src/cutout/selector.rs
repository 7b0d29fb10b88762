//! Matching cutout requests to HDUs
//!
//! While scanning a file, every HDU that carries an EXTNAME bumps the tally
//! for that name, whether or not anything is cut from it. The tally is a
//! plain value handed from one step of the scan to the next, so matching
//! stays a pure function of `(SubUnitId, request)`.

use std::collections::HashMap;

use crate::cutout::request::{ExtensionSpec, PixelCutoutRequest};

/// Identity of one visited HDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubUnitId {
    /// 0-based HDU index
    pub index: usize,
    /// EXTNAME, if any
    pub name: Option<String>,
    /// 1-based occurrence of `name` so far, if named
    pub occurrence: Option<usize>,
}

/// EXTNAME occurrence counts accumulated over a scan
#[derive(Debug, Clone, Default)]
pub struct OccurrenceTally {
    counts: HashMap<String, usize>,
}

impl OccurrenceTally {
    /// Start an empty tally
    pub fn new() -> Self {
        OccurrenceTally::default()
    }

    /// Record a visit to an HDU
    ///
    /// # Arguments
    /// * `index` - 0-based HDU index
    /// * `name` - EXTNAME of the HDU, if any
    ///
    /// # Returns
    /// The updated tally and the identity of the visited HDU
    pub fn visit(mut self, index: usize, name: Option<&str>) -> (OccurrenceTally, SubUnitId) {
        let occurrence = name.map(|n| {
            let count = self.counts.entry(name_key(n)).or_insert(0);
            *count += 1;
            *count
        });

        let id = SubUnitId {
            index,
            name: name.map(str::to_string),
            occurrence,
        };
        (self, id)
    }

    /// How many HDUs with this name have been visited
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(&name_key(name)).copied().unwrap_or(0)
    }
}

/// Whether a request targets a visited HDU
///
/// An index selector matches the HDU at that 0-based index. A name with an
/// occurrence matches the n-th HDU carrying that name. A bare name matches
/// only the first HDU carrying it. Names compare case-insensitively and
/// ignore trailing blanks.
pub fn matches(unit: &SubUnitId, request: &PixelCutoutRequest) -> bool {
    extension_matches(unit, &request.extension)
}

/// Same as `matches`, for an extension selector alone
pub fn extension_matches(unit: &SubUnitId, extension: &ExtensionSpec) -> bool {
    match extension {
        ExtensionSpec::Index(i) => *i == unit.index,
        ExtensionSpec::Name(name) => name_matches(unit, name, 1),
        ExtensionSpec::NameOccurrence(name, n) => name_matches(unit, name, *n),
    }
}

fn name_matches(unit: &SubUnitId, name: &str, occurrence: usize) -> bool {
    match (&unit.name, unit.occurrence) {
        (Some(unit_name), Some(seen)) => name_key(unit_name) == name_key(name) && seen == occurrence,
        _ => false,
    }
}

fn name_key(name: &str) -> String {
    name.trim_end().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutout::request::AxisRange;

    fn visit_all(names: &[Option<&str>]) -> Vec<SubUnitId> {
        let mut tally = OccurrenceTally::new();
        let mut ids = Vec::new();
        for (index, name) in names.iter().enumerate() {
            let (next, id) = tally.visit(index, *name);
            tally = next;
            ids.push(id);
        }
        ids
    }

    fn request(extension: ExtensionSpec) -> PixelCutoutRequest {
        PixelCutoutRequest::new(extension, vec![AxisRange::Span { start: 1, end: 10 }])
    }

    #[test]
    fn test_occurrences_count_per_name() {
        let ids = visit_all(&[None, Some("SCI"), Some("ERR"), Some("sci ")]);
        assert_eq!(ids[0].occurrence, None);
        assert_eq!(ids[1].occurrence, Some(1));
        assert_eq!(ids[2].occurrence, Some(1));
        assert_eq!(ids[3].occurrence, Some(2));
    }

    #[test]
    fn test_name_and_occurrence() {
        let ids = visit_all(&[Some("SCI"), Some("SCI"), Some("ERR")]);
        let req = request(ExtensionSpec::NameOccurrence("SCI".to_string(), 2));
        let matched: Vec<usize> = ids.iter().filter(|id| matches(id, &req)).map(|id| id.index).collect();
        assert_eq!(matched, vec![1]);

        let req = request(ExtensionSpec::NameOccurrence("SCI".to_string(), 3));
        assert!(ids.iter().all(|id| !matches(id, &req)));
    }

    #[test]
    fn test_index_selector() {
        let ids = visit_all(&[None, Some("SCI"), Some("SCI")]);
        let req = request(ExtensionSpec::Index(2));
        let matched: Vec<usize> = ids.iter().filter(|id| matches(id, &req)).map(|id| id.index).collect();
        assert_eq!(matched, vec![2]);
    }

    #[test]
    fn test_bare_name_matches_first_only() {
        let ids = visit_all(&[Some("SCI"), Some("SCI"), Some("ERR")]);
        let req = request(ExtensionSpec::Name("sci".to_string()));
        let matched: Vec<usize> = ids.iter().filter(|id| matches(id, &req)).map(|id| id.index).collect();
        assert_eq!(matched, vec![0]);
    }

    #[test]
    fn test_tally_counts() {
        let mut tally = OccurrenceTally::new();
        for (i, name) in ["A", "B", "A"].iter().enumerate() {
            tally = tally.visit(i, Some(*name)).0;
        }
        assert_eq!(tally.count("a"), 2);
        assert_eq!(tally.count("B"), 1);
        assert_eq!(tally.count("C"), 0);
    }
}
