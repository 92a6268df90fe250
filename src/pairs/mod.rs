use crate::{DocType, DocumentRecord, VersionPair};
use thiserror::Error;

/// Errors raised while building a comparison view.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairError {
    #[error(
        "Not enough versions available for comparison. At least 2 versions are required \
         ({batch}/{doc_type} has {found})."
    )]
    NotEnoughVersions {
        batch: String,
        doc_type: DocType,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, PairError>;

/// Generate the version pairs a reviewer may compare.
///
/// Adjacent pairs come first, in input order. With more than two versions the
/// first-vs-last pair is appended once at the end. The caller is expected to
/// pass versions sorted ascending and de-duplicated.
pub fn generate_pairs(versions: &[u32]) -> Vec<VersionPair> {
    if versions.len() < 2 {
        return Vec::new();
    }

    let mut pairs: Vec<VersionPair> = versions
        .windows(2)
        .filter_map(|w| VersionPair::new(w[0], w[1]))
        .collect();

    if versions.len() > 2
        && let Some(pair) = VersionPair::new(versions[0], versions[versions.len() - 1])
    {
        pairs.push(pair);
    }

    pairs
}

/// Selectable comparisons for one batch/type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub batch: String,
    pub doc_type: DocType,
    pub versions: Vec<u32>,
    pub pairs: Vec<VersionPair>,
    pub selected: usize,
}

impl Comparison {
    /// Collect the versions of `batch`/`doc_type` and compute their pairs.
    pub fn build(records: &[DocumentRecord], batch: &str, doc_type: DocType) -> Result<Self> {
        let mut versions: Vec<u32> = records
            .iter()
            .filter(|r| r.batch == batch && r.doc_type == doc_type)
            .map(|r| r.version)
            .collect();
        versions.sort_unstable();
        versions.dedup();

        let pairs = generate_pairs(&versions);
        if pairs.is_empty() {
            return Err(PairError::NotEnoughVersions {
                batch: batch.to_string(),
                doc_type,
                found: versions.len(),
            });
        }

        Ok(Self {
            batch: batch.to_string(),
            doc_type,
            versions,
            pairs,
            selected: 0,
        })
    }

    pub fn selected_pair(&self) -> VersionPair {
        self.pairs[self.selected]
    }

    /// Move selection right (clamp to end).
    pub fn select_next(&mut self) {
        if self.selected + 1 < self.pairs.len() {
            self.selected += 1;
        }
    }

    /// Move selection left (clamp to start).
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: u32, b: u32) -> VersionPair {
        VersionPair::new(a, b).unwrap()
    }

    fn record(batch: &str, doc_type: DocType, version: u32) -> DocumentRecord {
        DocumentRecord {
            batch: batch.to_string(),
            doc_type,
            version,
            storage_key: format!("{doc_type}/{batch}/{batch}_{version}.pdf"),
            portal_status: "Pending".to_string(),
            reason: String::new(),
        }
    }

    #[test]
    fn empty_and_single_yield_nothing() {
        assert!(generate_pairs(&[]).is_empty());
        assert!(generate_pairs(&[7]).is_empty());
    }

    #[test]
    fn two_versions_yield_one_pair() {
        assert_eq!(generate_pairs(&[1, 2]), vec![pair(1, 2)]);
    }

    #[test]
    fn three_versions_add_first_vs_last() {
        let pairs = generate_pairs(&[1, 2, 3]);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs, vec![pair(1, 2), pair(2, 3), pair(1, 3)]);
    }

    #[test]
    fn four_versions_never_self_pair() {
        let pairs = generate_pairs(&[1, 2, 3, 4]);
        assert_eq!(pairs, vec![pair(1, 2), pair(2, 3), pair(3, 4), pair(1, 4)]);
        assert!(pairs.iter().all(|p| p.first() != p.second()));
    }

    #[test]
    fn generator_keeps_input_order() {
        assert_eq!(generate_pairs(&[5, 2, 9]), vec![pair(5, 2), pair(2, 9), pair(5, 9)]);
    }

    #[test]
    fn build_sorts_versions_and_selects_first_pair() {
        let records = vec![
            record("B001", DocType::CI, 3),
            record("B001", DocType::CI, 1),
            record("B001", DocType::CI, 2),
            record("B001", DocType::PL, 9),
            record("B002", DocType::CI, 4),
        ];

        let comparison = Comparison::build(&records, "B001", DocType::CI).unwrap();
        assert_eq!(comparison.versions, vec![1, 2, 3]);
        assert_eq!(comparison.selected_pair(), pair(1, 2));
        assert_eq!(comparison.pairs.len(), 3);
    }

    #[test]
    fn build_reports_not_enough_versions() {
        let records = vec![record("B001", DocType::CI, 1)];
        let err = Comparison::build(&records, "B001", DocType::CI).unwrap_err();
        assert_eq!(
            err,
            PairError::NotEnoughVersions {
                batch: "B001".to_string(),
                doc_type: DocType::CI,
                found: 1,
            }
        );
        assert!(err.to_string().starts_with("Not enough versions"));
    }

    #[test]
    fn selection_clamps_at_both_ends() {
        let records = vec![
            record("B001", DocType::CI, 1),
            record("B001", DocType::CI, 2),
            record("B001", DocType::CI, 3),
        ];
        let mut comparison = Comparison::build(&records, "B001", DocType::CI).unwrap();

        comparison.select_prev();
        assert_eq!(comparison.selected, 0);
        comparison.select_next();
        comparison.select_next();
        comparison.select_next();
        assert_eq!(comparison.selected, 2);
        assert_eq!(comparison.selected_pair(), pair(1, 3));
    }
}
