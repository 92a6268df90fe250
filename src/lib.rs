pub mod audit;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod logging;
pub mod metadata;
pub mod migrate;
pub mod pairs;
pub mod render;
pub mod state;
pub mod storage;
pub mod tui;

use std::fmt;
use std::str::FromStr;

/// Category of a document within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocType {
    CI,
    PL,
}

impl DocType {
    pub const ALL: [DocType; 2] = [DocType::CI, DocType::PL];

    pub fn as_str(self) -> &'static str {
        match self {
            DocType::CI => "CI",
            DocType::PL => "PL",
        }
    }

    /// The other document type.
    pub fn toggled(self) -> Self {
        match self {
            DocType::CI => DocType::PL,
            DocType::PL => DocType::CI,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CI" => Ok(DocType::CI),
            "PL" => Ok(DocType::PL),
            other => Err(format!("unknown document type: {other} (expected CI or PL)")),
        }
    }
}

/// One stored document: a (batch, type, version) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub batch: String,
    pub doc_type: DocType,
    pub version: u32,
    pub storage_key: String,
    pub portal_status: String,
    pub reason: String,
}

impl DocumentRecord {
    pub fn file_name(&self) -> String {
        format!("{}_{}.pdf", self.batch, self.version)
    }
}

/// Two distinct versions of the same batch/type, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionPair {
    first: u32,
    second: u32,
}

impl VersionPair {
    /// Returns `None` for a self-pair.
    pub fn new(first: u32, second: u32) -> Option<Self> {
        (first != second).then_some(Self { first, second })
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    pub fn contains(&self, version: u32) -> bool {
        self.first == version || self.second == version
    }

    /// Same two versions regardless of order.
    pub fn same_versions(&self, other: &VersionPair) -> bool {
        self == other || (self.first == other.second && self.second == other.first)
    }
}

impl fmt::Display for VersionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ver {} vs {}", self.first, self.second)
    }
}

/// Internal review status of a batch/type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewStatus {
    #[default]
    NotReviewed,
    Reviewed,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::NotReviewed => "not-reviewed",
            ReviewStatus::Reviewed => "reviewed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewStatus::NotReviewed => "Not Reviewed",
            ReviewStatus::Reviewed => "Reviewed",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer decision recorded with each saved review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    #[default]
    Accept,
    Reject,
    RequestMoreInfo,
}

impl Decision {
    pub const ALL: [Decision; 3] = [Decision::Accept, Decision::Reject, Decision::RequestMoreInfo];

    pub fn label(self) -> &'static str {
        match self {
            Decision::Accept => "Accept",
            Decision::Reject => "Reject",
            Decision::RequestMoreInfo => "Request More Information",
        }
    }

    /// Next decision in selector order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Decision::Accept => Decision::Reject,
            Decision::Reject => Decision::RequestMoreInfo,
            Decision::RequestMoreInfo => Decision::Accept,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Review progress summary over every batch/type in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewProgress {
    pub reviewed: usize,
    pub total: usize,
}

impl ReviewProgress {
    pub fn remaining(&self) -> usize {
        self.total - self.reviewed
    }

    pub fn percent(&self) -> f64 {
        if self.total > 0 {
            (self.reviewed as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }
}
