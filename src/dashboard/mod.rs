use crate::metadata::Catalog;
use crate::state::ReviewSession;
use crate::{DocType, ReviewStatus};

/// A single row in the batch list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub batch: String,
    /// Versions on record, ascending.
    pub versions: Vec<u32>,
    /// Portal status of the latest version.
    pub portal_status: String,
    pub reason: String,
}

/// Batch list state. Owns the rows but NOT the ReviewSession
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub items: Vec<BatchItem>,
    pub selected: usize,
    pub doc_type: DocType,
}

impl Dashboard {
    /// Build one row per batch in the catalog.
    pub fn load(catalog: &Catalog) -> Self {
        let items = catalog
            .batches()
            .into_iter()
            .map(|batch| {
                let latest = catalog
                    .records()
                    .iter()
                    .filter(|r| r.batch == batch)
                    .max_by_key(|r| r.version);
                let (portal_status, reason) = match latest {
                    Some(r) => (r.portal_status.clone(), r.reason.clone()),
                    None => (String::new(), String::new()),
                };
                // Every row expands to both types, so CI versions cover the batch
                let versions = catalog.versions(&batch, DocType::CI);

                BatchItem {
                    batch,
                    versions,
                    portal_status,
                    reason,
                }
            })
            .collect();

        Dashboard {
            items,
            selected: 0,
            doc_type: DocType::CI,
        }
    }

    /// Move selection down (clamp to end).
    pub fn select_next(&mut self) {
        if !self.items.is_empty() && self.selected < self.items.len() - 1 {
            self.selected += 1;
        }
    }

    /// Move selection up (clamp to start).
    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    /// Switch between CI and PL.
    pub fn toggle_doc_type(&mut self) {
        self.doc_type = self.doc_type.toggled();
    }

    /// Get the id of the currently selected batch.
    pub fn selected_batch(&self) -> Option<&str> {
        self.items.get(self.selected).map(|item| item.batch.as_str())
    }

    pub fn selected_item(&self) -> Option<&BatchItem> {
        self.items.get(self.selected)
    }

    /// Review status of every document type for a row.
    pub fn statuses(&self, session: &ReviewSession, idx: usize) -> Vec<(DocType, ReviewStatus)> {
        let Some(item) = self.items.get(idx) else {
            return Vec::new();
        };
        DocType::ALL
            .into_iter()
            .map(|doc_type| (doc_type, session.get_status(&item.batch, doc_type)))
            .collect()
    }
}

/// Portal status text, with the reason in parentheses when present.
pub fn portal_status_text(status: &str, reason: &str) -> String {
    if reason.trim().is_empty() {
        status.to_string()
    } else {
        format!("{} ({})", status, reason.trim())
    }
}
