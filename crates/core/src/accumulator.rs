#![forbid(unsafe_code)]

use crate::ids::AdvisorId;
use crate::model::Advisor;

/// Pages merged in arrival order. Server-side order is authoritative, so rows
/// are never re-sorted or deduplicated here.
#[derive(Clone, Debug, Default)]
pub struct ResultAccumulator {
    rows: Vec<Advisor>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, page: Vec<Advisor>) {
        self.rows.extend(page);
    }

    pub fn reset(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Advisor] {
        &self.rows
    }

    pub fn advisor_ids(&self) -> Vec<AdvisorId> {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }
}
