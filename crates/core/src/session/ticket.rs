#![forbid(unsafe_code)]

use crate::pagination::{CursorState, PageWindow};
use crate::query::QuerySpec;

/// Generation of the filter/sort state. Bumped on every reset so responses
/// issued under an older generation can be recognised and dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lineage(u64);

impl Lineage {
    pub fn get(self) -> u64 {
        self.0
    }

    pub(super) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// An issued page request, to be handed back with its response. Each ticket
/// settles its window at most once.
#[derive(Debug)]
pub struct PageTicket {
    pub(super) lineage: Lineage,
    pub(super) window: PageWindow,
    pub(super) query: QuerySpec,
}

impl PageTicket {
    pub fn lineage(&self) -> Lineage {
        self.lineage
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn query(&self) -> &QuerySpec {
        &self.query
    }
}

/// An issued count request.
#[derive(Clone, Debug)]
pub struct CountTicket {
    pub(super) lineage: Lineage,
    pub(super) query: QuerySpec,
}

impl CountTicket {
    pub fn lineage(&self) -> Lineage {
        self.lineage
    }

    pub fn query(&self) -> &QuerySpec {
        &self.query
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageOutcome {
    /// No request was issued: one is in flight, the set is exhausted, or the
    /// query was short-circuited to zero rows.
    NotRequested,
    /// The response belonged to an older lineage, or its window was no longer
    /// in flight, and was discarded.
    Stale,
    Applied { received: usize, state: CursorState },
}
