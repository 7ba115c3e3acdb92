#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Rows requested by the first page of a lineage.
pub const FIRST_PAGE_SIZE: u64 = 40;
/// Rows requested by every page after the first.
pub const NEXT_PAGE_SIZE: u64 = 100;
/// Fraction of the scrollable height past which the next page is wanted.
pub const SCROLL_FETCH_THRESHOLD: f64 = 0.9;

/// Inclusive, zero-based row range of one page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageWindow {
    pub start: u64,
    pub end: u64,
}

impl PageWindow {
    /// Window of the 1-based page `page`: `[0, 39]` first, then 100-row
    /// windows starting at `40 + (page - 2) * 100`.
    pub fn for_page(page: u64) -> Self {
        if page <= 1 {
            return Self {
                start: 0,
                end: FIRST_PAGE_SIZE - 1,
            };
        }
        let start = FIRST_PAGE_SIZE + (page - 2) * NEXT_PAGE_SIZE;
        Self {
            start,
            end: start + NEXT_PAGE_SIZE - 1,
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn offset(&self) -> u64 {
        self.start
    }

    pub fn limit(&self) -> u64 {
        self.len()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    #[default]
    Empty,
    Fetching,
    Idle,
    Exhausted,
}

impl CursorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Fetching => "fetching",
            Self::Idle => "idle",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Tracks fetch progress through one filtered result set.
///
/// At most one window is in flight. A page shorter than its window is the
/// only exhaustion signal.
#[derive(Clone, Debug, Default)]
pub struct PaginationCursor {
    state: CursorState,
    pages_fetched: u64,
    rows_fetched: u64,
    in_flight: Option<PageWindow>,
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    pub fn rows_fetched(&self) -> u64 {
        self.rows_fetched
    }

    pub fn in_flight(&self) -> Option<PageWindow> {
        self.in_flight
    }

    pub fn has_more(&self) -> bool {
        self.state != CursorState::Exhausted
    }

    pub fn is_fetching(&self) -> bool {
        self.state == CursorState::Fetching
    }

    /// Claims the next window and moves to `Fetching`. Returns `None` while a
    /// window is already in flight or once the set is exhausted.
    pub fn begin(&mut self) -> Option<PageWindow> {
        match self.state {
            CursorState::Fetching => {
                debug!(in_flight = ?self.in_flight, "page request refused: already fetching");
                None
            }
            CursorState::Exhausted => None,
            CursorState::Empty | CursorState::Idle => {
                let window = PageWindow::for_page(self.pages_fetched + 1);
                self.state = CursorState::Fetching;
                self.in_flight = Some(window);
                Some(window)
            }
        }
    }

    /// Records the arrival of the in-flight window with `received` rows.
    pub fn complete(&mut self, received: usize) -> CursorState {
        let Some(window) = self.in_flight.take() else {
            warn!(
                state = self.state.as_str(),
                received, "page completion without a window in flight ignored"
            );
            return self.state;
        };
        let received = received as u64;
        self.pages_fetched += 1;
        self.rows_fetched += received;
        self.state = if received < window.len() {
            CursorState::Exhausted
        } else {
            CursorState::Idle
        };
        self.state
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Viewport position reported by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollProximity {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollProximity {
    pub fn is_near_end(&self) -> bool {
        if self.scroll_height <= 0.0 {
            return true;
        }
        (self.scroll_top + self.client_height) / self.scroll_height > SCROLL_FETCH_THRESHOLD
    }
}
