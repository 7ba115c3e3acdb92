#![forbid(unsafe_code)]

pub mod access;
pub mod accumulator;
pub mod filter;
pub mod ids;
pub mod membership;
pub mod memory;
pub mod model;
pub mod pagination;
pub mod query;
pub mod session;

pub use access::{DataAccess, DataAccessError};
pub use accumulator::ResultAccumulator;
pub use filter::{FilterCategory, FilterState, SearchTerm, has_applied_filters};
pub use ids::{AdvisorId, FavoriteListId, IdError, ReportId, UserId};
pub use membership::{Membership, MembershipResolver, ResolvedMembership};
pub use memory::MemoryDirectory;
pub use model::{Advisor, AdvisorColumn, FavoriteList, FilterOptions, NewReport, Report};
pub use pagination::{
    CursorState, FIRST_PAGE_SIZE, NEXT_PAGE_SIZE, PageWindow, PaginationCursor, ScrollProximity,
};
pub use query::{
    FilterSpec, Predicate, QueryComposer, QuerySpec, SortDirection, SortField, SortSpec,
};
pub use session::{BrowseSession, CountTicket, Lineage, PageOutcome, PageTicket};
