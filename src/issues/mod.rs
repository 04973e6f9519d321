//! Issue traversal.

mod walker;

pub use walker::{IssueSearch, Query, WalkError, Walker, DEFAULT_PAGE_SIZE};
