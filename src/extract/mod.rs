//! Two-phase article extraction.
//!
//! - [`field`]: best-effort single field and strategy-list accessors
//! - [`listing`]: drafts from the listing page, container-scoped kickers
//! - [`recovery`]: page-scoped kicker recovery from article pages

pub mod field;
pub mod listing;
pub mod recovery;
