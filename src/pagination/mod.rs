//! Pagination module
//!
//! # Overview
//!
//! Describes the next-link pagination contract: which key of a page
//! document holds the items, which holds the URL of the following page,
//! and how both are read out of a parsed document.

mod types;

pub use types::{FieldKey, NextPage, PaginationConfig};
