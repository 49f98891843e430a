//! Item decoder module
//!
//! # Overview
//!
//! The decode module turns a page's item array into typed values. The
//! engine treats decoding as a black box: JSON array in, `Vec<T>` or a
//! decode error out.

mod decoders;
mod types;

pub use decoders::{FnDecoder, SerdeDecoder};
pub use types::ItemDecoder;
