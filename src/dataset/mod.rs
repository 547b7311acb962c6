//! Compact data containers.
//!
//! - [`compressed_integer_list`]: delta + variable-length byte encoding for
//!   non-decreasing integer sequences such as edge or feature index lists.

pub mod compressed_integer_list;

pub use compressed_integer_list::{CompressedIntegerList, Iter as CompressedIntegerIter};
