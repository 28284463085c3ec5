//! Value model and shared building blocks.

mod constants;
mod fields;
mod sort_order;
pub(crate) mod stream;
mod type_utils;
mod value;

pub use constants::*;
pub use fields::*;
pub use sort_order::*;
pub use stream::{DocumentCursor, DocumentStream};
pub use type_utils::*;
pub use value::*;
