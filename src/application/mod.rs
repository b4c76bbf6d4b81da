//! # Application Module
//!
//! - [`dispatch`] - sequences registry lookup, model validation and
//!   generation for a single caller request
pub mod dispatch;

pub use dispatch::{DispatchError, Dispatcher, ErrorClass};
