//! Utility functions.

pub mod env;
pub mod format;

pub use format::{format_amount, format_balance, mask_key};
