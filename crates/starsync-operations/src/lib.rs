pub mod context;
pub mod error;
pub mod filter;
pub mod git;
pub mod layout;
pub mod list;
pub mod mirror;
pub mod progress;
#[cfg(test)]
mod test_utils;
pub mod types;

pub use context::MirrorContext;
pub use error::{ErrorContext, MirrorError, MirrorResult};
pub use types::*;
