//! Source namespace model and resolution.
//!
//! - [`walk`] flattens a group tree into a sorted project list
//! - [`filter_by_prefix`] narrows that list by project name

mod filter;
mod types;
mod walker;

pub use filter::filter_by_prefix;
pub use types::{GroupDetail, NamespaceNode, Project};
pub use walker::walk;
