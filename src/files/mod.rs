//! Document root access.
//!
//! Request paths are normalized and checked against the root before anything
//! touches the filesystem; directories fall back to their index file.

pub mod resolver;

pub use resolver::{PathResolver, ResolveError, ResolvedFile};
