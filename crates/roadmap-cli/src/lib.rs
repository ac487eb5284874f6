//! `roadmapctl`: operator tool for roadmap directories
//!
//! Inspects, validates and maintains the roadmap file that agents share in a
//! project directory. All mutations go through
//! [`RoadmapService`](roadmap_core::RoadmapService), so the tool is safe to
//! run while other processes are writing.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cli;
pub mod render;

pub use cli::{build_cli, exit_code, run, EXIT_BUSY, EXIT_CORRUPT};
