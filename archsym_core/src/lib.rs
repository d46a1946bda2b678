#![warn(clippy::pedantic)]
#![allow(
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::cast_precision_loss
)]

//! Symmetry reduction for task-to-processor mappings: automorphism groups
//! of labeled architecture graphs, exposed as base and strong generating
//! sets, with canonical orbit representatives for task allocations.

pub mod arch_graph;
pub mod arch_graph_system;
pub mod block_system;
pub mod bsgs;
pub mod eemp;
pub mod error;
pub mod inverse_semigroup;
pub mod loader;
pub mod orbits;
pub mod partial_perm;
pub mod perm;
pub mod perm_group;
pub mod pr_randomizer;
pub mod schreier;
pub mod task_mapping;

mod colored_graph;
mod disjoint_decomp;
mod wreath_decomp;

mod math;
pub use math::*;

pub use arch_graph::ArchGraph;
pub use arch_graph_system::{ArchGraphNode, ArchGraphSystem};
pub use block_system::BlockSystem;
pub use bsgs::{Bsgs, BsgsOptions, Construction};
pub use error::{Error, Result};
pub use partial_perm::PartialPerm;
pub use perm::{Perm, PermSet};
pub use perm_group::PermGroup;
pub use schreier::TransversalVariant;
pub use task_mapping::{
    LocalSearchVariant, ReprMethod, ReprOptions, TaskAllocation, TaskMapping, TaskOrbits,
};
