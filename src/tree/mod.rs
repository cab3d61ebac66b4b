//! Dependency-linked proof tree: node types and the builder that
//! constructs them from classified sentences.

pub mod builder;
pub mod types;

pub use builder::{build, repair_cycles};
pub use types::{
    Assumption, Goal, NodeRef, ProofTree, Step, SubSteps, Technique, TreeMetadata,
};
