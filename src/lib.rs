//! prooflift: translate informal mathematical proof text into a
//! dependency-linked proof tree and a Lean 4 proof skeleton.
//!
//! The pipeline has three pure stages: sentence classification
//! ([`classifier`]), proof tree construction ([`tree`]), and skeleton
//! generation ([`lean::generator`]). Every unresolved proof obligation in
//! the emitted skeleton is an explicit `sorry`; nothing is ever proved,
//! only translated. The optional [`lean::check`] module invokes an
//! external Lean compiler on the generated skeleton.
//!
//! ```
//! use prooflift::lean::GeneratorOptions;
//!
//! let result = prooflift::translate(
//!     "Assume n is even. Then n = 2k for some k. Therefore n is even.",
//!     &GeneratorOptions::default(),
//! );
//! assert!(result.skeleton.contains("theorem translated_theorem"));
//! ```

pub mod classifier;
pub mod entities;
pub mod error;
pub mod lean;
pub mod pipeline;
pub mod tree;

pub use classifier::{classify, Category, ClassifiedSentence};
pub use entities::{extract, Entity, EntityKind};
pub use error::{Error, Result};
pub use pipeline::{translate, TranslationResult};
pub use tree::{build, ProofTree, Technique};
