//! Lean 4 skeleton generation and compiler invocation.

pub mod check;
pub mod formalize;
pub mod generator;

pub use check::{CheckConfig, CheckReport, CheckStatus, Diagnostic, LeanChecker};
pub use formalize::{formalize_assumption, formalize_goal, sanitize_comment, Formalized};
pub use generator::{generate, GeneratorOptions, SkeletonGenerator};
