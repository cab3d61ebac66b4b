//! Deterministic Lean 4 proof skeleton emission.
//!
//! The generator walks the proof tree in linear order and emits one tactic
//! block per step, dispatched on the step's technique. Every unresolved
//! obligation is an explicit `sorry`; the output for a given tree and
//! options is byte-for-byte reproducible.

use crate::entities::{Entity, EntityKind};
use crate::lean::formalize::{formalize_assumption, formalize_goal, sanitize_comment};
use crate::tree::types::{ProofTree, Step, Technique};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const INDENT: &str = "  ";

static WITNESS_FOR_SOME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfor\s+some\s+([a-zA-Z])\b").expect("invalid regex"));

static WITNESS_EXISTS: LazyLock<Regex> = LazyLock::new(|| {
    // The article must be a whole word, or "an m" would capture the n.
    Regex::new(r"(?i)\bthere\s+(?:exists|is)\s+(?:(?:an|a|some)\s+)?([a-zA-Z])\b")
        .expect("invalid regex")
});

static CASE_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcase\s+(?:where|when|that|in\s+which)\s+(.+)$|\b(?:if|when)\s+(.+)$")
        .expect("invalid regex")
});

/// Options controlling skeleton emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Name of the emitted theorem.
    pub theorem_name: String,
    /// Emit explanatory comments alongside the tactics.
    pub include_comments: bool,
    /// Close open obligations with explicit `sorry` markers.
    pub use_admit: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            theorem_name: "translated_theorem".to_string(),
            include_comments: true,
            use_admit: true,
        }
    }
}

impl GeneratorOptions {
    pub fn with_theorem_name(mut self, name: impl Into<String>) -> Self {
        self.theorem_name = name.into();
        self
    }

    pub fn with_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    pub fn with_admit(mut self, use_admit: bool) -> Self {
        self.use_admit = use_admit;
        self
    }
}

/// Emits Lean skeletons from proof trees.
#[derive(Debug, Clone, Default)]
pub struct SkeletonGenerator {
    options: GeneratorOptions,
}

/// Convenience wrapper around [`SkeletonGenerator::generate`].
pub fn generate(tree: Option<&ProofTree>, options: &GeneratorOptions) -> String {
    SkeletonGenerator::new(options.clone()).generate(tree)
}

impl SkeletonGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Generate the full skeleton. `None` yields a single diagnostic
    /// comment line rather than an error.
    pub fn generate(&self, tree: Option<&ProofTree>) -> String {
        let Some(tree) = tree else {
            return "-- error: no proof tree to generate from".to_string();
        };

        let mut lines: Vec<String> = Vec::new();

        if self.options.include_comments {
            self.push_header(tree, &mut lines);
        }
        self.push_variables(tree, &mut lines);

        let goal_prop = match tree.goal {
            Some(ref goal) => formalize_goal(&goal.text).prop,
            None => "True".to_string(),
        };
        lines.push(format!(
            "theorem {} : {} := by",
            self.options.theorem_name, goal_prop
        ));

        for assumption in &tree.assumptions {
            self.push_assumption(&assumption.id, &assumption.text, &mut lines);
        }

        for step in &tree.steps {
            lines.push(String::new());
            self.push_step(step, &mut lines);
        }

        if self.options.use_admit {
            lines.push(String::new());
            lines.push(format!("{}sorry", INDENT));
        }

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }

    fn push_header(&self, tree: &ProofTree, lines: &mut Vec<String>) {
        lines.push("/-".to_string());
        lines.push("  Proof skeleton generated from informal proof text.".to_string());
        lines.push(format!("  Theorem: {}", self.options.theorem_name));
        if !tree.metadata.techniques.is_empty() {
            lines.push(format!(
                "  Techniques: {}",
                tree.metadata.techniques.join(", ")
            ));
        }
        lines.push("-/".to_string());
        lines.push(String::new());
    }

    fn push_variables(&self, tree: &ProofTree, lines: &mut Vec<String>) {
        let variables: Vec<&Entity> = tree
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Variable)
            .collect();
        if variables.is_empty() {
            return;
        }
        for entity in variables {
            let ty = infer_type(entity, &tree.metadata.types);
            lines.push(format!("variable ({} : {})", entity.name, ty));
        }
        lines.push(String::new());
    }

    fn push_assumption(&self, id: &str, text: &str, lines: &mut Vec<String>) {
        let formalized = formalize_assumption(text);
        if self.options.include_comments {
            lines.push(format!("{}-- {}: {}", INDENT, id, sanitize_comment(text)));
            if let Some(ref note) = formalized.note {
                lines.push(format!("{}-- {}", INDENT, sanitize_comment(note)));
            }
        }
        if self.options.use_admit {
            lines.push(format!(
                "{}have {} : {} := by sorry",
                INDENT, id, formalized.prop
            ));
        }
    }

    fn push_step(&self, step: &Step, lines: &mut Vec<String>) {
        if self.options.include_comments {
            lines.push(format!(
                "{}-- Step {} [{}]: {}",
                INDENT,
                step.id,
                step.technique,
                sanitize_comment(&step.text)
            ));
        }
        match step.technique {
            Technique::Induction => self.push_induction(step, lines),
            Technique::Contradiction => {
                lines.push(format!("{}by_contra h_contra", INDENT));
                self.push_sorry(1, lines);
            }
            Technique::CaseAnalysis => self.push_cases(step, lines),
            Technique::ExistentialIntro => {
                let witness = extract_witness(&step.text).unwrap_or_else(|| "_".to_string());
                lines.push(format!("{}use {}", INDENT, witness));
                self.push_sorry(1, lines);
            }
            Technique::UniversalIntro => {
                let variable = step
                    .variables
                    .as_ref()
                    .and_then(|v| v.first().cloned())
                    .unwrap_or_else(|| "x".to_string());
                lines.push(format!("{}intro {}", INDENT, variable));
                self.push_sorry(1, lines);
            }
            Technique::Implication => {
                lines.push(format!("{}intro h", INDENT));
                self.push_sorry(1, lines);
            }
            Technique::Definition => self.push_definition(step, lines),
            Technique::Arithmetic => self.push_arithmetic(step, lines),
            Technique::Algebraic => self.push_algebraic(step, lines),
            Technique::SetTheory | Technique::Direct => self.push_have(step, lines),
        }
    }

    fn push_induction(&self, step: &Step, lines: &mut Vec<String>) {
        let variable = step
            .variables
            .as_ref()
            .and_then(|v| v.first().cloned())
            .unwrap_or_else(|| "n".to_string());
        lines.push(format!("{}induction {} with", INDENT, variable));

        lines.push(format!("{}| zero =>", INDENT));
        if self.options.include_comments {
            let annotation = step
                .substeps
                .as_ref()
                .and_then(|s| s.base_case.as_deref())
                .unwrap_or("establish the base case");
            lines.push(format!(
                "{}-- {}",
                INDENT.repeat(2),
                sanitize_comment(annotation)
            ));
        }
        self.push_sorry(2, lines);

        lines.push(format!("{}| succ {} ih =>", INDENT, variable));
        if self.options.include_comments {
            let annotation = step
                .substeps
                .as_ref()
                .and_then(|s| s.inductive_step.as_deref())
                .unwrap_or("apply the inductive hypothesis ih");
            lines.push(format!(
                "{}-- {}",
                INDENT.repeat(2),
                sanitize_comment(annotation)
            ));
        }
        self.push_sorry(2, lines);
    }

    fn push_cases(&self, step: &Step, lines: &mut Vec<String>) {
        if self.options.include_comments {
            match extract_case_target(&step.text) {
                Some(target) => lines.push(format!(
                    "{}-- Case {}: {}",
                    INDENT,
                    step.case_number.unwrap_or(1),
                    sanitize_comment(&target)
                )),
                None => lines.push(format!("{}-- specify the case split target", INDENT)),
            }
        }
        lines.push(format!("{}cases h_case with", INDENT));
        lines.push(format!("{}| inl h =>", INDENT));
        self.push_sorry(2, lines);
        lines.push(format!("{}| inr h =>", INDENT));
        self.push_sorry(2, lines);
    }

    fn push_definition(&self, step: &Step, lines: &mut Vec<String>) {
        let lowered = step.text.to_lowercase();
        if lowered.contains("simplif") {
            lines.push(format!("{}simp", INDENT));
            self.push_sorry(1, lines);
        } else if lowered.contains("rewrit") || lowered.contains("substitut") {
            // A bare `rw []` would not parse; leave the instruction as a comment.
            if self.options.include_comments {
                lines.push(format!(
                    "{}-- rewrite using: {}",
                    INDENT,
                    sanitize_comment(&step.text)
                ));
            }
            self.push_sorry(1, lines);
        } else {
            if self.options.include_comments {
                lines.push(format!(
                    "{}-- unfold the relevant definition: {}",
                    INDENT,
                    sanitize_comment(&step.text)
                ));
            }
            self.push_sorry(1, lines);
        }
    }

    fn push_arithmetic(&self, step: &Step, lines: &mut Vec<String>) {
        let lowered = step.text.to_lowercase();
        if lowered.contains("linear") || lowered.contains("add") || lowered.contains("subtract") {
            lines.push(format!("{}omega", INDENT));
        } else {
            if self.options.include_comments {
                lines.push(format!(
                    "{}-- arithmetic reasoning: {}",
                    INDENT,
                    sanitize_comment(&step.text)
                ));
            }
            self.push_sorry(1, lines);
        }
    }

    fn push_algebraic(&self, step: &Step, lines: &mut Vec<String>) {
        let lowered = step.text.to_lowercase();
        if lowered.contains("ring") || lowered.contains("algebra") {
            lines.push(format!("{}ring_nf", INDENT));
            self.push_sorry(1, lines);
        } else {
            if self.options.include_comments {
                lines.push(format!(
                    "{}-- algebraic manipulation: {}",
                    INDENT,
                    sanitize_comment(&step.text)
                ));
            }
            self.push_sorry(1, lines);
        }
    }

    fn push_have(&self, step: &Step, lines: &mut Vec<String>) {
        let formalized = formalize_goal(&step.text);
        if self.options.include_comments {
            if let Some(ref note) = formalized.note {
                lines.push(format!("{}-- {}", INDENT, sanitize_comment(note)));
            }
        }
        if self.options.use_admit {
            lines.push(format!(
                "{}have {} : {} := by sorry",
                INDENT, step.id, formalized.prop
            ));
        }
    }

    fn push_sorry(&self, depth: usize, lines: &mut Vec<String>) {
        if self.options.use_admit {
            lines.push(format!("{}sorry", INDENT.repeat(depth)));
        }
    }
}

/// Infer a variable's Lean type from its usage snippets, falling back to
/// the tree-level type list and finally ℕ.
fn infer_type(entity: &Entity, tree_types: &[String]) -> String {
    for example in &entity.examples {
        let lowered = example.to_lowercase();
        if lowered.contains("integer") {
            return "ℤ".to_string();
        }
        if lowered.contains("natural") {
            return "ℕ".to_string();
        }
        if lowered.contains("rational") {
            return "ℚ".to_string();
        }
        if lowered.contains("real") {
            return "ℝ".to_string();
        }
        if lowered.contains("complex") {
            return "ℂ".to_string();
        }
    }
    tree_types
        .first()
        .cloned()
        .unwrap_or_else(|| "ℕ".to_string())
}

fn extract_witness(text: &str) -> Option<String> {
    WITNESS_FOR_SOME
        .captures(text)
        .map(|caps| caps[1].to_string())
        .or_else(|| {
            WITNESS_EXISTS
                .captures(text)
                .map(|caps| caps[1].to_string())
        })
}

fn extract_case_target(text: &str) -> Option<String> {
    CASE_TARGET.captures(text).map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim().trim_end_matches(['.', '!', '?']).to_string())
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify, Category, ClassifiedSentence};
    use crate::entities::extract;
    use crate::tree::build;
    use pretty_assertions::assert_eq;

    fn sample_tree(text: &str) -> ProofTree {
        let sentences = classify(text);
        let entities = extract(&sentences);
        build(&sentences, &entities)
    }

    fn single_step_tree(text: &str, category: Category) -> ProofTree {
        let sentences = vec![ClassifiedSentence::new(text, category)];
        let entities = extract(&sentences);
        build(&sentences, &entities)
    }

    #[test]
    fn test_none_tree_yields_diagnostic_comment() {
        let output = generate(None, &GeneratorOptions::default());
        assert_eq!(output, "-- error: no proof tree to generate from");
    }

    #[test]
    fn test_even_proof_skeleton() {
        let tree = sample_tree(
            "Let n be an integer. Assume n is even. Then n = 2k for some k. Therefore n is even.",
        );
        let output = generate(Some(&tree), &GeneratorOptions::default());

        assert!(output.contains("variable (n : ℤ)"));
        assert!(output.contains("theorem translated_theorem : Even n := by"));
        assert!(output.contains("use k"));
        assert!(output.contains("sorry"));
    }

    #[test]
    fn test_induction_two_branches() {
        let tree = sample_tree(
            "Let n be a natural number. We prove the claim by induction on n.",
        );
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(output.contains("induction n with"));
        assert!(output.contains("| zero =>"));
        assert!(output.contains("| succ n ih =>"));
    }

    #[test]
    fn test_contradiction_tactic() {
        let tree = sample_tree(
            "Assume p is prime. Suppose for contradiction that p is composite. This leads to a contradiction.",
        );
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(output.contains("by_contra h_contra"));
    }

    #[test]
    fn test_case_split_branches() {
        let tree = sample_tree("Consider the case where n > 0.");
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(output.contains("cases h_case with"));
        assert!(output.contains("| inl h =>"));
        assert!(output.contains("| inr h =>"));
        assert!(output.contains("-- Case 1: n > 0"));
    }

    #[test]
    fn test_arithmetic_vocabulary_dispatch() {
        let tree = single_step_tree("we add the two quantities", Category::Arithmetic);
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(output.contains("omega"));

        let tree = single_step_tree("a purely numeric observation", Category::Arithmetic);
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(!output.contains("omega"));
        assert!(output.contains("-- arithmetic reasoning:"));
    }

    #[test]
    fn test_algebraic_vocabulary_dispatch() {
        let tree = single_step_tree(
            "by the ring axioms the terms collect",
            Category::Algebraic,
        );
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(output.contains("ring_nf"));

        let tree = single_step_tree("rearrange the relation", Category::Algebraic);
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(!output.contains("ring_nf"));
        assert!(output.contains("-- algebraic manipulation:"));
    }

    #[test]
    fn test_definition_expand_takes_unfold_path() {
        let tree = single_step_tree(
            "Expanding the definition of even",
            Category::Definition,
        );
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(!output.contains("simp"));
        assert!(output.contains("-- unfold the relevant definition:"));

        let tree = single_step_tree("Simplify both sides", Category::Definition);
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(output.contains("simp"));
    }

    #[test]
    fn test_comments_suppressed() {
        let tree = sample_tree("Assume n is even. Therefore n is even.");
        let options = GeneratorOptions::default().with_comments(false);
        let output = generate(Some(&tree), &options);
        assert!(!output.contains("--"));
        assert!(output.contains("theorem translated_theorem"));
    }

    #[test]
    fn test_admit_suppressed() {
        let tree = sample_tree("Assume n is even. Therefore n is even.");
        let options = GeneratorOptions::default().with_admit(false);
        let output = generate(Some(&tree), &options);
        assert!(!output.contains("sorry"));
    }

    #[test]
    fn test_theorem_name_override() {
        let tree = sample_tree("Therefore n is even.");
        let options = GeneratorOptions::default().with_theorem_name("even_of_double");
        let output = generate(Some(&tree), &options);
        assert!(output.contains("theorem even_of_double : Even n := by"));
    }

    #[test]
    fn test_missing_goal_defaults_to_true() {
        let tree = sample_tree("Assume n is even.");
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(output.contains("theorem translated_theorem : True := by"));
    }

    #[test]
    fn test_comment_text_is_sanitized() {
        let mut tree = sample_tree("something unremarkable happens. Therefore q holds.");
        tree.steps[0].text = "breaks -/ out of the comment".to_string();
        let output = generate(Some(&tree), &GeneratorOptions::default());
        assert!(!output.contains("breaks -/"));
        assert!(output.contains("breaks - / out"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let tree = sample_tree(
            "Let n be an integer. Assume n is even. Then n = 2k for some k. Therefore n is even.",
        );
        let options = GeneratorOptions::default();
        assert_eq!(generate(Some(&tree), &options), generate(Some(&tree), &options));
    }

    #[test]
    fn test_witness_extraction() {
        assert_eq!(extract_witness("n = 2k for some k"), Some("k".to_string()));
        // The article is consumed whole; "an m" yields m, not the n of "an".
        assert_eq!(
            extract_witness("there exists an m with this property"),
            Some("m".to_string())
        );
        assert_eq!(
            extract_witness("there exists a d dividing n"),
            Some("d".to_string())
        );
        assert_eq!(
            extract_witness("there is some q between them"),
            Some("q".to_string())
        );
        assert_eq!(extract_witness("there exists j"), Some("j".to_string()));
        assert_eq!(extract_witness("no witness here"), None);
    }
}
