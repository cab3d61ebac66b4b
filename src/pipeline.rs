//! End-to-end translation pipeline.
//!
//! `translate` chains the three stages synchronously: classify the raw
//! text into sentences, extract entities, build the proof tree, then emit
//! the Lean skeleton. Total over arbitrary input and side-effect free.

use crate::classifier::{classify, ClassifiedSentence};
use crate::entities::{extract, Entity};
use crate::lean::generator::{generate, GeneratorOptions};
use crate::tree::{build, ProofTree};
use serde::{Deserialize, Serialize};

/// Everything a single translation produces, including the intermediate
/// stage outputs so callers can render any view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub sentences: Vec<ClassifiedSentence>,
    pub entities: Vec<Entity>,
    pub tree: ProofTree,
    pub skeleton: String,
}

/// Translate informal proof text into a proof tree and Lean skeleton.
pub fn translate(text: &str, options: &GeneratorOptions) -> TranslationResult {
    let sentences = classify(text);
    let entities = extract(&sentences);
    tracing::debug!(
        sentences = sentences.len(),
        entities = entities.len(),
        "classified input"
    );
    let tree = build(&sentences, &entities);
    let skeleton = generate(Some(&tree), options);
    TranslationResult {
        sentences,
        entities,
        tree,
        skeleton,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Category;
    use crate::tree::{repair_cycles, Technique};

    fn translate_default(text: &str) -> TranslationResult {
        translate(text, &GeneratorOptions::default())
    }

    #[test]
    fn test_empty_input_is_total() {
        let result = translate_default("");
        assert!(result.sentences.is_empty());
        assert!(result.entities.is_empty());
        assert!(result.tree.goal.is_none());
        assert!(result.skeleton.contains("theorem translated_theorem : True := by"));
    }

    #[test]
    fn test_scenario_even_number() {
        let result = translate_default(
            "Let n be an integer. Assume n is even. Then n = 2k for some k. Therefore n is even.",
        );
        let categories: Vec<Category> =
            result.sentences.iter().map(|s| s.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Assumption,
                Category::Assumption,
                Category::Existential,
                Category::Conclusion,
            ]
        );

        assert_eq!(result.tree.assumptions.len(), 2);
        assert_eq!(result.tree.steps.len(), 1);
        assert_eq!(
            result.tree.steps[0].technique,
            Technique::ExistentialIntro
        );
        let goal = result.tree.goal.as_ref().expect("goal");
        assert_eq!(goal.depends_on, vec!["s0".to_string()]);

        assert!(result.skeleton.contains("theorem translated_theorem : Even n := by"));
        assert!(result.skeleton.contains("use k"));
        assert!(result.skeleton.contains("sorry"));
    }

    #[test]
    fn test_scenario_contradiction() {
        let result = translate_default(
            "Assume sqrt(2) is rational. Suppose for contradiction that sqrt(2) = p/q in lowest terms. This leads to a contradiction.",
        );
        let contradiction_steps: Vec<_> = result
            .tree
            .steps
            .iter()
            .filter(|s| s.technique == Technique::Contradiction)
            .collect();
        assert!(!contradiction_steps.is_empty());
        assert!(result.skeleton.contains("by_contra h_contra"));
    }

    #[test]
    fn test_scenario_induction() {
        let result = translate_default(
            "Let n be a natural number. We prove the claim by induction on n. The base case is trivial. Therefore the claim holds for all n.",
        );
        let induction = result
            .tree
            .steps
            .iter()
            .find(|s| s.technique == Technique::Induction)
            .expect("induction step");
        assert_eq!(induction.variables, Some(vec!["n".to_string()]));
        assert!(result.skeleton.contains("induction n with"));
        assert!(result.skeleton.contains("| zero =>"));
        assert!(result.skeleton.contains("| succ n ih =>"));
    }

    #[test]
    fn test_tree_invariants_hold_end_to_end() {
        let result = translate_default(
            "Let m be an integer. Assume m > 0. Then m divides m^2. By the previous step, m^2 is positive. Therefore m^2 > 0.",
        );
        assert!(result.tree.references_are_valid());
        let mut clone = result.tree.clone();
        assert!(repair_cycles(&mut clone).is_empty());
        // Linear path covers every node exactly once, in insertion order.
        let path = result.tree.linear_path();
        let node_count = result.tree.assumptions.len()
            + result.tree.steps.len()
            + usize::from(result.tree.goal.is_some());
        assert_eq!(path.len(), node_count);
    }

    #[test]
    fn test_translation_is_deterministic() {
        let text = "Assume x is even. Then x = 2k for some k. Therefore x is even.";
        let options = GeneratorOptions::default();
        let first = translate(text, &options);
        let second = translate(text, &options);
        assert_eq!(first.skeleton, second.skeleton);
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn test_result_serializes_to_json() {
        let result = translate_default("Assume n is even. Therefore n is even.");
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"skeleton\""));
        assert!(json.contains("\"assumption\""));
        let parsed: TranslationResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.tree, result.tree);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn translate_never_panics(text in "\\PC{0,300}") {
                let result = translate(&text, &GeneratorOptions::default());
                prop_assert!(result.tree.references_are_valid());
                prop_assert!(!result.skeleton.is_empty());
            }
        }
    }
}
