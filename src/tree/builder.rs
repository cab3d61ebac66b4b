//! Proof tree construction from classified sentences.
//!
//! Sentences are processed strictly in original order. The builder keeps
//! its accumulators (variable scope, created-step list, case stack) in a
//! local context that is discarded when `build` returns; nothing is shared
//! across invocations. Metadata is aggregated in a single pass after all
//! nodes exist.

use crate::classifier::{Category, ClassifiedSentence};
use crate::entities::{sentence_variables, Entity, EntityKind};
use crate::tree::types::{
    Assumption, Goal, ProofTree, Step, SubSteps, Technique, TreeMetadata,
};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// How many prior steps a contradiction step depends on.
const CONTRADICTION_LOOKBACK: usize = 3;

static BACK_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:by|from|using)\s+(?:step|assumption|equation)\s*\d*\b|\b(?:above|previous|earlier)\s+(?:step|statement|equation)\b",
    )
    .expect("invalid regex")
});

static INDUCTION_ON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\binduction\s+on\s+([a-zA-Z])\b").expect("invalid regex"));

static PROVE_BY_INDUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bprove\s+by\s+induction\b.*?\b([a-zA-Z])\b").expect("invalid regex")
});

static FOR_ALL_NATURAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+all\s+([a-zA-Z])\b\s*(?:∈|in)\s*(?:ℕ|the\s+naturals?\b|natural\s+numbers?\b|N\b)")
        .expect("invalid regex")
});

static BASE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bbase\s+case\b").expect("invalid regex"));

static INDUCTIVE_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\binductive\s+(?:step|case|hypothesis)\b").expect("invalid regex")
});

/// Builder-local accumulators, passed explicitly rather than held as
/// ambient state. Discarded when `build` returns.
#[derive(Debug, Default)]
struct BuilderContext {
    /// Variable name → ordered list of node ids that introduced or
    /// constrained it. Grows monotonically in sentence order.
    scope: HashMap<String, Vec<String>>,
    /// Variable names in first-seen order, for metadata aggregation.
    scope_order: Vec<String>,
    /// Ids of previously created steps, in creation order.
    created_steps: Vec<String>,
    /// Ids of open case-analysis steps; depth drives case numbering.
    case_stack: Vec<String>,
}

impl BuilderContext {
    /// Register a variable occurrence, appending to any existing entries.
    fn register(&mut self, variable: &str, node_id: &str) {
        if !self.scope.contains_key(variable) {
            self.scope_order.push(variable.to_string());
        }
        self.scope
            .entry(variable.to_string())
            .or_default()
            .push(node_id.to_string());
    }

    /// Register a variable only when it is not already in scope, so an
    /// existing witness is never overwritten.
    fn register_if_absent(&mut self, variable: &str, node_id: &str) {
        if !self.scope.contains_key(variable) {
            self.register(variable, node_id);
        }
    }

    fn last_step(&self) -> Option<&String> {
        self.created_steps.last()
    }
}

fn push_unique(deps: &mut Vec<String>, id: &str) {
    if !deps.iter().any(|d| d == id) {
        deps.push(id.to_string());
    }
}

/// Extract the induction variable from an induction sentence, trying the
/// explicit patterns in order and falling back to the first bare letter.
fn induction_variable(text: &str) -> Option<String> {
    for pattern in [&*INDUCTION_ON, &*PROVE_BY_INDUCTION, &*FOR_ALL_NATURAL] {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    sentence_variables(text).into_iter().next()
}

/// Pick up base/inductive-case annotations mentioned in the sentence itself.
fn sniff_substeps(text: &str) -> Option<SubSteps> {
    let substeps = SubSteps {
        base_case: BASE_CASE.is_match(text).then(|| text.to_string()),
        inductive_step: INDUCTIVE_CASE.is_match(text).then(|| text.to_string()),
    };
    (!substeps.is_empty()).then_some(substeps)
}

/// General dependency inference for generic steps.
///
/// Candidates are accumulated from, in order: explicit back-reference
/// phrasing, variable-scope entries, entity cross-references against
/// assumption variables, the most recent step as a fallback, and finally
/// variable-matched (or first) assumptions. The result is an ordered,
/// deduplicated union; it is empty only when the tree has no assumptions
/// and no prior steps.
fn infer_dependencies(
    text: &str,
    variables: &[String],
    ctx: &BuilderContext,
    entities: &[Entity],
    assumptions: &[Assumption],
) -> Vec<String> {
    let mut deps = Vec::new();

    if BACK_REFERENCE.is_match(text) {
        if let Some(last) = ctx.last_step() {
            push_unique(&mut deps, last);
        }
    }

    for variable in variables {
        if let Some(ids) = ctx.scope.get(variable) {
            for id in ids {
                push_unique(&mut deps, id);
            }
        }
    }

    for variable in variables {
        let is_known_variable = entities
            .iter()
            .any(|e| e.kind == EntityKind::Variable && e.name == *variable);
        if !is_known_variable {
            continue;
        }
        for assumption in assumptions {
            if assumption.variables.contains(variable) {
                push_unique(&mut deps, &assumption.id);
            }
        }
    }

    if deps.is_empty() {
        if let Some(last) = ctx.last_step() {
            push_unique(&mut deps, last);
        }
    }

    if deps.is_empty() && !assumptions.is_empty() {
        let mut matched = false;
        for assumption in assumptions {
            if assumption.variables.iter().any(|v| variables.contains(v)) {
                push_unique(&mut deps, &assumption.id);
                matched = true;
            }
        }
        if !matched {
            push_unique(&mut deps, &assumptions[0].id);
        }
    }

    deps
}

/// Build a proof tree from classified sentences and extracted entities.
///
/// Total over empty or malformed input: returns a tree with empty
/// collections and no goal. The returned tree's step/goal dependency graph
/// is acyclic; repairs are logged as warnings.
pub fn build(sentences: &[ClassifiedSentence], entities: &[Entity]) -> ProofTree {
    let mut ctx = BuilderContext::default();
    let mut assumptions: Vec<Assumption> = Vec::new();
    let mut steps: Vec<Step> = Vec::new();
    let mut goal: Option<Goal> = None;

    for sentence in sentences {
        let text = sentence.text.clone();
        let variables = sentence_variables(&text);

        match sentence.category {
            Category::Assumption => {
                let id = format!("a{}", assumptions.len());
                for variable in &variables {
                    ctx.register(variable, &id);
                }
                assumptions.push(Assumption {
                    id,
                    text,
                    variables,
                });
            }

            Category::Conclusion => {
                // Last conclusion sentence wins.
                let depends_on = if !ctx.created_steps.is_empty() {
                    ctx.created_steps.clone()
                } else {
                    assumptions.iter().map(|a| a.id.clone()).collect()
                };
                goal = Some(Goal {
                    id: "goal".to_string(),
                    text,
                    depends_on,
                    variables,
                });
            }

            Category::Induction => {
                let id = format!("s{}", steps.len());
                let variable = induction_variable(&text);
                let mut depends_on = Vec::new();
                if let Some(ref v) = variable {
                    if let Some(ids) = ctx.scope.get(v) {
                        for dep in ids {
                            push_unique(&mut depends_on, dep);
                        }
                    }
                }
                if let Some(last) = ctx.last_step() {
                    push_unique(&mut depends_on, last);
                }
                let substeps = sniff_substeps(&text);
                steps.push(Step {
                    id: id.clone(),
                    text,
                    category: sentence.category,
                    technique: Technique::Induction,
                    depends_on,
                    variables: variable.map(|v| vec![v]),
                    case_number: None,
                    substeps,
                });
                ctx.created_steps.push(id);
            }

            Category::Contradiction => {
                let id = format!("s{}", steps.len());
                let start = ctx
                    .created_steps
                    .len()
                    .saturating_sub(CONTRADICTION_LOOKBACK);
                let depends_on = ctx.created_steps[start..].to_vec();
                steps.push(Step {
                    id: id.clone(),
                    text,
                    category: sentence.category,
                    technique: Technique::Contradiction,
                    depends_on,
                    variables: (!variables.is_empty()).then_some(variables),
                    case_number: None,
                    substeps: None,
                });
                ctx.created_steps.push(id);
            }

            Category::Case => {
                let id = format!("s{}", steps.len());
                let depends_on = ctx.last_step().cloned().into_iter().collect();
                let case_number = 1 + ctx.case_stack.len() as u32;
                steps.push(Step {
                    id: id.clone(),
                    text,
                    category: sentence.category,
                    technique: Technique::CaseAnalysis,
                    depends_on,
                    variables: (!variables.is_empty()).then_some(variables),
                    case_number: Some(case_number),
                    substeps: None,
                });
                ctx.case_stack.push(id.clone());
                ctx.created_steps.push(id);
            }

            Category::Existential => {
                let id = format!("s{}", steps.len());
                let depends_on = ctx.last_step().cloned().into_iter().collect();
                for variable in &variables {
                    ctx.register_if_absent(variable, &id);
                }
                steps.push(Step {
                    id: id.clone(),
                    text,
                    category: sentence.category,
                    technique: Technique::ExistentialIntro,
                    depends_on,
                    variables: (!variables.is_empty()).then_some(variables),
                    case_number: None,
                    substeps: None,
                });
                ctx.created_steps.push(id);
            }

            Category::Universal => {
                let id = format!("s{}", steps.len());
                let depends_on = ctx.last_step().cloned().into_iter().collect();
                steps.push(Step {
                    id: id.clone(),
                    text,
                    category: sentence.category,
                    technique: Technique::UniversalIntro,
                    depends_on,
                    variables: (!variables.is_empty()).then_some(variables),
                    case_number: None,
                    substeps: None,
                });
                ctx.created_steps.push(id);
            }

            // Implication, definition, arithmetic, algebraic, set theory,
            // plain steps and unmatched sentences all become generic steps
            // with inferred dependencies.
            category => {
                let id = format!("s{}", steps.len());
                let depends_on =
                    infer_dependencies(&text, &variables, &ctx, entities, &assumptions);
                steps.push(Step {
                    id: id.clone(),
                    text,
                    category,
                    technique: Technique::from_category(category),
                    depends_on,
                    variables: (!variables.is_empty()).then_some(variables),
                    case_number: None,
                    substeps: None,
                });
                ctx.created_steps.push(id);
            }
        }
    }

    let mut tree = ProofTree {
        assumptions,
        steps,
        goal,
        entities: entities.to_vec(),
        metadata: TreeMetadata::default(),
    };

    repair_cycles(&mut tree);
    tree.metadata = aggregate_metadata(&tree, &ctx);
    tree
}

/// Compute tree metadata in one pass over the finished nodes.
fn aggregate_metadata(tree: &ProofTree, ctx: &BuilderContext) -> TreeMetadata {
    let mut techniques: Vec<String> = Vec::new();
    for step in &tree.steps {
        let name = step.technique.to_string();
        if !techniques.contains(&name) {
            techniques.push(name);
        }
    }

    let mut types: Vec<String> = Vec::new();
    for entity in &tree.entities {
        if entity.kind == EntityKind::Type && !types.contains(&entity.name) {
            types.push(entity.name.clone());
        }
    }

    TreeMetadata {
        techniques,
        variables: ctx.scope_order.clone(),
        types,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Detect and repair dependency cycles among steps and the goal.
///
/// Classic white/gray/black depth-first traversal. Steps found on a cycle
/// have their entire dependency set cleared; a goal on a cycle is only
/// warned about and its edges are left untouched. Returns the warning
/// messages that were emitted, so callers can surface them.
pub fn repair_cycles(tree: &mut ProofTree) -> Vec<String> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for step in &tree.steps {
        edges.insert(
            step.id.as_str(),
            step.depends_on.iter().map(String::as_str).collect(),
        );
    }
    if let Some(ref goal) = tree.goal {
        edges.insert(
            goal.id.as_str(),
            goal.depends_on.iter().map(String::as_str).collect(),
        );
    }

    let mut colors: HashMap<&str, Color> =
        edges.keys().map(|&id| (id, Color::White)).collect();
    let mut in_cycle: Vec<String> = Vec::new();
    let node_ids: Vec<&str> = edges.keys().copied().collect();

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        colors: &mut HashMap<&'a str, Color>,
        path: &mut Vec<&'a str>,
        in_cycle: &mut Vec<String>,
    ) {
        colors.insert(node, Color::Gray);
        path.push(node);
        for &dep in edges.get(node).into_iter().flatten() {
            // Edges into assumptions terminate; assumptions have no out-edges.
            match colors.get(dep).copied() {
                Some(Color::White) => visit(dep, edges, colors, path, in_cycle),
                Some(Color::Gray) => {
                    let pos = path.iter().position(|&p| p == dep).unwrap_or(0);
                    for &member in &path[pos..] {
                        if !in_cycle.iter().any(|c| c == member) {
                            in_cycle.push(member.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
        path.pop();
        colors.insert(node, Color::Black);
    }

    for node in node_ids {
        if colors[node] == Color::White {
            let mut path = Vec::new();
            visit(node, &edges, &mut colors, &mut path, &mut in_cycle);
        }
    }

    let mut warnings = Vec::new();
    for id in &in_cycle {
        if id == "goal" {
            let warning = "dependency cycle involves the goal; edges left intact".to_string();
            tracing::warn!("{}", warning);
            warnings.push(warning);
            continue;
        }
        if let Some(step) = tree.steps.iter_mut().find(|s| &s.id == id) {
            let warning = format!(
                "dependency cycle detected at step {}; clearing its dependencies",
                id
            );
            tracing::warn!("{}", warning);
            step.depends_on.clear();
            warnings.push(warning);
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::entities::extract;

    fn build_from_text(text: &str) -> ProofTree {
        let sentences = classify(text);
        let entities = extract(&sentences);
        build(&sentences, &entities)
    }

    fn assert_acyclic(tree: &ProofTree) {
        let mut clone = tree.clone();
        assert!(repair_cycles(&mut clone).is_empty(), "tree has a cycle");
    }

    #[test]
    fn test_empty_input() {
        let tree = build(&[], &[]);
        assert!(tree.assumptions.is_empty());
        assert!(tree.steps.is_empty());
        assert!(tree.goal.is_none());
        assert!(tree.metadata.techniques.is_empty());
    }

    #[test]
    fn test_scenario_a_tree_shape() {
        let tree = build_from_text(
            "Let n be an integer. Assume n is even. Then n = 2k for some k. Therefore n is even.",
        );
        assert_eq!(tree.assumptions.len(), 2);
        assert_eq!(tree.steps.len(), 1);

        let step = &tree.steps[0];
        assert_eq!(step.technique, Technique::ExistentialIntro);

        // The witness k is registered into scope by the existential step.
        assert!(tree.metadata.variables.contains(&"k".to_string()));
        assert!(tree.metadata.variables.contains(&"n".to_string()));

        let goal = tree.goal.as_ref().expect("goal");
        assert_eq!(goal.depends_on, vec!["s0".to_string()]);
        assert!(tree.references_are_valid());
        assert_acyclic(&tree);
    }

    #[test]
    fn test_goal_falls_back_to_assumptions() {
        let tree = build_from_text("Assume n is even. Therefore n is even.");
        let goal = tree.goal.as_ref().expect("goal");
        assert_eq!(goal.depends_on, vec!["a0".to_string()]);
    }

    #[test]
    fn test_last_conclusion_wins() {
        let sentences = vec![
            ClassifiedSentence::new("Therefore p holds", Category::Conclusion),
            ClassifiedSentence::new("Therefore q holds", Category::Conclusion),
        ];
        let tree = build(&sentences, &[]);
        assert_eq!(tree.goal.as_ref().expect("goal").text, "Therefore q holds");
    }

    #[test]
    fn test_fallback_dependency_on_previous_step() {
        // Scenario D: two generic sentences, no shared variables, no
        // back-references, no assumptions. The second step depends on
        // exactly the first step's id.
        let sentences = vec![
            ClassifiedSentence::new("something unremarkable happens", Category::Other),
            ClassifiedSentence::new("another unrelated remark", Category::Other),
        ];
        let tree = build(&sentences, &[]);
        assert_eq!(tree.steps.len(), 2);
        assert!(tree.steps[0].depends_on.is_empty());
        assert_eq!(tree.steps[1].depends_on, vec!["s0".to_string()]);
    }

    #[test]
    fn test_back_reference_targets_most_recent_step() {
        let sentences = vec![
            ClassifiedSentence::new("something unremarkable happens", Category::Other),
            ClassifiedSentence::new("by the previous step the claim holds", Category::Other),
        ];
        let tree = build(&sentences, &[]);
        assert_eq!(tree.steps[1].depends_on, vec!["s0".to_string()]);
    }

    #[test]
    fn test_variable_scope_dependency() {
        let tree = build_from_text("Let m be an integer. It follows that m divides q.");
        assert_eq!(tree.steps.len(), 1);
        // m is in scope from a0.
        assert!(tree.steps[0].depends_on.contains(&"a0".to_string()));
    }

    #[test]
    fn test_unmatched_variables_fall_back_to_first_assumption() {
        let sentences = vec![
            ClassifiedSentence::new("Assume w is positive", Category::Assumption),
            ClassifiedSentence::new("something about z entirely", Category::Other),
        ];
        // No entity extraction: z is not in scope and not in any assumption.
        let tree = build(&sentences, &[]);
        assert_eq!(tree.steps[0].depends_on, vec!["a0".to_string()]);
    }

    #[test]
    fn test_contradiction_lookback_window() {
        let sentences = vec![
            ClassifiedSentence::new("first remark", Category::Other),
            ClassifiedSentence::new("second remark", Category::Other),
            ClassifiedSentence::new("third remark", Category::Other),
            ClassifiedSentence::new("fourth remark", Category::Other),
            ClassifiedSentence::new("this leads to a contradiction", Category::Contradiction),
        ];
        let tree = build(&sentences, &[]);
        let contradiction = &tree.steps[4];
        assert_eq!(contradiction.technique, Technique::Contradiction);
        assert_eq!(
            contradiction.depends_on,
            vec!["s1".to_string(), "s2".to_string(), "s3".to_string()]
        );
    }

    #[test]
    fn test_case_stack_numbering() {
        let sentences = vec![
            ClassifiedSentence::new("Consider the case where n > 0", Category::Case),
            ClassifiedSentence::new("Consider the case where n < 0", Category::Case),
        ];
        let tree = build(&sentences, &[]);
        assert_eq!(tree.steps[0].case_number, Some(1));
        assert_eq!(tree.steps[1].case_number, Some(2));
        assert_eq!(tree.steps[1].depends_on, vec!["s0".to_string()]);
    }

    #[test]
    fn test_existential_does_not_overwrite_witness() {
        let sentences = vec![
            ClassifiedSentence::new("Let k be a natural number", Category::Assumption),
            ClassifiedSentence::new("Then n = 2k for some k", Category::Existential),
        ];
        let tree = build(&sentences, &[]);
        // Witness n is new, k keeps its assumption registration.
        let step = &tree.steps[0];
        assert_eq!(step.technique, Technique::ExistentialIntro);
        assert_eq!(tree.assumptions[0].variables, vec!["k".to_string()]);
        // The builder registered k at a0 and left it there.
        let generic = vec![ClassifiedSentence::new(
            "it follows that k is bounded",
            Category::Step,
        )];
        let mut all = sentences.clone();
        all.extend(generic);
        let tree = build(&all, &[]);
        assert!(tree.steps[1].depends_on.contains(&"a0".to_string()));
    }

    #[test]
    fn test_induction_variable_and_dependencies() {
        let tree = build_from_text(
            "Let n be a natural number. We prove the claim by induction on n.",
        );
        assert_eq!(tree.steps.len(), 1);
        let step = &tree.steps[0];
        assert_eq!(step.technique, Technique::Induction);
        assert_eq!(step.variables, Some(vec!["n".to_string()]));
        assert!(step.depends_on.contains(&"a0".to_string()));
    }

    #[test]
    fn test_induction_substeps_sniffed() {
        let sentences = vec![ClassifiedSentence::new(
            "By induction on n, checking the base case first",
            Category::Induction,
        )];
        let tree = build(&sentences, &[]);
        let substeps = tree.steps[0].substeps.as_ref().expect("substeps");
        assert!(substeps.base_case.is_some());
        assert!(substeps.inductive_step.is_none());
    }

    #[test]
    fn test_repair_cycles_clears_step_dependencies() {
        let mut tree = build(
            &[
                ClassifiedSentence::new("first remark", Category::Other),
                ClassifiedSentence::new("second remark", Category::Other),
            ],
            &[],
        );
        // Manufacture a cycle: s0 -> s1 -> s0.
        tree.steps[0].depends_on = vec!["s1".to_string()];
        tree.steps[1].depends_on = vec!["s0".to_string()];

        let warnings = repair_cycles(&mut tree);
        assert!(!warnings.is_empty());
        assert!(tree.steps.iter().all(|s| s.depends_on.is_empty()));
        assert_acyclic(&tree);
    }

    #[test]
    fn test_goal_cycle_edges_left_intact() {
        let mut tree = build(
            &[
                ClassifiedSentence::new("first remark", Category::Other),
                ClassifiedSentence::new("therefore done", Category::Conclusion),
            ],
            &[],
        );
        // Manufacture a step -> goal -> step cycle.
        tree.steps[0].depends_on = vec!["goal".to_string()];

        let warnings = repair_cycles(&mut tree);
        assert!(warnings.iter().any(|w| w.contains("goal")));
        let goal = tree.goal.as_ref().expect("goal");
        assert_eq!(goal.depends_on, vec!["s0".to_string()]);
    }

    #[test]
    fn test_metadata_aggregation() {
        let tree = build_from_text(
            "Let n be an integer. Then n = 2k for some k. This leads to a contradiction.",
        );
        assert!(tree
            .metadata
            .techniques
            .contains(&"existential_intro".to_string()));
        assert!(tree
            .metadata
            .techniques
            .contains(&"proof_by_contradiction".to_string()));
        assert!(tree.metadata.types.contains(&"ℤ".to_string()));
        assert_eq!(tree.metadata.variables[0], "n");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arbitrary_category() -> impl Strategy<Value = Category> {
            prop_oneof![
                Just(Category::Induction),
                Just(Category::Contradiction),
                Just(Category::Case),
                Just(Category::Definition),
                Just(Category::Existential),
                Just(Category::Universal),
                Just(Category::Implication),
                Just(Category::Assumption),
                Just(Category::Step),
                Just(Category::Conclusion),
                Just(Category::Arithmetic),
                Just(Category::Algebraic),
                Just(Category::SetTheory),
                Just(Category::Other),
            ]
        }

        proptest! {
            #[test]
            fn built_trees_are_acyclic_with_valid_references(
                inputs in prop::collection::vec(
                    (arbitrary_category(), "[a-z ]{0,40}"),
                    0..24,
                )
            ) {
                let sentences: Vec<ClassifiedSentence> = inputs
                    .into_iter()
                    .map(|(category, text)| ClassifiedSentence::new(text, category))
                    .collect();
                let entities = extract(&sentences);
                let mut tree = build(&sentences, &entities);
                prop_assert!(tree.references_are_valid());
                prop_assert!(repair_cycles(&mut tree).is_empty());
            }
        }
    }
}
