//! Node types for the dependency-linked proof tree.

use crate::classifier::Category;
use crate::entities::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Proof strategy attached to a step, driving tactic-block dispatch
/// in the skeleton generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Induction,
    #[serde(rename = "proof_by_contradiction")]
    Contradiction,
    CaseAnalysis,
    ExistentialIntro,
    UniversalIntro,
    Implication,
    Definition,
    Arithmetic,
    Algebraic,
    SetTheory,
    /// A plain derivation step with no dedicated tactic form.
    Direct,
}

impl Technique {
    /// Map a sentence category to the technique of the step it produces.
    pub fn from_category(category: Category) -> Self {
        match category {
            Category::Induction => Self::Induction,
            Category::Contradiction => Self::Contradiction,
            Category::Case => Self::CaseAnalysis,
            Category::Existential => Self::ExistentialIntro,
            Category::Universal => Self::UniversalIntro,
            Category::Implication => Self::Implication,
            Category::Definition => Self::Definition,
            Category::Arithmetic => Self::Arithmetic,
            Category::Algebraic => Self::Algebraic,
            Category::SetTheory => Self::SetTheory,
            _ => Self::Direct,
        }
    }
}

impl std::fmt::Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Induction => write!(f, "induction"),
            Self::Contradiction => write!(f, "proof_by_contradiction"),
            Self::CaseAnalysis => write!(f, "case_analysis"),
            Self::ExistentialIntro => write!(f, "existential_intro"),
            Self::UniversalIntro => write!(f, "universal_intro"),
            Self::Implication => write!(f, "implication"),
            Self::Definition => write!(f, "definition"),
            Self::Arithmetic => write!(f, "arithmetic"),
            Self::Algebraic => write!(f, "algebraic"),
            Self::SetTheory => write!(f, "set_theory"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// A hypothesis introduced by the proof text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumption {
    /// Unique node id, `"a"` + ordinal.
    pub id: String,
    /// Original sentence text.
    pub text: String,
    /// Variables introduced or constrained by this assumption.
    pub variables: Vec<String>,
}

/// Base-case / inductive-step annotations for an induction step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSteps {
    pub base_case: Option<String>,
    pub inductive_step: Option<String>,
}

impl SubSteps {
    /// True when neither annotation is present.
    pub fn is_empty(&self) -> bool {
        self.base_case.is_none() && self.inductive_step.is_none()
    }
}

/// A technique-typed proof step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Unique node id, `"s"` + ordinal.
    pub id: String,
    /// Original sentence text.
    pub text: String,
    /// The sentence category that produced this step.
    pub category: Category,
    /// The proof technique driving tactic emission.
    pub technique: Technique,
    /// Ids of nodes this step depends on.
    pub depends_on: Vec<String>,
    /// Variables mentioned by this step, when relevant to its technique.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    /// 1-based case number for case-analysis steps (1 + nesting depth).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_number: Option<u32>,
    /// Base/inductive-case annotations for induction steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substeps: Option<SubSteps>,
}

/// The proof goal. At most one per tree; the last conclusion sentence wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Always `"goal"`.
    pub id: String,
    /// Original sentence text.
    pub text: String,
    /// Ids of nodes the goal depends on.
    pub depends_on: Vec<String>,
    /// Variables mentioned in the goal sentence.
    pub variables: Vec<String>,
}

/// Aggregated tree-level facts, computed once after all nodes are built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeMetadata {
    /// Techniques used, in first-use order.
    pub techniques: Vec<String>,
    /// Variables registered in scope, in first-seen order.
    pub variables: Vec<String>,
    /// Symbolic type names seen in the input, in first-seen order.
    pub types: Vec<String>,
}

/// Reference to a node in traversal order, for the linear proof path view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Assumption(&'a Assumption),
    Step(&'a Step),
    Goal(&'a Goal),
}

impl<'a> NodeRef<'a> {
    /// The node's unique id. Borrows from the tree, not from this reference.
    pub fn id(&self) -> &'a str {
        match self {
            Self::Assumption(a) => &a.id,
            Self::Step(s) => &s.id,
            Self::Goal(g) => &g.id,
        }
    }

    /// The node's source text. Borrows from the tree, not from this reference.
    pub fn text(&self) -> &'a str {
        match self {
            Self::Assumption(a) => &a.text,
            Self::Step(s) => &s.text,
            Self::Goal(g) => &g.text,
        }
    }
}

/// The dependency-linked proof representation.
///
/// Insertion order of `assumptions` and `steps` equals original sentence
/// order. After [`crate::tree::build`] returns, the dependency graph
/// restricted to steps and the goal is acyclic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofTree {
    pub assumptions: Vec<Assumption>,
    pub steps: Vec<Step>,
    pub goal: Option<Goal>,
    pub entities: Vec<Entity>,
    pub metadata: TreeMetadata,
}

impl ProofTree {
    /// Linear proof path: assumptions, then steps, then the goal if present.
    pub fn linear_path(&self) -> Vec<NodeRef<'_>> {
        let mut path: Vec<NodeRef<'_>> =
            self.assumptions.iter().map(NodeRef::Assumption).collect();
        path.extend(self.steps.iter().map(NodeRef::Step));
        if let Some(ref goal) = self.goal {
            path.push(NodeRef::Goal(goal));
        }
        path
    }

    /// Dependency adjacency map: node id → ids it depends on.
    /// Assumptions are sources and map to empty lists.
    pub fn dependency_map(&self) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();
        for assumption in &self.assumptions {
            map.insert(assumption.id.clone(), Vec::new());
        }
        for step in &self.steps {
            map.insert(step.id.clone(), step.depends_on.clone());
        }
        if let Some(ref goal) = self.goal {
            map.insert(goal.id.clone(), goal.depends_on.clone());
        }
        map
    }

    /// Look up a step by id.
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Every id referenced in a `depends_on` set must name an existing node.
    pub fn references_are_valid(&self) -> bool {
        let map = self.dependency_map();
        map.values()
            .flatten()
            .all(|id| map.contains_key(id.as_str()))
    }
}
