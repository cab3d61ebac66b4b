//! Entity and type extraction from proof sentences.
//!
//! Scans sentence text for variables, types, functions, constants,
//! properties and sets using intentionally approximate natural-language
//! heuristics (bare-letter matching, Greek-name matching, subscript
//! patterns). These are not a parser; downstream code treats the results
//! as hints, primarily for type inference in the skeleton generator.

use crate::classifier::ClassifiedSentence;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Maximum number of example snippets stored per entity.
const MAX_EXAMPLES: usize = 3;

/// Maximum length of a stored example snippet, in characters.
const MAX_SNIPPET_CHARS: usize = 60;

/// Kind of mathematical entity recognized in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Variable,
    Type,
    Function,
    Constant,
    Property,
    Set,
    Concept,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Type => write!(f, "type"),
            Self::Function => write!(f, "function"),
            Self::Constant => write!(f, "constant"),
            Self::Property => write!(f, "property"),
            Self::Set => write!(f, "set"),
            Self::Concept => write!(f, "concept"),
        }
    }
}

/// A named mathematical object recognized in the source text.
///
/// Deduplicated by `name`; `examples` accumulate across all sentences that
/// mention the entity, capped at [`MAX_EXAMPLES`] distinct snippets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub examples: Vec<String>,
}

impl Entity {
    /// Create an entity with a single example snippet.
    pub fn new(name: impl Into<String>, kind: EntityKind, example: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            examples: vec![example.into()],
        }
    }

    fn push_example(&mut self, example: &str) {
        if self.examples.len() < MAX_EXAMPLES && !self.examples.iter().any(|e| e == example) {
            self.examples.push(example.to_string());
        }
    }
}

/// Single letters that are almost always prose, not variables.
const VARIABLE_STOP_SET: &[&str] = &["a", "A", "I", "O"];

/// Spelled-out Greek letter names treated as variables.
/// "pi" is deliberately absent: it is recognized as a constant.
const GREEK_NAMES: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi", "omega",
];

static BARE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Z])\b").expect("invalid regex"));

static SUBSCRIPT_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Z])_([A-Za-z0-9]+)\b").expect("invalid regex"));

static SUBSCRIPT_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Z])\((\d+)\)").expect("invalid regex"));

static SUBSCRIPT_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Z])\{(\d+)\}").expect("invalid regex"));

static GREEK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", GREEK_NAMES.join("|"))).expect("invalid regex")
});

// π is filtered out after matching: it is a constant, not a variable.
static GREEK_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[α-ωΑ-Ω]").expect("invalid regex"));

static TYPE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let pat = |pattern: &str, name| (Regex::new(pattern).expect("invalid regex"), name);
    vec![
        pat(r"(?i)\bintegers?\b|ℤ", "ℤ"),
        pat(r"(?i)\bnaturals?\b|\bnatural\s+numbers?\b|ℕ", "ℕ"),
        pat(r"(?i)\breals?\b|\breal\s+numbers?\b|ℝ", "ℝ"),
        pat(r"(?i)\brationals?\b|ℚ", "ℚ"),
        pat(r"(?i)\bcomplex\b|ℂ", "ℂ"),
        pat(r"(?i)\bpropositions?\b|\bProp\b", "Prop"),
    ]
});

static FUNCTION_WHITELIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(sin|cos|tan|log|ln|exp|sqrt|abs|floor|ceil|gcd|lcm|min|max)\b")
        .expect("invalid regex")
});

// Single letter applied to a non-numeric argument, e.g. f(x).
// A numeric argument is a subscript, handled above.
static CUSTOM_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-zA-Z])\(\s*([^\s)])").expect("invalid regex"));

static PI_CONSTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"π|(?i)\bpi\b").expect("invalid regex"));

static E_CONSTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\be\b").expect("invalid regex"));

static INFINITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"∞|(?i)\binfinity\b").expect("invalid regex"));

static ZERO_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0\b").expect("invalid regex"));

static ONE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b1\b").expect("invalid regex"));

static PROPERTY_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(even|odd|prime|composite|divisible|factor|multiple|positive|negative|nonzero|continuous|differentiable|integrable|bounded|unbounded|convergent|divergent|injective|surjective|bijective|associative|commutative|distributive)\b",
    )
    .expect("invalid regex")
});

static SET_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z])\s*=\s*\{").expect("invalid regex"));

static SET_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsubsets?\b|\bsupersets?\b|\bunion\b|\bintersection\b|\bcomplement\b|\belement\s+of\b|[∈∉⊂⊆⊃⊇∪∩]")
        .expect("invalid regex")
});

/// True when the identifier ending at byte offset `end` is an assignment
/// target (next non-space char is `=` but not `==`).
fn followed_by_equals(text: &str, end: usize) -> bool {
    let rest = text[end..].trim_start();
    rest.starts_with('=') && !rest.starts_with("==")
}

/// Extract variable names from a single sentence, in order of appearance,
/// deduplicated. Shared between the extractor and the tree builder's
/// variable scope tracking.
pub fn sentence_variables(text: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut push = |name: String| {
        if !variables.contains(&name) {
            variables.push(name);
        }
    };

    for caps in BARE_LETTER.captures_iter(text) {
        let m = caps.get(1).expect("capture group");
        let letter = m.as_str();
        if VARIABLE_STOP_SET.contains(&letter) {
            continue;
        }
        // "e" is Euler's number unless it is being assigned to.
        if letter == "e" && !followed_by_equals(text, m.end()) {
            continue;
        }
        // A letter applied to an argument is a function, not a variable.
        if text[m.end()..].starts_with('(') {
            continue;
        }
        push(letter.to_string());
    }

    for caps in SUBSCRIPT_UNDERSCORE.captures_iter(text) {
        push(format!("{}_{}", &caps[1], &caps[2]));
    }
    for caps in SUBSCRIPT_PAREN
        .captures_iter(text)
        .chain(SUBSCRIPT_BRACE.captures_iter(text))
    {
        push(format!("{}_{}", &caps[1], &caps[2]));
    }

    for caps in GREEK_NAME.captures_iter(text) {
        push(caps[1].to_lowercase());
    }
    for m in GREEK_SYMBOL.find_iter(text) {
        if m.as_str() != "π" {
            push(m.as_str().to_string());
        }
    }

    variables
}

/// Accumulates entities in insertion order, merging by name.
#[derive(Default)]
struct EntityAccumulator {
    entities: Vec<Entity>,
    by_name: HashMap<String, usize>,
}

impl EntityAccumulator {
    fn add(&mut self, name: &str, kind: EntityKind, snippet: &str) {
        match self.by_name.get(name) {
            Some(&idx) => self.entities[idx].push_example(snippet),
            None => {
                self.by_name.insert(name.to_string(), self.entities.len());
                self.entities.push(Entity::new(name, kind, snippet));
            }
        }
    }

    fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}

/// Truncate a sentence to a bounded snippet for entity examples.
fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_SNIPPET_CHARS).collect();
        format!("{}…", cut)
    }
}

/// Scan classified sentences for mathematical entities.
///
/// Total over an empty sequence (returns an empty vec). Results are merged
/// by name; the first kind seen for a name wins, later mentions only add
/// example snippets.
pub fn extract(sentences: &[ClassifiedSentence]) -> Vec<Entity> {
    let mut acc = EntityAccumulator::default();

    for sentence in sentences {
        let text = sentence.text.as_str();
        let snip = snippet(text);

        // Types first: their vocabulary drives downstream type inference.
        for (pattern, name) in TYPE_PATTERNS.iter() {
            if pattern.is_match(text) {
                acc.add(name, EntityKind::Type, &snip);
            }
        }

        // Named functions, then the single-letter application heuristic.
        for caps in FUNCTION_WHITELIST.captures_iter(text) {
            acc.add(&caps[1].to_lowercase(), EntityKind::Function, &snip);
        }
        for caps in CUSTOM_FUNCTION.captures_iter(text) {
            if !caps[2].chars().next().is_some_and(|c| c.is_ascii_digit()) {
                acc.add(&caps[1], EntityKind::Function, &snip);
            }
        }

        // Constants.
        if PI_CONSTANT.is_match(text) {
            acc.add("π", EntityKind::Constant, &snip);
        }
        for m in E_CONSTANT.find_iter(text) {
            if !followed_by_equals(text, m.end()) {
                acc.add("e", EntityKind::Constant, &snip);
            }
        }
        if INFINITY.is_match(text) {
            acc.add("∞", EntityKind::Constant, &snip);
        }
        for (literal, pattern) in [("0", &*ZERO_LITERAL), ("1", &*ONE_LITERAL)] {
            if pattern.is_match(text) {
                acc.add(literal, EntityKind::Constant, &snip);
            }
        }

        // Properties.
        for caps in PROPERTY_VOCAB.captures_iter(text) {
            acc.add(&caps[1].to_lowercase(), EntityKind::Property, &snip);
        }

        // Sets.
        for caps in SET_DEFINITION.captures_iter(text) {
            acc.add(&caps[1], EntityKind::Set, &snip);
        }
        if SET_VOCAB.is_match(text) {
            acc.add("Set", EntityKind::Concept, &snip);
        }

        // Variables last: a name already recorded as a function or
        // constant keeps that kind and only gains an example.
        for variable in sentence_variables(text) {
            acc.add(&variable, EntityKind::Variable, &snip);
        }
    }

    acc.into_entities()
}
