//! Sentence classification for informal proof text.
//!
//! Splits free text into sentences and tags each with the proof technique
//! it signals. Classification is driven by [`RULE_TABLE`], an ordered list
//! of (category, pattern) pairs evaluated top-to-bottom with first-match-wins
//! semantics, so the priority order is an inspectable artifact rather than
//! implicit control flow.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Proof technique category assigned to a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Proof by induction (base case / inductive step).
    Induction,
    /// Proof by contradiction.
    Contradiction,
    /// Case analysis.
    Case,
    /// Definition expansion, simplification, substitution.
    Definition,
    /// Existential claim ("there exists", "for some").
    Existential,
    /// Universal claim ("for all", "every").
    Universal,
    /// Implication ("if ... then", "implies").
    Implication,
    /// Hypothesis introduction ("assume", "let", "suppose").
    Assumption,
    /// A derivation step ("then", "we have", "it follows that").
    Step,
    /// The concluding sentence ("therefore", QED).
    Conclusion,
    /// Number-theoretic or arithmetic content.
    Arithmetic,
    /// Equational/relational algebraic content.
    Algebraic,
    /// Set-theoretic vocabulary or symbols.
    SetTheory,
    /// Fallback when no rule matches.
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Induction => write!(f, "induction"),
            Self::Contradiction => write!(f, "contradiction"),
            Self::Case => write!(f, "case"),
            Self::Definition => write!(f, "definition"),
            Self::Existential => write!(f, "existential"),
            Self::Universal => write!(f, "universal"),
            Self::Implication => write!(f, "implication"),
            Self::Assumption => write!(f, "assumption"),
            Self::Step => write!(f, "step"),
            Self::Conclusion => write!(f, "conclusion"),
            Self::Arithmetic => write!(f, "arithmetic"),
            Self::Algebraic => write!(f, "algebraic"),
            Self::SetTheory => write!(f, "set_theory"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A sentence tagged with its proof technique category.
///
/// Immutable once produced by [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSentence {
    /// The sentence text, trimmed.
    pub text: String,
    /// The category assigned by the first matching rule.
    pub category: Category,
}

impl ClassifiedSentence {
    /// Create a classified sentence directly (useful for tests and callers
    /// that do their own sentence splitting).
    pub fn new(text: impl Into<String>, category: Category) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// Ordered classification rules: first matching pattern wins.
///
/// Order encodes priority. A sentence matching both an induction trigger and
/// a generic step trigger is always classified as induction.
static RULE_TABLE: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    let rule = |category, pattern| {
        (
            category,
            Regex::new(pattern).expect("invalid classification regex"),
        )
    };
    vec![
        rule(
            Category::Induction,
            r"(?i)\b(?:by|using|via)\s+induction\b|\bprove\s+by\s+induction\b|\binduction\s+on\b|\binductive\s+(?:step|case|hypothesis)\b",
        ),
        rule(
            Category::Contradiction,
            r"(?i)\b(?:suppose|assume)\s+(?:that\s+)?not\b|\bcontradict|\bcontradiction\b|\babsurd\b|\bleads?\s+to\s+a\s+contradiction\b",
        ),
        rule(
            Category::Case,
            r"(?i)\b(?:consider|examine)\s+the\s+case\b|\bcase\s+\d+\b|\bin\s+the\s+case\s+(?:where|when)\b|\b(?:first|second|third|next|final)\s+case\b",
        ),
        rule(
            Category::Definition,
            r"(?i)\bby\s+definition\b|\bdefinition\s+of\b|\bsimplif\w*\b|\bexpand(?:ing)?\b|\bsubstitut\w*\b",
        ),
        rule(
            Category::Existential,
            r"(?i)\bthere\s+exists?\b|\bfor\s+some\b|\bwe\s+can\s+find\b|\bchoose\b|∃",
        ),
        rule(
            Category::Universal,
            r"(?i)\bfor\s+(?:all|every|each|any)\b|\bevery\s+\w+\s+(?:is|has|satisfies)\b|∀",
        ),
        rule(
            Category::Implication,
            r"(?i)\bif\b.*\bthen\b|\bwhenever\b.*\b(?:then|we\s+have)\b|\bimplies\b|=>|⇒|⟹",
        ),
        rule(
            Category::Assumption,
            r"(?i)^\s*(?:assume|suppose|let|given)\b|\bwe\s+(?:assume|suppose|let)\b",
        ),
        rule(
            Category::Step,
            r"(?i)^\s*(?:then|thus|so|hence)\b|\bwe\s+(?:have|get|obtain|derive|see|find|conclude)\b|\bthis\s+(?:gives|yields|shows|implies)\b|\bit\s+follows\s+that\b",
        ),
        rule(
            Category::Conclusion,
            r"(?i)^\s*(?:therefore|hence|thus|consequently|so)\b|\bwe\s+conclude\s+that\b|\bthis\s+(?:proves|establishes|shows|demonstrates)\b|\bq\.?e\.?d\b|∎|□|■",
        ),
        rule(
            Category::Arithmetic,
            r"(?i)\bdivisib\w*\b|\bdivides\b|\bfactor\w*\b|\bmultiple\w*\b|\beven\b|\bodd\b|\bprime\b|\bcomposite\b|\binteger\w*\b|\bnatural\s+numbers?\b|\brationals?\b|\breal\s+numbers?\b|\bgcd\b|\blcm\b|\bmod(?:ulo)?\b|\bremainder\b|\d\s*[+*/^-]\s*\d",
        ),
        rule(
            Category::Algebraic,
            r"(?i)[\w)\]]\s*(?:=|≤|≥|≠|<|>)\s*[\w(\[-]|\bequation\b|\bsolve\s+for\b",
        ),
        rule(
            Category::SetTheory,
            r"(?i)\bsubsets?\b|\bsupersets?\b|\belement\s+of\b|\bunion\b|\bintersection\b|\bcomplement\b|[∈∉⊂⊆⊃⊇∪∩∅]",
        ),
    ]
});

/// Classify a single sentence by walking the rule table in priority order.
///
/// Total over every string; unmatched text falls to [`Category::Other`].
pub fn classify_sentence(text: &str) -> Category {
    for (category, pattern) in RULE_TABLE.iter() {
        if pattern.is_match(text) {
            return *category;
        }
    }
    Category::Other
}

/// Split free text into sentences on `.`, `!` and `?` terminators.
///
/// A `.` flanked by digits is treated as a decimal point, not a boundary.
/// This is a deliberately shallow boundary detector; callers with better
/// sentence segmentation can classify pre-split text themselves.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '.' || c == '!' || c == '?' {
            let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
            let next_digit = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if c == '.' && prev_digit && next_digit {
                current.push(c);
                continue;
            }
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        } else {
            current.push(c);
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Split text into sentences and classify each one.
///
/// Empty or whitespace-only input classifies as an empty sequence.
pub fn classify(text: &str) -> Vec<ClassifiedSentence> {
    split_sentences(text)
        .into_iter()
        .map(|sentence| {
            let category = classify_sentence(&sentence);
            ClassifiedSentence {
                text: sentence,
                category,
            }
        })
        .collect()
}
