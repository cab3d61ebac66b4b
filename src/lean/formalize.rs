//! Template-based translation of proof-text fragments into Lean propositions.
//!
//! Matching is best-effort: templates are tried in a fixed order and the
//! first hit wins. A sentence no template covers falls back to `True` with
//! an explanatory note, so nothing is ever silently dropped.

use regex::Regex;
use std::sync::LazyLock;

/// A formalized proposition plus an optional note when the translation
/// fell back to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formalized {
    pub prop: String,
    pub note: Option<String>,
}

impl Formalized {
    fn exact(prop: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            note: None,
        }
    }

    fn fallback(original: &str) -> Self {
        Self {
            prop: "True".to_string(),
            note: Some(format!("could not formalize: {}", original)),
        }
    }
}

static DISCOURSE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:therefore|hence|thus|consequently|so|then|now|clearly|note\s+that|observe\s+that|we\s+(?:conclude|have|know|see|get)\s+that|it\s+follows\s+that|this\s+(?:proves|establishes|shows|demonstrates)\s+that|assume(?:\s+that)?|suppose(?:\s+that)?|given(?:\s+that)?|let)\b\s*,?\s*",
    )
    .expect("invalid regex")
});

static EVEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-zA-Z](?:\^\d+)?)\s+is\s+even\b").expect("invalid regex")
});

static ODD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-zA-Z](?:\^\d+)?)\s+is\s+odd\b").expect("invalid regex")
});

static DIVIDES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-zA-Z0-9]+)\s+divides\s+([a-zA-Z0-9]+)\b").expect("invalid regex")
});

static EXISTENTIAL_EQUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-zA-Z](?:\^\d+)?)\s*=\s*([^,.]+?)\s+for\s+some\s+([a-zA-Z])\b")
        .expect("invalid regex")
});

static UNIVERSAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^for\s+(?:all|every|each|any)\s+([a-zA-Z])\b[,:]?\s*(.*)$")
        .expect("invalid regex")
});

static PRIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-zA-Z])\s+is\s+(?:a\s+)?prime\b").expect("invalid regex")
});

static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-zA-Z])\s*(>=|<=|!=|≥|≤|≠|=|<|>)\s*(\d+)").expect("invalid regex")
});

/// Strip leading discourse markers and trailing sentence punctuation.
fn clean(text: &str) -> String {
    let stripped = DISCOURSE_MARKER.replace(text.trim(), "");
    stripped
        .trim()
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_string()
}

fn normalize_operator(op: &str) -> &str {
    match op {
        ">=" => "≥",
        "<=" => "≤",
        "!=" => "≠",
        other => other,
    }
}

fn formalize(text: &str, assumption: bool) -> Formalized {
    let cleaned = clean(text);
    if cleaned.is_empty() {
        return Formalized::fallback(text.trim());
    }

    // The universal prefix is anchored and wraps whatever follows, so it
    // must win over the inner templates.
    if let Some(caps) = UNIVERSAL_PREFIX.captures(&cleaned) {
        let variable = caps[1].to_string();
        let body = caps[2].trim().to_string();
        let inner = formalize(&body, assumption);
        return Formalized {
            prop: format!("∀ {}, {}", variable, inner.prop),
            note: inner.note,
        };
    }
    if let Some(caps) = EVEN.captures(&cleaned) {
        return Formalized::exact(format!("Even {}", &caps[1]));
    }
    if let Some(caps) = ODD.captures(&cleaned) {
        return Formalized::exact(format!("Odd {}", &caps[1]));
    }
    if let Some(caps) = DIVIDES.captures(&cleaned) {
        return Formalized::exact(format!("{} ∣ {}", &caps[1], &caps[2]));
    }
    if let Some(caps) = EXISTENTIAL_EQUATION.captures(&cleaned) {
        return Formalized::exact(format!(
            "∃ {}, {} = {}",
            &caps[3],
            &caps[1],
            caps[2].trim()
        ));
    }

    if assumption {
        if let Some(caps) = PRIME.captures(&cleaned) {
            return Formalized::exact(format!("Nat.Prime {}", &caps[1]));
        }
        if let Some(caps) = COMPARISON.captures(&cleaned) {
            return Formalized::exact(format!(
                "{} {} {}",
                &caps[1],
                normalize_operator(&caps[2]),
                &caps[3]
            ));
        }
    }

    Formalized::fallback(&cleaned)
}

/// Formalize a goal sentence into a Lean proposition.
pub fn formalize_goal(text: &str) -> Formalized {
    formalize(text, false)
}

/// Formalize an assumption sentence. Tries the goal templates first, then
/// the assumption-only ones (primality, literal comparisons).
pub fn formalize_assumption(text: &str) -> Formalized {
    formalize(text, true)
}

/// Make arbitrary proof text safe inside a Lean comment: flatten line
/// breaks and neutralize the block-comment terminator.
pub fn sanitize_comment(text: &str) -> String {
    text.replace(['\n', '\r'], " ").replace("-/", "- /")
}
