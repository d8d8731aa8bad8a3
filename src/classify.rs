use _model::SellerLabel;
use rayon::prelude::*;

use crate::rules::RuleSet;

/// What decided a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// No name to look at.
    Blank,
    Exact(String),
    Pattern(String),
    /// Nothing matched.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub label: SellerLabel,
    pub reason: Reason,
}

impl Verdict {
    fn new(label: SellerLabel, reason: Reason) -> Self {
        Self { label, reason }
    }
}

/// Label a seller name. Tiers are tried official, reseller, suspect; the
/// first tier with a match wins regardless of how specific other matches are.
pub fn classify(name: Option<&str>, rules: &RuleSet) -> SellerLabel {
    explain(name, rules).label
}

pub fn explain(name: Option<&str>, rules: &RuleSet) -> Verdict {
    let name = match name.map(str::trim) {
        Some(x) if !x.is_empty() => x,
        _ => return Verdict::new(SellerLabel::Suspect, Reason::Blank),
    };

    let official = rules.tier(SellerLabel::Official);
    if let Some(x) = official.exact_match(name) {
        return Verdict::new(SellerLabel::Official, Reason::Exact(x.to_string()));
    }

    // exact lists of the lower tiers are never consulted
    for label in SellerLabel::all() {
        if let Some(x) = rules.tier(label).regex_match(name) {
            return Verdict::new(label, Reason::Pattern(x.as_str().to_string()));
        }
    }

    Verdict::new(SellerLabel::Suspect, Reason::Default)
}

/// Labels in input order.
pub fn classify_all<S: AsRef<str> + Sync>(names: &[S], rules: &RuleSet) -> Vec<SellerLabel> {
    names
        .par_iter()
        .map(|x| classify(Some(x.as_ref()), rules))
        .collect()
}
