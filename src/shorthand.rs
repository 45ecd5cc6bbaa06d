//! Convenience wrappers over the rule algebra. Nothing here does anything
//! [`Rule`]'s own combinators cannot; these are the spellings grammars
//! actually want.

use crate::rule::Rule;

pub fn maybe(r: impl Into<Rule>) -> Rule {
    r.into().times(0..=1)
}

pub fn some(r: impl Into<Rule>) -> Rule {
    r.into().times(0..)
}

pub fn many(r: impl Into<Rule>) -> Rule {
    r.into().times(1..)
}

// r (by r)*
pub fn sep(r: impl Into<Rule>, by: impl Into<Rule>) -> Rule {
    let r = r.into();
    r.clone().then(some(by.into().then(r)))
}

// a keyword, captured under its own spelling
pub fn lit(s: &str) -> Rule {
    Rule::text(s).capture(s)
}
