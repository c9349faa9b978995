//! Variable/constant classification of source tokens
//!
//! Classification runs once, when text becomes a [`Term`]. From then on the
//! distinction is carried by the term itself, so a database value substituted
//! for a variable stays a constant whatever its spelling.

use crate::{sym, Term};

/// Decides whether a source token denotes a variable
pub trait TermClassifier {
    fn is_variable(&self, text: &str) -> bool;

    fn term(&self, text: &str) -> Term {
        if self.is_variable(text) {
            Term::Variable(sym(text))
        } else {
            Term::Constant(sym(text))
        }
    }
}

impl<C: TermClassifier + ?Sized> TermClassifier for &C {
    fn is_variable(&self, text: &str) -> bool {
        (**self).is_variable(text)
    }
}

/// Identifiers starting with a lowercase letter are variables.
///
/// Numerals, capitalized identifiers and quoted literals are constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LowercaseVariables;

impl TermClassifier for LowercaseVariables {
    fn is_variable(&self, text: &str) -> bool {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) if first.is_lowercase() => {
                chars.all(|c| c.is_alphanumeric() || c == '_' || c == '\'')
            }
            _ => false,
        }
    }
}
