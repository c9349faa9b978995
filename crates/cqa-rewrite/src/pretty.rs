//! Rendering formulas as Unicode text and as LaTeX

use std::fmt;

use crate::{FoAtom, FoTerm, Formula};

impl fmt::Display for FoTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoTerm::Var(var) => write!(f, "{}", var.as_str()),
            FoTerm::Const(value) => write!(f, "{}", value.as_str()),
        }
    }
}

impl fmt::Display for FoAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.predicate.as_str(), join(&self.args, ", "))
    }
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Arguments of a `NotExists` node, `_` at uncorrelated positions
fn pattern(arity: usize, correlations: &[(usize, FoTerm)]) -> Vec<String> {
    (0..arity)
        .map(|position| {
            correlations
                .iter()
                .find(|(at, _)| *at == position)
                .map(|(_, term)| term.to_string())
                .unwrap_or_else(|| "_".to_string())
        })
        .collect()
}

/// Binding strength: quantifiers and negation bind tightest
fn precedence(formula: &Formula) -> u8 {
    match formula {
        Formula::Implies(..) => 1,
        Formula::And(..) => 2,
        _ => 3,
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, formula: &Formula, above: u8) -> fmt::Result {
    if precedence(formula) <= above {
        write!(f, "({})", formula)
    } else {
        write!(f, "{}", formula)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "⊤"),
            Formula::False => write!(f, "⊥"),
            Formula::Atom(atom) => write!(f, "{}", atom),
            Formula::Eq(left, right) => write!(f, "{} = {}", left, right),
            Formula::Not(inner) => match inner.as_ref() {
                Formula::Eq(left, right) => write!(f, "{} ≠ {}", left, right),
                Formula::Atom(_) | Formula::Fresh { .. } | Formula::Not(_) => {
                    write!(f, "¬{}", inner)
                }
                other => write!(f, "¬({})", other),
            },
            Formula::And(conjuncts) => {
                for (i, conjunct) in conjuncts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ∧ ")?;
                    }
                    write_operand(f, conjunct, 2)?;
                }
                Ok(())
            }
            Formula::Implies(premise, conclusion) => {
                write_operand(f, premise, 1)?;
                write!(f, " → ")?;
                write_operand(f, conclusion, 0)
            }
            Formula::Forall(vars, body) => {
                write!(f, "∀{} ({})", join(vars_as_str(vars).as_slice(), ", "), body)
            }
            Formula::Exists(vars, body) => {
                write!(f, "∃{} ({})", join(vars_as_str(vars).as_slice(), ", "), body)
            }
            Formula::NotExists {
                predicate,
                arity,
                correlations,
            } => write!(
                f,
                "¬{}({})",
                predicate.as_str(),
                pattern(*arity, correlations).join(", ")
            ),
            Formula::Fresh {
                relation,
                args,
                tuple,
            } => write!(
                f,
                "{}⟨{}⟩({})",
                relation.as_str(),
                join(tuple, ", "),
                join(args, ", ")
            ),
        }
    }
}

fn vars_as_str(vars: &[cqa_ast::Symbol]) -> Vec<&str> {
    vars.iter().map(|var| var.as_str()).collect()
}

fn latex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '_' | '&' | '%' | '$' | '#' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '"' => out.push_str("''"),
            _ => out.push(c),
        }
    }
    out
}

fn latex_term(term: &FoTerm) -> String {
    match term {
        FoTerm::Var(var) => latex_escape(var.as_str()),
        FoTerm::Const(value) => format!("\\mathsf{{{}}}", latex_escape(value.as_str())),
    }
}

fn latex_terms(terms: &[FoTerm]) -> String {
    terms.iter().map(latex_term).collect::<Vec<_>>().join(", ")
}

fn latex_vars(vars: &[cqa_ast::Symbol]) -> String {
    vars.iter()
        .map(|var| latex_escape(var.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn latex_operand(formula: &Formula, above: u8) -> String {
    if precedence(formula) <= above {
        format!("\\left({}\\right)", to_latex(formula))
    } else {
        to_latex(formula)
    }
}

/// LaTeX math-mode source for `formula`
pub fn to_latex(formula: &Formula) -> String {
    match formula {
        Formula::True => "\\top".to_string(),
        Formula::False => "\\bot".to_string(),
        Formula::Atom(atom) => format!(
            "\\mathrm{{{}}}({})",
            latex_escape(atom.predicate.as_str()),
            latex_terms(&atom.args)
        ),
        Formula::Eq(left, right) => format!("{} = {}", latex_term(left), latex_term(right)),
        Formula::Not(inner) => match inner.as_ref() {
            Formula::Eq(left, right) => format!("{} \\neq {}", latex_term(left), latex_term(right)),
            Formula::Atom(_) | Formula::Fresh { .. } | Formula::Not(_) => {
                format!("\\neg {}", to_latex(inner))
            }
            other => format!("\\neg\\left({}\\right)", to_latex(other)),
        },
        Formula::And(conjuncts) => conjuncts
            .iter()
            .map(|conjunct| latex_operand(conjunct, 2))
            .collect::<Vec<_>>()
            .join(" \\land "),
        Formula::Implies(premise, conclusion) => format!(
            "{} \\rightarrow {}",
            latex_operand(premise, 1),
            latex_operand(conclusion, 0)
        ),
        Formula::Forall(vars, body) => format!(
            "\\forall {}\\left({}\\right)",
            latex_vars(vars),
            to_latex(body)
        ),
        Formula::Exists(vars, body) => format!(
            "\\exists {}\\left({}\\right)",
            latex_vars(vars),
            to_latex(body)
        ),
        Formula::NotExists {
            predicate,
            arity,
            correlations,
        } => {
            let args: Vec<String> = (0..*arity)
                .map(|position| {
                    correlations
                        .iter()
                        .find(|(at, _)| *at == position)
                        .map(|(_, term)| latex_term(term))
                        .unwrap_or_else(|| "\\_".to_string())
                })
                .collect();
            format!(
                "\\neg \\mathrm{{{}}}({})",
                latex_escape(predicate.as_str()),
                args.join(", ")
            )
        }
        Formula::Fresh {
            relation,
            args,
            tuple,
        } => format!(
            "\\mathrm{{{}}}_{{\\langle {} \\rangle}}({})",
            latex_escape(relation.as_str()),
            latex_terms(tuple),
            latex_terms(args)
        ),
    }
}
