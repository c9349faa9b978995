//! Atoms, facts and queries
//!
//! Arguments are stored positionally; the first `key_length` arguments form the
//! primary key of the atom's relation. Equality is structural over all fields,
//! so two occurrences of the same literal compare equal. Algorithms that must
//! tell such occurrences apart address atoms by their index in the [`Query`].

use internment::Intern;
use std::fmt;

use crate::{LowercaseVariables, TermClassifier};

/// Interned string for efficient storage and comparison
pub type Symbol = Intern<String>;

/// Intern a string
pub fn sym(text: &str) -> Symbol {
    Intern::new(text.to_string())
}

/// A query term; facts hold bare constant symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Variable(Symbol),
    Constant(Symbol),
}

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Variable(sym(name))
    }

    pub fn constant(value: &str) -> Self {
        Term::Constant(sym(value))
    }

    pub fn symbol(&self) -> Symbol {
        match self {
            Term::Variable(symbol) | Term::Constant(symbol) => *symbol,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Term::Variable(symbol) | Term::Constant(symbol) => symbol.as_str(),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Constant(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A query literal: `R(k1, k2; v1)` or `¬R(k1, k2; v1)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub negated: bool,
    pub predicate: Symbol,
    pub key_length: usize,
    pub args: Vec<Term>,
}

impl Atom {
    pub fn new(negated: bool, predicate: Symbol, key_length: usize, args: Vec<Term>) -> Self {
        debug_assert!(key_length <= args.len(), "key longer than the argument list");
        Atom {
            negated,
            predicate,
            key_length,
            args,
        }
    }

    /// Build a positive atom, classifying arguments with [`LowercaseVariables`]
    pub fn positive(predicate: &str, key_length: usize, args: &[&str]) -> Self {
        Self::new(
            false,
            sym(predicate),
            key_length,
            args.iter().map(|arg| LowercaseVariables.term(arg)).collect(),
        )
    }

    /// Build a negated atom, classifying arguments with [`LowercaseVariables`]
    pub fn negative(predicate: &str, key_length: usize, args: &[&str]) -> Self {
        Self {
            negated: true,
            ..Self::positive(predicate, key_length, args)
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn key_args(&self) -> &[Term] {
        &self.args[..self.key_length.min(self.args.len())]
    }

    pub fn non_key_args(&self) -> &[Term] {
        &self.args[self.key_length.min(self.args.len())..]
    }

    /// The key spans every argument position
    pub fn is_all_key(&self) -> bool {
        self.key_length >= self.args.len()
    }

    /// Distinct variables, in order of first occurrence
    pub fn variables(&self) -> Vec<Symbol> {
        distinct_variables(&self.args)
    }

    /// Distinct variables occurring in key positions
    pub fn key_variables(&self) -> Vec<Symbol> {
        distinct_variables(self.key_args())
    }

    pub fn mentions(&self, var: &Symbol) -> bool {
        self.args.contains(&Term::Variable(*var))
    }

    pub fn is_ground(&self) -> bool {
        self.args.iter().all(Term::is_constant)
    }

    /// Replace every argument through `f`, keeping shape and polarity
    pub fn map_terms(&self, mut f: impl FnMut(&Term) -> Term) -> Atom {
        Atom {
            negated: self.negated,
            predicate: self.predicate,
            key_length: self.key_length,
            args: self.args.iter().map(|term| f(term)).collect(),
        }
    }
}

fn distinct_variables(terms: &[Term]) -> Vec<Symbol> {
    let mut vars = Vec::new();
    for term in terms {
        if let Term::Variable(var) = term {
            if !vars.contains(var) {
                vars.push(*var);
            }
        }
    }
    vars
}

fn write_args<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    key_length: usize,
    args: &[T],
) -> fmt::Result {
    let join = |terms: &[T]| {
        terms
            .iter()
            .map(|term| term.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    if key_length >= args.len() {
        write!(f, "({})", join(args))
    } else if key_length == 0 {
        write!(f, "(; {})", join(args))
    } else {
        write!(
            f,
            "({}; {})",
            join(&args[..key_length]),
            join(&args[key_length..])
        )
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "¬")?;
        }
        write!(f, "{}", self.predicate.as_str())?;
        write_args(f, self.key_length, &self.args)
    }
}

/// A ground tuple of a relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fact {
    pub predicate: Symbol,
    pub key_length: usize,
    pub args: Vec<Symbol>,
}

impl Fact {
    pub fn new(predicate: Symbol, key_length: usize, args: Vec<Symbol>) -> Self {
        debug_assert!(key_length <= args.len(), "key longer than the argument list");
        Fact {
            predicate,
            key_length,
            args,
        }
    }

    /// Build a fact from string slices
    pub fn from_strs(predicate: &str, key_length: usize, args: &[&str]) -> Self {
        Self::new(
            sym(predicate),
            key_length,
            args.iter().map(|arg| sym(arg)).collect(),
        )
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn key_args(&self) -> &[Symbol] {
        &self.args[..self.key_length.min(self.args.len())]
    }

    /// Two facts conflict when they share a block but differ
    pub fn conflicts_with(&self, other: &Fact) -> bool {
        self.predicate == other.predicate && self.key_args() == other.key_args() && self != other
    }

    /// The fact as a ground positive atom
    pub fn to_atom(&self) -> Atom {
        Atom::new(
            false,
            self.predicate,
            self.key_length,
            self.args.iter().map(|value| Term::Constant(*value)).collect(),
        )
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.predicate.as_str())?;
        let args: Vec<&str> = self.args.iter().map(|value| value.as_str()).collect();
        write_args(f, self.key_length, &args)
    }
}

/// A conjunction of atoms; order is significant for tie-breaking
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Query {
    pub atoms: Vec<Atom>,
}

impl Query {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Query { atoms }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn positive(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|atom| !atom.negated)
    }

    pub fn negative(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(|atom| atom.negated)
    }

    /// Predicates in order of first occurrence
    pub fn predicates(&self) -> Vec<Symbol> {
        let mut predicates = Vec::new();
        for atom in &self.atoms {
            if !predicates.contains(&atom.predicate) {
                predicates.push(atom.predicate);
            }
        }
        predicates
    }

    /// Every symbol occurring in the query: predicates, variables and constants
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols = self.predicates();
        for term in self.atoms.iter().flat_map(|atom| atom.args.iter()) {
            if !symbols.contains(&term.symbol()) {
                symbols.push(term.symbol());
            }
        }
        symbols
    }

    /// Distinct variables across all atoms, in order of first occurrence
    pub fn variables(&self) -> Vec<Symbol> {
        collect_variables(self.atoms.iter())
    }

    /// Distinct variables of the positive atoms
    pub fn positive_variables(&self) -> Vec<Symbol> {
        collect_variables(self.positive())
    }

    /// The query with the atom at `index` removed
    pub fn without(&self, index: usize) -> Query {
        let mut atoms = self.atoms.clone();
        atoms.remove(index);
        Query { atoms }
    }

    pub fn push(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn map_terms(&self, mut f: impl FnMut(&Term) -> Term) -> Query {
        Query {
            atoms: self.atoms.iter().map(|atom| atom.map_terms(&mut f)).collect(),
        }
    }
}

fn collect_variables<'a>(atoms: impl Iterator<Item = &'a Atom>) -> Vec<Symbol> {
    let mut vars = Vec::new();
    for atom in atoms {
        for var in atom.variables() {
            if !vars.contains(&var) {
                vars.push(var);
            }
        }
    }
    vars
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let atoms: Vec<String> = self.atoms.iter().map(|atom| atom.to_string()).collect();
        write!(f, "{}", atoms.join(", "))
    }
}
