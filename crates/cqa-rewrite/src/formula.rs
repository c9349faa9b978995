//! First-order formulas produced by the rewriter

use cqa_ast::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FoTerm {
    Var(Symbol),
    Const(Symbol),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FoAtom {
    pub predicate: Symbol,
    pub args: Vec<FoTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    True,
    False,
    Atom(FoAtom),
    Eq(FoTerm, FoTerm),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Forall(Vec<Symbol>, Box<Formula>),
    Exists(Vec<Symbol>, Box<Formula>),
    /// No `predicate` tuple of `arity` agrees with every correlated position
    NotExists {
        predicate: Symbol,
        arity: usize,
        correlations: Vec<(usize, FoTerm)>,
    },
    /// `relation(args)` for a relation holding exactly the tuple `tuple`
    Fresh {
        relation: Symbol,
        args: Vec<FoTerm>,
        tuple: Vec<FoTerm>,
    },
}

impl Formula {
    pub fn atom(predicate: Symbol, args: Vec<FoTerm>) -> Formula {
        Formula::Atom(FoAtom { predicate, args })
    }

    /// Conjunction, flattened, with `⊤` dropped and `⊥` absorbing
    pub fn and(conjuncts: Vec<Formula>) -> Formula {
        let mut flat = Vec::new();
        for conjunct in conjuncts {
            match conjunct {
                Formula::True => {}
                Formula::False => return Formula::False,
                Formula::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Formula::True,
            1 => flat.remove(0),
            _ => Formula::And(flat),
        }
    }

    pub fn not(formula: Formula) -> Formula {
        match formula {
            Formula::True => Formula::False,
            Formula::False => Formula::True,
            Formula::Not(inner) => *inner,
            other => Formula::Not(Box::new(other)),
        }
    }

    pub fn implies(premise: Formula, conclusion: Formula) -> Formula {
        match (premise, conclusion) {
            (Formula::True, conclusion) => conclusion,
            (Formula::False, _) | (_, Formula::True) => Formula::True,
            (premise, conclusion) => Formula::Implies(Box::new(premise), Box::new(conclusion)),
        }
    }

    pub fn exists(vars: Vec<Symbol>, body: Formula) -> Formula {
        if vars.is_empty() || matches!(body, Formula::True | Formula::False) {
            return body;
        }
        Formula::Exists(vars, Box::new(body))
    }

    pub fn forall(vars: Vec<Symbol>, body: Formula) -> Formula {
        if vars.is_empty() || matches!(body, Formula::True | Formula::False) {
            return body;
        }
        Formula::Forall(vars, Box::new(body))
    }

    /// Variables not bound by an enclosing quantifier, in order of occurrence
    pub fn free_variables(&self) -> Vec<Symbol> {
        let mut free = Vec::new();
        collect_free(self, &mut Vec::new(), &mut free);
        free
    }

    pub fn is_closed(&self) -> bool {
        self.free_variables().is_empty()
    }

    /// Number of nodes in the tree
    pub fn size(&self) -> usize {
        1 + match self {
            Formula::Not(inner) | Formula::Forall(_, inner) | Formula::Exists(_, inner) => {
                inner.size()
            }
            Formula::And(conjuncts) => conjuncts.iter().map(Formula::size).sum(),
            Formula::Implies(premise, conclusion) => premise.size() + conclusion.size(),
            _ => 0,
        }
    }
}

fn collect_free(formula: &Formula, bound: &mut Vec<Symbol>, free: &mut Vec<Symbol>) {
    match formula {
        Formula::True | Formula::False => {}
        Formula::Atom(atom) => collect_terms(&atom.args, bound, free),
        Formula::Eq(left, right) => {
            collect_terms(std::slice::from_ref(left), bound, free);
            collect_terms(std::slice::from_ref(right), bound, free);
        }
        Formula::NotExists { correlations, .. } => {
            for (_, arg) in correlations {
                collect_terms(std::slice::from_ref(arg), bound, free);
            }
        }
        Formula::Fresh { args, tuple, .. } => {
            collect_terms(args, bound, free);
            collect_terms(tuple, bound, free);
        }
        Formula::Not(inner) => collect_free(inner, bound, free),
        Formula::And(conjuncts) => {
            for conjunct in conjuncts {
                collect_free(conjunct, bound, free);
            }
        }
        Formula::Implies(premise, conclusion) => {
            collect_free(premise, bound, free);
            collect_free(conclusion, bound, free);
        }
        Formula::Forall(vars, body) | Formula::Exists(vars, body) => {
            let depth = bound.len();
            bound.extend(vars.iter().copied());
            collect_free(body, bound, free);
            bound.truncate(depth);
        }
    }
}

fn collect_terms(terms: &[FoTerm], bound: &[Symbol], free: &mut Vec<Symbol>) {
    for term in terms {
        if let FoTerm::Var(var) = term {
            if !bound.contains(var) && !free.contains(var) {
                free.push(*var);
            }
        }
    }
}
