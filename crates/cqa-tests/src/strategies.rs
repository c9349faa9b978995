//! Generators for small queries and databases
//!
//! Queries draw terms from three variables and two constants, databases from
//! three values, so generated atoms and facts overlap often. Every variable of
//! a negated atom also occurs in a positive atom; a variable that would not is
//! replaced by a constant.

use cqa_ast::{sym, Atom, Fact, Query, Symbol, Term};
use cqa_core::Database;
use proptest::prelude::*;

const VARIABLES: &[&str] = &["x", "y", "z"];
const CONSTANTS: &[&str] = &["A", "B"];
const VALUES: &[&str] = &["A", "B", "C"];

/// An atom before predicate naming and term selection
#[derive(Debug, Clone)]
struct Shape {
    negated: bool,
    key_length: usize,
    /// Indices into `VARIABLES` followed by `CONSTANTS`
    terms: Vec<usize>,
}

fn terms(arity: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..VARIABLES.len() + CONSTANTS.len(), arity)
}

fn shape(negated: bool, key_length: usize, terms: Vec<usize>) -> Shape {
    Shape {
        negated,
        key_length,
        terms,
    }
}

/// Any sign, any key length
fn any_shape() -> impl Strategy<Value = Shape> {
    (any::<bool>(), 1..=3usize).prop_flat_map(|(negated, arity)| {
        (0..=arity, terms(arity)).prop_map(move |(key_length, terms)| shape(negated, key_length, terms))
    })
}

fn all_key_shape() -> impl Strategy<Value = Shape> {
    (any::<bool>(), 1..=2usize)
        .prop_flat_map(|(negated, arity)| terms(arity).prop_map(move |terms| shape(negated, arity, terms)))
}

/// All-key or with an empty key
fn empty_key_shape() -> impl Strategy<Value = Shape> {
    (any::<bool>(), any::<bool>(), 1..=2usize).prop_flat_map(|(negated, all_key, arity)| {
        let key_length = if all_key { arity } else { 0 };
        terms(arity).prop_map(move |terms| shape(negated, key_length, terms))
    })
}

/// Positive with a proper, non-empty key
fn keyed_shape() -> impl Strategy<Value = Shape> {
    (2..=3usize).prop_flat_map(|arity| {
        (1..arity, terms(arity)).prop_map(|(key_length, terms)| shape(false, key_length, terms))
    })
}

fn term(index: usize) -> Term {
    match VARIABLES.get(index) {
        Some(var) => Term::var(var),
        None => Term::constant(CONSTANTS[index - VARIABLES.len()]),
    }
}

/// Name predicates `R0`, `R1`, ... by position unless `names` is given
fn build(shapes: &[Shape], names: Option<&[usize]>) -> Query {
    let positive_vars: Vec<Symbol> = shapes
        .iter()
        .filter(|shape| !shape.negated)
        .flat_map(|shape| shape.terms.iter())
        .filter_map(|index| VARIABLES.get(*index).map(|var| sym(var)))
        .collect();

    let atoms = shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let name = names.map_or(i, |names| names[i]);
            let args = shape
                .terms
                .iter()
                .map(|index| match term(*index) {
                    Term::Variable(var) if shape.negated && !positive_vars.contains(&var) => {
                        Term::constant(CONSTANTS[*index % CONSTANTS.len()])
                    }
                    other => other,
                })
                .collect();
            Atom::new(shape.negated, sym(&format!("R{}", name)), shape.key_length, args)
        })
        .collect();
    Query::new(atoms)
}

/// Self-join-free queries of any shape
pub fn any_query() -> impl Strategy<Value = Query> {
    prop::collection::vec(any_shape(), 1..=4).prop_map(|shapes| build(&shapes, None))
}

/// Queries whose predicates may repeat
pub fn query_with_repeats() -> impl Strategy<Value = Query> {
    prop::collection::vec((any_shape(), 0..3usize), 1..=4).prop_map(|atoms| {
        let (shapes, names): (Vec<Shape>, Vec<usize>) = atoms.into_iter().unzip();
        build(&shapes, Some(&names))
    })
}

pub fn all_key_query() -> impl Strategy<Value = Query> {
    prop::collection::vec(all_key_shape(), 1..=3).prop_map(|shapes| build(&shapes, None))
}

/// Every atom all-key or with an empty key
pub fn empty_key_query() -> impl Strategy<Value = Query> {
    prop::collection::vec(empty_key_shape(), 1..=3).prop_map(|shapes| build(&shapes, None))
}

/// One positive atom with a proper key among all-key atoms
pub fn single_keyed_query() -> impl Strategy<Value = Query> {
    (
        keyed_shape(),
        prop::collection::vec(all_key_shape(), 0..=2),
        any::<prop::sample::Index>(),
    )
        .prop_map(|(keyed, mut shapes, at)| {
            let position = at.index(shapes.len() + 1);
            shapes.insert(position, keyed);
            build(&shapes, None)
        })
}

/// Up to four facts per query predicate, possibly conflicting
pub fn database_for(query: &Query) -> impl Strategy<Value = Database> {
    let relations: Vec<_> = query
        .iter()
        .map(|atom| {
            let predicate = atom.predicate;
            let key_length = atom.key_length;
            prop::collection::vec(prop::collection::vec(0..VALUES.len(), atom.arity()), 0..=4)
                .prop_map(move |tuples| {
                    tuples
                        .into_iter()
                        .map(|tuple| {
                            let args = tuple.iter().map(|index| sym(VALUES[*index])).collect();
                            Fact::new(predicate, key_length, args)
                        })
                        .collect::<Vec<_>>()
                })
        })
        .collect();
    relations.prop_map(|relations| {
        Database::from_facts(relations.into_iter().flatten()).expect("one schema per predicate")
    })
}

/// A query together with a database over its predicates
pub fn problem(query: impl Strategy<Value = Query>) -> impl Strategy<Value = (Query, Database)> {
    query.prop_flat_map(|query| {
        let db = database_for(&query);
        (Just(query), db)
    })
}
