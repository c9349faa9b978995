//! Parser implementation for consistent query answering inputs.
//!
//! Supports parsing:
//! - Sections: `@database`, `@query`
//! - Facts: `Lives(John; London)`, `Likes(John, Paris;)`, `Visited(; Rome)`
//! - Query atoms: `Likes(p, t)`, `not Lives(p; t)`
//!
//! Atoms are separated by whitespace or commas. Terms are classified into
//! variables and constants only after parsing, through a [`TermClassifier`].

use chumsky::prelude::*;
use chumsky::stream::Stream;
use cqa_ast::{sym, Atom, Fact, LowercaseVariables, Query, Symbol, TermClassifier};
use std::collections::HashMap;
use std::fmt;

use crate::error::ParserError;
use crate::token::{lexer, SpannedToken, Token};
use crate::{ParseError, Span, SrcId};

/// A parsed input: the database facts and the query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Problem {
    pub database: Vec<Fact>,
    pub query: Query,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@database")?;
        for fact in &self.database {
            writeln!(f, "{}", fact)?;
        }
        writeln!(f, "@query")?;
        for atom in &self.query.atoms {
            writeln!(f, "{}", atom)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Database,
    Query,
}

/// An atom before term classification
#[derive(Debug, Clone)]
struct RawAtom {
    negated: bool,
    predicate: String,
    key: Vec<String>,
    rest: Option<Vec<String>>,
    span: Span,
}

impl RawAtom {
    fn key_length(&self) -> usize {
        self.key.len()
    }

    fn args(&self) -> impl Iterator<Item = &String> {
        self.key.iter().chain(self.rest.iter().flatten())
    }

    fn to_fact(&self) -> Fact {
        Fact::new(
            sym(&self.predicate),
            self.key_length(),
            self.args().map(|arg| sym(arg)).collect(),
        )
    }

    fn to_atom<C: TermClassifier + ?Sized>(&self, classifier: &C) -> Atom {
        Atom::new(
            self.negated,
            sym(&self.predicate),
            self.key_length(),
            self.args().map(|arg| classifier.term(arg)).collect(),
        )
    }
}

#[derive(Debug, Clone)]
struct RawSection {
    kind: SectionKind,
    atoms: Vec<RawAtom>,
}

fn lex_with_src(input: &str, src: SrcId) -> Result<Vec<SpannedToken>, Vec<ParseError>> {
    let len = input.chars().count();
    let eoi = Span::new(src, len..len);
    let stream = Stream::from_iter(
        eoi,
        input
            .chars()
            .enumerate()
            .map(|(idx, ch)| (ch, Span::new(src, idx..idx + 1))),
    );
    lexer()
        .parse(stream)
        .map_err(|errors| errors.into_iter().map(ParseError::Lex).collect())
}

#[cfg(test)]
fn lex(input: &str) -> Result<Vec<SpannedToken>, Vec<ParseError>> {
    lex_with_src(input, SrcId::empty())
}

fn parse_with<T>(
    parser: impl Parser<Token, T, Error = ParserError>,
    input: &str,
    src: SrcId,
) -> Result<T, Vec<ParseError>> {
    let tokens = lex_with_src(input, src)?;
    let end = input.chars().count();
    let eoi = Span::new(src, end..end);
    let stream = Stream::from_iter(eoi, tokens.into_iter());
    parser
        .parse(stream)
        .map_err(|errors| errors.into_iter().map(ParseError::Syntax).collect())
}

fn token(kind: Token) -> impl Parser<Token, Token, Error = ParserError> + Clone {
    just(kind)
}

/// A term keeps its source spelling; string literals keep their quotes
fn term_text() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! {
        Token::Ident(ident) => ident,
        Token::Number(number) => number,
        Token::String(text) => format!("\"{}\"", text),
    }
    .labelled("term")
}

fn predicate_name() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! { Token::Ident(ident) => ident }.labelled("predicate")
}

/// `(k1, k2; v1)`; the second list is absent when there is no `;`
fn arguments() -> impl Parser<Token, (Vec<String>, Option<Vec<String>>), Error = ParserError> + Clone
{
    let terms = term_text().separated_by(token(Token::Comma)).allow_trailing();

    terms
        .clone()
        .then(token(Token::Semicolon).ignore_then(terms).or_not())
        .delimited_by(token(Token::LParen), token(Token::RParen))
        .labelled("arguments")
}

/// Parse an optionally negated atom, with an optional trailing comma
fn atom() -> impl Parser<Token, RawAtom, Error = ParserError> + Clone {
    token(Token::Not)
        .or_not()
        .then(predicate_name())
        .then(arguments())
        .map_with_span(|((not, predicate), (key, rest)), span| RawAtom {
            negated: not.is_some(),
            predicate,
            key,
            rest,
            span,
        })
        .then_ignore(token(Token::Comma).or_not())
        .labelled("atom")
}

fn section() -> impl Parser<Token, RawSection, Error = ParserError> + Clone {
    select! { Token::Section(name) => name }
        .try_map(|name: String, span| match name.to_lowercase().as_str() {
            "database" => Ok(SectionKind::Database),
            "query" => Ok(SectionKind::Query),
            _ => Err(ParserError::custom(
                span,
                format!("unknown section '@{}', expected @database or @query", name),
            )),
        })
        .then(atom().repeated())
        .map(|(kind, atoms)| RawSection { kind, atoms })
        .labelled("section")
}

fn document() -> impl Parser<Token, Vec<RawSection>, Error = ParserError> + Clone {
    section().repeated().then_ignore(end()).labelled("document")
}

/// Parse a problem, classifying query terms with [`LowercaseVariables`]
pub fn parse_problem(input: &str, src: SrcId) -> Result<Problem, Vec<ParseError>> {
    parse_problem_with(input, src, &LowercaseVariables)
}

/// Parse a problem with a custom variable convention
pub fn parse_problem_with<C: TermClassifier + ?Sized>(
    input: &str,
    src: SrcId,
    classifier: &C,
) -> Result<Problem, Vec<ParseError>> {
    let sections = parse_with(document(), input, src)?;

    let mut errors = Vec::new();
    let mut facts = Vec::new();
    let mut atoms = Vec::new();
    for section in sections {
        match section.kind {
            SectionKind::Database => {
                for raw in section.atoms {
                    if raw.negated {
                        errors.push(negated_fact(&raw));
                    } else {
                        facts.push(raw);
                    }
                }
            }
            SectionKind::Query => atoms.extend(section.atoms),
        }
    }

    if facts.is_empty() {
        errors.push(ParseError::MissingSection("database"));
    }
    if atoms.is_empty() {
        errors.push(ParseError::MissingSection("query"));
    }
    errors.extend(check_schema(&facts, &atoms));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Problem {
        database: facts.iter().map(RawAtom::to_fact).collect(),
        query: Query::new(atoms.iter().map(|raw| raw.to_atom(classifier)).collect()),
    })
}

/// Parse a bare list of query atoms, e.g. `Likes(p, t;), not Lives(p; t)`
pub fn parse_query(input: &str, src: SrcId) -> Result<Query, Vec<ParseError>> {
    let atoms = parse_with(atom().repeated().then_ignore(end()), input, src)?;
    let errors = check_schema(&[], &atoms);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(Query::new(
        atoms
            .iter()
            .map(|raw| raw.to_atom(&LowercaseVariables))
            .collect(),
    ))
}

/// Parse a bare list of facts, e.g. `Lives(John; London) Lives(John; Paris)`
pub fn parse_facts(input: &str, src: SrcId) -> Result<Vec<Fact>, Vec<ParseError>> {
    let atoms = parse_with(atom().repeated().then_ignore(end()), input, src)?;
    let mut errors: Vec<ParseError> = atoms
        .iter()
        .filter(|raw| raw.negated)
        .map(negated_fact)
        .collect();
    errors.extend(check_schema(&atoms, &[]));
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(atoms.iter().map(RawAtom::to_fact).collect())
}

fn negated_fact(raw: &RawAtom) -> ParseError {
    ParseError::Syntax(ParserError::custom(
        raw.span,
        format!("database fact {} cannot be negated", raw.predicate),
    ))
}

/// Every use of a predicate must agree on arity and key length
fn check_schema(facts: &[RawAtom], atoms: &[RawAtom]) -> Vec<ParseError> {
    let mut schemas: HashMap<Symbol, (usize, usize)> = HashMap::new();
    let mut errors = Vec::new();
    for raw in facts.iter().chain(atoms) {
        let shape = (raw.args().count(), raw.key_length());
        let expected = *schemas.entry(sym(&raw.predicate)).or_insert(shape);
        if expected != shape {
            errors.push(ParseError::Schema {
                predicate: raw.predicate.clone(),
                detail: format!(
                    "used with {} arguments and key length {}, but earlier with {} arguments and key length {}",
                    shape.0, shape.1, expected.0, expected.1
                ),
                span: raw.span,
            });
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqa_ast::Term;

    fn parse(input: &str) -> Problem {
        parse_problem(input, SrcId::empty()).unwrap()
    }

    // ===== Lexer Tests =====

    #[test]
    fn test_lex_atom() {
        let tokens = lex("Lives(John; London)").unwrap();
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].0, Token::Ident("Lives".to_string()));
        assert_eq!(tokens[3].0, Token::Semicolon);
    }

    #[test]
    fn test_lex_sections_and_comments() {
        let tokens = lex("# header\n@database # facts follow\n@Query").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].0, Token::Section("database".to_string()));
        assert_eq!(tokens[1].0, Token::Section("Query".to_string()));
    }

    #[test]
    fn test_lex_negation_forms() {
        for input in ["not R(x)", "Not R(x)", "¬R(x)", "!R(x)"] {
            let tokens = lex(input).unwrap();
            assert_eq!(tokens[0].0, Token::Not, "{}", input);
        }
    }

    #[test]
    fn test_lex_numbers_and_strings() {
        let tokens = lex("T(-5, 3.25, \"New York\")").unwrap();
        assert_eq!(tokens[2].0, Token::Number("-5".to_string()));
        assert_eq!(tokens[4].0, Token::Number("3.25".to_string()));
        assert_eq!(tokens[6].0, Token::String("New York".to_string()));
    }

    #[test]
    fn test_lex_rejects_unknown_characters() {
        assert!(lex("R(x) & S(y)").is_err());
    }

    // ===== Problem Parsing Tests =====

    #[test]
    fn test_parse_problem() {
        let problem = parse(
            "@database\nLikes(John, Paris;)\nLives(John; London)\n@query\nLikes(p, t;)\nnot Lives(p; t)\n",
        );
        assert_eq!(problem.database.len(), 2);
        assert_eq!(problem.database[0], Fact::from_strs("Likes", 2, &["John", "Paris"]));
        assert_eq!(problem.database[1], Fact::from_strs("Lives", 1, &["John", "London"]));
        assert_eq!(
            problem.query.atoms,
            vec![
                Atom::positive("Likes", 2, &["p", "t"]),
                Atom::negative("Lives", 1, &["p", "t"]),
            ]
        );
    }

    #[test]
    fn test_no_semicolon_means_all_key() {
        let problem = parse("@database\nR(A, B)\n@query\nR(x, y)");
        assert_eq!(problem.database[0].key_length, 2);
        assert!(problem.query.atoms[0].is_all_key());
    }

    #[test]
    fn test_empty_key() {
        let problem = parse("@database\nVisited(; Rome)\n@query\nnot Visited(; x)");
        assert_eq!(problem.database[0].key_length, 0);
        assert_eq!(problem.query.atoms[0].key_length, 0);
        assert!(problem.query.atoms[0].negated);
    }

    #[test]
    fn test_items_on_one_line() {
        let problem = parse("@database R(A; B), R(A; C) @query R(x; y), not S(y)");
        assert_eq!(problem.database.len(), 2);
        assert_eq!(problem.query.len(), 2);
    }

    #[test]
    fn test_lowercase_database_values_are_constants() {
        let problem = parse("@database\nP(a, b)\n@query\nP(x, b)");
        assert_eq!(problem.database[0], Fact::from_strs("P", 2, &["a", "b"]));
        // in the query, `b` is a variable under the default convention
        assert_eq!(problem.query.atoms[0].args[1], Term::var("b"));
    }

    #[test]
    fn test_string_constants_keep_quotes() {
        let problem = parse("@database\nCity(\"New York\")\n@query\nCity(\"New York\")");
        assert_eq!(problem.query.atoms[0].args[0], Term::constant("\"New York\""));
        assert_eq!(problem.database[0].args[0].as_str(), "\"New York\"");
    }

    #[test]
    fn test_section_headers_case() {
        assert!(parse_problem("@Database\nR(A)\n@Query\nR(x)", SrcId::empty()).is_ok());
    }

    #[test]
    fn test_custom_classifier() {
        struct Sigils;
        impl TermClassifier for Sigils {
            fn is_variable(&self, text: &str) -> bool {
                text.starts_with('v')
            }
        }
        let problem =
            parse_problem_with("@database\nR(A)\n@query\nR(vx)\nR(x)", SrcId::empty(), &Sigils)
                .unwrap();
        assert!(problem.query.atoms[0].args[0].is_variable());
        assert!(problem.query.atoms[1].args[0].is_constant());
    }

    // ===== Error Tests =====

    #[test]
    fn test_missing_database() {
        let errors = parse_problem("@query\nR(x)", SrcId::empty()).unwrap_err();
        assert!(matches!(errors[0], ParseError::MissingSection("database")));
    }

    #[test]
    fn test_missing_query() {
        let errors = parse_problem("@database\nR(A)", SrcId::empty()).unwrap_err();
        assert!(matches!(errors[0], ParseError::MissingSection("query")));
    }

    #[test]
    fn test_malformed_line() {
        assert!(parse_problem("@database\nR(A\n@query\nR(x)", SrcId::empty()).is_err());
        assert!(parse_problem("@database\nR(A; B; C)\n@query\nR(x)", SrcId::empty()).is_err());
    }

    #[test]
    fn test_unknown_section() {
        let errors = parse_problem("@facts\nR(A)", SrcId::empty()).unwrap_err();
        assert!(matches!(errors[0], ParseError::Syntax(_)));
    }

    #[test]
    fn test_negated_fact_rejected() {
        let errors = parse_problem("@database\nnot R(A)\n@query\nR(x)", SrcId::empty()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("cannot be negated")));
    }

    #[test]
    fn test_schema_mismatch() {
        let errors =
            parse_problem("@database\nR(A; B)\n@query\nR(x, y)", SrcId::empty()).unwrap_err();
        assert!(matches!(&errors[0], ParseError::Schema { predicate, .. } if predicate == "R"));

        let errors = parse_problem("@database\nR(A; B)\nR(A)\n@query\nS(x)", SrcId::empty())
            .unwrap_err();
        assert!(matches!(&errors[0], ParseError::Schema { .. }));
    }

    #[test]
    fn test_render_points_at_source() {
        let input = "@database\nR(A; B)\n@query\nR(x, y)";
        let errors = parse_problem(input, SrcId::named("input.cqa")).unwrap_err();
        let rendered = errors[0].render(input);
        assert!(rendered.contains("input.cqa"));
        assert!(rendered.contains("schema error"));
    }

    // ===== Fragments =====

    #[test]
    fn test_parse_query_fragment() {
        let query = parse_query("Likes(p, t;), not Lives(p; t)", SrcId::repl()).unwrap();
        assert_eq!(query.len(), 2);
        assert!(query.atoms[1].negated);
    }

    #[test]
    fn test_parse_facts_fragment() {
        let facts = parse_facts("Lives(John; London) Lives(John; Paris)", SrcId::repl()).unwrap();
        assert_eq!(facts.len(), 2);
        assert!(parse_facts("not Lives(John; London)", SrcId::repl()).is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let problem = parse("@database\nR(A; B)\nS(; C)\nT(D, E)\n@query\nR(x; y)\nnot S(; y)\nT(x, y)");
        assert_eq!(parse(&problem.to_string()), problem);
    }
}
