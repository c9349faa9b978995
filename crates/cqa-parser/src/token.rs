use chumsky::prelude::*;
use std::fmt;

use crate::Span;

pub type SpannedToken = (Token, Span);
pub type LexError = Simple<char, Span>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Ident(String),
    Number(String),
    String(String),
    /// `@database`, `@query`
    Section(String),
    Not,
    LParen,
    RParen,
    Comma,
    Semicolon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(text) => write!(f, "{}", text),
            Token::Number(text) => write!(f, "{}", text),
            Token::String(text) => write!(f, "\"{}\"", text),
            Token::Section(name) => write!(f, "@{}", name),
            Token::Not => write!(f, "not"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

fn string_literal() -> impl Parser<char, String, Error = LexError> + Clone {
    let escape_sequence = just('\\').ignore_then(choice((
        just('"').to('"'),
        just('n').to('\n'),
        just('t').to('\t'),
        just('\\').to('\\'),
    )));

    let string_char = choice((
        escape_sequence,
        filter(|c| *c != '"' && *c != '\\' && *c != '\n'),
    ));

    just('"')
        .ignore_then(string_char.repeated())
        .then_ignore(just('"'))
        .collect::<String>()
        .labelled("string")
}

fn number_literal() -> impl Parser<char, String, Error = LexError> + Clone {
    just('-')
        .or_not()
        .then(text::int(10))
        .then(just('.').ignore_then(text::digits(10)).or_not())
        .map(|((sign, whole), frac)| {
            let sign = if sign.is_some() { "-" } else { "" };
            match frac {
                Some(frac) => format!("{}{}.{}", sign, whole, frac),
                None => format!("{}{}", sign, whole),
            }
        })
        .labelled("number")
}

fn identifier() -> impl Parser<char, Token, Error = LexError> + Clone {
    text::ident()
        .map(|ident: String| match ident.as_str() {
            "not" | "Not" | "NOT" => Token::Not,
            _ => Token::Ident(ident),
        })
        .labelled("identifier")
}

fn section_header() -> impl Parser<char, Token, Error = LexError> + Clone {
    just('@')
        .ignore_then(text::ident())
        .map(Token::Section)
        .labelled("section header")
}

fn line_comment() -> impl Parser<char, (), Error = LexError> + Clone {
    just('#')
        .then(filter(|c| *c != '\n').repeated())
        .ignored()
        .labelled("comment")
}

fn spacing() -> impl Parser<char, (), Error = LexError> + Clone {
    line_comment()
        .or(text::whitespace().at_least(1).ignored())
        .repeated()
        .ignored()
}

pub fn lexer() -> impl Parser<char, Vec<SpannedToken>, Error = LexError> + Clone {
    let punct = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just(';').to(Token::Semicolon),
        just('¬').to(Token::Not),
        just('!').to(Token::Not),
    ));

    let token = choice((
        string_literal().map(Token::String),
        number_literal().map(Token::Number),
        section_header(),
        identifier(),
        punct,
    ))
    .map_with_span(|token, span| (token, span))
    .padded_by(spacing());

    spacing()
        .ignore_then(token.repeated())
        .then_ignore(end())
}
