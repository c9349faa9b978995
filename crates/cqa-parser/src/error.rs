use ariadne::{Config, Label, Report, ReportKind, Source};
use chumsky::error::{Simple, SimpleReason};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

use crate::token::{LexError, Token};
use crate::Span;

pub(crate) type ParserError = Simple<Token, Span>;

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("lexical error: {}", describe(.0))]
    Lex(LexError),
    #[error("syntax error: {}", describe(.0))]
    Syntax(ParserError),
    /// No `@database` facts or no `@query` atoms
    #[error("missing or empty @{0} section")]
    MissingSection(&'static str),
    /// A predicate is used with two different shapes
    #[error("schema error for {predicate}: {detail}")]
    Schema {
        predicate: String,
        detail: String,
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Lex(error) => Some(error.span()),
            ParseError::Syntax(error) => Some(error.span()),
            ParseError::MissingSection(_) => None,
            ParseError::Schema { span, .. } => Some(*span),
        }
    }

    /// Render the error against its source text
    pub fn render(&self, source: &str) -> String {
        let Some(span) = self.span() else {
            return self.to_string();
        };
        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, span.src(), span.start())
            .with_config(Config::default().with_color(false))
            .with_message(self.to_string())
            .with_label(Label::new(span).with_message(self.label()))
            .finish()
            .write((span.src(), Source::from(source.to_string())), &mut out);
        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    fn label(&self) -> String {
        match self {
            ParseError::Lex(error) => describe(error),
            ParseError::Syntax(error) => describe(error),
            ParseError::MissingSection(name) => format!("missing @{}", name),
            ParseError::Schema { detail, .. } => detail.clone(),
        }
    }
}

fn describe<T: fmt::Display + Hash + Eq>(error: &Simple<T, Span>) -> String {
    if let SimpleReason::Custom(message) = error.reason() {
        return message.clone();
    }
    let found = match error.found() {
        Some(token) => format!("'{}'", token),
        None => "end of input".to_string(),
    };
    let mut expected: Vec<String> = error
        .expected()
        .map(|token| match token {
            Some(token) => format!("'{}'", token),
            None => "end of input".to_string(),
        })
        .collect();
    expected.sort();
    expected.dedup();

    let mut message = format!("unexpected {}", found);
    if let Some(label) = error.label() {
        message.push_str(&format!(" while parsing {}", label));
    }
    if !expected.is_empty() {
        message.push_str(&format!(", expected {}", expected.join(" or ")));
    }
    message
}
