use cqa_analysis::{classify, AttackGraph};
use cqa_certainty::{CertaintyError, Certifier, Limits};
use cqa_core::{Database, InsertError};
use cqa_parser::{parse_problem, ParseError, Problem, SrcId};
use cqa_rewrite::{rewrite, to_latex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub limits: Limits,
    /// Attempt a first-order rewriting
    pub rewrite: bool,
    /// Record the certainty recursion in the report
    pub trace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            limits: Limits::default(),
            rewrite: true,
            trace: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{}", summarize(.0))]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Database(#[from] InsertError),
    #[error(transparent)]
    Certainty(#[from] CertaintyError),
}

impl DriverError {
    /// Render against the source text, one diagnostic per parse error
    pub fn render(&self, source: &str) -> String {
        match self {
            DriverError::Parse(errors) => errors
                .iter()
                .map(|error| error.render(source))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

fn summarize(errors: &[ParseError]) -> String {
    match errors {
        [single] => single.to_string(),
        _ => format!("{} parse errors", errors.len()),
    }
}

/// Parse and evaluate a `@database` / `@query` source
pub fn evaluate_source(source: &str, options: &Options) -> Result<Report, DriverError> {
    let problem = parse_problem(source, SrcId::empty()).map_err(DriverError::Parse)?;
    evaluate(&problem, options)
}

pub fn evaluate(problem: &Problem, options: &Options) -> Result<Report, DriverError> {
    let query = &problem.query;
    let guardedness = classify(query);
    debug!(%query, %guardedness, "classified");

    let mut report = Report::new(query, guardedness);
    if !guardedness.is_guarded() {
        info!(%guardedness, "skipping certainty");
        return Ok(report);
    }

    let db = Database::from_facts(problem.database.iter().cloned())?;
    let graph = AttackGraph::build(query);
    let acyclic = graph.is_acyclic();
    debug!(acyclic, edges = graph.edge_count(), "attack graph");
    report.acyclic = Some(acyclic);
    report.cycle = graph.describe_cycle();
    report.attacks = graph
        .edges()
        .into_iter()
        .map(|(from, to)| format!("{} ⇝ {}", graph.node(from), graph.node(to)))
        .collect();
    report.attack_graph_dot = Some(graph.to_dot());

    let mut certifier = Certifier::new()
        .with_limits(options.limits)
        .strict(acyclic);
    if options.trace {
        certifier = certifier.with_trace();
    }
    let certain = certifier.is_certain(query, &db)?;
    debug!(certain, steps = certifier.steps(), "certainty");
    report.certain = Some(certain);
    report.trace = certifier.trace().to_vec();

    if options.rewrite {
        match rewrite(query) {
            Ok(formula) => {
                report.rewriting_latex = Some(to_latex(&formula));
                report.rewriting = Some(formula.to_string());
            }
            Err(refusal) => {
                debug!(%refusal, "not rewritable");
                report.rewrite_refusal = Some(refusal.to_string());
            }
        }
    }
    Ok(report)
}
