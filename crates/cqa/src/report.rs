use cqa_analysis::Guardedness;
use cqa_ast::Query;
use serde::Serialize;
use std::fmt;

/// Outcome of one evaluation
///
/// Fields after `guardedness` stay empty when the query is not self-join-free
/// or its negation is unguarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub query: String,
    pub guardedness: Guardedness,
    pub acyclic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<String>,
    pub certain: Option<bool>,
    pub rewriting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewriting_latex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite_refusal: Option<String>,
    pub attacks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_graph_dot: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

impl Report {
    pub fn new(query: &Query, guardedness: Guardedness) -> Self {
        Report {
            query: query.to_string(),
            guardedness,
            acyclic: None,
            cycle: None,
            certain: None,
            rewriting: None,
            rewriting_latex: None,
            rewrite_refusal: None,
            attacks: Vec::new(),
            attack_graph_dot: None,
            trace: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "n/a",
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query:       {}", self.query)?;
        writeln!(f, "guardedness: {}", self.guardedness)?;
        writeln!(f, "acyclic:     {}", yes_no(self.acyclic))?;
        if let Some(cycle) = &self.cycle {
            writeln!(f, "cycle:       {}", cycle)?;
        }
        for attack in &self.attacks {
            writeln!(f, "attack:      {}", attack)?;
        }
        write!(f, "certain:     {}", yes_no(self.certain))?;
        if let Some(rewriting) = &self.rewriting {
            write!(f, "\nrewriting:   {}", rewriting)?;
        }
        if let Some(refusal) = &self.rewrite_refusal {
            write!(f, "\nrewriting:   none ({})", refusal)?;
        }
        for line in &self.trace {
            write!(f, "\n  {}", line)?;
        }
        Ok(())
    }
}
