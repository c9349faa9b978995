use cqa::cqa_core::Database;
use cqa::cqa_parser::{parse_facts, parse_problem, parse_query, ParseError, Problem, SrcId};
use cqa::{evaluate, Options};
use ratatui::style::Color;
use std::path::Path;

/// Colon commands with their help text
pub const COMMANDS: &[(&str, &str)] = &[
    (":load FILE", "replace the database and evaluate the file's query"),
    (":clear", "empty the database"),
    (":db", "show the database grouped into blocks"),
    (":help", "show the help popup"),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    Fact,
    Query,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Fact => "Fact",
            Mode::Query => "Query",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Mode::Fact => Mode::Query,
            Mode::Query => Mode::Fact,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Mode::Fact => Color::Cyan,
            Mode::Query => Color::Magenta,
        }
    }
}

pub struct HistoryEntry {
    pub mode: Mode,
    pub input: String,
    pub output: String,
    pub is_error: bool,
}

pub struct App {
    pub options: Options,
    pub database: Database,
    pub mode: Mode,
    pub input: String,
    /// Byte offset into `input`, always on a char boundary
    pub cursor_pos: usize,
    pub history: Vec<HistoryEntry>,
    pub scroll_offset: usize,
    pub show_help: bool,
}

impl App {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            database: Database::new(),
            mode: Mode::Fact,
            input: String::new(),
            cursor_pos: 0,
            history: Vec::new(),
            scroll_offset: 0,
            show_help: false,
        }
    }

    pub fn submit(&mut self) {
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }

        let mode = self.mode;
        let (output, is_error) = match self.run(&input) {
            Ok(output) => (output, false),
            Err(error) => (error, true),
        };

        self.history.push(HistoryEntry {
            mode,
            input,
            output,
            is_error,
        });

        self.clear_input();
        self.scroll_offset = 0;
    }

    fn run(&mut self, input: &str) -> Result<String, String> {
        if let Some(command) = input.strip_prefix(':') {
            return self.command(command.trim());
        }
        match self.mode {
            Mode::Fact => self.add_facts(input),
            Mode::Query => self.ask(input),
        }
    }

    fn command(&mut self, command: &str) -> Result<String, String> {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match name {
            "load" if arg.is_empty() => Err("usage: :load FILE".to_string()),
            "load" => self.load(Path::new(arg)),
            "clear" => {
                self.database = Database::new();
                Ok("database cleared".to_string())
            }
            "db" => Ok(self.describe_database()),
            "help" => {
                self.show_help = true;
                let names: Vec<&str> = COMMANDS.iter().map(|(name, _)| *name).collect();
                Ok(format!("commands: {}", names.join(", ")))
            }
            other => Err(format!("unknown command :{} (try :help)", other)),
        }
    }

    /// All facts are added or none are
    fn add_facts(&mut self, input: &str) -> Result<String, String> {
        let facts = parse_facts(input, SrcId::repl()).map_err(|errors| render(&errors, input))?;
        let mut database = self.database.clone();
        let mut added = 0;
        for fact in facts {
            if database.insert(fact).map_err(|e| e.to_string())?.is_new() {
                added += 1;
            }
        }
        self.database = database;
        Ok(format!(
            "{} fact{} added ({} total)",
            added,
            if added == 1 { "" } else { "s" },
            self.database.len()
        ))
    }

    fn ask(&self, input: &str) -> Result<String, String> {
        let query = parse_query(input, SrcId::repl()).map_err(|errors| render(&errors, input))?;
        let problem = Problem {
            database: self.database.iter().cloned().collect(),
            query,
        };
        evaluate(&problem, &self.options)
            .map(|report| report.to_string())
            .map_err(|e| e.to_string())
    }

    /// Replace the session database with the file's facts and evaluate its query
    fn load(&mut self, path: &Path) -> Result<String, String> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        let problem = parse_problem(&source, SrcId::from_path(path))
            .map_err(|errors| render(&errors, &source))?;
        let database =
            Database::from_facts(problem.database.iter().cloned()).map_err(|e| e.to_string())?;
        let report = evaluate(&problem, &self.options).map_err(|e| e.to_string())?;

        self.database = database;
        self.mode = Mode::Query;
        Ok(format!(
            "loaded {} facts from {}\n{}",
            self.database.len(),
            path.display(),
            report
        ))
    }

    fn describe_database(&self) -> String {
        if self.database.is_empty() {
            return "(empty database)".to_string();
        }

        let mut predicates: Vec<_> = self.database.predicates().collect();
        predicates.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let mut lines = Vec::new();
        for predicate in predicates {
            for block in self.database.blocks(predicate) {
                let facts: Vec<String> = block.iter().map(|fact| fact.to_string()).collect();
                let marker = if block.len() > 1 { "  (conflict)" } else { "" };
                lines.push(format!("{}{}", facts.join("  "), marker));
            }
        }
        lines.push(format!(
            "({} facts, {})",
            self.database.len(),
            if self.database.is_consistent() {
                "consistent"
            } else {
                "inconsistent"
            }
        ));
        lines.join("\n")
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    pub fn delete_char(&mut self) {
        if let Some(c) = self.input[..self.cursor_pos].chars().next_back() {
            self.cursor_pos -= c.len_utf8();
            self.input.remove(self.cursor_pos);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor_pos < self.input.len() {
            self.input.remove(self.cursor_pos);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(c) = self.input[..self.cursor_pos].chars().next_back() {
            self.cursor_pos -= c.len_utf8();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(c) = self.input[self.cursor_pos..].chars().next() {
            self.cursor_pos += c.len_utf8();
        }
    }

    pub fn move_cursor_start(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_pos = self.input.len();
    }

    /// Column of the cursor in characters
    pub fn cursor_column(&self) -> usize {
        self.input[..self.cursor_pos].chars().count()
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    pub fn scroll_up(&mut self) {
        if self.scroll_offset < self.history.len().saturating_sub(1) {
            self.scroll_offset += 1;
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

fn render(errors: &[ParseError], source: &str) -> String {
    errors
        .iter()
        .map(|error| error.render(source))
        .collect::<Vec<_>>()
        .join("\n")
}
