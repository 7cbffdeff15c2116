//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use attest_domain::{Fragment, Turn, VerdictKind};
use attest_engine::DecisionParseError;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const EXCERPT_CHARS: usize = 80;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an answered question.
    pub fn format_turn(&self, turn: &Turn, show_evidence: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&turn_json(turn, show_evidence))?),
            OutputFormat::Table => {
                let mut out = String::new();
                out.push_str(&self.verdict_label(turn.verdict.kind()));
                out.push('\n');
                out.push_str(turn.verdict.rationale());
                out.push('\n');

                let citations: Vec<&str> = turn.verdict.citations().iter().map(|c| c.as_str()).collect();
                if citations.is_empty() {
                    out.push_str(&self.colorize("Citations: none", "yellow"));
                } else {
                    out.push_str(&format!("Citations: {}", citations.join(", ")));
                }

                if turn.attempts > 1 {
                    out.push('\n');
                    out.push_str(&self.info(&format!("Accepted after {} attempts", turn.attempts)));
                }

                if show_evidence {
                    out.push_str("\n\n");
                    out.push_str(&self.fragments_table(&turn.fragments));
                }
                Ok(out)
            }
        }
    }

    /// Format retrieved evidence.
    pub fn format_fragments(&self, fragments: &[Fragment]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = fragments.iter().map(fragment_json).collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if fragments.is_empty() {
                    return Ok(self.colorize("No evidence found.", "yellow"));
                }
                Ok(self.fragments_table(fragments))
            }
        }
    }

    /// Format the session history.
    pub fn format_history(&self, turns: &[Turn]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = turns.iter().map(|t| turn_json(t, false)).collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Table => {
                if turns.is_empty() {
                    return Ok(self.colorize("No questions asked yet.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["#", "Question", "Verdict", "Citations"]);
                for (i, turn) in turns.iter().enumerate() {
                    let citations: Vec<&str> = turn.verdict.citations().iter().map(|c| c.as_str()).collect();
                    builder.push_record([
                        (i + 1).to_string(),
                        excerpt(&turn.question),
                        turn.verdict.kind().to_string(),
                        citations.join(", "),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a question the model never answered validly.
    ///
    /// Shows the last raw reply so the failure can be diagnosed.
    pub fn format_parse_failure(&self, err: &DecisionParseError) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "error": err.to_string(),
                "attempts": err.attempts,
                "reason": err.reason.to_string(),
                "last_output": err.last_output,
            }))?),
            OutputFormat::Table => {
                let reply = if err.last_output.trim().is_empty() {
                    "(no reply)"
                } else {
                    err.last_output.as_str()
                };
                Ok(format!(
                    "{}\n{}",
                    self.warning(&format!("Last model reply after {} attempt(s):", err.attempts)),
                    reply
                ))
            }
        }
    }

    fn fragments_table(&self, fragments: &[Fragment]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Fragment", "Source", "Page", "Chunk", "Similarity", "Excerpt"]);

        for fragment in fragments {
            let provenance = fragment.provenance();
            builder.push_record([
                fragment.id().to_string(),
                provenance.source_name().to_string(),
                provenance.page().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                provenance.chunk_index().to_string(),
                format!("{:.3}", fragment.similarity()),
                excerpt(fragment.text()),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn verdict_label(&self, kind: VerdictKind) -> String {
        let color = match kind {
            VerdictKind::Yes => "green",
            VerdictKind::No => "red",
            VerdictKind::Conditional => "yellow",
        };
        self.colorize(&format!("Verdict: {}", kind), color)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn fragment_json(fragment: &Fragment) -> serde_json::Value {
    let provenance = fragment.provenance();
    serde_json::json!({
        "id": fragment.id(),
        "source_name": provenance.source_name(),
        "page": provenance.page(),
        "chunk_index": provenance.chunk_index(),
        "similarity": fragment.similarity(),
        "text": fragment.text(),
    })
}

fn turn_json(turn: &Turn, show_evidence: bool) -> serde_json::Value {
    let citations: Vec<&str> = turn.verdict.citations().iter().map(|c| c.as_str()).collect();
    let mut json = serde_json::json!({
        "question": turn.question,
        "verdict": turn.verdict.kind().as_str(),
        "rationale": turn.verdict.rationale(),
        "citations": citations,
        "attempts": turn.attempts,
    });
    if show_evidence {
        json["evidence"] = serde_json::Value::Array(turn.fragments.iter().map(fragment_json).collect());
    }
    json
}

/// First line of `text`, cut to a fixed number of characters.
fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() <= EXCERPT_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(EXCERPT_CHARS - 1).collect();
    format!("{}…", cut)
}
