//! Prompt assembly for grounded decisions
//!
//! Prompts are a pure function of the question, the memory window and the
//! citation index, so identical inputs always render byte-identical prompts.

use crate::citation::CitationIndex;
use crate::error::Rejection;
use attest_domain::{CitationKey, ConversationMemory, Fragment};

/// JSON Schema for the verdict object, passed to structured-output providers
pub const VERDICT_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "verdict": { "type": "string", "enum": ["YES", "NO", "CONDITIONAL"] },
    "rationale": { "type": "string" },
    "citations": { "type": "array", "items": { "type": "string" } }
  },
  "required": ["verdict", "rationale", "citations"]
}"#;

const DECISION_INSTRUCTIONS: &str = r#"You are a Risk / InfoSec Access Control Compliance Agent.
Answer the question using ONLY the evidence below.

Rules:
1) Use only the supplied evidence. Do not rely on outside knowledge.
2) Cite only keys listed under "Allowed citation keys". Never invent keys or ids.
3) If the evidence is insufficient, answer CONDITIONAL and state exactly what is missing.
4) Keep the rationale to at most two sentences.
5) Return JSON only: no code fences, no prose before or after."#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Return exactly one JSON object of this shape:
{"verdict": "YES" | "NO" | "CONDITIONAL", "rationale": "<at most two sentences>", "citations": ["<allowed key>", ...]}"#;

/// Renders decision and repair prompts
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    memory_window: usize,
}

impl PromptAssembler {
    /// Create an assembler showing at most `memory_window` prior turns
    pub fn new(memory_window: usize) -> Self {
        Self { memory_window }
    }

    /// Number of prior turns included in each prompt
    pub fn memory_window(&self) -> usize {
        self.memory_window
    }

    /// Build the grounding prompt for a question
    pub fn build(&self, question: &str, memory: &ConversationMemory, index: &CitationIndex) -> String {
        let mut prompt = String::new();

        prompt.push_str(DECISION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        let recent = memory.recent(self.memory_window);
        if !recent.is_empty() {
            prompt.push_str("Earlier in this conversation:\n");
            for turn in recent {
                prompt.push_str(&format!("Q: {}\n", turn.question));
                prompt.push_str(&format!(
                    "A: {} - {} [{}]\n",
                    turn.verdict.kind(),
                    turn.verdict.rationale(),
                    join_keys(turn.verdict.citations())
                ));
            }
            prompt.push('\n');
        }

        prompt.push_str("Evidence:\n");
        for (position, (fragment, keys)) in index.entries().enumerate() {
            render_fragment(&mut prompt, position + 1, fragment, keys);
        }
        prompt.push('\n');

        let allowed: Vec<&CitationKey> = index.entries().flat_map(|(_, keys)| keys).collect();
        prompt.push_str("Allowed citation keys: ");
        prompt.push_str(
            &allowed
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        prompt.push_str(" (a fragment id shown in the evidence is also allowed)\n\n");

        prompt.push_str(&format!("Question: {}\n\n", question));
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    /// Build the follow-up prompt after a rejected reply
    ///
    /// Repeats the original prompt, shows the rejected reply with the reason,
    /// then restates the output contract.
    pub fn build_repair(&self, original_prompt: &str, rejected_output: &str, reason: &Rejection) -> String {
        let mut prompt = String::with_capacity(original_prompt.len() + rejected_output.len() + 256);

        prompt.push_str(original_prompt);
        prompt.push_str("\n\nYour previous reply was rejected.\n");
        prompt.push_str("Previous reply:\n");
        prompt.push_str("---\n");
        if rejected_output.trim().is_empty() {
            prompt.push_str("(no reply)");
        } else {
            prompt.push_str(rejected_output.trim());
        }
        prompt.push_str("\n---\n");
        prompt.push_str(&format!("Reason: {}\n\n", reason));
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(3)
    }
}

fn render_fragment(prompt: &mut String, number: usize, fragment: &Fragment, keys: &[CitationKey]) {
    let provenance = fragment.provenance();
    let page = provenance
        .page()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "n/a".to_string());

    prompt.push_str(&format!(
        "[{}] keys: {} | id: {} | source: {}, page {}, chunk {}\n",
        number,
        join_keys(keys),
        fragment.id(),
        provenance.source_name(),
        page,
        provenance.chunk_index()
    ));
    prompt.push_str("---\n");
    prompt.push_str(fragment.text());
    prompt.push_str("\n---\n");
}

fn join_keys(keys: &[CitationKey]) -> String {
    keys.iter().map(CitationKey::as_str).collect::<Vec<_>>().join(", ")
}
