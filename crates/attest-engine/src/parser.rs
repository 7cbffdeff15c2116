//! Parse and validate model output against the verdict schema
//!
//! Parsing is split in two steps that mirror the retry loop: a structural
//! check ([`parse_decision`]) and a grounding check ([`validate_candidate`]).

use crate::citation::CitationIndex;
use crate::error::Rejection;
use attest_domain::{CitationKey, Verdict, VerdictKind};
use serde_json::{Map, Value};

/// A structurally valid reply whose citations are not yet checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictCandidate {
    /// Decision
    pub kind: VerdictKind,

    /// Rationale text, trimmed
    pub rationale: String,

    /// Cited keys, trimmed and deduplicated in first-seen order
    pub citations: Vec<String>,
}

/// Parse raw model output into a candidate verdict
///
/// Markdown code fences are stripped; if the remainder is not JSON, the span
/// from the first `{` to the last `}` is tried. Unknown fields are ignored.
pub fn parse_decision(raw: &str) -> Result<VerdictCandidate, Rejection> {
    let value = extract_json(raw)?;
    let obj = value.as_object().ok_or(Rejection::WrongType {
        field: "reply",
        expected: "a JSON object",
    })?;

    let verdict = required_str(obj, "verdict")?;
    let kind = VerdictKind::parse(verdict).ok_or_else(|| Rejection::InvalidVerdict(verdict.to_string()))?;

    let rationale = required_str(obj, "rationale")?.trim();
    if rationale.is_empty() {
        return Err(Rejection::EmptyRationale);
    }

    let items = obj
        .get("citations")
        .ok_or(Rejection::MissingField("citations"))?
        .as_array()
        .ok_or(Rejection::WrongType {
            field: "citations",
            expected: "an array of strings",
        })?;

    let mut citations: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let citation = item
            .as_str()
            .ok_or(Rejection::WrongType {
                field: "citations",
                expected: "an array of strings",
            })?
            .trim();
        if !citation.is_empty() && !citations.iter().any(|c| c == citation) {
            citations.push(citation.to_string());
        }
    }

    Ok(VerdictCandidate {
        kind,
        rationale: rationale.to_string(),
        citations,
    })
}

/// Check a candidate's citations against the evidence and build the verdict
pub fn validate_candidate(
    candidate: VerdictCandidate,
    index: &CitationIndex,
    require_citations: bool,
) -> Result<Verdict, Rejection> {
    if require_citations && candidate.citations.is_empty() {
        return Err(Rejection::NoCitations);
    }

    for citation in &candidate.citations {
        index
            .resolve(citation)
            .map_err(|unknown| Rejection::UnknownCitation(unknown.0))?;
    }

    let citations = candidate.citations.into_iter().map(CitationKey::new).collect();
    Verdict::new(candidate.kind, candidate.rationale, citations).map_err(|_| Rejection::EmptyRationale)
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, Rejection> {
    obj.get(field)
        .ok_or(Rejection::MissingField(field))?
        .as_str()
        .ok_or(Rejection::WrongType {
            field,
            expected: "a string",
        })
}

/// Locate and parse the JSON object in a reply
fn extract_json(raw: &str) -> Result<Value, Rejection> {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return Err(Rejection::NoJson);
    }

    let direct_error = match serde_json::from_str::<Value>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // LLMs sometimes wrap JSON in prose
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end])
            .map_err(|e| Rejection::Malformed(e.to_string())),
        (None, _) => Err(Rejection::NoJson),
        _ => Err(Rejection::Malformed(direct_error.to_string())),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Skip the info string (```json) on the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
