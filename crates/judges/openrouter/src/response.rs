//! Turning a model's free-text reply into a judgment

use bracket_core::{JudgeError, Judgment, Side};
use serde::Deserialize;
use serde_json::Value;

/// Longest excerpt of a bad reply quoted in an error
const EXCERPT_LEN: usize = 120;

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if there is any
    pub(crate) fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawJudgment {
    winner: Option<String>,
    explanation: Option<String>,
}

/// Find the first complete JSON object in `text`.
///
/// Models like to wrap their answer in code fences or a sentence of prose,
/// so each `{` is tried as the start of an object until one parses.
pub fn extract_json_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}

/// Parse and validate a judgment out of a model reply.
pub fn parse_judgment(content: &str) -> Result<Judgment, JudgeError> {
    let value = extract_json_object(content).ok_or_else(|| {
        JudgeError::MalformedResponse(format!("no JSON object in reply: {}", excerpt(content)))
    })?;

    let raw: RawJudgment = serde_json::from_value(value)
        .map_err(|e| JudgeError::MalformedResponse(e.to_string()))?;

    let label = raw
        .winner
        .ok_or_else(|| JudgeError::MalformedResponse("reply has no winner".to_string()))?;
    let winner = Side::parse(&label).ok_or_else(|| JudgeError::InvalidWinner(label.clone()))?;

    let explanation = raw
        .explanation
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(JudgeError::EmptyRationale)?;

    Ok(Judgment::new(winner, explanation))
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod response_tests;
