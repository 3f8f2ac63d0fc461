//! Turning free-form model replies into JSON.
//!
//! Models wrap their answer in prose, put it inside a fenced block, or stop
//! mid-object when they hit the token limit. [`parse_reply`] handles each of
//! those cases in a fixed order and gives up with [`AgentError::Parse`] when
//! the text still is not JSON after one repair pass.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::{AgentError, Result};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Narrow `text` down to the most likely JSON object it contains.
///
/// 1. keep the body of a ```` ```json ```` fence, if present
/// 2. close any unbalanced `{`
/// 3. slice from the first `{` to the last `}`
/// 4. strip leftover fence markers
pub fn extract_json_text(text: &str) -> String {
    let mut text = text.to_string();

    if let Some(open) = text.find(JSON_FENCE) {
        let start = open + JSON_FENCE.len();
        let body = match text.rfind(FENCE) {
            Some(end) if end >= start => &text[start..end],
            // Opening fence only: the reply was cut off before it closed.
            _ => &text[start..],
        };
        text = body.trim().to_string();
    }

    let opens = text.matches('{').count();
    let closes = text.matches('}').count();
    if opens > closes {
        text.push_str(&"}".repeat(opens - closes));
    }

    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if first < last {
            text = text[first..=last].to_string();
        }
    }

    clean_json_text(&text)
}

/// Parse a model reply into a JSON object.
///
/// A reply that parses to anything other than an object (an array, a bare
/// string) is reported as [`AgentError::EmptyReply`].
pub fn parse_reply(text: &str) -> Result<Map<String, Value>> {
    let cleaned = extract_json_text(text);
    tracing::debug!(cleaned = %cleaned, "cleaned model reply");

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(v) => v,
        Err(first) => {
            tracing::warn!(error = %first, "reply is not valid JSON, attempting repair");
            let repaired = repair(&cleaned);
            serde_json::from_str::<Value>(&repaired).map_err(|source| AgentError::Parse {
                text: repaired,
                source,
            })?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AgentError::EmptyReply),
    }
}

/// Second-chance cleanup: drop every fence marker and a leading `json`
/// language tag, and unescape literal `\n` sequences.
fn repair(text: &str) -> String {
    let without_fences = text.replace(FENCE, "");
    let trimmed = without_fences.trim_start();
    let untagged = trimmed.strip_prefix("json").unwrap_or(trimmed);
    untagged.replace("\\n", "\n").trim().to_string()
}

/// Remove a leading ```` ```json ```` (or bare ```` ``` ````) and a trailing
/// ```` ``` ```` from `text`.
pub fn clean_json_text(text: &str) -> String {
    static LEAD_JSON: OnceLock<Regex> = OnceLock::new();
    static LEAD: OnceLock<Regex> = OnceLock::new();
    static TRAIL: OnceLock<Regex> = OnceLock::new();

    let text = text.trim();
    let text = LEAD_JSON
        .get_or_init(|| Regex::new(r"^```json\s*").unwrap())
        .replace(text, "");
    let text = LEAD.get_or_init(|| Regex::new(r"^```").unwrap()).replace(&text, "");
    let text = TRAIL.get_or_init(|| Regex::new(r"```$").unwrap()).replace(&text, "");
    text.trim().to_string()
}

/// Strip a fenced block of any language (```` ```mermaid ````, ```` ```rust ````, …)
/// down to its body. Used for Mermaid diagrams and generated code.
pub fn clean_code_block(text: &str) -> String {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();

    let text = OPEN
        .get_or_init(|| Regex::new(r"^```[a-zA-Z0-9]*\s*").unwrap())
        .replace(text.trim(), "");
    let text = CLOSE
        .get_or_init(|| Regex::new(r"\s*```$").unwrap())
        .replace(text.trim(), "");
    text.trim().to_string()
}

/// Remove block comments (`/* */`, `'''`, `"""`), line comments (`#`, `//`)
/// and collapse blank lines.
pub fn remove_all_comments(text: &str) -> String {
    static BLOCK: OnceLock<Regex> = OnceLock::new();
    static SINGLE_QUOTE_DOC: OnceLock<Regex> = OnceLock::new();
    static DOUBLE_QUOTE_DOC: OnceLock<Regex> = OnceLock::new();
    static HASH_LINE: OnceLock<Regex> = OnceLock::new();
    static SLASH_LINE: OnceLock<Regex> = OnceLock::new();
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    let code = BLOCK
        .get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap())
        .replace_all(text, "");
    let code = SINGLE_QUOTE_DOC
        .get_or_init(|| Regex::new(r"(?s)'''.*?'''").unwrap())
        .replace_all(&code, "");
    let code = DOUBLE_QUOTE_DOC
        .get_or_init(|| Regex::new(r#"(?s)""".*?""""#).unwrap())
        .replace_all(&code, "");
    let code = HASH_LINE
        .get_or_init(|| Regex::new(r"(?m)(^|\s)#.*$").unwrap())
        .replace_all(&code, "");
    let code = SLASH_LINE
        .get_or_init(|| Regex::new(r"(?m)(^|\s)//.*$").unwrap())
        .replace_all(&code, "");
    let code = BLANK_LINES
        .get_or_init(|| Regex::new(r"\n{2,}").unwrap())
        .replace_all(&code, "\n");
    code.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object_passes_through() {
        let map = parse_reply(r#"{"description": "todo app"}"#).unwrap();
        assert_eq!(map["description"], "todo app");
    }

    #[test]
    fn fenced_block_inside_prose() {
        let reply = "Sure, here is the draft:\n```json\n{\"architecture\": \"MVC\"}\n```\nLet me know!";
        let map = parse_reply(reply).unwrap();
        assert_eq!(map["architecture"], "MVC");
    }

    #[test]
    fn unclosed_fence_keeps_the_rest() {
        let reply = "```json\n{\"description\": \"cut off\"";
        let map = parse_reply(reply).unwrap();
        assert_eq!(map["description"], "cut off");
    }

    #[test]
    fn truncated_braces_are_closed() {
        let reply = r#"{"description": "x", "frontend": {"language": "TypeScript""#;
        let map = parse_reply(reply).unwrap();
        assert_eq!(map["frontend"]["language"], "TypeScript");
    }

    #[test]
    fn prose_around_bare_object_is_dropped() {
        let reply = "The JSON is {\"backend\": {\"platform\": \"Axum\"}} as requested.";
        let map = parse_reply(reply).unwrap();
        assert_eq!(map["backend"]["platform"], "Axum");
    }

    #[test]
    fn literal_newline_escapes_are_repaired() {
        let reply = r#"{\n  "description": "ok"\n}"#;
        let map = parse_reply(reply).unwrap();
        assert_eq!(map["description"], "ok");
    }

    #[test]
    fn unparseable_text_is_parse_error() {
        let err = parse_reply("{ this is not json }").unwrap_err();
        assert!(matches!(err, AgentError::Parse { .. }));
    }

    #[test]
    fn non_object_json_is_empty_reply() {
        let err = parse_reply("42").unwrap_err();
        assert!(matches!(err, AgentError::EmptyReply));
    }

    #[test]
    fn clean_json_text_strips_markers() {
        assert_eq!(clean_json_text("```json\n{}\n```"), "{}");
        assert_eq!(clean_json_text("  ```{}```  "), "{}");
    }

    #[test]
    fn clean_code_block_handles_any_language() {
        let block = "```mermaid\nsequenceDiagram\n  A->>B: hi\n```";
        assert_eq!(clean_code_block(block), "sequenceDiagram\n  A->>B: hi");
    }

    #[test]
    fn remove_all_comments_strips_comment_forms() {
        let code = "fn main() {\n    // say hi\n    println!(\"hi\"); /* inline */\n\n\n}\n# trailing";
        let cleaned = remove_all_comments(code);
        assert!(!cleaned.contains("say hi"));
        assert!(!cleaned.contains("inline"));
        assert!(!cleaned.contains("trailing"));
        assert!(!cleaned.contains("\n\n"));
        assert!(cleaned.contains("println!(\"hi\");"));
    }
}
