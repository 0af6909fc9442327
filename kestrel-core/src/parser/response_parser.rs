//! The Response Parser: extracts tool calls from a model response,
//! leaving a cleaned textual part and reporting unmatched opening markers.
//!
//! Grammar: `<tool_call name="...">` opens a call, `</tool_call>` closes it;
//! between them, zero or more `<param name="...">value</param>` blocks
//! carry the call's arguments.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::message::ToolCall;

static NEXT_CALL_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_call_id() -> String {
    format!("call_{}", NEXT_CALL_SEQ.fetch_add(1, Ordering::SeqCst))
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn tool_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<tool_call\s+name="([^"]*)"\s*>(.*?)</tool_call>"#).expect("tool_call_re should compile")
    })
}

fn opening_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<tool_call\s+name="([^"]*)"\s*>"#).expect("opening_marker_re should compile"))
}

fn param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<param\s+name="([^"]*)"\s*>(.*?)</param>"#).expect("param_re should compile")
    })
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{4,}").expect("blank_run_re should compile"))
}

/// Coerces a trimmed parameter literal into a JSON value following the
/// fixed precedence: boolean, null, undefined (represented as an absent
/// entry, signaled by returning `None`), number, JSON, then raw string.
fn coerce(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    match trimmed {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        "undefined" => return None,
        _ => {}
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if !f.is_nan() {
            return Some(Value::from(f));
        }
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            return Some(parsed);
        }
    }
    Some(Value::String(trimmed.to_string()))
}

fn parse_params(body: &str) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    for caps in param_re().captures_iter(body) {
        let name = caps[1].to_string();
        let raw = &caps[2];
        if let Some(value) = coerce(raw) {
            params.insert(name, value);
        }
    }
    params
}

fn collapse_blank_runs(text: &str) -> String {
    blank_run_re().replace_all(text, "\n\n\n").into_owned()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub incomplete_tool_call: bool,
}

/// Parses a model response into cleaned prose plus an ordered list of tool
/// calls. Calls are returned in source order; an opening marker with no
/// matching close is dropped from the output but sets
/// [`ParsedResponse::incomplete_tool_call`].
pub fn parse(response: &str) -> ParsedResponse {
    let mut tool_calls = Vec::new();
    let mut text = String::new();
    let mut cursor = 0usize;

    for caps in tool_call_re().captures_iter(response) {
        let whole = caps.get(0).expect("capture 0 always present");
        text.push_str(&response[cursor..whole.start()]);
        cursor = whole.end();

        let name = caps[1].to_string();
        let body = &caps[2];
        tool_calls.push(ToolCall {
            id: next_call_id(),
            name,
            params: parse_params(body),
            timestamp: now_secs(),
        });
    }
    text.push_str(&response[cursor..]);

    let remaining_openings = opening_marker_re().find_iter(&text).count();
    let incomplete_tool_call = remaining_openings > 0;

    ParsedResponse {
        text: collapse_blank_runs(text.trim_end()).to_string(),
        tool_calls,
        incomplete_tool_call,
    }
}
