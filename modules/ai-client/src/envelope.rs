use serde_json::Value;

/// Pull the reply text out of a completion response.
///
/// Endpoints disagree on where the text lives. Known shapes are tried in
/// order: `content`, `reply`, `message` (string or `{content}`),
/// `choices[0].message.content`, `choices[0].text`, `output_text`, and a bare
/// JSON string. Anything else yields an empty string.
pub fn extract_reply(value: &Value) -> String {
    if let Value::String(s) = value {
        return s.clone();
    }

    let candidates = [
        value.get("content"),
        value.get("reply"),
        value.get("message"),
        value.pointer("/message/content"),
        value.pointer("/choices/0/message/content"),
        value.pointer("/choices/0/text"),
        value.get("output_text"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_default()
}
