// Shared prompt fragments and structured-output helpers.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

use serde_json::{json, Value};

/// Appended to system prompts whose answer must be a bare JSON object.
pub const JSON_ONLY_INSTRUCTION: &str = "\
Respond with valid JSON only. \
Do not include any text outside the JSON object. \
Do not use markdown code fences.";

/// Builds the `response_format` value for a strict JSON-schema answer.
pub fn json_schema_format(name: &str, schema: Value) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": name,
            "strict": true,
            "schema": schema,
        }
    })
}
