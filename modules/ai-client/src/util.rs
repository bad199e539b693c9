use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

/// Strip markdown code fences from a model response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a model response as JSON, tolerating fenced output and prose
/// around the object. Models occasionally preface the JSON with a sentence;
/// when direct parsing fails, retry on the outermost `{...}` span.
pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> Result<T> {
    let cleaned = strip_code_blocks(response);

    match serde_json::from_str(cleaned) {
        Ok(value) => Ok(value),
        Err(first_err) => {
            let start = cleaned.find('{');
            let end = cleaned.rfind('}');
            if let (Some(start), Some(end)) = (start, end) {
                if start < end {
                    if let Ok(value) = serde_json::from_str(&cleaned[start..=end]) {
                        return Ok(value);
                    }
                }
            }
            Err(anyhow!("Response is not valid JSON: {first_err}"))
        }
    }
}
