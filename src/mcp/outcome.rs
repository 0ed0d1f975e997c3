//! Conversion of MCP tool replies into `ToolOutcome`

use base64::Engine;
use rmcp::model::{CallToolResult, RawContent};

use crate::tools::ToolOutcome;

/// Classify a raw `CallToolResult`
///
/// Error flag wins, then structured content, then the content parts joined
/// as text. Images are not forwarded to the model; they are checked and
/// summarized so the model knows one was produced.
pub fn outcome_from_result(result: CallToolResult) -> ToolOutcome {
    let is_error = result.is_error.unwrap_or(false);

    if !is_error {
        if let Some(structured) = result.structured_content {
            return ToolOutcome::Structured(structured);
        }
    }

    let mut parts = Vec::new();

    for content in &result.content {
        match &content.raw {
            RawContent::Text(text_content) => parts.push(text_content.text.clone()),
            RawContent::Image(image_content) => {
                match base64::engine::general_purpose::STANDARD.decode(&image_content.data) {
                    Ok(bytes) => parts.push(format!(
                        "[image: {}, {} bytes]",
                        image_content.mime_type,
                        bytes.len()
                    )),
                    Err(e) => {
                        return ToolOutcome::error(format!("Failed to decode base64 image: {}", e))
                    }
                }
            }
            RawContent::Resource(resource_content) => {
                match serde_json::to_string_pretty(&resource_content.resource) {
                    Ok(json) => parts.push(json),
                    Err(e) => tracing::warn!("[MCP] Skipping unserializable resource: {}", e),
                }
            }
            _ => match serde_json::to_string_pretty(content) {
                Ok(json) => parts.push(json),
                Err(e) => tracing::warn!("[MCP] Skipping unserializable content: {}", e),
            },
        }
    }

    let output = parts.join("\n\n");

    if is_error {
        ToolOutcome::Error(output)
    } else {
        ToolOutcome::Text(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;
    use serde_json::json;

    #[test]
    fn test_text_parts_are_joined() {
        let result = CallToolResult::success(vec![Content::text("first"), Content::text("second")]);
        assert_eq!(outcome_from_result(result), ToolOutcome::text("first\n\nsecond"));
    }

    #[test]
    fn test_error_flag() {
        let result = CallToolResult::error(vec![Content::text("Invalid URL")]);
        assert_eq!(outcome_from_result(result), ToolOutcome::error("Invalid URL"));
    }

    #[test]
    fn test_structured_content_wins() {
        let payload = json!({"customers": [{"id": 1}], "next": "abc"});
        let result = CallToolResult::structured(payload.clone());
        assert_eq!(outcome_from_result(result), ToolOutcome::Structured(payload));
    }

    #[test]
    fn test_image_is_summarized() {
        let data = base64::engine::general_purpose::STANDARD.encode([0u8; 16]);
        let result = CallToolResult::success(vec![Content::image(data, "image/png")]);
        assert_eq!(
            outcome_from_result(result),
            ToolOutcome::text("[image: image/png, 16 bytes]")
        );
    }

    #[test]
    fn test_bad_image_is_error() {
        let result = CallToolResult::success(vec![Content::image("%%%not-base64", "image/png")]);
        assert!(outcome_from_result(result).is_error());
    }
}
