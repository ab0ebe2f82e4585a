//! Encode/decode tool: Base64 and URL percent-encoding.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ollabot_core::error::ToolError;
use ollabot_core::tool::Tool;

/// A supported transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Base64Encode,
    Base64Decode,
    UrlEncode,
    UrlDecode,
}

impl Operation {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "base64_encode" => Some(Self::Base64Encode),
            "base64_decode" => Some(Self::Base64Decode),
            "url_encode" => Some(Self::UrlEncode),
            "url_decode" => Some(Self::UrlDecode),
            _ => None,
        }
    }

    pub fn apply(self, text: &str) -> Result<String, ToolError> {
        match self {
            Self::Base64Encode => Ok(format!("Base64 encoded: {}", STANDARD.encode(text))),
            Self::Base64Decode => {
                let bytes = STANDARD
                    .decode(text.trim())
                    .map_err(|e| ToolError::Failed(format!("Invalid base64 input: {e}")))?;
                let decoded = String::from_utf8(bytes)
                    .map_err(|_| ToolError::Failed("Decoded bytes are not valid UTF-8".into()))?;
                Ok(format!("Base64 decoded: {decoded}"))
            }
            Self::UrlEncode => Ok(format!("URL encoded: {}", urlencoding::encode(text))),
            Self::UrlDecode => {
                let decoded = urlencoding::decode(text)
                    .map_err(|_| ToolError::Failed("Decoded bytes are not valid UTF-8".into()))?;
                Ok(format!("URL decoded: {decoded}"))
            }
        }
    }
}

pub struct EncodeDecodeTool;

#[async_trait]
impl Tool for EncodeDecodeTool {
    fn name(&self) -> &str {
        "encode_decode_text"
    }

    fn description(&self) -> &str {
        "Encodes or decodes text with Base64 or URL encoding."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to encode or decode"
                },
                "operation": {
                    "type": "string",
                    "enum": ["base64_encode", "base64_decode", "url_encode", "url_decode"],
                    "description": "The operation to perform (default: base64_encode)",
                    "default": "base64_encode"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;
        let operation = arguments["operation"].as_str().unwrap_or("base64_encode");

        let operation = Operation::parse(operation).ok_or_else(|| {
            ToolError::Failed(
                "Operation must be base64_encode, base64_decode, url_encode, or url_decode".into(),
            )
        })?;
        operation.apply(text)
    }
}
