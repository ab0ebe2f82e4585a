//! Text analyzer tool: word, character and sentence statistics.

use async_trait::async_trait;
use ollabot_core::error::ToolError;
use ollabot_core::tool::Tool;

/// Basic statistics for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStats {
    pub words: usize,
    pub characters: usize,
    pub sentences: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
            sentences: text.split('.').filter(|s| !s.trim().is_empty()).count(),
        }
    }

    /// Characters per word, counting whitespace and punctuation.
    pub fn average_word_length(&self) -> Option<f64> {
        (self.words > 0).then(|| self.characters as f64 / self.words as f64)
    }
}

pub struct TextAnalyzerTool;

#[async_trait]
impl Tool for TextAnalyzerTool {
    fn name(&self) -> &str {
        "text_analyzer"
    }

    fn description(&self) -> &str {
        "Analyzes text and reports word count, character count, sentence count and average word length."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "The text to analyze"
                }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'text' argument".into()))?;

        let stats = TextStats::of(text);
        let average = stats
            .average_word_length()
            .ok_or_else(|| ToolError::Failed("Text contains no words to analyze".into()))?;

        Ok(format!(
            "📝 Text Analysis:\n- Words: {}\n- Characters: {}\n- Sentences: {}\n- Avg word length: {average:.1} chars",
            stats.words, stats.characters, stats.sentences
        ))
    }
}
