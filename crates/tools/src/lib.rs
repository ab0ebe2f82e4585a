//! Built-in tool implementations for ollabot.
//!
//! Tools are small, side-effect free helpers the model can call:
//! arithmetic, unit conversion, date and time lookups, text statistics
//! and text encoding.

pub mod calculator;
pub mod datetime;
pub mod encode_decode;
pub mod text_analyzer;
pub mod unit_converter;

use ollabot_core::tool::ToolRegistry;

/// Create a tool registry with all built-in tools, in advertised order.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    // Math & conversion
    registry.register(Box::new(calculator::CalculatorTool));
    registry.register(Box::new(unit_converter::UnitConverterTool));
    // Date & time
    registry.register(Box::new(datetime::CurrentTimeTool));
    registry.register(Box::new(datetime::TimezoneTimeTool));
    registry.register(Box::new(datetime::DaysBetweenTool));
    // Text
    registry.register(Box::new(text_analyzer::TextAnalyzerTool));
    registry.register(Box::new(encode_decode::EncodeDecodeTool));
    tracing::debug!(tools = registry.len(), "Built-in tool registry ready");
    registry
}
