//! Unit converter tool: temperature, length and weight.

use async_trait::async_trait;
use ollabot_core::error::ToolError;
use ollabot_core::tool::Tool;

type Convert = fn(f64) -> f64;

/// Supported `(from, to)` pairs, in the order they are advertised.
const CONVERSIONS: &[(&str, &str, Convert)] = &[
    // Temperature
    ("celsius", "fahrenheit", |x| x * 9.0 / 5.0 + 32.0),
    ("fahrenheit", "celsius", |x| (x - 32.0) * 5.0 / 9.0),
    ("celsius", "kelvin", |x| x + 273.15),
    ("kelvin", "celsius", |x| x - 273.15),
    // Length
    ("km", "miles", |x| x * 0.621371),
    ("miles", "km", |x| x * 1.60934),
    ("meters", "feet", |x| x * 3.28084),
    ("feet", "meters", |x| x * 0.3048),
    ("cm", "inches", |x| x * 0.393701),
    ("inches", "cm", |x| x * 2.54),
    // Weight
    ("kg", "lbs", |x| x * 2.20462),
    ("lbs", "kg", |x| x * 0.453592),
];

pub struct UnitConverterTool;

/// Look up and apply a conversion. Unit names are case-insensitive.
pub fn convert(value: f64, from_unit: &str, to_unit: &str) -> Option<f64> {
    let from = from_unit.to_lowercase();
    let to = to_unit.to_lowercase();
    CONVERSIONS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, convert)| convert(value))
}

fn available() -> String {
    CONVERSIONS
        .iter()
        .map(|(f, t, _)| format!("{f}->{t}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl Tool for UnitConverterTool {
    fn name(&self) -> &str {
        "unit_converter"
    }

    fn description(&self) -> &str {
        "Converts a value between units of temperature (celsius, fahrenheit, kelvin), length (km, miles, meters, feet, cm, inches) and weight (kg, lbs)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "value": {
                    "type": "number",
                    "description": "The numeric value to convert"
                },
                "from_unit": {
                    "type": "string",
                    "description": "The source unit, e.g. 'celsius', 'km', 'kg'"
                },
                "to_unit": {
                    "type": "string",
                    "description": "The target unit"
                }
            },
            "required": ["value", "from_unit", "to_unit"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let value = number_arg(&arguments["value"])
            .ok_or_else(|| ToolError::InvalidArguments("'value' must be a number".into()))?;
        let from_unit = arguments["from_unit"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'from_unit' argument".into()))?;
        let to_unit = arguments["to_unit"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'to_unit' argument".into()))?;

        match convert(value, from_unit, to_unit) {
            Some(result) => Ok(format!("✓ {value} {from_unit} = {result:.2} {to_unit}")),
            None => Err(ToolError::Failed(format!(
                "Conversion not supported. Available: {}",
                available()
            ))),
        }
    }
}

/// Models sometimes quote numbers; accept `"1.5"` as well as `1.5`.
fn number_arg(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
