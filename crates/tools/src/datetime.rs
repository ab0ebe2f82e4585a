//! Date and time tools: local clock, clock in an IANA zone, and day counts.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use ollabot_core::error::ToolError;
use ollabot_core::tool::Tool;

const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S %A";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Gets the current local date, time and day of the week."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<String, ToolError> {
        let now = Local::now();
        Ok(format!(
            "📅 Current date and time: {}",
            now.format(CLOCK_FORMAT)
        ))
    }
}

pub struct TimezoneTimeTool;

#[async_trait]
impl Tool for TimezoneTimeTool {
    fn name(&self) -> &str {
        "get_timezone_time"
    }

    fn description(&self) -> &str {
        "Gets the current time in an IANA timezone such as 'America/New_York' or 'Europe/London'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name, e.g. 'Asia/Tokyo'"
                }
            },
            "required": ["timezone"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let name = arguments["timezone"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'timezone' argument".into()))?;

        let tz: Tz = name.trim().parse().map_err(|_| {
            ToolError::Failed(format!(
                "Unknown timezone '{name}'. Try timezones like 'America/New_York', 'Europe/London', 'Asia/Tokyo'"
            ))
        })?;

        let now = Utc::now().with_timezone(&tz);
        Ok(format!(
            "🌍 Time in {name}: {}",
            now.format("%Y-%m-%d %H:%M:%S %A %Z")
        ))
    }
}

pub struct DaysBetweenTool;

/// Absolute number of days between two `YYYY-MM-DD` dates.
pub fn days_between(date1: &str, date2: &str) -> Result<i64, ToolError> {
    let d1 = parse_date(date1)?;
    let d2 = parse_date(date2)?;
    Ok((d2 - d1).num_days().abs())
}

fn parse_date(raw: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
        ToolError::Failed(format!(
            "Invalid date '{raw}': {e}. Use format YYYY-MM-DD (e.g., 2024-12-31)"
        ))
    })
}

#[async_trait]
impl Tool for DaysBetweenTool {
    fn name(&self) -> &str {
        "days_between_dates"
    }

    fn description(&self) -> &str {
        "Calculates the absolute number of days between two dates given as YYYY-MM-DD."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "date1": { "type": "string", "description": "First date, YYYY-MM-DD" },
                "date2": { "type": "string", "description": "Second date, YYYY-MM-DD" }
            },
            "required": ["date1", "date2"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let date1 = arguments["date1"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'date1' argument".into()))?;
        let date2 = arguments["date2"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'date2' argument".into()))?;

        let days = days_between(date1, date2)?;
        Ok(format!("📆 Days between {date1} and {date2}: {days} days"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn current_time_has_expected_shape() {
        let output = CurrentTimeTool.execute(json!({})).await.unwrap();
        let stamp = output
            .strip_prefix("📅 Current date and time: ")
            .unwrap();
        // "YYYY-MM-DD HH:MM:SS Weekday"
        let parts: Vec<_> = stamp.split(' ').collect();
        assert_eq!(parts.len(), 3);
        assert!(NaiveDate::parse_from_str(parts[0], DATE_FORMAT).is_ok());
        assert_eq!(parts[1].len(), 8);
        assert!(parts[2].ends_with("day"));
    }

    #[tokio::test]
    async fn timezone_time_uses_zone_abbreviation() {
        let output = TimezoneTimeTool
            .execute(json!({"timezone": "Asia/Tokyo"}))
            .await
            .unwrap();
        assert!(output.starts_with("🌍 Time in Asia/Tokyo: "));
        assert!(output.ends_with(" JST"));
    }

    #[tokio::test]
    async fn unknown_timezone_suggests_examples() {
        let err = TimezoneTimeTool
            .execute(json!({"timezone": "Mars/Olympus_Mons"}))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Mars/Olympus_Mons"));
        assert!(message.contains("America/New_York"));
        assert!(message.contains("Asia/Tokyo"));
    }

    #[test]
    fn days_between_is_absolute() {
        assert_eq!(days_between("2024-01-01", "2024-12-31").unwrap(), 365);
        assert_eq!(days_between("2024-12-31", "2024-01-01").unwrap(), 365);
        assert_eq!(days_between("2024-02-28", "2024-03-01").unwrap(), 2);
    }

    #[tokio::test]
    async fn days_between_tool_output() {
        let output = DaysBetweenTool
            .execute(json!({"date1": "2024-01-01", "date2": "2024-01-31"}))
            .await
            .unwrap();
        assert_eq!(output, "📆 Days between 2024-01-01 and 2024-01-31: 30 days");
    }

    #[tokio::test]
    async fn bad_date_names_expected_format() {
        let err = DaysBetweenTool
            .execute(json!({"date1": "31/12/2024", "date2": "2024-01-01"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Use format YYYY-MM-DD (e.g., 2024-12-31)"));
    }
}
