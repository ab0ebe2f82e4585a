//! Calculator tool: evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, parentheses, decimals and unary negation.
//! Input is checked against a strict character allowlist before it reaches
//! the precedence-climbing evaluator; nothing is handed to an interpreter.

use std::iter::Peekable;

use async_trait::async_trait;
use ollabot_core::error::ToolError;
use ollabot_core::tool::Tool;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Performs mathematical calculations. Supports +, -, *, /, parentheses and decimal numbers, e.g. '2 + 2' or '(75-32)*5/9'."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The mathematical expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let expr = arguments["expression"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        let expr = sanitize(expr)?;
        let value = evaluate(expr).map_err(ToolError::Failed)?;
        Ok(format!("Result: {}", format_number(value)))
    }
}

/// Reject anything outside the arithmetic alphabet.
fn sanitize(expr: &str) -> Result<&str, ToolError> {
    if expr.trim().is_empty() {
        return Err(ToolError::Failed("Invalid expression".into()));
    }
    match expr.chars().find(|c| !is_allowed(*c)) {
        Some(c) => Err(ToolError::Failed(format!(
            "Invalid expression: unsupported character '{c}'"
        ))),
        None => Ok(expr),
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | '(' | ')' | '+' | '-' | '*' | '/')
}

/// Integers print without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ── Precedence-climbing evaluator ─────────────────────────────────────────

/// Evaluate an arithmetic expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let mut evaluator = Evaluator {
        tokens: lex(expr)?.into_iter().peekable(),
    };
    let value = evaluator.expression(1)?;
    if let Some(extra) = evaluator.tokens.next() {
        return Err(format!("Unexpected token after expression: {extra:?}"));
    }
    if !value.is_finite() {
        return Err("Result is not a finite number".into());
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '+' => Self::Add,
            '-' => Self::Sub,
            '*' => Self::Mul,
            '/' => Self::Div,
            _ => return None,
        })
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }

    fn apply(self, lhs: f64, rhs: f64) -> Result<f64, String> {
        match self {
            Self::Add => Ok(lhs + rhs),
            Self::Sub => Ok(lhs - rhs),
            Self::Mul => Ok(lhs * rhs),
            Self::Div if rhs == 0.0 => Err("Division by zero".into()),
            Self::Div => Ok(lhs / rhs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(BinOp),
    Open,
    Close,
}

fn lex(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        let token = match c {
            '(' => Token::Open,
            ')' => Token::Close,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + 1;
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_ascii_digit() || d == '.') {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                let literal = &input[start..end];
                Token::Num(
                    literal
                        .parse()
                        .map_err(|_| format!("Invalid number: {literal}"))?,
                )
            }
            c => match BinOp::from_char(c) {
                Some(op) => Token::Op(op),
                None => return Err(format!("Unexpected character: '{c}'")),
            },
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Evaluator<I: Iterator<Item = Token>> {
    tokens: Peekable<I>,
}

impl<I: Iterator<Item = Token>> Evaluator<I> {
    /// Fold every operator binding at least as tightly as `min_precedence`.
    /// The right operand is evaluated one level tighter, so equal
    /// precedence associates to the left.
    fn expression(&mut self, min_precedence: u8) -> Result<f64, String> {
        let mut acc = self.operand()?;
        while let Some(&Token::Op(op)) = self.tokens.peek() {
            if op.precedence() < min_precedence {
                break;
            }
            self.tokens.next();
            let rhs = self.expression(op.precedence() + 1)?;
            acc = op.apply(acc, rhs)?;
        }
        Ok(acc)
    }

    /// A number, a parenthesised expression, or a signed operand.
    fn operand(&mut self) -> Result<f64, String> {
        match self.tokens.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Op(BinOp::Sub)) => Ok(-self.operand()?),
            Some(Token::Op(BinOp::Add)) => self.operand(),
            Some(Token::Open) => {
                let inner = self.expression(1)?;
                match self.tokens.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(token) => Err(format!("Unexpected token: {token:?}")),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(expr: &str) -> Result<String, ToolError> {
        CalculatorTool.execute(json!({ "expression": expr })).await
    }

    #[test]
    fn operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn nested_parentheses_and_unary() {
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("-(2 + 3)").unwrap(), -5.0);
    }

    #[test]
    fn same_precedence_associates_left() {
        assert_eq!(evaluate("10 - 2 - 3").unwrap(), 5.0);
        assert_eq!(evaluate("24 / 4 / 2").unwrap(), 3.0);
        assert_eq!(evaluate("-2 * 3").unwrap(), -6.0);
        assert_eq!(evaluate("+4 - -1").unwrap(), 5.0);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(evaluate("2 3").is_err());
        assert!(evaluate("1)").is_err());
    }

    #[test]
    fn fahrenheit_formula() {
        let result = evaluate("(75-32)*5/9").unwrap();
        assert!((result - 23.888_888).abs() < 1e-5);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(evaluate("1 / 0").unwrap_err(), "Division by zero");
    }

    #[test]
    fn malformed_expressions() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1..2").is_err());
        assert!(evaluate("2 ** 3").is_err());
    }

    #[tokio::test]
    async fn adds_with_result_prefix() {
        assert_eq!(run("2+2").await.unwrap(), "Result: 4");
    }

    #[tokio::test]
    async fn formats_integers_and_decimals() {
        assert_eq!(run("10 / 2").await.unwrap(), "Result: 5");
        assert_eq!(run("10 / 4").await.unwrap(), "Result: 2.5");
        assert!(run("10 / 3").await.unwrap().starts_with("Result: 3.333"));
    }

    #[tokio::test]
    async fn empty_expression_is_invalid() {
        assert_eq!(
            run("").await.unwrap_err(),
            ToolError::Failed("Invalid expression".into())
        );
        assert!(run("   ").await.is_err());
    }

    #[tokio::test]
    async fn code_injection_is_rejected_before_parsing() {
        let err = run("__import__('os')").await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid expression"));

        assert!(run("2 + os.system('ls')").await.is_err());
        assert!(run("1e3").await.is_err());
    }

    #[tokio::test]
    async fn missing_expression_argument() {
        let err = CalculatorTool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn tool_definition() {
        let def = CalculatorTool.to_definition();
        assert_eq!(def.name, "calculator");
        assert_eq!(def.parameters["required"][0], "expression");
    }
}
