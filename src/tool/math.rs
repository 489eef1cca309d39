//! Deterministic arithmetic tools. Each free-text tool extracts every decimal
//! number from its input and applies one reduction; numeric failures are
//! reported as result strings, never as faults.
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use super::{Tool, ToolError, text_argument, text_parameters};

pub const NO_NUMBERS: &str = "No numbers found.";
pub const DIVISION_BY_ZERO: &str = "Error: Division by zero.";

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number pattern is valid"));

fn extract_numbers(text: &str) -> Vec<f64> {
    NUMBER_PATTERN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Format a value to 4 significant digits, `%.4g`-style: fixed notation while
/// the decimal exponent is in `[-4, 4)`, exponential otherwise, trailing zeros
/// trimmed.
pub(crate) fn format_significant(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let mut exponent = value.abs().log10().floor() as i32;
    let mut mantissa = value / 10f64.powi(exponent);
    // Rounding to 4 significant digits can carry the mantissa up to 10,
    // which shifts the exponent.
    if (mantissa * 1000.0).round().abs() >= 10000.0 {
        exponent += 1;
        mantissa /= 10.0;
    }

    if (-4..4).contains(&exponent) {
        let decimals = (3 - exponent).max(0) as usize;
        trim_zeros(format!("{value:.decimals$}"))
    } else {
        let mantissa = (mantissa * 1000.0).round() / 1000.0;
        format!("{}e{exponent:+03}", trim_zeros(format!("{mantissa:.3}")))
    }
}

fn trim_zeros(formatted: String) -> String {
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_owned()
    } else {
        formatted
    }
}

/// Sum of every number in the text.
pub fn sum_numbers(text: &str) -> String {
    let numbers = extract_numbers(text);
    if numbers.is_empty() {
        return NO_NUMBERS.to_owned();
    }
    format_significant(numbers.iter().sum())
}

/// Left-to-right subtraction of the numbers in the text.
pub fn subtract_numbers(text: &str) -> String {
    let numbers = extract_numbers(text);
    let Some((first, rest)) = numbers.split_first() else {
        return NO_NUMBERS.to_owned();
    };
    format_significant(rest.iter().fold(*first, |result, n| result - n))
}

/// Product of every number in the text.
pub fn multiply_numbers(text: &str) -> String {
    let numbers = extract_numbers(text);
    if numbers.is_empty() {
        return NO_NUMBERS.to_owned();
    }
    format_significant(numbers.iter().product())
}

/// Left-to-right division of the numbers in the text. Any zero divisor yields
/// the division-by-zero message and no partial result.
pub fn divide_numbers(text: &str) -> String {
    let numbers = extract_numbers(text);
    let Some((first, rest)) = numbers.split_first() else {
        return NO_NUMBERS.to_owned();
    };
    let mut result = *first;
    for n in rest {
        if *n == 0.0 {
            return DIVISION_BY_ZERO.to_owned();
        }
        result /= n;
    }
    format_significant(result)
}

/// Raise base to exponent. Invalid inputs yield an "Error: …" string.
pub fn power(base: f64, exponent: f64) -> String {
    if !base.is_finite() || !exponent.is_finite() {
        return "Error: base and exponent must be finite numbers.".to_owned();
    }
    let value = base.powf(exponent);
    if value.is_finite() {
        format_significant(value)
    } else {
        "Error: result is not a finite number.".to_owned()
    }
}

pub struct AddNumbers;

#[async_trait]
impl Tool for AddNumbers {
    fn name(&self) -> &str {
        "add_numbers"
    }

    fn description(&self) -> &str {
        "Extracts all numeric values from text and returns their sum. \
         Example: 'Add 12, 8 and 5' -> '25'"
    }

    fn parameters(&self) -> serde_json::Value {
        text_parameters("Free text containing the numbers to add")
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = text_argument(self.name(), arguments)?;
        Ok(sum_numbers(&text))
    }
}

pub struct SubtractNumbers;

#[async_trait]
impl Tool for SubtractNumbers {
    fn name(&self) -> &str {
        "subtract_numbers"
    }

    fn description(&self) -> &str {
        "Extracts numbers from text and subtracts them sequentially. \
         Example: 'Subtract 10, 2, and 3' -> '5'"
    }

    fn parameters(&self) -> serde_json::Value {
        text_parameters("Free text containing the numbers to subtract in order")
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = text_argument(self.name(), arguments)?;
        Ok(subtract_numbers(&text))
    }
}

pub struct MultiplyNumbers;

#[async_trait]
impl Tool for MultiplyNumbers {
    fn name(&self) -> &str {
        "multiply_numbers"
    }

    fn description(&self) -> &str {
        "Multiplies all numeric values found in the text. \
         Example: 'Multiply 2, 3 and 4' -> '24'"
    }

    fn parameters(&self) -> serde_json::Value {
        text_parameters("Free text containing the numbers to multiply")
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = text_argument(self.name(), arguments)?;
        Ok(multiply_numbers(&text))
    }
}

pub struct DivideNumbers;

#[async_trait]
impl Tool for DivideNumbers {
    fn name(&self) -> &str {
        "divide_numbers"
    }

    fn description(&self) -> &str {
        "Divides numbers sequentially in the order they appear. \
         Example: 'Divide 100 by 5 and then by 2' -> '10'"
    }

    fn parameters(&self) -> serde_json::Value {
        text_parameters("Free text containing the numbers to divide in order")
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let text = text_argument(self.name(), arguments)?;
        Ok(divide_numbers(&text))
    }
}

/// Structured tool with two validated numeric fields.
pub struct PowerNumbers;

#[derive(Deserialize)]
struct PowerArgs {
    base: f64,
    exponent: f64,
}

#[async_trait]
impl Tool for PowerNumbers {
    fn name(&self) -> &str {
        "power_numbers"
    }

    fn description(&self) -> &str {
        "Calculates the power of a base number raised to an exponent."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "base": { "type": "number", "description": "Base number" },
                "exponent": { "type": "number", "description": "Exponent value" }
            },
            "required": ["base", "exponent"]
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        match serde_json::from_value::<PowerArgs>(arguments) {
            Ok(args) => Ok(power(args.base, args.exponent)),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}
