//! Runtime values and their JavaScript-compatible coercions.

use std::cmp::Ordering;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Strings `ToNumber` accepts (after trimming), besides `Infinity` and hex.
static DECIMAL_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$").unwrap()
});

/// Longest numeric prefix `parseFloat` reads.
static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(Infinity|[0-9]+\.?[0-9]*([eE][+-]?[0-9]+)?|\.[0-9]+([eE][+-]?[0-9]+)?)")
        .unwrap()
});

/// A value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// JavaScript truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    /// `typeof` result.
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null | Self::Array(_) | Self::Object(_) => "object",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
        }
    }

    /// `ToNumber`.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::Str(s) => string_to_number(s),
            Self::Array(_) | Self::Object(_) => string_to_number(&self.to_js_string()),
        }
    }

    /// `ToString`. Arrays and objects serialize as JSON.
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".into(),
            Self::Null => "null".into(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::Str(s) => s.clone(),
            Self::Array(_) | Self::Object(_) => self.to_json().to_string(),
        }
    }

    /// What a binding writes into the document: like `ToString`, except
    /// that `null` and `undefined` render as nothing.
    pub fn to_display_string(&self) -> String {
        if self.is_nullish() {
            String::new()
        } else {
            self.to_js_string()
        }
    }

    /// Strict equality (`===`). Aggregates compare structurally.
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            _ => self == other,
        }
    }

    /// Loose equality (`==`).
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Self::Bool(_), _) => Self::Number(self.to_number()).loose_eq(other),
            (_, Self::Bool(_)) => self.loose_eq(&Self::Number(other.to_number())),
            (Self::Number(a), Self::Str(_)) => *a == other.to_number(),
            (Self::Str(_), Self::Number(b)) => self.to_number() == *b,
            (Self::Array(_) | Self::Object(_), Self::Str(_) | Self::Number(_)) => {
                Self::Str(self.to_js_string()).loose_eq(other)
            }
            (Self::Str(_) | Self::Number(_), Self::Array(_) | Self::Object(_)) => {
                self.loose_eq(&Self::Str(other.to_js_string()))
            }
            _ => self.strict_eq(other),
        }
    }

    /// Relational comparison: strings lexicographically, everything else
    /// numerically. `None` when either side is `NaN`.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        let left = self.to_primitive();
        let right = other.to_primitive();
        match (&left, &right) {
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            _ => left.to_number().partial_cmp(&right.to_number()),
        }
    }

    /// The `+` operator.
    pub fn add(&self, other: &Self) -> Self {
        let left = self.to_primitive();
        let right = other.to_primitive();
        if matches!(left, Self::Str(_)) || matches!(right, Self::Str(_)) {
            Self::Str(left.to_js_string() + &right.to_js_string())
        } else {
            Self::Number(left.to_number() + right.to_number())
        }
    }

    fn to_primitive(&self) -> Self {
        match self {
            Self::Array(_) | Self::Object(_) => Self::Str(self.to_js_string()),
            other => other.clone(),
        }
    }

    /// Convert from JSON. Integers become numbers.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON the way `JSON.stringify` would see it.
    /// `undefined` and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(_, v)| !matches!(v, Self::Undefined))
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Format a number the way JavaScript's `Number#toString` does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if n == 0.0 {
        return "0".into();
    }
    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let formatted = format!("{n:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => formatted,
        };
    }
    if n.fract() == 0.0 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    if DECIMAL_LITERAL.is_match(trimmed) {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// `parseFloat`: the longest numeric prefix, ignoring leading whitespace.
pub fn parse_float(s: &str) -> f64 {
    let trimmed = s.trim_start();
    match FLOAT_PREFIX.find(trimmed) {
        Some(m) => match m.as_str().trim_start_matches('+') {
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            prefix => prefix.parse().unwrap_or(f64::NAN),
        },
        None => f64::NAN,
    }
}

/// `parseInt` with an optional radix (2..=36; `0x` implies 16).
pub fn parse_int(s: &str, radix: Option<u32>) -> f64 {
    let trimmed = s.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (radix, digits) = match radix {
        Some(16) | None
            if digits.starts_with("0x") || digits.starts_with("0X") =>
        {
            (16, &digits[2..])
        }
        Some(r) if (2..=36).contains(&r) => (r, digits),
        Some(0) | None => (10, digits),
        Some(_) => return f64::NAN,
    };
    let valid: String = digits.chars().take_while(|c| c.is_digit(radix)).collect();
    if valid.is_empty() {
        return f64::NAN;
    }
    let magnitude = valid
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(123456789.0), "123456789");
    }

    #[test]
    fn to_number_coercion() {
        assert_eq!(Value::str("  42 ").to_number(), 42.0);
        assert_eq!(Value::str("").to_number(), 0.0);
        assert_eq!(Value::str("0x10").to_number(), 16.0);
        assert_eq!(Value::str("1e3").to_number(), 1000.0);
        assert!(Value::str("inf").to_number().is_nan());
        assert!(Value::str("12px").to_number().is_nan());
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Null.to_number(), 0.0);
        assert!(Value::Undefined.to_number().is_nan());
    }

    #[test]
    fn truthiness() {
        assert!(!Value::str("").truthy());
        assert!(Value::str("0").truthy());
        assert!(!Value::Number(f64::NAN).truthy());
        assert!(Value::Array(vec![]).truthy());
        assert!(!Value::Null.truthy());
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::Undefined.to_display_string(), "");
        assert_eq!(Value::Undefined.to_js_string(), "undefined");
        let obj = Value::Object(IndexMap::from([
            ("0".to_string(), Value::str("1")),
            ("1".to_string(), Value::str("2")),
        ]));
        assert_eq!(obj.to_display_string(), r#"{"0":"1","1":"2"}"#);
        assert_eq!(Value::Array(vec![Value::Number(1.0)]).to_js_string(), "[1]");
    }

    #[test]
    fn addition_concatenates_strings() {
        assert_eq!(Value::str("0").add(&Value::str("1")), Value::str("01"));
        assert_eq!(Value::Number(2.0).add(&Value::Number(2.0)), Value::Number(4.0));
        assert_eq!(Value::str("a").add(&Value::Undefined), Value::str("aundefined"));
        assert_eq!(Value::Number(1.0).add(&Value::Bool(true)), Value::Number(2.0));
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
        assert!(Value::str("1").loose_eq(&Value::Number(1.0)));
        assert!(Value::Bool(true).loose_eq(&Value::str("1")));
        assert!(!Value::Number(f64::NAN).loose_eq(&Value::Number(f64::NAN)));
        assert!(!Value::str("1").strict_eq(&Value::Number(1.0)));
    }

    #[test]
    fn comparison() {
        assert_eq!(Value::str("b").compare(&Value::str("a")), Some(Ordering::Greater));
        assert_eq!(Value::str("10").compare(&Value::Number(9.0)), Some(Ordering::Greater));
        assert_eq!(Value::str("x").compare(&Value::Number(1.0)), None);
    }

    #[test]
    fn json_roundtrip_keeps_order() {
        let json: serde_json::Value = serde_json::from_str(r#"{"b":1,"a":[true,null]}"#).unwrap();
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);
        assert_eq!(value.to_js_string(), r#"{"b":1,"a":[true,null]}"#);
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_float("  3.5px"), 3.5);
        assert!(parse_float("px").is_nan());
        assert_eq!(parse_float("-Infinity and beyond"), f64::NEG_INFINITY);
        assert_eq!(parse_int("42.9", None), 42.0);
        assert_eq!(parse_int("-0x1f", None), -31.0);
        assert_eq!(parse_int("101", Some(2)), 5.0);
        assert!(parse_int("z", None).is_nan());
    }
}
