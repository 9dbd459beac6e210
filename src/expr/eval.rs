//! Tree-walking interpreter.
//!
//! Only the names in the allow-list below can be called. Namespaces
//! (`Math`, `JSON`, `pug`) resolve to built-ins only while the scope does
//! not shadow them. Unknown plain identifiers read as `undefined`.

use indexmap::IndexMap;

use super::ast::{BinaryOp, Expr, LogicalOp, TemplatePart, UnaryOp};
use super::value::{format_number, parse_float, parse_int, Value};
use super::{EvalError, ExprError, Scope};

/// Evaluate `expr` against `scope`.
pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<Value, ExprError> {
    Ok(Evaluator { scope }.eval(expr)?)
}

struct Evaluator<'a> {
    scope: &'a Scope,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        Ok(self.eval_chain(expr)?.unwrap_or_default())
    }

    /// Evaluate, returning `None` when an optional chain short-circuited.
    fn eval_chain(&self, expr: &Expr) -> Result<Option<Value>, EvalError> {
        let value = match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Null => Value::Null,
            Expr::Undefined => Value::Undefined,
            Expr::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Expr(e) => out.push_str(&self.eval(e)?.to_js_string()),
                    }
                }
                Value::Str(out)
            }
            Expr::Regex(source) => {
                return Err(EvalError::Unsupported(format!(
                    "regular expression literal {source}"
                )))
            }
            Expr::Ident(name) => self.lookup(name),
            Expr::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Object(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Value::Object(map)
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                if let Some(value) = self.namespace_constant(object, property) {
                    return Ok(Some(value));
                }
                let Some(target) = self.receiver(object, property, *optional)? else {
                    return Ok(None);
                };
                get_property(&target, property)
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let key = self.eval(index)?;
                let Some(target) = self.receiver(object, &key.to_js_string(), *optional)? else {
                    return Ok(None);
                };
                get_index(&target, &key)
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => return self.call(callee, args, *optional),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::TypeOf => Value::str(value.type_of()),
                }
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, &left, &right)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short = match op {
                    LogicalOp::And => !left.truthy(),
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if short {
                    left
                } else {
                    self.eval(right)?
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.truthy() {
                    self.eval(consequent)?
                } else {
                    self.eval(alternate)?
                }
            }
        };
        Ok(Some(value))
    }

    fn lookup(&self, name: &str) -> Value {
        match self.scope.get(name) {
            Some(value) => value.clone(),
            None => match name {
                "NaN" => Value::Number(f64::NAN),
                "Infinity" => Value::Number(f64::INFINITY),
                _ => Value::Undefined,
            },
        }
    }

    /// Whether `name` refers to a built-in namespace here.
    fn is_namespace(&self, expr: &Expr, name: &str) -> bool {
        matches!(expr, Expr::Ident(n) if n == name) && !self.scope.contains_key(name)
    }

    fn namespace_constant(&self, object: &Expr, property: &str) -> Option<Value> {
        if !self.is_namespace(object, "Math") {
            return None;
        }
        match property {
            "PI" => Some(Value::Number(std::f64::consts::PI)),
            "E" => Some(Value::Number(std::f64::consts::E)),
            _ => None,
        }
    }

    /// Evaluate the object of a member access, applying optional-chain and
    /// null-access rules.
    fn receiver(
        &self,
        object: &Expr,
        property: &str,
        optional: bool,
    ) -> Result<Option<Value>, EvalError> {
        let Some(target) = self.eval_chain(object)? else {
            return Ok(None);
        };
        if target.is_nullish() {
            if optional {
                return Ok(None);
            }
            return Err(EvalError::NullAccess {
                property: property.to_owned(),
                target: target.to_js_string(),
            });
        }
        Ok(Some(target))
    }

    fn call(&self, callee: &Expr, args: &[Expr], optional: bool) -> Result<Option<Value>, EvalError> {
        match callee {
            Expr::Ident(name) if !self.scope.contains_key(name) => {
                let args = self.eval_args(args)?;
                match call_global(name, &args)? {
                    Some(value) => Ok(Some(value)),
                    None if optional => Ok(None),
                    None => Err(EvalError::UnknownFunction(name.clone())),
                }
            }
            Expr::Member { object, .. }
                if ["Math", "JSON", "pug"]
                .iter()
                .any(|ns| self.is_namespace(object, ns)) =>
            {
                let args = self.eval_args(args)?;
                let name = callee.dotted_name().unwrap_or_default();
                match call_namespaced(&name, &args)? {
                    Some(value) => Ok(Some(value)),
                    None if optional => Ok(None),
                    None => Err(EvalError::UnknownFunction(name)),
                }
            }
            Expr::Member {
                object,
                property,
                optional: member_optional,
            } => {
                let Some(receiver) = self.receiver(object, property, *member_optional)? else {
                    return Ok(None);
                };
                let args = self.eval_args(args)?;
                match call_method(&receiver, property, &args)? {
                    Some(value) => Ok(Some(value)),
                    None if optional => Ok(None),
                    None => Err(EvalError::UnknownFunction(format!(
                        "{}.{property}",
                        receiver.type_of()
                    ))),
                }
            }
            other => {
                if optional && self.eval(other)?.is_nullish() {
                    return Ok(None);
                }
                Err(EvalError::UnknownFunction(
                    other.dotted_name().unwrap_or_else(|| "expression".into()),
                ))
            }
        }
    }

    fn eval_args(&self, args: &[Expr]) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    use std::cmp::Ordering::{Equal, Greater, Less};

    let numeric = |f: fn(f64, f64) -> f64| Value::Number(f(left.to_number(), right.to_number()));
    let order = || left.compare(right);
    match op {
        BinaryOp::Add => left.add(right),
        BinaryOp::Sub => numeric(|a, b| a - b),
        BinaryOp::Mul => numeric(|a, b| a * b),
        BinaryOp::Div => numeric(|a, b| a / b),
        BinaryOp::Rem => numeric(|a, b| a % b),
        BinaryOp::Lt => Value::Bool(order() == Some(Less)),
        BinaryOp::LtEq => Value::Bool(matches!(order(), Some(Less | Equal))),
        BinaryOp::Gt => Value::Bool(order() == Some(Greater)),
        BinaryOp::GtEq => Value::Bool(matches!(order(), Some(Greater | Equal))),
        BinaryOp::Eq => Value::Bool(left.loose_eq(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_eq(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_eq(right)),
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn get_property(target: &Value, property: &str) -> Value {
    match target {
        Value::Str(s) if property == "length" => Value::Number(s.chars().count() as f64),
        Value::Array(items) if property == "length" => Value::Number(items.len() as f64),
        Value::Str(_) | Value::Array(_) => match property.parse::<usize>() {
            Ok(index) => get_index(target, &Value::Number(index as f64)),
            Err(_) => Value::Undefined,
        },
        Value::Object(map) => map.get(property).cloned().unwrap_or_default(),
        _ => Value::Undefined,
    }
}

fn get_index(target: &Value, key: &Value) -> Value {
    let index = match key {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => Some(*n as usize),
        _ => None,
    };
    match (target, index) {
        (Value::Array(items), Some(i)) => items.get(i).cloned().unwrap_or_default(),
        (Value::Str(s), Some(i)) => s
            .chars()
            .nth(i)
            .map(|c| Value::Str(c.to_string()))
            .unwrap_or_default(),
        _ => get_property(target, &key.to_js_string()),
    }
}

// ---------------------------------------------------------------------------
// Allow-listed functions
// ---------------------------------------------------------------------------

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Optional integer argument; `undefined` means absent.
fn int_arg(args: &[Value], i: usize) -> Option<i64> {
    match args.get(i) {
        None | Some(Value::Undefined) => None,
        Some(v) => {
            let n = v.to_number();
            Some(if n.is_nan() { 0 } else { n.trunc() as i64 })
        }
    }
}

fn call_global(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    let value = match name {
        "String" => Value::Str(args.first().map(Value::to_js_string).unwrap_or_default()),
        "Number" => Value::Number(args.first().map_or(0.0, Value::to_number)),
        "Boolean" => Value::Bool(arg(args, 0).truthy()),
        "parseInt" => {
            let radix = int_arg(args, 1).and_then(|r| u32::try_from(r).ok());
            Value::Number(parse_int(&arg(args, 0).to_js_string(), radix))
        }
        "parseFloat" => Value::Number(parse_float(&arg(args, 0).to_js_string())),
        "isNaN" => Value::Bool(arg(args, 0).to_number().is_nan()),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn call_namespaced(name: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    let number = || arg(args, 0).to_number();
    let value = match name {
        "Math.min" => Value::Number(fold_numbers(args, f64::INFINITY, f64::min)),
        "Math.max" => Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)),
        "Math.round" => Value::Number((number() + 0.5).floor()),
        "Math.floor" => Value::Number(number().floor()),
        "Math.ceil" => Value::Number(number().ceil()),
        "Math.abs" => Value::Number(number().abs()),
        "JSON.stringify" => match arg(args, 0) {
            Value::Undefined => Value::Undefined,
            v => Value::Str(v.to_json().to_string()),
        },
        "JSON.parse" => {
            let text = arg(args, 0).to_js_string();
            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| EvalError::InvalidJson(e.to_string()))?;
            Value::from_json(&json)
        }
        "pug.style" | "pug.classes" => arg(args, 0),
        "pug.escape" => Value::Str(escape(&arg(args, 0).to_display_string())),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Option<Value>, EvalError> {
    if method == "toString" && !matches!(receiver, Value::Number(_)) {
        return Ok(Some(Value::Str(receiver.to_js_string())));
    }
    Ok(match receiver {
        Value::Str(s) => string_method(s, method, args),
        Value::Number(n) => number_method(*n, method, args),
        Value::Array(items) => array_method(items, method, args),
        _ => None,
    })
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Option<Value> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let text_arg = |i: usize| arg(args, i).to_js_string();
    let substr = |from: i64, to: i64| -> Value {
        let (from, to) = (from.clamp(0, len) as usize, to.clamp(0, len) as usize);
        if from >= to {
            Value::str("")
        } else {
            Value::Str(chars[from..to].iter().collect())
        }
    };
    let relative = |i: i64| if i < 0 { (len + i).max(0) } else { i.min(len) };

    let value = match method {
        "toUpperCase" => Value::Str(s.to_uppercase()),
        "toLowerCase" => Value::Str(s.to_lowercase()),
        "trim" => Value::str(s.trim()),
        "trimStart" => Value::str(s.trim_start()),
        "trimEnd" => Value::str(s.trim_end()),
        "includes" => Value::Bool(s.contains(text_arg(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text_arg(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text_arg(0).as_str())),
        "indexOf" => Value::Number(match s.find(text_arg(0).as_str()) {
            Some(byte) => s[..byte].chars().count() as f64,
            None => -1.0,
        }),
        "charAt" => substr(int_arg(args, 0).unwrap_or(0), int_arg(args, 0).unwrap_or(0) + 1),
        "slice" => substr(
            relative(int_arg(args, 0).unwrap_or(0)),
            relative(int_arg(args, 1).unwrap_or(len)),
        ),
        "substring" => {
            let a = int_arg(args, 0).unwrap_or(0).clamp(0, len);
            let b = int_arg(args, 1).unwrap_or(len).clamp(0, len);
            substr(a.min(b), a.max(b))
        }
        "replace" => Value::Str(s.replacen(text_arg(0).as_str(), &text_arg(1), 1)),
        "split" => match args.first() {
            None | Some(Value::Undefined) => Value::Array(vec![Value::str(s)]),
            Some(sep) => {
                let sep = sep.to_js_string();
                let parts: Vec<Value> = if sep.is_empty() {
                    chars.iter().map(|c| Value::Str(c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(Value::str).collect()
                };
                let limit = int_arg(args, 1).map_or(parts.len(), |l| l.max(0) as usize);
                Value::Array(parts.into_iter().take(limit).collect())
            }
        },
        "repeat" => Value::Str(s.repeat(int_arg(args, 0).unwrap_or(0).max(0) as usize)),
        "padStart" | "padEnd" => {
            let target = int_arg(args, 0).unwrap_or(0);
            let fill = match args.get(1) {
                None | Some(Value::Undefined) => " ".to_owned(),
                Some(v) => v.to_js_string(),
            };
            if target <= len || fill.is_empty() {
                Value::str(s)
            } else {
                let pad: String = fill.chars().cycle().take((target - len) as usize).collect();
                if method == "padStart" {
                    Value::Str(pad + s)
                } else {
                    Value::Str(s.to_owned() + &pad)
                }
            }
        }
        _ => return None,
    };
    Some(value)
}

fn number_method(n: f64, method: &str, args: &[Value]) -> Option<Value> {
    match method {
        "toFixed" => {
            let digits = int_arg(args, 0).unwrap_or(0).clamp(0, 100) as usize;
            Some(Value::Str(if n.is_finite() {
                format!("{n:.digits$}")
            } else {
                format_number(n)
            }))
        }
        "toString" => Some(Value::Str(format_number(n))),
        _ => None,
    }
}

fn array_method(items: &[Value], method: &str, args: &[Value]) -> Option<Value> {
    match method {
        "join" => {
            let sep = match args.first() {
                None | Some(Value::Undefined) => ",".to_owned(),
                Some(v) => v.to_js_string(),
            };
            let parts: Vec<String> = items.iter().map(Value::to_display_string).collect();
            Some(Value::Str(parts.join(&sep)))
        }
        "includes" => {
            let needle = arg(args, 0);
            Some(Value::Bool(items.iter().any(|item| item.strict_eq(&needle))))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let index = items.iter().position(|item| item.strict_eq(&needle));
            Some(Value::Number(index.map_or(-1.0, |i| i as f64)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::evaluate_source;

    fn eval_with(source: &str, vars: &[(&str, Value)]) -> Value {
        let scope: Scope = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        evaluate_source(source, &scope).unwrap()
    }

    fn eval(source: &str) -> Value {
        eval_with(source, &[])
    }

    // ── Operators ───────────────────────────────────────────────────

    #[test]
    fn arithmetic_and_concatenation() {
        assert_eq!(eval("2 + 2"), Value::Number(4.0));
        assert_eq!(eval("'0' + '1'"), Value::str("01"));
        assert_eq!(eval("7 % 4 * 2"), Value::Number(6.0));
        assert_eq!(eval("1 / 0"), Value::Number(f64::INFINITY));
        assert_eq!(eval("-'3'"), Value::Number(-3.0));
    }

    #[test]
    fn string_scope_values_act_like_strings() {
        let vars = [("a", Value::str("2")), ("b", Value::str("3"))];
        assert_eq!(eval_with("a + b", &vars), Value::str("23"));
        assert_eq!(eval_with("a * b", &vars), Value::Number(6.0));
        assert_eq!(eval_with("+a + +b", &vars), Value::Number(5.0));
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(eval("'' || 'x'"), Value::str("x"));
        assert_eq!(eval("'a' && 'b'"), Value::str("b"));
        assert_eq!(eval("null ?? 'd'"), Value::str("d"));
        assert_eq!(eval("'' ?? 'd'"), Value::str(""));
        assert_eq!(eval("!!'true'"), Value::Bool(true));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("'b' > 'a'"), Value::Bool(true));
        assert_eq!(eval("'10' < 9"), Value::Bool(false));
        assert_eq!(eval("1 == '1'"), Value::Bool(true));
        assert_eq!(eval("1 === '1'"), Value::Bool(false));
        assert_eq!(eval("NaN <= NaN"), Value::Bool(false));
    }

    #[test]
    fn conditional_and_typeof() {
        assert_eq!(eval("1 ? 'yes' : 'no'"), Value::str("yes"));
        assert_eq!(eval("typeof missing"), Value::str("undefined"));
        assert_eq!(eval("typeof {}"), Value::str("object"));
    }

    // ── Access ──────────────────────────────────────────────────────

    #[test]
    fn unknown_identifiers_are_undefined() {
        assert_eq!(eval("missing"), Value::Undefined);
        assert_eq!(eval("missing?.deep"), Value::Undefined);
        assert_eq!(eval("missing?.deep.deeper"), Value::Undefined);
    }

    #[test]
    fn member_access_on_undefined_fails() {
        let err = evaluate_source("missing.deep", &Scope::new()).unwrap_err();
        assert_eq!(
            err,
            ExprError::Eval(EvalError::NullAccess {
                property: "deep".into(),
                target: "undefined".into(),
            })
        );
    }

    #[test]
    fn object_array_and_string_access() {
        assert_eq!(eval("{a: {b: 'c'}}.a.b"), Value::str("c"));
        assert_eq!(eval("[1, 2, 3][1]"), Value::Number(2.0));
        assert_eq!(eval("[1, 2, 3].length"), Value::Number(3.0));
        assert_eq!(eval("'abc'[2]"), Value::str("c"));
        assert_eq!(eval("'héllo'.length"), Value::Number(5.0));
        assert_eq!(eval("{'0': 'x'}[0]"), Value::str("x"));
    }

    #[test]
    fn template_literals() {
        let vars = [("n", Value::str("3"))];
        assert_eq!(eval_with("`${n} items`", &vars), Value::str("3 items"));
        assert_eq!(eval_with("`${n * 2}`", &vars), Value::str("6"));
        assert_eq!(eval("`a${undefined}b`"), Value::str("aundefinedb"));
    }

    // ── Allow-list ──────────────────────────────────────────────────

    #[test]
    fn global_functions() {
        assert_eq!(eval("String(4)"), Value::str("4"));
        assert_eq!(eval("Number('4.5')"), Value::Number(4.5));
        assert_eq!(eval("Boolean('')"), Value::Bool(false));
        assert_eq!(eval("parseInt('12px')"), Value::Number(12.0));
        assert_eq!(eval("parseFloat('1.5em')"), Value::Number(1.5));
        assert_eq!(eval("isNaN('x')"), Value::Bool(true));
    }

    #[test]
    fn math_and_json() {
        assert_eq!(eval("Math.max(1, '5', 3)"), Value::Number(5.0));
        assert_eq!(eval("Math.min()"), Value::Number(f64::INFINITY));
        assert_eq!(eval("Math.round(-2.5)"), Value::Number(-2.0));
        assert_eq!(eval("Math.floor(2.7) + Math.ceil(0.1)"), Value::Number(3.0));
        assert_eq!(eval("JSON.stringify({a: 1, b: [true]})"), Value::str(r#"{"a":1,"b":[true]}"#));
        assert_eq!(eval(r#"JSON.parse('{"x":"y"}').x"#), Value::str("y"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = evaluate_source("JSON.parse('{')", &Scope::new()).unwrap_err();
        assert!(matches!(err, ExprError::Eval(EvalError::InvalidJson(_))));
    }

    #[test]
    fn marker_functions_are_identity() {
        assert_eq!(
            eval("pug.style({color: 'red'})"),
            Value::Object(IndexMap::from([("color".to_string(), Value::str("red"))]))
        );
        assert_eq!(eval("pug.classes('a b')"), Value::str("a b"));
        assert_eq!(eval("pug.escape('<b>&')"), Value::str("&lt;b&gt;&amp;"));
    }

    #[test]
    fn scope_shadows_namespaces() {
        let obj = Value::Object(IndexMap::from([("max".to_string(), Value::str("m"))]));
        assert_eq!(eval_with("Math.max", &[("Math", obj)]), Value::str("m"));
    }

    #[test]
    fn string_methods() {
        assert_eq!(eval("'Hi'.toUpperCase()"), Value::str("HI"));
        assert_eq!(eval("'  x '.trim()"), Value::str("x"));
        assert_eq!(eval("'abcdef'.slice(-3, -1)"), Value::str("de"));
        assert_eq!(eval("'abcdef'.substring(4, 1)"), Value::str("bcd"));
        assert_eq!(eval("'a-b-c'.split('-')"), Value::Array(vec![
            Value::str("a"),
            Value::str("b"),
            Value::str("c"),
        ]));
        assert_eq!(eval("'aXbX'.replace('X', '_')"), Value::str("a_bX"));
        assert_eq!(eval("'5'.padStart(3, '0')"), Value::str("005"));
        assert_eq!(eval("'ab'.repeat(2)"), Value::str("abab"));
        assert_eq!(eval("'hello'.indexOf('l')"), Value::Number(2.0));
        assert_eq!(eval("'hello'.charAt(1)"), Value::str("e"));
        assert_eq!(eval("'hello'.includes('ell')"), Value::Bool(true));
    }

    #[test]
    fn number_and_array_methods() {
        assert_eq!(eval("(1.005).toFixed(1)"), Value::str("1.0"));
        assert_eq!(eval("(3).toString()"), Value::str("3"));
        assert_eq!(eval("[1, 'a', null].join('|')"), Value::str("1|a|"));
        assert_eq!(eval("['a', 'b'].indexOf('b')"), Value::Number(1.0));
        assert_eq!(eval("['a'].includes('z')"), Value::Bool(false));
    }

    #[test]
    fn unknown_functions_are_rejected() {
        let err = evaluate_source("alert('x')", &Scope::new()).unwrap_err();
        assert_eq!(err, ExprError::Eval(EvalError::UnknownFunction("alert".into())));
        let err = evaluate_source("'x'.big()", &Scope::new()).unwrap_err();
        assert_eq!(err, ExprError::Eval(EvalError::UnknownFunction("string.big".into())));
        assert_eq!(eval("'x'.big?.()"), Value::Undefined);
    }

    #[test]
    fn regex_literals_are_unsupported() {
        let err = evaluate_source("'a'.replace(/a/g, 'b')", &Scope::new()).unwrap_err();
        assert!(matches!(err, ExprError::Eval(EvalError::Unsupported(_))));
    }
}
