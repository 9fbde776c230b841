//! JSON-logic expression evaluation.
//!
//! A rule is a JSON document. Objects with exactly one key are operator
//! applications (`{"<": [{"var": "age"}, 18]}`), arrays evaluate element-wise,
//! and everything else is a literal. Short-circuiting operators (`if`, `and`,
//! `or`, the array iterators) evaluate their arguments lazily; every other
//! operator, including custom ones, receives evaluated arguments.

use indexmap::IndexMap;
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use crate::logic::value::LogicValue;
use crate::logic::{OperatorRegistry, RuleError};

const BUILTINS: &[&str] = &[
    "var",
    "missing",
    "missing_some",
    "if",
    "?:",
    "==",
    "===",
    "!=",
    "!==",
    "!",
    "!!",
    "and",
    "or",
    "<",
    "<=",
    ">",
    ">=",
    "max",
    "min",
    "+",
    "-",
    "*",
    "/",
    "%",
    "map",
    "filter",
    "reduce",
    "all",
    "none",
    "some",
    "merge",
    "in",
    "cat",
    "substr",
    "log",
];

/// Returns true if `name` is a built-in operator.
pub(crate) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Evaluates rule expressions against a data value.
pub(crate) struct Evaluator<'a> {
    operators: &'a OperatorRegistry,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(operators: &'a OperatorRegistry) -> Self {
        Self { operators }
    }

    /// Evaluates `rule` with `data` as the variable scope.
    pub(crate) fn evaluate(&self, rule: &Value, data: &LogicValue) -> Result<LogicValue, RuleError> {
        match rule {
            Value::Array(items) => items
                .iter()
                .map(|item| self.evaluate(item, data))
                .collect::<Result<Vec<_>, _>>()
                .map(LogicValue::Array),
            Value::Object(map) if map.len() == 1 => {
                let Some((op, args)) = map.iter().next() else {
                    return Ok(LogicValue::Null);
                };
                let args: Vec<&Value> = match args {
                    Value::Array(items) => items.iter().collect(),
                    single => vec![single],
                };
                self.apply(op, &args, data)
            }
            literal => Ok(LogicValue::from_json(literal)),
        }
    }

    fn eval_all(&self, args: &[&Value], data: &LogicValue) -> Result<Vec<LogicValue>, RuleError> {
        args.iter().map(|arg| self.evaluate(arg, data)).collect()
    }

    fn eval_arg(&self, args: &[&Value], index: usize, data: &LogicValue) -> Result<LogicValue, RuleError> {
        match args.get(index) {
            Some(arg) => self.evaluate(arg, data),
            None => Ok(LogicValue::Null),
        }
    }

    fn apply(&self, op: &str, args: &[&Value], data: &LogicValue) -> Result<LogicValue, RuleError> {
        match op {
            "var" => self.var(args, data),
            "missing" => {
                let keys = flatten_keys(self.eval_all(args, data)?);
                Ok(LogicValue::Array(missing_keys(&keys, data)))
            }
            "missing_some" => {
                let need = self.eval_arg(args, 0, data)?.to_number();
                let keys = match self.eval_arg(args, 1, data)? {
                    LogicValue::Array(keys) => keys,
                    other => vec![other],
                };
                let missing = missing_keys(&keys, data);
                let found = (keys.len() - missing.len()) as f64;
                Ok(LogicValue::Array(if found >= need { Vec::new() } else { missing }))
            }
            "if" | "?:" => self.if_chain(args, data),
            "and" => {
                let mut last = LogicValue::Null;
                for arg in args {
                    last = self.evaluate(arg, data)?;
                    if !last.truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            "or" => {
                let mut last = LogicValue::Null;
                for arg in args {
                    last = self.evaluate(arg, data)?;
                    if last.truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            "map" | "filter" | "all" | "none" | "some" => self.iterate(op, args, data),
            "reduce" => self.reduce(args, data),
            _ => {
                let values = self.eval_all(args, data)?;
                self.apply_strict(op, values)
            }
        }
    }

    fn apply_strict(&self, op: &str, args: Vec<LogicValue>) -> Result<LogicValue, RuleError> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(LogicValue::Null);
        let result = match op {
            "==" => LogicValue::Bool(loose_equal(&arg(0), &arg(1))),
            "!=" => LogicValue::Bool(!loose_equal(&arg(0), &arg(1))),
            "===" => LogicValue::Bool(strict_equal(&arg(0), &arg(1))),
            "!==" => LogicValue::Bool(!strict_equal(&arg(0), &arg(1))),
            "!" => LogicValue::Bool(!arg(0).truthy()),
            "!!" => LogicValue::Bool(arg(0).truthy()),
            "<" | "<=" | ">" | ">=" => LogicValue::Bool(compare_chain(op, &args)),
            "max" | "min" => extremum(op, &args),
            "+" => LogicValue::Number(args.iter().map(LogicValue::to_number).sum()),
            "*" => LogicValue::Number(args.iter().map(LogicValue::to_number).product()),
            "-" => match args.len() {
                1 => LogicValue::Number(-arg(0).to_number()),
                _ => LogicValue::Number(arg(0).to_number() - arg(1).to_number()),
            },
            "/" => LogicValue::Number(arg(0).to_number() / arg(1).to_number()),
            "%" => LogicValue::Number(arg(0).to_number() % arg(1).to_number()),
            "merge" => LogicValue::Array(
                args.iter()
                    .flat_map(|a| match a {
                        LogicValue::Array(items) => items.clone(),
                        other => vec![other.clone()],
                    })
                    .collect(),
            ),
            "in" => LogicValue::Bool(match arg(1) {
                LogicValue::String(haystack) => haystack.contains(&arg(0).to_js_string()),
                LogicValue::Array(items) => items.iter().any(|item| strict_equal(item, &arg(0))),
                _ => false,
            }),
            "cat" => LogicValue::String(args.iter().map(LogicValue::to_js_string).collect()),
            "substr" => substr(&arg(0), &args[1.min(args.len())..]),
            "log" => {
                tracing::debug!(value = ?arg(0), "rule log");
                arg(0)
            }
            custom => {
                let operator = self
                    .operators
                    .get(custom)
                    .ok_or_else(|| RuleError::UnknownOperator(custom.to_string()))?;
                let json_args: Vec<Value> = args.iter().map(LogicValue::to_json).collect();
                LogicValue::from_json(&operator(&json_args))
            }
        };
        Ok(result)
    }

    fn var(&self, args: &[&Value], data: &LogicValue) -> Result<LogicValue, RuleError> {
        let path = match self.eval_arg(args, 0, data)? {
            LogicValue::Null => String::new(),
            LogicValue::String(s) => s,
            LogicValue::Number(n) => LogicValue::Number(n).to_js_string(),
            other => {
                return Err(RuleError::InvalidRule(format!(
                    "var expects a string path, got {}",
                    other.to_js_string()
                )))
            }
        };

        match data.lookup(&path) {
            Some(found) => Ok(found.clone()),
            None if args.len() > 1 => self.evaluate(args[1], data),
            None => Ok(LogicValue::NAN),
        }
    }

    fn if_chain(&self, args: &[&Value], data: &LogicValue) -> Result<LogicValue, RuleError> {
        for pair in args.chunks(2) {
            match pair {
                [condition, then] => {
                    if self.evaluate(condition, data)?.truthy() {
                        return self.evaluate(then, data);
                    }
                }
                [otherwise] => return self.evaluate(otherwise, data),
                _ => {}
            }
        }
        Ok(LogicValue::Null)
    }

    fn iterate(&self, op: &str, args: &[&Value], data: &LogicValue) -> Result<LogicValue, RuleError> {
        let items = match self.eval_arg(args, 0, data)? {
            LogicValue::Array(items) => items,
            _ => Vec::new(),
        };
        let body = args.get(1).copied().unwrap_or(&Value::Null);

        match op {
            "map" => items
                .iter()
                .map(|item| self.evaluate(body, item))
                .collect::<Result<Vec<_>, _>>()
                .map(LogicValue::Array),
            "filter" => {
                let mut kept = Vec::new();
                for item in items {
                    if self.evaluate(body, &item)?.truthy() {
                        kept.push(item);
                    }
                }
                Ok(LogicValue::Array(kept))
            }
            "all" => {
                if items.is_empty() {
                    return Ok(LogicValue::Bool(false));
                }
                for item in &items {
                    if !self.evaluate(body, item)?.truthy() {
                        return Ok(LogicValue::Bool(false));
                    }
                }
                Ok(LogicValue::Bool(true))
            }
            "some" | "none" => {
                let mut any = false;
                for item in &items {
                    if self.evaluate(body, item)?.truthy() {
                        any = true;
                        break;
                    }
                }
                Ok(LogicValue::Bool(if op == "some" { any } else { !any }))
            }
            _ => Err(RuleError::UnknownOperator(op.to_string())),
        }
    }

    fn reduce(&self, args: &[&Value], data: &LogicValue) -> Result<LogicValue, RuleError> {
        let items = match self.eval_arg(args, 0, data)? {
            LogicValue::Array(items) => items,
            _ => Vec::new(),
        };
        let body = args.get(1).copied().unwrap_or(&Value::Null);
        let mut accumulator = self.eval_arg(args, 2, data)?;

        for current in items {
            let mut scope = IndexMap::new();
            scope.insert("current".to_string(), current);
            scope.insert("accumulator".to_string(), accumulator);
            accumulator = self.evaluate(body, &LogicValue::Object(scope))?;
        }
        Ok(accumulator)
    }
}

fn flatten_keys(values: Vec<LogicValue>) -> Vec<LogicValue> {
    match values.as_slice() {
        [LogicValue::Array(keys)] => keys.clone(),
        _ => values,
    }
}

fn missing_keys(keys: &[LogicValue], data: &LogicValue) -> Vec<LogicValue> {
    keys.iter()
        .filter(|key| {
            match data.lookup(&key.to_js_string()) {
                None | Some(LogicValue::Null) => true,
                Some(LogicValue::String(s)) => s.is_empty(),
                Some(found) => found.is_nan(),
            }
        })
        .cloned()
        .collect()
}

/// JavaScript `==`.
pub(crate) fn loose_equal(a: &LogicValue, b: &LogicValue) -> bool {
    use LogicValue::*;
    match (a, b) {
        (Null, Null) => true,
        (Null, _) | (_, Null) => false,
        (Number(x), Number(y)) => x == y,
        (String(x), String(y)) => x == y,
        (Bool(x), Bool(y)) => x == y,
        (Array(_) | Object(_), Array(_) | Object(_)) => a == b,
        (Bool(_), _) | (_, Bool(_)) => {
            let (bool_side, other) = if matches!(a, Bool(_)) { (a, b) } else { (b, a) };
            loose_equal(&Number(bool_side.to_number()), other)
        }
        (Array(_) | Object(_), _) => loose_equal(&String(a.to_js_string()), b),
        (_, Array(_) | Object(_)) => loose_equal(a, &String(b.to_js_string())),
        _ => a.to_number() == b.to_number(),
    }
}

/// JavaScript `===`.
pub(crate) fn strict_equal(a: &LogicValue, b: &LogicValue) -> bool {
    match (a, b) {
        (LogicValue::Number(x), LogicValue::Number(y)) => x == y,
        _ => std::mem::discriminant(a) == std::mem::discriminant(b) && a == b,
    }
}

fn less_than(a: &LogicValue, b: &LogicValue, or_equal: bool) -> bool {
    if let (LogicValue::String(x), LogicValue::String(y)) = (a, b) {
        return if or_equal { x <= y } else { x < y };
    }
    let (x, y) = (a.to_number(), b.to_number());
    if or_equal {
        x <= y
    } else {
        x < y
    }
}

fn compare_chain(op: &str, args: &[LogicValue]) -> bool {
    let null = LogicValue::Null;
    let a = args.first().unwrap_or(&null);
    let b = args.get(1).unwrap_or(&null);
    match op {
        "<" | "<=" => {
            let or_equal = op == "<=";
            match args.get(2) {
                Some(c) => less_than(a, b, or_equal) && less_than(b, c, or_equal),
                None => less_than(a, b, or_equal),
            }
        }
        ">" => less_than(b, a, false),
        _ => less_than(b, a, true),
    }
}

fn extremum(op: &str, args: &[LogicValue]) -> LogicValue {
    if args.is_empty() {
        return LogicValue::Null;
    }
    let numbers: Vec<f64> = args.iter().map(LogicValue::to_number).collect();
    if numbers.iter().any(|n| n.is_nan()) {
        return LogicValue::NAN;
    }
    let pick = if op == "max" { f64::max } else { f64::min };
    let init = if op == "max" { f64::NEG_INFINITY } else { f64::INFINITY };
    LogicValue::Number(numbers.into_iter().fold(init, pick))
}

fn substr(source: &LogicValue, rest: &[LogicValue]) -> LogicValue {
    let text = source.to_js_string();
    let chars: Vec<&str> = text.graphemes(true).collect();
    let len = chars.len() as i64;

    let resolve = |n: f64| -> i64 {
        let n = if n.is_nan() { 0 } else { n as i64 };
        if n < 0 {
            len.saturating_add(n).max(0)
        } else {
            n.min(len)
        }
    };

    let start = resolve(rest.first().map(LogicValue::to_number).unwrap_or(0.0));
    let end = match rest.get(1).map(LogicValue::to_number) {
        None => len,
        Some(count) if count < 0.0 => len.saturating_add(count as i64).max(start),
        Some(count) => start.saturating_add(count as i64).min(len),
    };

    LogicValue::String(chars[start as usize..end.max(start) as usize].concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(rule: Value, data: Value) -> LogicValue {
        let operators = OperatorRegistry::new();
        Evaluator::new(&operators)
            .evaluate(&rule, &LogicValue::from_form_data(&data))
            .unwrap()
    }

    fn eval_json(rule: Value, data: Value) -> Value {
        eval(rule, data).to_json()
    }

    #[test]
    fn test_literals_pass_through() {
        assert_eq!(eval_json(json!(3), json!({})), json!(3));
        assert_eq!(eval_json(json!("x"), json!({})), json!("x"));
        assert_eq!(eval_json(json!([1, { "+": [1, 1] }]), json!({})), json!([1, 2]));
    }

    #[test]
    fn test_var_lookup_and_default() {
        let data = json!({ "a": { "b": 5 }, "list": [10, 20] });
        assert_eq!(eval_json(json!({ "var": "a.b" }), data.clone()), json!(5));
        assert_eq!(eval_json(json!({ "var": "list.1" }), data.clone()), json!(20));
        assert_eq!(eval_json(json!({ "var": ["nope", 7] }), data.clone()), json!(7));
        assert!(eval(json!({ "var": "nope" }), data).is_nan());
    }

    #[test]
    fn test_comparisons_against_unfilled_fields_are_false() {
        let data = json!({ "age": null });
        assert_eq!(eval_json(json!({ ">=": [{ "var": "age" }, 0] }), data.clone()), json!(false));
        assert_eq!(eval_json(json!({ "<": [{ "var": "age" }, 100] }), data), json!(false));
    }

    #[test]
    fn test_between() {
        assert_eq!(eval_json(json!({ "<": [1, 2, 3] }), json!({})), json!(true));
        assert_eq!(eval_json(json!({ "<": [1, 3, 3] }), json!({})), json!(false));
        assert_eq!(eval_json(json!({ "<=": [1, 3, 3] }), json!({})), json!(true));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval_json(json!({ "==": [1, "1"] }), json!({})), json!(true));
        assert_eq!(eval_json(json!({ "===": [1, "1"] }), json!({})), json!(false));
        assert_eq!(eval_json(json!({ "==": [0, false] }), json!({})), json!(true));
        assert_eq!(eval_json(json!({ "!==": [1, 1.0] }), json!({})), json!(false));
    }

    #[test]
    fn test_logic_short_circuits() {
        let rule = json!({ "or": [true, { "unknown_op": [] }] });
        assert_eq!(eval_json(rule, json!({})), json!(true));
        assert_eq!(eval_json(json!({ "and": [1, 0, 2] }), json!({})), json!(0));
        assert_eq!(eval_json(json!({ "!": [[]] }), json!({})), json!(true));
    }

    #[test]
    fn test_if_chain() {
        let rule = json!({ "if": [{ "<": [{ "var": "t" }, 0] }, "freezing", { "<": [{ "var": "t" }, 20] }, "cold", "warm"] });
        assert_eq!(eval_json(rule.clone(), json!({ "t": -5 })), json!("freezing"));
        assert_eq!(eval_json(rule.clone(), json!({ "t": 5 })), json!("cold"));
        assert_eq!(eval_json(rule, json!({ "t": 25 })), json!("warm"));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_json(json!({ "+": [1, "2", 3] }), json!({})), json!(6));
        assert_eq!(eval_json(json!({ "-": [5] }), json!({})), json!(-5));
        assert_eq!(eval_json(json!({ "/": [{ "var": "x" }, 2] }), json!({ "x": 5 })), json!(2.5));
        assert_eq!(eval_json(json!({ "%": [7, 3] }), json!({})), json!(1));
        assert_eq!(eval_json(json!({ "max": [1, 9, 3] }), json!({})), json!(9));
        assert_eq!(eval_json(json!({ "min": [] }), json!({})), json!(null));
    }

    #[test]
    fn test_array_operators() {
        let data = json!({ "xs": [1, 2, 3, 4] });
        assert_eq!(
            eval_json(json!({ "map": [{ "var": "xs" }, { "*": [{ "var": "" }, 2] }] }), data.clone()),
            json!([2, 4, 6, 8])
        );
        assert_eq!(
            eval_json(json!({ "filter": [{ "var": "xs" }, { ">": [{ "var": "" }, 2] }] }), data.clone()),
            json!([3, 4])
        );
        assert_eq!(
            eval_json(
                json!({ "reduce": [{ "var": "xs" }, { "+": [{ "var": "current" }, { "var": "accumulator" }] }, 0] }),
                data.clone()
            ),
            json!(10)
        );
        assert_eq!(eval_json(json!({ "all": [[], true] }), json!({})), json!(false));
        assert_eq!(
            eval_json(json!({ "some": [{ "var": "xs" }, { "==": [{ "var": "" }, 3] }] }), data.clone()),
            json!(true)
        );
        assert_eq!(
            eval_json(json!({ "none": [{ "var": "xs" }, { ">": [{ "var": "" }, 10] }] }), data),
            json!(true)
        );
    }

    #[test]
    fn test_missing() {
        let data = json!({ "a": 1, "b": null, "c": "" });
        assert_eq!(eval_json(json!({ "missing": ["a", "b", "c", "d"] }), data.clone()), json!(["b", "c", "d"]));
        assert_eq!(eval_json(json!({ "missing_some": [1, ["a", "d"]] }), data.clone()), json!([]));
        assert_eq!(eval_json(json!({ "missing_some": [2, ["a", "d"]] }), data), json!(["d"]));
    }

    #[test]
    fn test_strings() {
        assert_eq!(eval_json(json!({ "cat": ["a", 1, true] }), json!({})), json!("a1true"));
        assert_eq!(eval_json(json!({ "substr": ["jsonlogic", 4] }), json!({})), json!("logic"));
        assert_eq!(eval_json(json!({ "substr": ["jsonlogic", -5, 2] }), json!({})), json!("lo"));
        assert_eq!(eval_json(json!({ "substr": ["jsonlogic", 1, -5] }), json!({})), json!("son"));
        assert_eq!(eval_json(json!({ "in": ["log", "jsonlogic"] }), json!({})), json!(true));
        assert_eq!(eval_json(json!({ "in": ["x", ["a", "b"]] }), json!({})), json!(false));
        assert_eq!(eval_json(json!({ "merge": [[1], 2, [3, 4]] }), json!({})), json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_substr_with_out_of_range_bounds() {
        assert_eq!(eval_json(json!({ "substr": ["abc", 1, 1e300] }), json!({})), json!("bc"));
        assert_eq!(eval_json(json!({ "substr": ["abc", 1, -1e300] }), json!({})), json!(""));
        assert_eq!(eval_json(json!({ "substr": ["abc", -1e300] }), json!({})), json!("abc"));
        assert_eq!(eval_json(json!({ "substr": ["abc", 1e300, 2] }), json!({})), json!(""));
    }

    #[test]
    fn test_unknown_operator_fails() {
        let operators = OperatorRegistry::new();
        let err = Evaluator::new(&operators)
            .evaluate(&json!({ "teleport": [1] }), &LogicValue::Null)
            .unwrap_err();
        assert!(matches!(err, RuleError::UnknownOperator(name) if name == "teleport"));
    }

    #[test]
    fn test_custom_operator_receives_evaluated_args() {
        let operators = OperatorRegistry::new();
        operators
            .register("sum_len", |args: &[Value]| {
                json!(args.iter().filter_map(Value::as_str).map(str::len).sum::<usize>())
            })
            .unwrap();
        let result = Evaluator::new(&operators)
            .evaluate(
                &json!({ "sum_len": [{ "var": "a" }, "xyz"] }),
                &LogicValue::from_json(&json!({ "a": "hi" })),
            )
            .unwrap();
        assert_eq!(result.to_json(), json!(5));
    }
}
