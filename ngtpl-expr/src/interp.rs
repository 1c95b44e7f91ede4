//! Tree-walking evaluation of parsed expressions.

use std::cmp::Ordering;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{BinaryOp, Expr, Literal, UnaryOp};
use crate::error::EvalError;
use crate::scope::Scope;
use crate::value::{Function, Value, format_number};

pub type EvalResult<T> = Result<T, EvalError>;

/// Longest string, in bytes, that string methods may build.
const MAX_STRING_LEN: usize = (1 << 29) - 24;

pub fn eval(expr: &Expr, scope: &Scope) -> EvalResult<Value> {
    match expr {
        Expr::Literal(lit) => Ok(literal(lit)),
        Expr::Ident(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownIdentifier { name: name.clone() }),
        Expr::Array(items) => {
            let values = items
                .iter()
                .map(|e| eval(e, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::from(values))
        }
        Expr::Object(props) => {
            let mut map = IndexMap::with_capacity(props.len());
            for (key, e) in props {
                map.insert(key.clone(), eval(e, scope)?);
            }
            Ok(Value::Object(Rc::new(map)))
        }
        Expr::Member { object, property } => {
            let target = eval(object, scope)?;
            get_property(&target, property)
        }
        Expr::Index { object, index } => {
            let target = eval(object, scope)?;
            let key = eval(index, scope)?;
            get_index(&target, &key)
        }
        Expr::Call { callee, args } => {
            if let Expr::Member { object, property } = callee.as_ref() {
                let target = eval(object, scope)?;
                let args = eval_args(args, scope)?;
                return call_method(&target, property, &args);
            }
            let f = eval(callee, scope)?;
            let args = eval_args(args, scope)?;
            call_value(&f, &args, &callee.describe())
        }
        Expr::Unary { op, operand } => {
            let v = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!v.is_truthy()),
                UnaryOp::Neg => Value::Number(-v.to_number()),
                UnaryOp::Plus => Value::Number(v.to_number()),
            })
        }
        Expr::Binary { op, lhs, rhs } => binary(*op, lhs, rhs, scope),
        Expr::Conditional {
            test,
            then,
            otherwise,
        } => {
            if eval(test, scope)?.is_truthy() {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Lambda(def) => Ok(Value::Function(Rc::new(Function::Lambda {
            def: def.clone(),
            env: scope.clone(),
        }))),
    }
}

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Undefined => Value::Undefined,
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::String(s) => Value::String(s.clone()),
    }
}

fn eval_args(args: &[Expr], scope: &Scope) -> EvalResult<Vec<Value>> {
    args.iter().map(|a| eval(a, scope)).collect()
}

fn binary(op: BinaryOp, lhs: &Expr, rhs: &Expr, scope: &Scope) -> EvalResult<Value> {
    let l = eval(lhs, scope)?;
    match op {
        BinaryOp::And if !l.is_truthy() => return Ok(l),
        BinaryOp::Or if l.is_truthy() => return Ok(l),
        BinaryOp::Nullish if !l.is_nullish() => return Ok(l),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => return eval(rhs, scope),
        _ => {}
    }
    let r = eval(rhs, scope)?;
    Ok(match op {
        BinaryOp::Add => add(&l, &r),
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::Lt => Value::Bool(compare(&l, &r) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(&l, &r),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(&l, &r) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(&l, &r),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Eq => Value::Bool(l.loose_eq(&r)),
        BinaryOp::Ne => Value::Bool(!l.loose_eq(&r)),
        BinaryOp::StrictEq => Value::Bool(l.strict_eq(&r)),
        BinaryOp::StrictNe => Value::Bool(!l.strict_eq(&r)),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => r,
    })
}

/// `+` concatenates as soon as either side is not a primitive number-like value.
fn add(l: &Value, r: &Value) -> Value {
    let stringy = |v: &Value| {
        matches!(
            v,
            Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Async(_)
        )
    };
    if stringy(l) || stringy(r) {
        Value::String(format!("{l}{r}"))
    } else {
        Value::Number(l.to_number() + r.to_number())
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => l.to_number().partial_cmp(&r.to_number()),
    }
}

fn nullish_access(target: &Value, property: &str) -> EvalError {
    EvalError::NullishAccess {
        property: property.to_string(),
        target: target.type_name().to_string(),
    }
}

pub fn get_property(target: &Value, property: &str) -> EvalResult<Value> {
    match target {
        Value::Undefined | Value::Null => Err(nullish_access(target, property)),
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or_default()),
        Value::Array(items) if property == "length" => Ok(Value::from(items.len())),
        Value::String(s) if property == "length" => Ok(Value::from(s.chars().count())),
        _ => Ok(Value::Undefined),
    }
}

fn get_index(target: &Value, key: &Value) -> EvalResult<Value> {
    match (target, key) {
        (Value::Undefined | Value::Null, _) => Err(nullish_access(target, &key.to_string())),
        (Value::Array(items), Value::Number(n)) => Ok(array_index(*n)
            .and_then(|i| items.get(i).cloned())
            .unwrap_or_default()),
        (Value::String(s), Value::Number(n)) => Ok(array_index(*n)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or_default()),
        _ => get_property(target, &key.to_string()),
    }
}

fn array_index(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

pub fn call_value(f: &Value, args: &[Value], name: &str) -> EvalResult<Value> {
    let Value::Function(func) = f else {
        return Err(EvalError::NotCallable {
            callee: name.to_string(),
        });
    };
    match func.as_ref() {
        Function::Native(native) => native(args),
        Function::Lambda { def, env } => {
            let mut scope = env.clone();
            for (i, param) in def.params.iter().enumerate() {
                scope = scope.with(param.clone(), args.get(i).cloned().unwrap_or_default());
            }
            eval(&def.body, &scope)
        }
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

fn not_callable(target: &Value, method: &str) -> EvalError {
    EvalError::NotCallable {
        callee: format!("{}.{method}", target.type_name()),
    }
}

fn call_method(target: &Value, method: &str, args: &[Value]) -> EvalResult<Value> {
    match target {
        Value::Undefined | Value::Null => Err(nullish_access(target, method)),
        Value::Object(map) => match map.get(method) {
            Some(f @ Value::Function(_)) => call_value(f, args, method),
            _ if method == "toString" => Ok(Value::String(target.to_string())),
            _ => Err(not_callable(target, method)),
        },
        Value::Array(items) => array_method(target, items, method, args),
        Value::String(s) => string_method(target, s, method, args),
        Value::Number(n) => match method {
            "toFixed" => {
                let digits = arg(args, 0).to_number();
                let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
                Ok(Value::String(format!("{n:.digits$}")))
            }
            "toString" => Ok(Value::String(format_number(*n))),
            _ => Err(not_callable(target, method)),
        },
        _ if method == "toString" => Ok(Value::String(target.to_string())),
        _ => Err(not_callable(target, method)),
    }
}

fn array_method(
    target: &Value,
    items: &[Value],
    method: &str,
    args: &[Value],
) -> EvalResult<Value> {
    let callback = arg(args, 0);
    let call = |item: &Value, i: usize| {
        call_value(&callback, &[item.clone(), Value::from(i)], method)
    };
    match method {
        "find" => {
            for (i, item) in items.iter().enumerate() {
                if call(item, i)?.is_truthy() {
                    return Ok(item.clone());
                }
            }
            Ok(Value::Undefined)
        }
        "findIndex" => {
            for (i, item) in items.iter().enumerate() {
                if call(item, i)?.is_truthy() {
                    return Ok(Value::from(i));
                }
            }
            Ok(Value::from(-1))
        }
        "filter" => {
            let mut out = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if call(item, i)?.is_truthy() {
                    out.push(item.clone());
                }
            }
            Ok(Value::from(out))
        }
        "map" => {
            let out = items
                .iter()
                .enumerate()
                .map(|(i, item)| call(item, i))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::from(out))
        }
        "some" => {
            for (i, item) in items.iter().enumerate() {
                if call(item, i)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "every" => {
            for (i, item) in items.iter().enumerate() {
                if !call(item, i)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        "includes" => Ok(Value::Bool(items.iter().any(|v| v.same_value_zero(&callback)))),
        "indexOf" => Ok(Value::from(
            items
                .iter()
                .position(|v| v.strict_eq(&callback))
                .map_or(-1, |i| i as i64),
        )),
        "join" => {
            let sep = match &callback {
                Value::Undefined => ",".to_string(),
                other => other.to_string(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_string() })
                .collect();
            Ok(Value::String(parts.join(&sep)))
        }
        "slice" => {
            let (start, end) = slice_bounds(items.len(), args);
            Ok(Value::from(items[start..end].to_vec()))
        }
        "concat" => {
            let mut out = items.to_vec();
            for a in args {
                match a {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Ok(Value::from(out))
        }
        "toString" => Ok(Value::String(target.to_string())),
        _ => Err(not_callable(target, method)),
    }
}

fn string_method(target: &Value, s: &str, method: &str, args: &[Value]) -> EvalResult<Value> {
    let text_arg = |i: usize| arg(args, i).to_string();
    let chars: Vec<char> = s.chars().collect();
    Ok(match method {
        "toUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "includes" => Value::Bool(s.contains(&text_arg(0))),
        "startsWith" => Value::Bool(s.starts_with(&text_arg(0))),
        "endsWith" => Value::Bool(s.ends_with(&text_arg(0))),
        "indexOf" => Value::from(
            s.find(&text_arg(0))
                .map_or(-1, |byte| s[..byte].chars().count() as i64),
        ),
        "charAt" => {
            let i = arg(args, 0).to_number();
            let i = if i.is_nan() { 0.0 } else { i };
            Value::String(
                array_index(i)
                    .and_then(|i| chars.get(i))
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            )
        }
        "slice" => {
            let (start, end) = slice_bounds(chars.len(), args);
            Value::String(chars[start..end].iter().collect())
        }
        "split" => match arg(args, 0) {
            Value::Undefined => Value::from(vec![Value::from(s)]),
            sep => {
                let sep = sep.to_string();
                let parts: Vec<Value> = if sep.is_empty() {
                    chars.iter().map(|c| Value::String(c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(Value::from).collect()
                };
                Value::from(parts)
            }
        },
        "repeat" => {
            let n = arg(args, 0).to_number();
            if n < 0.0 || n.is_infinite() {
                return Err(EvalError::Type(format!("invalid repeat count {}", format_number(n))));
            }
            let count = if n.is_nan() { 0 } else { n as usize };
            match s.len().checked_mul(count) {
                Some(len) if len <= MAX_STRING_LEN => Value::String(s.repeat(count)),
                _ => return Err(EvalError::Type("invalid string length".into())),
            }
        }
        "concat" => {
            let mut out = s.to_string();
            for a in args {
                out.push_str(&a.to_string());
            }
            Value::String(out)
        }
        "toString" => Value::String(s.to_string()),
        _ => return Err(not_callable(target, method)),
    })
}

/// Resolve `slice(start, end)` arguments, negative offsets counting from the end.
fn slice_bounds(len: usize, args: &[Value]) -> (usize, usize) {
    let resolve = |v: Value, default: usize| -> usize {
        if matches!(v, Value::Undefined) {
            return default;
        }
        let n = v.to_number();
        if n.is_nan() {
            return 0;
        }
        let n = n.trunc();
        if n < 0.0 {
            (len as f64 + n).max(0.0) as usize
        } else {
            (n as usize).min(len)
        }
    };
    let start = resolve(arg(args, 0), 0);
    let end = resolve(arg(args, 1), len);
    (start, end.max(start))
}
