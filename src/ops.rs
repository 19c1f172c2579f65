//! Pure typed primitives shared by every register-form and stack-form
//! opcode that isn't pure control flow or frame/stack bookkeeping. One
//! function per arity; the interpreter supplies the operands regardless
//! of whether they came from registers or the data stack.

use std::convert::TryFrom;

use crate::error::{EngineResult, ErrorKind};
use crate::value::Value;

fn bad_type(msg: impl Into<String>) -> ErrorKind {
    ErrorKind::BadOperandType(msg.into())
}

fn bad_value(msg: impl Into<String>) -> ErrorKind {
    ErrorKind::BadOperandValue(msg.into())
}

fn bad_string(msg: impl Into<String>) -> ErrorKind {
    ErrorKind::BadStringOperation(msg.into())
}

pub fn add(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_add(y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x + y)),
        _ => Err(bad_type("ADD requires two Int or two Float operands")),
    }
}

pub fn sub(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_sub(y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x - y)),
        _ => Err(bad_type("SUB requires two Int or two Float operands")),
    }
}

pub fn mul(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_mul(y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x * y)),
        _ => Err(bad_type("MUL requires two Int or two Float operands")),
    }
}

pub fn div(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => {
            if y == 0.0 {
                Err(bad_value("DIV by zero"))
            } else {
                Ok(Value::Float(x / y))
            }
        }
        _ => Err(bad_type("DIV requires two Float operands")),
    }
}

/// Integer floor division towards negative infinity, matching the
/// language reference (not truncating division).
pub fn idiv(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => {
            if y == 0 {
                Err(bad_value("IDIV by zero"))
            } else {
                Ok(Value::Int(floor_div(x, y)))
            }
        }
        _ => Err(bad_type("IDIV requires two Int operands")),
    }
}

fn floor_div(x: i64, y: i64) -> i64 {
    let q = x / y;
    let r = x % y;
    if (r != 0) && ((r < 0) != (y < 0)) {
        q - 1
    } else {
        q
    }
}

pub fn lt(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Nil, _) | (_, Value::Nil) => {
            Err(bad_type("LT does not accept a Nil operand"))
        }
        (Value::Int(x), Value::Int(y)) => Ok(Value::Bool(x < y)),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Bool(x < y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(!x & y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x < y)),
        _ => Err(bad_type("LT requires both operands of the same type")),
    }
}

pub fn gt(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Nil, _) | (_, Value::Nil) => {
            Err(bad_type("GT does not accept a Nil operand"))
        }
        (Value::Int(x), Value::Int(y)) => Ok(Value::Bool(x > y)),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Bool(x > y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x & !y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x > y)),
        _ => Err(bad_type("GT requires both operands of the same type")),
    }
}

pub fn eq(a: Value, b: Value) -> EngineResult<Value> {
    match (&a, &b) {
        (Value::Nil, Value::Nil) => Ok(Value::Bool(true)),
        (Value::Nil, _) | (_, Value::Nil) => Ok(Value::Bool(false)),
        (Value::Int(x), Value::Int(y)) => Ok(Value::Bool(x == y)),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Bool(x == y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x == y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x == y)),
        _ => Err(bad_type("EQ requires both operands of the same type")),
    }
}

pub fn and(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x && y)),
        _ => Err(bad_type("AND requires two Bool operands")),
    }
}

pub fn or(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x || y)),
        _ => Err(bad_type("OR requires two Bool operands")),
    }
}

pub fn not(a: Value) -> EngineResult<Value> {
    match a {
        Value::Bool(x) => Ok(Value::Bool(!x)),
        _ => Err(bad_type("NOT requires a Bool operand")),
    }
}

/// Returns the Unicode scalar value at `index` as an Int, per the
/// language reference (not the character itself).
pub fn stri2int(s: Value, idx: Value) -> EngineResult<Value> {
    match (s, idx) {
        (Value::Str(s), Value::Int(i)) => {
            let ch = char_at(&s, i).ok_or_else(|| bad_string("STRI2INT index out of range"))?;
            Ok(Value::Int(ch as i64))
        }
        _ => Err(bad_type("STRI2INT requires (string, int) operands")),
    }
}

pub fn getchar(s: Value, idx: Value) -> EngineResult<Value> {
    match (s, idx) {
        (Value::Str(s), Value::Int(i)) => {
            let ch = char_at(&s, i).ok_or_else(|| bad_string("GETCHAR index out of range"))?;
            Ok(Value::Str(ch.to_string()))
        }
        _ => Err(bad_type("GETCHAR requires (string, int) operands")),
    }
}

pub fn concat(a: Value, b: Value) -> EngineResult<Value> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(x + &y)),
        _ => Err(bad_type("CONCAT requires two string operands")),
    }
}

/// Replaces the character at `index` in `current` (the destination
/// variable's existing string value) with the first character of
/// `replacement`.
pub fn setchar(current: Value, index: Value, replacement: Value) -> EngineResult<Value> {
    match (current, index, replacement) {
        (Value::Str(base), Value::Int(i), Value::Str(repl)) => {
            let first = repl
                .chars()
                .next()
                .ok_or_else(|| bad_string("SETCHAR replacement string is empty"))?;
            let mut chars: Vec<char> = base.chars().collect();
            let idx = usize::try_from(i).ok().filter(|&idx| idx < chars.len());
            let idx = idx.ok_or_else(|| bad_string("SETCHAR index out of range"))?;
            chars[idx] = first;
            Ok(Value::Str(chars.into_iter().collect()))
        }
        _ => Err(bad_type("SETCHAR requires (string, int, string) operands")),
    }
}

pub fn int2char(a: Value) -> EngineResult<Value> {
    match a {
        Value::Int(i) => {
            let code = u32::try_from(i).map_err(|_| bad_string("INT2CHAR code point out of range"))?;
            let ch = char::from_u32(code).ok_or_else(|| bad_string("INT2CHAR code point out of range"))?;
            Ok(Value::Str(ch.to_string()))
        }
        _ => Err(bad_type("INT2CHAR requires an Int operand")),
    }
}

pub fn int2float(a: Value) -> EngineResult<Value> {
    match a {
        Value::Int(i) => Ok(Value::Float(i as f64)),
        _ => Err(bad_type("INT2FLOAT requires an Int operand")),
    }
}

pub fn float2int(a: Value) -> EngineResult<Value> {
    match a {
        Value::Float(x) => Ok(Value::Int(x.trunc() as i64)),
        _ => Err(bad_type("FLOAT2INT requires a Float operand")),
    }
}

pub fn strlen(a: Value) -> EngineResult<Value> {
    match a {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        _ => Err(bad_type("STRLEN requires a string operand")),
    }
}

fn char_at(s: &str, idx: i64) -> Option<char> {
    if idx < 0 {
        return None;
    }
    s.chars().nth(idx as usize)
}
