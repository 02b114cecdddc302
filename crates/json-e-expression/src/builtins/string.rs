//! String builtins, including the regex family.

use super::{
    arg_array, arg_f64, arg_str, generated_len, BuiltinDefinition, Signature, TypeTag, ARRAY,
    INTEGER, NUMBER, STRING, STRING_OR_NUMBER,
};
use crate::error::Error;
use crate::util::{format_number, to_text};
use crate::value::Value;
use regex::Regex;

const STRINGIFIABLE: &[TypeTag] = &[
    TypeTag::String,
    TypeTag::Number,
    TypeTag::Boolean,
    TypeTag::Null,
];
const MEASURABLE: &[TypeTag] = &[TypeTag::String, TypeTag::Array, TypeTag::Object];

fn compile(builtin: &str, pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|err| {
        Error::builtin(format!(
            "invalid arguments to builtin: {}: invalid regular expression: {}",
            builtin, err
        ))
    })
}

/// Separators may be given as numbers; they are used in their textual form.
fn separator(args: &[Value], index: usize) -> String {
    match args.get(index) {
        Some(Value::Number(n)) => format_number(*n),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn lowercase_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(arg_str(args, 0).to_lowercase()))
}

fn uppercase_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(arg_str(args, 0).to_uppercase()))
}

fn str_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(args.first().map(Value::to_string).unwrap_or_default()))
}

fn number_eval(args: &[Value]) -> Result<Value, Error> {
    let text = arg_str(args, 0);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Number(0.0));
    }
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok().map(|n| n as f64),
        None => match trimmed {
            "Infinity" | "+Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            // Rust also accepts "inf" and "nan", which are not numbers here.
            _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => None,
            _ => trimmed.parse::<f64>().ok(),
        },
    };
    match parsed {
        Some(n) => Ok(Value::Number(n)),
        None => Err(Error::builtin(format!(
            "invalid arguments to builtin: number: cannot convert \"{}\" to a number",
            text
        ))),
    }
}

fn len_eval(args: &[Value]) -> Result<Value, Error> {
    let len = match args.first() {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(Value::Object(object)) => object.len(),
        _ => 0,
    };
    Ok(Value::from(len))
}

fn strip_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(arg_str(args, 0).trim()))
}

fn lstrip_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(arg_str(args, 0).trim_start()))
}

fn rstrip_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(arg_str(args, 0).trim_end()))
}

fn split_eval(args: &[Value]) -> Result<Value, Error> {
    let input = arg_str(args, 0);
    let delimiter = separator(args, 1);
    let parts: Vec<Value> = if delimiter.is_empty() {
        input.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        input.split(delimiter.as_str()).map(Value::from).collect()
    };
    Ok(Value::Array(parts))
}

fn join_eval(args: &[Value]) -> Result<Value, Error> {
    let parts: Vec<String> = arg_array(args, 0).iter().map(to_text).collect();
    Ok(Value::String(parts.join(&separator(args, 1))))
}

fn replace_eval(args: &[Value]) -> Result<Value, Error> {
    let regex = compile("replace", arg_str(args, 1))?;
    Ok(Value::String(
        regex.replace_all(arg_str(args, 0), arg_str(args, 2)).into_owned(),
    ))
}

fn replace_first_eval(args: &[Value]) -> Result<Value, Error> {
    let regex = compile("replaceFirst", arg_str(args, 1))?;
    Ok(Value::String(
        regex.replace(arg_str(args, 0), arg_str(args, 2)).into_owned(),
    ))
}

/// Character-based; bounds are clamped and swapped when reversed.
fn substring_eval(args: &[Value]) -> Result<Value, Error> {
    let chars: Vec<char> = arg_str(args, 0).chars().collect();
    let clamp = |n: f64| {
        if n.is_nan() {
            0
        } else {
            n.max(0.0).min(chars.len() as f64) as usize
        }
    };
    let start = clamp(arg_f64(args, 1));
    let end = if args.len() > 2 {
        clamp(arg_f64(args, 2))
    } else {
        chars.len()
    };
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn starts_with_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(arg_str(args, 0).starts_with(arg_str(args, 1))))
}

fn ends_with_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(arg_str(args, 0).ends_with(arg_str(args, 1))))
}

fn includes_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(arg_str(args, 0).contains(arg_str(args, 1))))
}

/// Filler for padding up to `target` characters; the fill string repeats and
/// is truncated to fit.
fn padding(name: &str, args: &[Value]) -> Result<(String, String), Error> {
    let input = arg_str(args, 0).to_string();
    let target = arg_f64(args, 1);
    let fill = if args.len() > 2 { arg_str(args, 2) } else { " " };
    let current = input.chars().count();
    if fill.is_empty() || target <= current as f64 {
        return Ok((input, String::new()));
    }
    let missing = generated_len(name, (target - current as f64) as u128)?;
    let pad: String = fill.chars().cycle().take(missing).collect();
    Ok((input, pad))
}

fn pad_left_eval(args: &[Value]) -> Result<Value, Error> {
    let (input, pad) = padding("padLeft", args)?;
    Ok(Value::String(pad + &input))
}

fn pad_right_eval(args: &[Value]) -> Result<Value, Error> {
    let (input, pad) = padding("padRight", args)?;
    Ok(Value::String(input + &pad))
}

fn match_eval(args: &[Value]) -> Result<Value, Error> {
    let regex = compile("match", arg_str(args, 1))?;
    Ok(regex
        .find(arg_str(args, 0))
        .map_or(Value::Null, |m| Value::from(m.as_str())))
}

fn match_all_eval(args: &[Value]) -> Result<Value, Error> {
    let regex = compile("matchAll", arg_str(args, 1))?;
    Ok(Value::Array(
        regex
            .find_iter(arg_str(args, 0))
            .map(|m| Value::from(m.as_str()))
            .collect(),
    ))
}

fn test_eval(args: &[Value]) -> Result<Value, Error> {
    let regex = compile("test", arg_str(args, 1))?;
    Ok(Value::Bool(regex.is_match(arg_str(args, 0))))
}

pub fn builtins() -> Vec<BuiltinDefinition> {
    let plain = BuiltinDefinition::plain;
    vec![
        plain("lowercase", Signature::fixed(&[STRING]), lowercase_eval),
        plain("uppercase", Signature::fixed(&[STRING]), uppercase_eval),
        plain("str", Signature::fixed(&[STRINGIFIABLE]), str_eval),
        plain("number", Signature::fixed(&[STRING]), number_eval),
        plain("len", Signature::fixed(&[MEASURABLE]), len_eval),
        plain("strip", Signature::fixed(&[STRING]), strip_eval),
        plain("lstrip", Signature::fixed(&[STRING]), lstrip_eval),
        plain("rstrip", Signature::fixed(&[STRING]), rstrip_eval),
        plain("split", Signature::fixed(&[STRING, STRING_OR_NUMBER]), split_eval),
        plain("join", Signature::fixed(&[ARRAY, STRING_OR_NUMBER]), join_eval),
        plain("replace", Signature::fixed(&[STRING, STRING, STRING]), replace_eval),
        plain(
            "replaceFirst",
            Signature::fixed(&[STRING, STRING, STRING]),
            replace_first_eval,
        ),
        plain(
            "substring",
            Signature::fixed(&[STRING, NUMBER, NUMBER]).min(2),
            substring_eval,
        ),
        plain("startsWith", Signature::fixed(&[STRING, STRING]), starts_with_eval),
        plain("endsWith", Signature::fixed(&[STRING, STRING]), ends_with_eval),
        plain("includes", Signature::fixed(&[STRING, STRING]), includes_eval),
        plain(
            "padLeft",
            Signature::fixed(&[STRING, INTEGER, STRING]).min(2),
            pad_left_eval,
        ),
        plain(
            "padRight",
            Signature::fixed(&[STRING, INTEGER, STRING]).min(2),
            pad_right_eval,
        ),
        plain("match", Signature::fixed(&[STRING, STRING]), match_eval),
        plain("matchAll", Signature::fixed(&[STRING, STRING]), match_all_eval),
        plain("test", Signature::fixed(&[STRING, STRING]), test_eval),
    ]
}
