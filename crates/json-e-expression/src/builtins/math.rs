//! Numeric builtins.

use super::{
    arg_f64, generated_len, BuiltinDefinition, Invoke, PlainFn, Signature, INTEGER, NUMBER,
};
use crate::error::Error;
use crate::value::Value;

macro_rules! unary_math {
    ($($fn_name:ident => $op:expr;)*) => {
        $(
            fn $fn_name(args: &[Value]) -> Result<Value, Error> {
                let f: fn(f64) -> f64 = $op;
                Ok(Value::Number(f(arg_f64(args, 0))))
            }
        )*
    };
}

unary_math! {
    sqrt_eval => f64::sqrt;
    ceil_eval => f64::ceil;
    floor_eval => f64::floor;
    abs_eval => f64::abs;
    sin_eval => f64::sin;
    cos_eval => f64::cos;
    tan_eval => f64::tan;
    asin_eval => f64::asin;
    acos_eval => f64::acos;
    atan_eval => f64::atan;
    log_eval => f64::ln;
    log10_eval => f64::log10;
    exp_eval => f64::exp;
    // Halves round towards positive infinity.
    round_eval => |n| (n + 0.5).floor();
}

fn numbers(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    args.iter().filter_map(Value::as_f64)
}

fn max_eval(args: &[Value]) -> Result<Value, Error> {
    let m = numbers(args).fold(f64::NEG_INFINITY, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            acc.max(n)
        }
    });
    Ok(Value::Number(m))
}

fn min_eval(args: &[Value]) -> Result<Value, Error> {
    let m = numbers(args).fold(f64::INFINITY, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            acc.min(n)
        }
    });
    Ok(Value::Number(m))
}

fn pow_eval(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(arg_f64(args, 0).powf(arg_f64(args, 1))))
}

fn random_eval(_args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(rand::random::<f64>()))
}

/// Half-open `[start, stop)` with an optional step. The item count is
/// computed in `i128` so no bound or step can overflow.
fn range_eval(args: &[Value]) -> Result<Value, Error> {
    let start = arg_f64(args, 0) as i64;
    let stop = arg_f64(args, 1) as i64;
    let step = if args.len() > 2 { arg_f64(args, 2) as i64 } else { 1 };
    if step == 0 {
        return Err(Error::builtin(
            "invalid arguments to builtin: range: step must not be zero",
        ));
    }
    let span = i128::from(stop) - i128::from(start);
    let (start, step) = (i128::from(start), i128::from(step));
    let count = if span != 0 && (span > 0) == (step > 0) {
        (span + step - step.signum()) / step
    } else {
        0
    };
    let count = generated_len("range", count.unsigned_abs())?;
    let items = (0..count as i128)
        .map(|i| Value::Number((start + i * step) as f64))
        .collect();
    Ok(Value::Array(items))
}

fn unary(name: &'static str, eval: PlainFn) -> BuiltinDefinition {
    BuiltinDefinition::plain(name, Signature::fixed(&[NUMBER]), eval)
}

pub fn builtins() -> Vec<BuiltinDefinition> {
    vec![
        BuiltinDefinition {
            name: "max",
            signature: Signature::variadic(&[], NUMBER).min(1),
            invoke: Invoke::Plain(max_eval),
        },
        BuiltinDefinition {
            name: "min",
            signature: Signature::variadic(&[], NUMBER).min(1),
            invoke: Invoke::Plain(min_eval),
        },
        unary("sqrt", sqrt_eval),
        unary("ceil", ceil_eval),
        unary("floor", floor_eval),
        unary("abs", abs_eval),
        unary("sin", sin_eval),
        unary("cos", cos_eval),
        unary("tan", tan_eval),
        unary("asin", asin_eval),
        unary("acos", acos_eval),
        unary("atan", atan_eval),
        unary("log", log_eval),
        unary("log10", log10_eval),
        unary("exp", exp_eval),
        unary("round", round_eval),
        BuiltinDefinition {
            name: "pow",
            signature: Signature::fixed(&[NUMBER, NUMBER]),
            invoke: Invoke::Plain(pow_eval),
        },
        BuiltinDefinition {
            name: "random",
            signature: Signature::fixed(&[]),
            invoke: Invoke::Plain(random_eval),
        },
        BuiltinDefinition {
            name: "range",
            signature: Signature::fixed(&[INTEGER, INTEGER, INTEGER]).min(2),
            invoke: Invoke::Plain(range_eval),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|n| Value::Number(*n)).collect()
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_eval(&nums(&[2.5])).unwrap(), Value::Number(3.0));
        assert_eq!(round_eval(&nums(&[-2.5])).unwrap(), Value::Number(-2.0));
        assert_eq!(round_eval(&nums(&[1.4])).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(max_eval(&nums(&[1.0, 7.0, 3.0])).unwrap(), Value::Number(7.0));
        assert_eq!(min_eval(&nums(&[1.0, -7.0, 3.0])).unwrap(), Value::Number(-7.0));
    }

    #[test]
    fn test_range() {
        assert_eq!(
            range_eval(&nums(&[1.0, 5.0])).unwrap(),
            Value::Array(nums(&[1.0, 2.0, 3.0, 4.0]))
        );
        assert_eq!(
            range_eval(&nums(&[0.0, 10.0, 3.0])).unwrap(),
            Value::Array(nums(&[0.0, 3.0, 6.0, 9.0]))
        );
        assert_eq!(
            range_eval(&nums(&[5.0, 1.0, -2.0])).unwrap(),
            Value::Array(nums(&[5.0, 3.0]))
        );
        assert_eq!(range_eval(&nums(&[5.0, 1.0])).unwrap(), Value::Array(vec![]));
        assert!(range_eval(&nums(&[0.0, 5.0, 0.0])).is_err());
    }

    #[test]
    fn test_range_near_i64_limits() {
        let out = range_eval(&nums(&[0.0, 9e18, 4e18])).unwrap();
        assert_eq!(out, Value::Array(nums(&[0.0, 4e18, 8e18])));
        let out = range_eval(&nums(&[9e18, -9e18, -9e18])).unwrap();
        assert_eq!(out, Value::Array(nums(&[9e18, 0.0])));
    }

    #[test]
    fn test_range_length_is_capped() {
        let err = range_eval(&nums(&[0.0, 1e15])).unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));
        let err = range_eval(&nums(&[-9e18, 9e18])).unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));
    }

    #[test]
    fn test_random_is_unit_interval() {
        let Value::Number(n) = random_eval(&[]).unwrap() else {
            panic!("random returned a non-number");
        };
        assert!((0.0..1.0).contains(&n));
    }
}
