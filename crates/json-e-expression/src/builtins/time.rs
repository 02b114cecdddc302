//! Time builtins. All timestamps are handled in UTC.

use super::{arg_str, BuiltinDefinition, Signature, STRING};
use crate::context::Context;
use crate::error::Error;
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn offset_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(\s*(?P<sign>[-+]))?",
            r"(\s*(?P<years>\d+)\s*(y|yr|yrs|year|years))?",
            r"(\s*(?P<months>\d+)\s*(mo|mon|mons|month|months))?",
            r"(\s*(?P<weeks>\d+)\s*(w|wk|wks|week|weeks))?",
            r"(\s*(?P<days>\d+)\s*(d|day|days))?",
            r"(\s*(?P<hours>\d+)\s*(h|hr|hrs|hour|hours))?",
            r"(\s*(?P<minutes>\d+)\s*(m|min|mins|minute|minutes))?",
            r"(\s*(?P<seconds>\d+)\s*(s|sec|secs|second|seconds))?",
            r"\s*$",
        ))
        .unwrap()
    })
}

fn format_tokens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("yyyy|MM|dd|HH|mm|ss").unwrap())
}

/// ISO-8601 with milliseconds and a `Z` suffix.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339, a naive date-time (taken as UTC) or a bare date.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn unparseable(builtin: &str, text: &str) -> Error {
    Error::builtin(format!(
        "invalid arguments to builtin: {}: cannot parse \"{}\" as a time",
        builtin, text
    ))
}

/// Parses an offset such as `"2 days 3 hours"` or `"-1y"` into a signed
/// duration. Years count 365 days and months 30 days.
pub fn parse_offset(offset: &str) -> Option<TimeDelta> {
    let captures = offset_pattern().captures(offset)?;
    let field = |caps: &Captures<'_>, name: &str| -> Option<i64> {
        caps.name(name).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let units = [
        ("years", 365 * 86_400),
        ("months", 30 * 86_400),
        ("weeks", 7 * 86_400),
        ("days", 86_400),
        ("hours", 3_600),
        ("minutes", 60),
        ("seconds", 1),
    ];
    let mut seconds: i64 = 0;
    for (name, scale) in units {
        let amount = field(&captures, name)?;
        seconds = seconds.checked_add(amount.checked_mul(scale)?)?;
    }
    if captures.name("sign").is_some_and(|m| m.as_str() == "-") {
        seconds = -seconds;
    }
    TimeDelta::try_seconds(seconds)
}

fn now_eval(_args: &[Value]) -> Result<Value, Error> {
    Ok(Value::String(format_timestamp(&Utc::now())))
}

/// Reference order: explicit argument, then the context's `now`, then the
/// wall clock.
fn from_now_eval(context: &Context, args: &[Value]) -> Result<Value, Error> {
    let offset = arg_str(args, 0);
    let reference = match args.get(1).and_then(Value::as_str) {
        Some(text) => Some(text),
        None => context.get("now").and_then(Value::as_str),
    };
    let reference = match reference {
        Some(text) => parse_timestamp(text).ok_or_else(|| unparseable("fromNow", text))?,
        None => Utc::now(),
    };
    let delta = parse_offset(offset).ok_or_else(|| {
        Error::builtin(format!(
            "invalid arguments to builtin: fromNow: invalid time expression: {}",
            offset
        ))
    })?;
    let time = reference
        .checked_add_signed(delta)
        .ok_or_else(|| Error::builtin("invalid arguments to builtin: fromNow: time out of range"))?;
    Ok(Value::String(format_timestamp(&time)))
}

fn parse_time_eval(args: &[Value]) -> Result<Value, Error> {
    let text = arg_str(args, 0);
    let time = parse_timestamp(text).ok_or_else(|| unparseable("parseTime", text))?;
    Ok(Value::Number(time.timestamp_millis() as f64))
}

fn format_date_eval(args: &[Value]) -> Result<Value, Error> {
    let text = arg_str(args, 0);
    let time = parse_timestamp(text).ok_or_else(|| unparseable("formatDate", text))?;
    let formatted = format_tokens().replace_all(arg_str(args, 1), |caps: &Captures<'_>| {
        let pattern = match &caps[0] {
            "yyyy" => "%Y",
            "MM" => "%m",
            "dd" => "%d",
            "HH" => "%H",
            "mm" => "%M",
            _ => "%S",
        };
        time.format(pattern).to_string()
    });
    Ok(Value::String(formatted.into_owned()))
}

pub fn builtins() -> Vec<BuiltinDefinition> {
    vec![
        BuiltinDefinition::plain("now", Signature::fixed(&[]), now_eval),
        BuiltinDefinition::with_context(
            "fromNow",
            Signature::fixed(&[STRING, STRING]).min(1),
            from_now_eval,
        ),
        BuiltinDefinition::plain("parseTime", Signature::fixed(&[STRING]), parse_time_eval),
        BuiltinDefinition::plain(
            "formatDate",
            Signature::fixed(&[STRING, STRING]),
            format_date_eval,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBuilder;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("1 day"), TimeDelta::try_days(1));
        assert_eq!(parse_offset("-2h 30min"), TimeDelta::try_minutes(-150));
        assert_eq!(parse_offset("1y"), TimeDelta::try_days(365));
        assert_eq!(parse_offset("1 month 1w"), TimeDelta::try_days(37));
        assert_eq!(parse_offset(""), TimeDelta::try_seconds(0));
        assert_eq!(parse_offset("soon"), None);
    }

    #[test]
    fn test_from_now_with_explicit_reference() {
        let ctx = Context::empty();
        let out = from_now_eval(
            &ctx,
            &[Value::from("2 days 1 hour"), Value::from("2020-01-01T00:00:00.000Z")],
        )
        .unwrap();
        assert_eq!(out, Value::from("2020-01-03T01:00:00.000Z"));
    }

    #[test]
    fn test_from_now_uses_context_now() {
        let ctx = ContextBuilder::new()
            .now("2017-01-19T16:27:20.974Z")
            .build();
        let out = from_now_eval(&ctx, &[Value::from("-1 minute")]).unwrap();
        assert_eq!(out, Value::from("2017-01-19T16:26:20.974Z"));
    }

    #[test]
    fn test_from_now_rejects_bad_offset() {
        let err = from_now_eval(&Context::empty(), &[Value::from("tomorrow")]).unwrap_err();
        assert!(matches!(err, Error::Builtin(_)));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(
            parse_time_eval(&[Value::from("1970-01-01T00:00:01.500Z")]).unwrap(),
            Value::Number(1500.0)
        );
        assert_eq!(
            parse_time_eval(&[Value::from("1970-01-02")]).unwrap(),
            Value::Number(86_400_000.0)
        );
        assert!(parse_time_eval(&[Value::from("yesterday")]).is_err());
    }

    #[test]
    fn test_format_date() {
        let out = format_date_eval(&[
            Value::from("2021-03-04T05:06:07Z"),
            Value::from("yyyy/MM/dd HH:mm:ss"),
        ])
        .unwrap();
        assert_eq!(out, Value::from("2021/03/04 05:06:07"));
    }

    #[test]
    fn test_now_format() {
        let Value::String(now) = now_eval(&[]).unwrap() else {
            panic!("now returned a non-string");
        };
        assert!(now.ends_with('Z'));
        assert!(parse_timestamp(&now).is_some());
    }
}
