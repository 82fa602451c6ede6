use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Largest magnitude at which every integral `f64` is exactly representable.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Number,
    Text,
}

/// Every field accepted by the model service's `/predict` route, with the
/// scalar type it must arrive as. Names and capitalization are the wire contract.
pub const INFERENCE_FIELDS: &[(&str, Scalar)] = &[
    ("gender", Scalar::Text),
    ("SeniorCitizen", Scalar::Number),
    ("Partner", Scalar::Text),
    ("Dependents", Scalar::Text),
    ("tenure", Scalar::Number),
    ("PhoneService", Scalar::Text),
    ("MultipleLines", Scalar::Text),
    ("InternetService", Scalar::Text),
    ("OnlineSecurity", Scalar::Text),
    ("OnlineBackup", Scalar::Text),
    ("DeviceProtection", Scalar::Text),
    ("TechSupport", Scalar::Text),
    ("StreamingTV", Scalar::Text),
    ("StreamingMovies", Scalar::Text),
    ("Contract", Scalar::Text),
    ("PaperlessBilling", Scalar::Text),
    ("PaymentMethod", Scalar::Text),
    ("MonthlyCharges", Scalar::Number),
    ("TotalCharges", Scalar::Number),
];

pub fn scalar_for(field: &str) -> Option<Scalar> {
    INFERENCE_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, kind)| *kind)
}

pub fn coerce(kind: Scalar, value: &Value) -> Value {
    match kind {
        Scalar::Number => number_value(to_number(value)),
        Scalar::Text => Value::String(to_text(value)),
    }
}

/// Coerce a record in place: schema fields get their declared scalar type,
/// anything else only loses a single-element array wrapper.
pub fn sanitize(record: &mut Map<String, Value>) {
    for (name, value) in record.iter_mut() {
        *value = match scalar_for(name) {
            Some(kind) => coerce(kind, value),
            None => unwrap_singleton(value.take()),
        };
    }
}

fn unwrap_singleton(value: Value) -> Value {
    match value {
        Value::Array(items) if items.len() == 1 => items.into_iter().next().unwrap_or_default(),
        other => other,
    }
}

/// Numeric coercion. Total: anything unparseable becomes NaN.
///
/// Arrays go through their text form, so `[8]` is `8`, `[]` is `0` and
/// `[1, 2]` is NaN.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_number(s),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(_) => parse_number(&to_text(value)),
        Value::Object(_) => f64::NAN,
    }
}

pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), number_text),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Shortest round-trip digits, positional between 1e-7 and 1e21 and
/// exponent notation (`1e+21`, `1.5e-7`) outside that range.
fn number_text(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let sci = format!("{:e}", value.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    // value = 0.<digits> * 10^point
    let point = exponent + 1;
    let len = digits.len() as i32;

    let body = if len <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - len) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let (lead, rest) = digits.split_at(1);
        let rest = if rest.is_empty() { String::new() } else { format!(".{rest}") };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{lead}{rest}e{exp_sign}{}", exponent.abs())
    };
    format!("{sign}{body}")
}

fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    // f64::from_str also takes "inf" and "nan", which are not numbers here
    let plain = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !plain {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

/// JSON form of a coerced number: integral values as integers, non-finite as null.
pub fn number_value(value: f64) -> Value {
    if !value.is_finite() {
        return Value::Null;
    }
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return Value::from(value as i64);
    }
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize_number<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    number_value(*value).serialize(serializer)
}
