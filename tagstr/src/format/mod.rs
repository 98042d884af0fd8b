mod spec;

use thiserror::Error;

use crate::interpolation::Conversion;
use crate::value::Value;

pub use spec::{Align, FormatSpec, Sign};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid format specifier {spec:?}: {reason}")]
    InvalidSpec { spec: String, reason: String },
    #[error("unknown format code '{code}' for value of type {type_name}")]
    UnknownCode { code: char, type_name: &'static str },
    #[error("precision not allowed in integer format specifier")]
    IntegerPrecision,
    #[error("bad conversion: {0:?}")]
    BadConversion(String),
}

/// Apply an interpolation's conversion and format spec to its value.
pub fn format_value(
    value: &Value,
    conversion: Option<Conversion>,
    spec: Option<&str>,
) -> Result<String, FormatError> {
    let converted;
    let value = match conversion {
        None => value,
        Some(Conversion::Str) => {
            converted = Value::Str(value.to_string());
            &converted
        }
        Some(Conversion::Repr) => {
            converted = Value::Str(value.repr());
            &converted
        }
        Some(Conversion::Ascii) => {
            converted = Value::Str(ascii(&value.repr()));
            &converted
        }
    };

    let spec = spec.unwrap_or("");
    if spec.is_empty() {
        return Ok(value.to_string());
    }
    let spec = FormatSpec::parse(spec)?;

    match value {
        Value::Str(s) => format_str(s, &spec),
        Value::Int(n) => format_int(*n, &spec),
        Value::Bool(b) => format_int(i64::from(*b), &spec),
        Value::Float(x) => format_float(*x, &spec),
        other => Err(FormatError::UnknownCode {
            code: spec.kind.unwrap_or('s'),
            type_name: other.type_name(),
        }),
    }
}

/// Escape every non-ASCII character as `\xhh`, `\uhhhh` or `\Uhhhhhhhh`.
pub fn ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code < 0x80 {
            out.push(c);
        } else if code <= 0xff {
            out.push_str(&format!("\\x{:02x}", code));
        } else if code <= 0xffff {
            out.push_str(&format!("\\u{:04x}", code));
        } else {
            out.push_str(&format!("\\U{:08x}", code));
        }
    }
    out
}

fn format_str(s: &str, spec: &FormatSpec) -> Result<String, FormatError> {
    match spec.kind {
        None | Some('s') => {}
        Some(code) => {
            return Err(FormatError::UnknownCode {
                code,
                type_name: "str",
            });
        }
    }
    let body: String = match spec.precision {
        Some(p) => s.chars().take(p).collect(),
        None => s.to_string(),
    };
    Ok(spec.pad("", &body, Align::Left))
}

fn sign_prefix(negative: bool, sign: Sign) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, Sign::Plus) => "+",
        (false, Sign::Space) => " ",
        (false, Sign::Minus) => "",
    }
}

fn format_int(n: i64, spec: &FormatSpec) -> Result<String, FormatError> {
    let kind = spec.kind.unwrap_or('d');
    if matches!(kind, 'e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') {
        return format_float(n as f64, spec);
    }
    if spec.precision.is_some() {
        return Err(FormatError::IntegerPrecision);
    }

    let magnitude = n.unsigned_abs();
    let (digits, prefix, group_every) = match kind {
        'd' | 'n' => (magnitude.to_string(), "", 3),
        'b' => (format!("{:b}", magnitude), "0b", 4),
        'o' => (format!("{:o}", magnitude), "0o", 4),
        'x' => (format!("{:x}", magnitude), "0x", 4),
        'X' => (format!("{:X}", magnitude), "0X", 4),
        'c' => {
            let c = u32::try_from(n)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| FormatError::InvalidSpec {
                    spec: "c".into(),
                    reason: format!("{} is not a valid character", n),
                })?;
            return Ok(spec.pad("", &c.to_string(), Align::Left));
        }
        code => {
            return Err(FormatError::UnknownCode {
                code,
                type_name: "int",
            });
        }
    };

    let digits = match spec.grouping {
        Some(sep) => group_digits(&digits, sep, group_every),
        None => digits,
    };
    let sign = format!(
        "{}{}",
        sign_prefix(n < 0, spec.sign),
        if spec.alternate { prefix } else { "" }
    );
    Ok(spec.pad(&sign, &digits, Align::Right))
}

fn format_float(x: f64, spec: &FormatSpec) -> Result<String, FormatError> {
    let upper = matches!(spec.kind, Some('E' | 'F' | 'G'));
    let sign = sign_prefix(x.is_sign_negative() && !x.is_nan(), spec.sign);
    let magnitude = x.abs();

    let body = if !magnitude.is_finite() {
        let word = if magnitude.is_nan() { "nan" } else { "inf" };
        if upper { word.to_uppercase() } else { word.to_string() }
    } else {
        match spec.kind {
            None => match spec.precision {
                Some(p) => general(magnitude, p, spec.alternate),
                None => Value::Float(magnitude).to_string(),
            },
            Some('f' | 'F') => format!("{:.*}", spec.precision.unwrap_or(6), magnitude),
            Some('e' | 'E') => {
                let s = scientific(magnitude, spec.precision.unwrap_or(6));
                if upper { s.to_uppercase() } else { s }
            }
            Some('g' | 'G') => {
                let s = general(magnitude, spec.precision.unwrap_or(6), spec.alternate);
                if upper { s.to_uppercase() } else { s }
            }
            Some('%') => format!("{:.*}%", spec.precision.unwrap_or(6), magnitude * 100.0),
            Some(code) => {
                return Err(FormatError::UnknownCode {
                    code,
                    type_name: "float",
                });
            }
        }
    };

    let body = match spec.grouping {
        Some(sep) if magnitude.is_finite() => {
            let split = body.find(|c: char| !c.is_ascii_digit()).unwrap_or(body.len());
            format!("{}{}", group_digits(&body[..split], sep, 3), &body[split..])
        }
        _ => body,
    };
    Ok(spec.pad(sign, &body, Align::Right))
}

/// `d.ddde+XX` with at least two exponent digits.
fn scientific(x: f64, precision: usize) -> String {
    let s = format!("{:.*e}", precision, x);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => s,
    }
}

/// The `g` presentation: fixed or scientific depending on the exponent,
/// with insignificant trailing zeros removed unless `alternate`.
fn general(x: f64, precision: usize, alternate: bool) -> String {
    let p = precision.max(1);
    if x == 0.0 {
        return if alternate {
            format!("{:.*}", p - 1, 0.0)
        } else {
            "0".to_string()
        };
    }
    let rounded = format!("{:.*e}", p - 1, x);
    let exp: i32 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let s = if exp >= -4 && exp < p as i32 {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        format!("{:.*}", decimals, x)
    } else {
        scientific(x, p - 1)
    };
    if alternate {
        return s;
    }
    strip_trailing_zeros(&s)
}

fn strip_trailing_zeros(s: &str) -> String {
    let (mantissa, exponent) = match s.find('e') {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, exponent)
}

fn group_digits(digits: &str, sep: char, every: usize) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / every);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % every == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}
