//! Message body rendering.
//!
//! Without a template the arguments are joined with single spaces. With a
//! template, printf-style verbs consume arguments left to right. Rendering
//! never fails: a verb that does not fit its operand, a missing operand and
//! surplus operands are all rendered inline as diagnostics.
//!
//! | Verb | Operands |
//! |------|----------|
//! | `%v` | any, default form |
//! | `%s` | any, default form, precision truncates |
//! | `%d` | int, uint |
//! | `%b %o %x %X` | int, uint; `%x %X` also hex-encode text |
//! | `%f %F %e %E %g %G` | float |
//! | `%c` | char, int, uint |
//! | `%q` | text and char, quoted |
//! | `%t` | bool |
//! | `%%` | literal percent, consumes nothing |
//!
//! Widths and precisions above 1000000 are ignored and reported as
//! `%!(BADWIDTH)` or `%!(BADPREC)` ahead of the rendered operand.

use crate::value::Value;
use std::fmt::{self, Write};
use std::iter::Peekable;
use std::str::Chars;

/// Largest accepted width or precision.
const MAX_WIDTH_OR_PRECISION: usize = 1_000_000;

/// Fractional digits past this are always zero for an `f64`, so they are
/// padded instead of asking `fmt` for them.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// `fmt::Write` adapter over a byte buffer.
pub(crate) struct ByteWriter<'a>(pub(crate) &'a mut Vec<u8>);

impl Write for ByteWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// Append the arguments' default forms separated by single spaces.
pub fn sprint(out: &mut Vec<u8>, args: &[Value]) {
    let mut w = ByteWriter(out);
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            w.0.push(b' ');
        }
        let _ = write!(w, "{}", arg);
    }
}

/// Append `template` with each verb replaced by the next argument.
pub fn sprintf(out: &mut Vec<u8>, template: &str, args: &[Value]) {
    let mut w = ByteWriter(out);
    let mut chars = template.chars().peekable();
    let mut next_arg = 0;

    while let Some(c) = chars.next() {
        if c != '%' {
            let _ = w.write_char(c);
            continue;
        }

        let spec = Spec::parse(&mut chars);
        if spec.bad_width {
            let _ = w.write_str("%!(BADWIDTH)");
        }
        if spec.bad_precision {
            let _ = w.write_str("%!(BADPREC)");
        }
        let verb = match chars.next() {
            Some(verb) => verb,
            None => {
                let _ = w.write_str("%!(NOVERB)");
                break;
            }
        };
        if verb == '%' {
            let _ = w.write_char('%');
            continue;
        }

        match args.get(next_arg) {
            Some(arg) => {
                next_arg += 1;
                match render_verb(verb, &spec, arg) {
                    Some(rendered) => spec.pad(&mut w, &rendered),
                    None => {
                        let _ = write!(w, "%!{}({}={})", verb, arg.type_name(), arg);
                    }
                }
            }
            None => {
                let _ = write!(w, "%!{}(MISSING)", verb);
            }
        }
    }

    if next_arg < args.len() {
        let _ = w.write_str("%!(EXTRA ");
        for (i, arg) in args[next_arg..].iter().enumerate() {
            if i > 0 {
                let _ = w.write_str(", ");
            }
            let _ = write!(w, "{}={}", arg.type_name(), arg);
        }
        let _ = w.write_char(')');
    }
}

/// Render a message body into a fresh string.
pub fn format_message(template: Option<&str>, args: &[Value]) -> String {
    let mut out = Vec::new();
    match template {
        Some(template) => sprintf(&mut out, template, args),
        None => sprint(&mut out, args),
    }
    // Both renderers only ever append UTF-8 text.
    String::from_utf8_lossy(&out).into_owned()
}

#[derive(Debug, Default)]
struct Spec {
    minus: bool,
    plus: bool,
    space: bool,
    zero: bool,
    sharp: bool,
    width: Option<usize>,
    precision: Option<usize>,
    bad_width: bool,
    bad_precision: bool,
}

impl Spec {
    fn parse(chars: &mut Peekable<Chars<'_>>) -> Self {
        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.minus = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                '0' => spec.zero = true,
                '#' => spec.sharp = true,
                _ => break,
            }
            chars.next();
        }
        match read_number(chars) {
            Some(width) if width > MAX_WIDTH_OR_PRECISION => spec.bad_width = true,
            width => spec.width = width,
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            match read_number(chars).unwrap_or(0) {
                p if p > MAX_WIDTH_OR_PRECISION => spec.bad_precision = true,
                p => spec.precision = Some(p),
            }
        }
        spec
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.plus {
            "+"
        } else if self.space {
            " "
        } else {
            ""
        }
    }

    fn pad(&self, w: &mut ByteWriter<'_>, rendered: &Rendered) {
        let body_len = rendered.sign.len() + rendered.digits.chars().count();
        let fill = self.width.unwrap_or(0).saturating_sub(body_len);

        if self.minus {
            let _ = w.write_str(rendered.sign);
            let _ = w.write_str(&rendered.digits);
            push_repeat(w, b' ', fill);
        } else if self.zero && rendered.numeric {
            let _ = w.write_str(rendered.sign);
            push_repeat(w, b'0', fill);
            let _ = w.write_str(&rendered.digits);
        } else {
            push_repeat(w, b' ', fill);
            let _ = w.write_str(rendered.sign);
            let _ = w.write_str(&rendered.digits);
        }
    }
}

struct Rendered {
    sign: &'static str,
    digits: String,
    numeric: bool,
}

impl Rendered {
    fn text(digits: String) -> Self {
        Self {
            sign: "",
            digits,
            numeric: false,
        }
    }

    fn number(sign: &'static str, digits: String) -> Self {
        Self {
            sign,
            digits,
            numeric: true,
        }
    }
}

fn read_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    value
}

fn push_repeat(w: &mut ByteWriter<'_>, byte: u8, n: usize) {
    let len = w.0.len();
    w.0.resize(len + n, byte);
}

fn render_verb(verb: char, spec: &Spec, arg: &Value) -> Option<Rendered> {
    match (verb, arg) {
        ('v', Value::Float(f)) => Some(float_fixed_or_default(spec, *f)),
        ('v', Value::Int(i)) => Some(signed(spec, *i)),
        ('v', Value::Uint(u)) => Some(Rendered::number(spec.sign(false), u.to_string())),
        ('v', other) => Some(Rendered::text(other.to_string())),

        ('s', other) => {
            let s = other.to_string();
            Some(Rendered::text(match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s,
            }))
        }

        ('d', Value::Int(i)) => Some(signed(spec, *i)),
        ('d', Value::Uint(u)) => Some(Rendered::number(spec.sign(false), u.to_string())),

        ('b' | 'o' | 'x' | 'X', Value::Int(i)) => {
            Some(radix(spec, verb, *i < 0, i.unsigned_abs()))
        }
        ('b' | 'o' | 'x' | 'X', Value::Uint(u)) => Some(radix(spec, verb, false, *u)),
        ('x' | 'X', text) if text.is_textual() => {
            let mut hex = String::new();
            for byte in text.to_string().bytes() {
                let _ = if verb == 'x' {
                    write!(hex, "{:02x}", byte)
                } else {
                    write!(hex, "{:02X}", byte)
                };
            }
            Some(Rendered::text(hex))
        }

        ('f' | 'F', Value::Float(f)) => {
            let p = spec.precision.unwrap_or(6);
            Some(Rendered::number(
                spec.sign(f.is_sign_negative()),
                fixed(p, f.abs()),
            ))
        }
        ('e' | 'E', Value::Float(f)) => {
            let p = spec.precision.unwrap_or(6);
            let digits = exponent(p, f.abs());
            let digits = if verb == 'E' {
                digits.to_uppercase()
            } else {
                digits
            };
            Some(Rendered::number(spec.sign(f.is_sign_negative()), digits))
        }
        ('g' | 'G', Value::Float(f)) => Some(float_fixed_or_default(spec, *f)),

        ('c', Value::Char(c)) => Some(Rendered::text(c.to_string())),
        ('c', Value::Int(i)) => Some(Rendered::text(code_point(*i as i128))),
        ('c', Value::Uint(u)) => Some(Rendered::text(code_point(*u as i128))),

        ('q', Value::Char(c)) => Some(Rendered::text(format!("{:?}", c))),
        ('q', text) if text.is_textual() => {
            Some(Rendered::text(format!("{:?}", text.to_string())))
        }

        ('t', Value::Bool(b)) => Some(Rendered::text(b.to_string())),

        _ => None,
    }
}

fn signed(spec: &Spec, i: i64) -> Rendered {
    Rendered::number(spec.sign(i < 0), i.unsigned_abs().to_string())
}

fn radix(spec: &Spec, verb: char, negative: bool, magnitude: u64) -> Rendered {
    let (prefix, digits) = match verb {
        'b' => ("0b", format!("{:b}", magnitude)),
        'o' => ("0", format!("{:o}", magnitude)),
        'x' => ("0x", format!("{:x}", magnitude)),
        _ => ("0X", format!("{:X}", magnitude)),
    };
    let digits = if spec.sharp {
        format!("{}{}", prefix, digits)
    } else {
        digits
    };
    Rendered::number(spec.sign(negative), digits)
}

fn float_fixed_or_default(spec: &Spec, f: f64) -> Rendered {
    let digits = match spec.precision {
        Some(p) => fixed(p, f.abs()),
        None => format!("{}", f.abs()),
    };
    Rendered::number(spec.sign(f.is_sign_negative()), digits)
}

/// Fixed-point with `precision` fractional digits.
fn fixed(precision: usize, f: f64) -> String {
    let mut digits = format!("{:.*}", precision.min(EXACT_FRACTION_DIGITS), f);
    if f.is_finite() {
        pad_zeros(&mut digits, precision.saturating_sub(EXACT_FRACTION_DIGITS));
    }
    digits
}

fn pad_zeros(digits: &mut String, n: usize) {
    digits.extend(std::iter::repeat('0').take(n));
}

/// Scientific notation with a signed, at least two-digit exponent: `1.5e+03`.
fn exponent(precision: usize, f: f64) -> String {
    let raw = format!("{:.*e}", precision.min(EXACT_FRACTION_DIGITS), f);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let mut mantissa = mantissa.to_string();
            pad_zeros(
                &mut mantissa,
                precision.saturating_sub(EXACT_FRACTION_DIGITS),
            );
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        // NaN and inf carry no exponent
        None => raw,
    }
}

fn code_point(v: i128) -> String {
    u32::try_from(v)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
        .to_string()
}
