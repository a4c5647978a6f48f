//! Canonical number formatting.
//!
//! Every numeric input funnels through one textual canonicalizer: integers
//! keep plain decimal digits, floats are reduced to their shortest
//! round-trip decimal first, and decimal literals are validated against the
//! JSON number grammar before being re-split. Integral values use the
//! integer grammar (`-?[1-9][0-9]*` or `0`); everything else is normalized
//! to a single-nonzero-digit significand with an explicit exponent, like
//! `2.5E-2`.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::Error;

/// Exponent magnitudes beyond this are rejected outright; no meaningful
/// input gets anywhere near it, and it keeps the scale arithmetic safe.
const EXPONENT_LIMIT: i64 = 1 << 60;

/// JSON number grammar (RFC 7159 section 6).
fn literal_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?$")
            .expect("invalid regex")
    })
}

/// Appends a signed integer in integer grammar.
pub(crate) fn append_int(buf: &mut Vec<u8>, value: i64) {
    let mut digits = itoa::Buffer::new();
    buf.extend_from_slice(digits.format(value).as_bytes());
}

/// Appends an unsigned integer in integer grammar.
pub(crate) fn append_uint(buf: &mut Vec<u8>, value: u64) {
    let mut digits = itoa::Buffer::new();
    buf.extend_from_slice(digits.format(value).as_bytes());
}

/// Appends the canonical form of a double. NaN and the infinities are
/// unsupported values.
pub(crate) fn append_float(buf: &mut Vec<u8>, value: f64) -> Result<(), Error> {
    if !value.is_finite() {
        return Err(Error::UnsupportedValue(format!("float {value}")));
    }
    let mut shortest = ryu::Buffer::new();
    let decimal = Decimal::parse(shortest.format_finite(value))
        .expect("shortest float form is a valid number lexeme");
    decimal.append_to(buf);
    Ok(())
}

/// Validates a decimal literal against the JSON number grammar and appends
/// its canonical form.
pub(crate) fn append_literal(buf: &mut Vec<u8>, literal: &str) -> Result<(), Error> {
    if !literal_pattern().is_match(literal) {
        return Err(Error::UnsupportedValue(format!(
            "invalid number literal {literal:?}"
        )));
    }
    let decimal = Decimal::parse(literal).ok_or_else(|| {
        Error::UnsupportedValue(format!("number literal {literal:?} out of range"))
    })?;
    decimal.append_to(buf);
    Ok(())
}

/// A decimal split into significant digits and scale: the value is
/// `0.<digits> * 10^point`. `digits` carries no leading or trailing
/// zeros; empty `digits` means the value is zero.
struct Decimal {
    negative: bool,
    digits: Vec<u8>,
    point: i64,
}

impl Decimal {
    /// Splits a validated JSON-number lexeme (ryu output included) into
    /// significand and scale. Returns `None` when the exponent leaves the
    /// working range.
    fn parse(text: &str) -> Option<Decimal> {
        let bytes = text.as_bytes();
        let mut pos = 0;
        let negative = bytes.first() == Some(&b'-');
        if negative {
            pos += 1;
        }

        let int_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let int_digits = &bytes[int_start..pos];

        let frac_digits = if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let frac_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            &bytes[frac_start..pos]
        } else {
            &bytes[pos..pos]
        };

        let mut exponent: i64 = 0;
        if matches!(bytes.get(pos), Some(&(b'e' | b'E'))) {
            pos += 1;
            let exponent_negative = match bytes.get(pos) {
                Some(&b'-') => {
                    pos += 1;
                    true
                }
                Some(&b'+') => {
                    pos += 1;
                    false
                }
                _ => false,
            };
            while pos < bytes.len() {
                let digit = i64::from(bytes[pos] - b'0');
                exponent = exponent.checked_mul(10)?.checked_add(digit)?;
                if exponent > EXPONENT_LIMIT {
                    return None;
                }
                pos += 1;
            }
            if exponent_negative {
                exponent = -exponent;
            }
        }

        let mut digits = Vec::with_capacity(int_digits.len() + frac_digits.len());
        digits.extend_from_slice(int_digits);
        digits.extend_from_slice(frac_digits);
        let mut point = exponent + int_digits.len() as i64;

        let leading = digits.iter().take_while(|digit| **digit == b'0').count();
        digits.drain(..leading);
        point -= leading as i64;
        while digits.last() == Some(&b'0') {
            digits.pop();
        }

        Some(Decimal {
            negative,
            digits,
            point,
        })
    }

    /// Emits the canonical form: integer grammar when every significant
    /// digit sits left of the decimal point, normalized exponent grammar
    /// otherwise.
    fn append_to(&self, buf: &mut Vec<u8>) {
        if self.digits.is_empty() {
            // negative zero folds into plain zero
            buf.push(b'0');
            return;
        }
        if self.negative {
            buf.push(b'-');
        }

        let width = self.digits.len() as i64;
        if width <= self.point {
            buf.extend_from_slice(&self.digits);
            for _ in width..self.point {
                buf.push(b'0');
            }
            return;
        }

        buf.push(self.digits[0]);
        buf.push(b'.');
        if self.digits.len() > 1 {
            buf.extend_from_slice(&self.digits[1..]);
        } else {
            // the decimal point needs at least one fractional digit
            buf.push(b'0');
        }
        buf.push(b'E');
        let exponent = self.point - 1;
        if exponent > 0 {
            buf.push(b'+');
        } else if exponent < 0 {
            buf.push(b'-');
        }
        let mut digits = itoa::Buffer::new();
        buf.extend_from_slice(digits.format(exponent.unsigned_abs()).as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float(value: f64) -> String {
        let mut buf = Vec::new();
        append_float(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn literal(text: &str) -> Result<String, Error> {
        let mut buf = Vec::new();
        append_literal(&mut buf, text)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn integers_use_plain_digits() {
        let mut buf = Vec::new();
        append_int(&mut buf, -123);
        append_uint(&mut buf, u64::MAX);
        assert_eq!(buf, b"-12318446744073709551615");
    }

    #[test]
    fn integral_floats_use_integer_grammar() {
        assert_eq!(float(0.0), "0");
        assert_eq!(float(-0.0), "0");
        assert_eq!(float(2500.0), "2500");
        assert_eq!(float(-42.0), "-42");
        assert_eq!(float(9007199254740992.0), "9007199254740992");
        assert_eq!(float(1e21), "1000000000000000000000");
    }

    #[test]
    fn fractional_floats_normalize() {
        assert_eq!(float(0.025), "2.5E-2");
        assert_eq!(float(2.5), "2.5E0");
        assert_eq!(float(-0.25), "-2.5E-1");
        assert_eq!(float(0.1), "1.0E-1");
        assert_eq!(float(123.4), "1.234E+2");
        assert_eq!(float(5e-324), "5.0E-324");
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        let mut buf = Vec::new();
        assert!(matches!(
            append_float(&mut buf, f64::NAN),
            Err(Error::UnsupportedValue(_))
        ));
        assert!(matches!(
            append_float(&mut buf, f64::INFINITY),
            Err(Error::UnsupportedValue(_))
        ));
        assert!(matches!(
            append_float(&mut buf, f64::NEG_INFINITY),
            Err(Error::UnsupportedValue(_))
        ));
    }

    #[test]
    fn literals_collapse_like_floats() {
        assert_eq!(literal("250e-2").unwrap(), "2.5E0");
        assert_eq!(literal("0.0250e-1").unwrap(), "2.5E-3");
        assert_eq!(literal("25.00e2").unwrap(), "2500");
        assert_eq!(literal("250.00").unwrap(), "250");
        assert_eq!(literal("-0").unwrap(), "0");
        assert_eq!(literal("0.0e99").unwrap(), "0");
        assert_eq!(literal("10").unwrap(), "10");
    }

    #[test]
    fn literals_keep_arbitrary_precision() {
        assert_eq!(
            literal("3.14159265358979323846264338327950288419716939937510582097494459").unwrap(),
            "3.14159265358979323846264338327950288419716939937510582097494459E0"
        );
        assert_eq!(
            literal("123456789012345678901234567890").unwrap(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn malformed_literals_are_rejected() {
        for bad in ["", "invalid", "01", "+1", "1.", ".5", "1e", "0x10", "1 "] {
            assert!(
                matches!(literal(bad), Err(Error::UnsupportedValue(_))),
                "literal {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn runaway_exponents_are_rejected() {
        assert!(matches!(
            literal("1e99999999999999999999"),
            Err(Error::UnsupportedValue(_))
        ));
    }
}
