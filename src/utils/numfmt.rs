//! Culture-invariant "general" number formatting.
//!
//! Symbol dumps print floating point constants the way the .NET runtime's invariant
//! culture `ToString()` does: at most 15 significant digits for `double` and 7 for
//! `float`, trailing zeros removed, scientific notation (`E+XX`, at least two exponent
//! digits) once the exponent reaches the precision or drops below -4.

/// Significant digits used for `double` constants.
pub const DOUBLE_PRECISION: usize = 15;

/// Significant digits used for `float` constants.
pub const SINGLE_PRECISION: usize = 7;

/// Format `value` with `precision` significant digits in general notation.
///
/// # Examples
///
/// ```rust
/// use symscope::utils::{format_general, DOUBLE_PRECISION};
///
/// assert_eq!(format_general(f64::MAX, DOUBLE_PRECISION), "1.79769313486232E+308");
/// assert_eq!(format_general(1.5, DOUBLE_PRECISION), "1.5");
/// assert_eq!(format_general(0.000_01, DOUBLE_PRECISION), "1E-05");
/// ```
#[must_use]
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let mut out = String::new();
    if value.is_sign_negative() {
        out.push('-');
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let use_scientific = exponent >= precision as i32 || exponent < -4;

    if use_scientific {
        out.push_str(&digits[..1]);
        if digits.len() > 1 {
            out.push('.');
            out.push_str(&digits[1..]);
        }
        out.push('E');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&format!("{:02}", exponent.unsigned_abs()));
    } else if exponent >= 0 {
        #[allow(clippy::cast_sign_loss)]
        let integral_len = exponent as usize + 1;
        if digits.len() <= integral_len {
            out.push_str(digits);
            out.extend(std::iter::repeat('0').take(integral_len - digits.len()));
        } else {
            out.push_str(&digits[..integral_len]);
            out.push('.');
            out.push_str(&digits[integral_len..]);
        }
    } else {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((exponent.unsigned_abs() - 1) as usize));
        out.push_str(digits);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_extremes() {
        assert_eq!(
            format_general(f64::MAX, DOUBLE_PRECISION),
            "1.79769313486232E+308"
        );
        assert_eq!(
            format_general(f64::MIN, DOUBLE_PRECISION),
            "-1.79769313486232E+308"
        );
        assert_eq!(
            format_general(f64::EPSILON, DOUBLE_PRECISION),
            "2.22044604925031E-16"
        );
    }

    #[test]
    fn float_extremes() {
        assert_eq!(
            format_general(f64::from(f32::MAX), SINGLE_PRECISION),
            "3.402823E+38"
        );
    }

    #[test]
    fn fixed_notation() {
        assert_eq!(format_general(100.0, DOUBLE_PRECISION), "100");
        assert_eq!(format_general(-2.25, DOUBLE_PRECISION), "-2.25");
        assert_eq!(format_general(0.0001, DOUBLE_PRECISION), "0.0001");
        assert_eq!(format_general(0.1, DOUBLE_PRECISION), "0.1");
        assert_eq!(format_general(1e14, DOUBLE_PRECISION), "100000000000000");
        assert_eq!(format_general(1e15, DOUBLE_PRECISION), "1E+15");
    }

    #[test]
    fn special_values() {
        assert_eq!(format_general(f64::NAN, DOUBLE_PRECISION), "NaN");
        assert_eq!(format_general(f64::INFINITY, DOUBLE_PRECISION), "Infinity");
        assert_eq!(
            format_general(f64::NEG_INFINITY, DOUBLE_PRECISION),
            "-Infinity"
        );
        assert_eq!(format_general(0.0, DOUBLE_PRECISION), "0");
    }
}
