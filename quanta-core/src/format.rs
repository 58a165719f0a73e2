//! Number formatting for magnitudes
//!
//! Exact numbers render like C's `%g`. Uncertain numbers use the concise
//! parenthetical notation: `2.334(20)e+01` means `23.34 ± 0.20`.

use crate::Magnitude;

/// Default number of significant digits
pub const DEFAULT_PRECISION: usize = 6;

/// Digits kept for the error in parenthetical notation
const ERROR_DIGITS: i32 = 2;

/// Array elements shown before the ellipsis
const SHOWN_ELEMENTS: usize = 2;

/// Format like `printf("%.*g", precision, x)`
pub fn format_general(x: f64, precision: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, x);
    let (mantissa, exponent) = split_exponent(&sci);

    if exponent < -4 || exponent >= precision as i32 {
        format!("{}{}", strip_zeros(mantissa), exponent_suffix(exponent))
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, x)).to_string()
    }
}

/// Format a value with its error in parenthetical notation
///
/// The error is shown with two digits in units of the last digit of the
/// value. Values whose exponent is not zero get an `e±XX` suffix.
pub fn format_uncertain(value: f64, error: f64, precision: usize) -> String {
    if error == 0.0 || !error.is_finite() || !value.is_finite() {
        return format_general(value, precision);
    }

    let exp_e = error.abs().log10().floor() as i32;
    let exp_v = if value == 0.0 {
        exp_e
    } else {
        value.abs().log10().floor() as i32
    };

    let max_decimals = (precision.max(1) as i32 - 1).max(0);
    let decimals = (exp_v - exp_e + ERROR_DIGITS - 1).clamp(0, max_decimals);

    let scale = 10f64.powi(exp_v);
    let mut mantissa = value / scale;
    let mut exp_v = exp_v;
    // rounding may carry into a new leading digit (9.996 -> 10.00)
    let rounded = format!("{:.*}", decimals as usize, mantissa);
    if rounded.trim_start_matches('-').starts_with("10") {
        exp_v += 1;
        mantissa /= 10.0;
    }

    let last_digit = 10f64.powi(exp_v - decimals);
    let error_digits = (error / last_digit).round() as u64;

    let suffix = if exp_v == 0 { String::new() } else { exponent_suffix(exp_v) };
    format!(
        "{:.*}({}){}",
        decimals as usize, mantissa, error_digits, suffix
    )
}

/// Format one element, choosing the notation by its error
pub fn format_element(value: f64, error: f64, precision: usize) -> String {
    if error == 0.0 {
        format_general(value, precision)
    } else {
        format_uncertain(value, error, precision)
    }
}

/// Format a magnitude; arrays show the first elements followed by `...`
pub fn format_magnitude(magnitude: &Magnitude, precision: usize) -> String {
    let values = magnitude.value();
    let errors = magnitude.error();
    if values.len() == 1 {
        return format_element(values.at(0), errors.at(0), precision);
    }

    let mut parts: Vec<String> = (0..values.len().min(SHOWN_ELEMENTS))
        .map(|i| format_element(values.at(i), errors.at(i), precision))
        .collect();
    if values.len() > SHOWN_ELEMENTS {
        parts.push("...".to_string());
    }
    format!("{{{}}}", parts.join(", "))
}

fn split_exponent(sci: &str) -> (&str, i32) {
    match sci.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (sci, 0),
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn exponent_suffix(exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("e{}{:02}", sign, exponent.abs())
}
