use crate::model::{Status, StatusKind};

/// Pressure/temperature limits. Exceeding either limit of a band puts the
/// record in that band; critical is checked before warning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub critical_pressure: f64,
    pub critical_temp: f64,
    pub warning_pressure: f64,
    pub warning_temp: f64,
}

impl Thresholds {
    pub const DEFAULT: Thresholds = Thresholds {
        critical_pressure: 15.0,
        critical_temp: 130.0,
        warning_pressure: 9.0,
        warning_temp: 115.0,
    };

    /// Non-numeric readings count as 0, which keeps them out of the alert bands.
    pub fn classify(&self, pressure: &str, temp: &str) -> StatusKind {
        let pressure = leading_number(pressure).unwrap_or(0.0);
        let temp = leading_number(temp).unwrap_or(0.0);

        if pressure > self.critical_pressure || temp > self.critical_temp {
            StatusKind::Critical
        } else if pressure > self.warning_pressure || temp > self.warning_temp {
            StatusKind::Warning
        } else {
            StatusKind::Stable
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds::DEFAULT
    }
}

pub fn classify_readings(pressure: &str, temp: &str) -> StatusKind {
    Thresholds::DEFAULT.classify(pressure, temp)
}

/// Derive the status of one row.
///
/// `status_cell` is the value under a matched status header, `sixth_cell` the
/// value in positional slot 5. A supplied status is taken verbatim unless it
/// is a short number (fewer than 4 characters), in which case it is treated
/// as a stray reading and the status is recomputed from the thresholds.
pub fn classify_row(
    status_cell: Option<&str>,
    sixth_cell: Option<&str>,
    pressure: &str,
    temp: &str,
) -> Status {
    let supplied = match status_cell {
        Some(value) if !value.is_empty() => Some(value),
        _ => sixth_cell.filter(|value| leading_number(value).is_none() && value.chars().count() > 2),
    };

    match supplied {
        Some(text) if !is_stray_number(text) => Status::from_text(text),
        _ => Status::Known(classify_readings(pressure, temp)),
    }
}

fn is_stray_number(text: &str) -> bool {
    leading_number(text).is_some() && text.chars().count() < 4
}

/// Parse the longest numeric prefix of `text`, ignoring leading whitespace.
///
/// `"16 bar"` reads as 16 and `"3rd"` as 3; text without a leading number
/// yields `None`.
pub fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    if text[end..].starts_with("Infinity") {
        let sign = if text.starts_with('-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}
