//! Quantitative claim extraction
//!
//! A quantity is a number with an optional currency symbol and an optional
//! scale word or suffix (`5.5B`, `$1,200 million`, `12%`). Numbers glued to
//! identifiers (`Company_Y2`, `v3`) are not claims.

use once_cell::sync::Lazy;
use regex::Regex;

static QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<cur>[$€£])?(?P<num>\d+(?:,\d{3})*(?:\.\d+)?)(?:\s?(?P<unit>thousand|million|billion|trillion|bn|k|m|b|t)\b|(?P<pct>%))?",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    /// Matched text as it appeared
    pub text: String,
    /// Scaled value
    pub value: f64,
    pub percent: bool,
}

impl Quantity {
    /// Equal within a relative tolerance; percentages only match percentages
    pub fn approx_eq(&self, other: &Quantity, tolerance: f64) -> bool {
        if self.percent != other.percent {
            return false;
        }
        let scale = self.value.abs().max(other.value.abs());
        if scale == 0.0 {
            return true;
        }
        (self.value - other.value).abs() <= tolerance.max(f64::EPSILON) * scale
    }
}

fn scale_of(unit: &str) -> f64 {
    match unit.to_ascii_lowercase().as_str() {
        "k" | "thousand" => 1e3,
        "m" | "million" => 1e6,
        "b" | "bn" | "billion" => 1e9,
        "t" | "trillion" => 1e12,
        _ => 1.0,
    }
}

/// Extract every quantity in `text`, in order of appearance
pub fn extract_quantities(text: &str) -> Vec<Quantity> {
    let mut out = Vec::new();
    for caps in QUANTITY.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(num) = caps.name("num") else { continue };

        if caps.name("cur").is_none() {
            let glued = text[..num.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
            if glued {
                continue;
            }
        }

        let Ok(base) = num.as_str().replace(',', "").parse::<f64>() else {
            continue;
        };
        let scale = caps.name("unit").map(|u| scale_of(u.as_str())).unwrap_or(1.0);

        out.push(Quantity {
            text: whole.as_str().trim().to_string(),
            value: base * scale,
            percent: caps.name("pct").is_some(),
        });
    }
    out
}
