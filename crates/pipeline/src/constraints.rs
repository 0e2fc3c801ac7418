//! Business-constraint review of validated strategies.
//!
//! Runs after the schema gate, once per strategy. A failed review does
//! not fail the run; it is attached to the report so an operator can
//! see which recommendations violate campaign constraints.

use serde::{Deserialize, Serialize};

use palco_core::Strategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub budget: Option<f64>,
    /// Maximum currency discount an offer may carry.
    pub min_margin: Option<f64>,
    pub allowed_channels: Option<Vec<String>>,
    /// Venue capacity; a target segment may not exceed 80% of it.
    pub capacity: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintReview {
    pub title: String,
    pub ok: bool,
    pub reasons: Vec<String>,
}

/// Check one strategy against the run constraints.
pub fn review(strategy: &Strategy, constraints: &Constraints) -> ConstraintReview {
    let mut reasons = Vec::new();

    if let (Some(capacity), Some(size)) =
        (constraints.capacity, first_number(&strategy.target_segment))
    {
        let ceiling = (capacity as f64 * 0.8) as u64;
        if size > ceiling {
            reasons.push(format!(
                "segment size ({size}) exceeds 80% of venue capacity ({capacity})"
            ));
        }
    }

    if let (Some(min_margin), Some(discount)) =
        (constraints.min_margin, currency_amount(&strategy.offer.value))
    {
        if discount > min_margin {
            reasons.push(format!(
                "offer discount (R${discount}) exceeds the margin constraint (R${min_margin})"
            ));
        }
    }

    if let Some(allowed) = &constraints.allowed_channels {
        let invalid: Vec<&str> = strategy
            .channel
            .iter()
            .filter(|c| !allowed.contains(c))
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            reasons.push(format!("channels not allowed: {}", invalid.join(", ")));
        }
    }

    ConstraintReview { title: strategy.title.clone(), ok: reasons.is_empty(), reasons }
}

/// First run of digits in free text, e.g. the segment size in
/// "850 at-risk high spenders".
fn first_number(text: &str) -> Option<u64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Currency amount after an "R$" marker, e.g. 50 in "R$50 off".
fn currency_amount(text: &str) -> Option<f64> {
    let after = text.split("R$").nth(1)?;
    let digits: String = after
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}
