//! Fraud rules applied to every payment attempt.
//!
//! The engine is a pure fold over a static list of named rules; it never
//! declines anything. A hit only decorates the payment row, which keeps
//! flagged attempts visible in `/admin/flagged` while letting the
//! authorization flow proceed.

use api_models::enums::PaymentMethod;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::storage;

/// Flag amounts above this many minor units outright.
pub const HIGH_VALUE_THRESHOLD: i64 = 50_000;

/// Flag when a customer's combined spend in the window exceeds this.
pub const VELOCITY_THRESHOLD: i64 = 200_000;

/// Flag when a customer made more than this many attempts in the window.
pub const HIGH_FREQUENCY_THRESHOLD: usize = 5;

#[allow(clippy::expect_used)]
static VPA_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9._-]{2,}@[a-z]{2,}$").expect("static VPA pattern is valid")
});

/// The slice of an attempt the rules look at.
#[derive(Clone, Debug)]
pub struct FraudInput<'a> {
    pub amount: i64,
    pub method: PaymentMethod,
    pub vpa: Option<&'a str>,
}

/// The customer's payment attempts over the trailing window.
#[derive(Clone, Debug, Default)]
pub struct PaymentHistory {
    amounts: Vec<i64>,
}

impl PaymentHistory {
    pub fn from_payments(payments: &[storage::Payment]) -> Self {
        Self {
            amounts: payments.iter().map(|payment| payment.amount).collect(),
        }
    }

    fn attempt_count(&self) -> usize {
        self.amounts.len()
    }

    fn contains_amount(&self, amount: i64) -> bool {
        self.amounts.contains(&amount)
    }

    fn total_amount(&self) -> i64 {
        self.amounts.iter().sum()
    }
}

pub struct FraudRule {
    pub name: &'static str,
    check: fn(&FraudInput<'_>, &PaymentHistory) -> bool,
}

static RULES: &[FraudRule] = &[
    FraudRule {
        name: "high_value",
        check: |input, _| input.amount > HIGH_VALUE_THRESHOLD,
    },
    FraudRule {
        name: "duplicate_amount",
        check: |input, history| history.contains_amount(input.amount),
    },
    FraudRule {
        name: "high_frequency",
        check: |_, history| history.attempt_count() > HIGH_FREQUENCY_THRESHOLD,
    },
    FraudRule {
        name: "invalid_vpa",
        check: |input, _| {
            input.method == PaymentMethod::Upi
                && !input.vpa.is_some_and(|vpa| VPA_REGEX.is_match(vpa))
        },
    },
    FraudRule {
        name: "velocity",
        check: |input, history| history.total_amount() + input.amount > VELOCITY_THRESHOLD,
    },
];

#[derive(Clone, Debug, Default)]
pub struct FraudEvaluation {
    pub is_flagged: bool,
    pub rule_hits: Vec<String>,
}

/// Fold the rule list over one attempt and its history.
pub fn evaluate(input: &FraudInput<'_>, history: &PaymentHistory) -> FraudEvaluation {
    let rule_hits: Vec<String> = RULES
        .iter()
        .filter(|rule| (rule.check)(input, history))
        .map(|rule| rule.name.to_string())
        .collect();

    FraudEvaluation {
        is_flagged: !rule_hits.is_empty(),
        rule_hits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upi_input(amount: i64, vpa: &str) -> FraudInput<'_> {
        FraudInput {
            amount,
            method: PaymentMethod::Upi,
            vpa: Some(vpa),
        }
    }

    fn history_of(amounts: &[i64]) -> PaymentHistory {
        PaymentHistory {
            amounts: amounts.to_vec(),
        }
    }

    #[test]
    fn clean_attempt_is_not_flagged() {
        let evaluation = evaluate(&upi_input(49_900, "user@upi"), &PaymentHistory::default());
        assert!(!evaluation.is_flagged);
        assert!(evaluation.rule_hits.is_empty());
    }

    #[test]
    fn high_value_fires_above_threshold() {
        let evaluation = evaluate(&upi_input(75_000, "user@upi"), &PaymentHistory::default());
        assert!(evaluation.is_flagged);
        assert!(evaluation.rule_hits.contains(&"high_value".to_string()));
    }

    #[test]
    fn threshold_amount_itself_is_allowed() {
        let evaluation = evaluate(
            &upi_input(HIGH_VALUE_THRESHOLD, "user@upi"),
            &PaymentHistory::default(),
        );
        assert!(!evaluation.rule_hits.contains(&"high_value".to_string()));
    }

    #[test]
    fn duplicate_amount_fires_on_repeat() {
        let evaluation = evaluate(&upi_input(1_000, "user@upi"), &history_of(&[1_000]));
        assert!(evaluation.is_flagged);
        assert!(evaluation
            .rule_hits
            .contains(&"duplicate_amount".to_string()));
    }

    #[test]
    fn high_frequency_fires_past_five_attempts() {
        let evaluation = evaluate(
            &upi_input(10, "user@upi"),
            &history_of(&[1, 2, 3, 4, 5, 6]),
        );
        assert!(evaluation
            .rule_hits
            .contains(&"high_frequency".to_string()));

        let evaluation = evaluate(&upi_input(10, "user@upi"), &history_of(&[1, 2, 3, 4, 5]));
        assert!(!evaluation
            .rule_hits
            .contains(&"high_frequency".to_string()));
    }

    #[test]
    fn invalid_vpa_fires_on_malformed_and_missing() {
        let evaluation = evaluate(&upi_input(100, "not-a-vpa"), &PaymentHistory::default());
        assert!(evaluation.rule_hits.contains(&"invalid_vpa".to_string()));

        let missing = FraudInput {
            amount: 100,
            method: PaymentMethod::Upi,
            vpa: None,
        };
        let evaluation = evaluate(&missing, &PaymentHistory::default());
        assert!(evaluation.rule_hits.contains(&"invalid_vpa".to_string()));
    }

    #[test]
    fn vpa_match_is_case_insensitive() {
        let evaluation = evaluate(&upi_input(100, "User.Name@OkBank"), &PaymentHistory::default());
        assert!(!evaluation.rule_hits.contains(&"invalid_vpa".to_string()));
    }

    #[test]
    fn invalid_vpa_does_not_fire_for_cards() {
        let input = FraudInput {
            amount: 100,
            method: PaymentMethod::Card,
            vpa: None,
        };
        let evaluation = evaluate(&input, &PaymentHistory::default());
        assert!(!evaluation.rule_hits.contains(&"invalid_vpa".to_string()));
    }

    #[test]
    fn velocity_counts_the_current_attempt() {
        let evaluation = evaluate(&upi_input(60_000, "user@upi"), &history_of(&[150_000]));
        assert!(evaluation.rule_hits.contains(&"velocity".to_string()));

        let evaluation = evaluate(&upi_input(50_000, "user@upi"), &history_of(&[150_000]));
        assert!(!evaluation.rule_hits.contains(&"velocity".to_string()));
    }
}
