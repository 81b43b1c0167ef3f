//! Card details as typed at checkout, and the checks they must pass before the
//! gateway is called.

use crate::market_actor::MarketError;
use crate::model::CardFingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
}

impl CardDetails {
    pub fn new(
        number: impl Into<String>,
        holder: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            holder: holder.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
        }
    }

    /// Checks the format of every field and reduces the card to what may be
    /// stored.
    ///
    /// The expiry is checked for shape only; whether it lies in the past is the
    /// gateway's call.
    pub fn validate(&self) -> Result<CardFingerprint, MarketError> {
        let digits: String = self
            .number
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(MarketError::InvalidPaymentDetails(
                "card number must be 16 digits".into(),
            ));
        }
        if self.holder.trim().is_empty() {
            return Err(MarketError::InvalidPaymentDetails(
                "card holder is required".into(),
            ));
        }
        if !valid_expiry(&self.expiry) {
            return Err(MarketError::InvalidPaymentDetails(
                "expiry must be MM/YY".into(),
            ));
        }
        if !(3..=4).contains(&self.cvv.len()) || !self.cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(MarketError::InvalidPaymentDetails(
                "cvv must be 3 or 4 digits".into(),
            ));
        }

        Ok(CardFingerprint {
            last4: digits[12..].to_string(),
            expiry: self.expiry.clone(),
        })
    }
}

fn valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}

// Never print the number or the cvv, even at debug level.
impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail: String = self
            .number
            .chars()
            .filter(|c| c.is_ascii_digit())
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        f.debug_struct("CardDetails")
            .field("number", &format_args!("****{tail}"))
            .field("holder", &self.holder)
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_card_keeps_only_fingerprint() {
        let card = CardDetails::new("4242 4242-4242 1234", "Alice", "09/27", "123");
        let fingerprint = card.validate().unwrap();
        assert_eq!(fingerprint.last4, "1234");
        assert_eq!(fingerprint.expiry, "09/27");
    }

    #[test]
    fn test_rejects_malformed_fields() {
        let cases = [
            CardDetails::new("4242", "Alice", "09/27", "123"),
            CardDetails::new("4242 4242 4242 424x", "Alice", "09/27", "123"),
            CardDetails::new("4242424242424242", "  ", "09/27", "123"),
            CardDetails::new("4242424242424242", "Alice", "13/27", "123"),
            CardDetails::new("4242424242424242", "Alice", "0927", "123"),
            CardDetails::new("4242424242424242", "Alice", "09/27", "12"),
            CardDetails::new("4242424242424242", "Alice", "09/27", "12a4"),
        ];
        for card in cases {
            assert!(
                matches!(card.validate(), Err(MarketError::InvalidPaymentDetails(_))),
                "{card:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_debug_redacts_number_and_cvv() {
        let card = CardDetails::new("4242424242421234", "Alice", "09/27", "987");
        let printed = format!("{card:?}");
        assert!(printed.contains("****1234"));
        assert!(!printed.contains("4242"));
        assert!(!printed.contains("987"));
    }
}
