// service/card_gateway.rs
//
// Simulated card processor. There is no external provider behind it; the
// outcome depends only on the card number:
//   4242 4242 4242 4242  -> approved
//   4000 ....            -> declined
use serde::Serialize;

use crate::dtos::paymentdtos::CardDetailsDto;

pub const DECLINED_PREFIX: &str = "4000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardDecision {
    pub approved: bool,
    pub message: String,
}

impl CardDecision {
    fn approved() -> Self {
        Self {
            approved: true,
            message: "Payment successful".to_string(),
        }
    }

    fn declined(message: &str) -> Self {
        Self {
            approved: false,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardGateway;

impl CardGateway {
    pub fn new() -> Self {
        Self
    }

    pub fn authorize(&self, card: &CardDetailsDto) -> CardDecision {
        let number = normalize_card_number(&card.card_number);

        if !(13..=19).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_digit()) {
            return CardDecision::declined("Invalid card number");
        }

        if number.starts_with(DECLINED_PREFIX) {
            return CardDecision::declined("Card declined");
        }

        if !luhn_valid(&number) {
            return CardDecision::declined("Invalid card number");
        }

        CardDecision::approved()
    }
}

/// Drops the spaces and dashes people type between digit groups.
pub fn normalize_card_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

pub fn luhn_valid(number: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
