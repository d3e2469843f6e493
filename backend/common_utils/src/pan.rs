//! PAN masking: provider payloads retained in logs mask the card number
//! to `first4********last4`. This is the one place that rule is
//! implemented; every other component calls through here rather than
//! re-deriving the mask.

use crate::consts::{MAX_CARD_NUMBER_LENGTH, MIN_CARD_NUMBER_LENGTH};

/// Masks a card number to `first4********last4`. Numbers shorter than the
/// minimum valid PAN length are masked entirely rather than risk leaking a
/// malformed-but-still-sensitive value.
pub fn mask_card_number(card_number: &str) -> String {
    let digits: String = card_number.chars().filter(char::is_ascii_digit).collect();
    let len = digits.len();

    if !(MIN_CARD_NUMBER_LENGTH..=MAX_CARD_NUMBER_LENGTH).contains(&len) {
        return "*".repeat(len.max(8));
    }

    let first4 = &digits[..4];
    let last4 = &digits[len - 4..];
    let masked_len = len - 8;
    format!("{first4}{}{last4}", "*".repeat(masked_len))
}

/// CVV is never retained anywhere, masked or not. This exists only so call
/// sites that build a log record from a full `PaymentRequest` have an
/// explicit, greppable elision point instead of silently omitting the
/// field.
pub fn elide_cvv() -> &'static str {
    "***"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_standard_pan() {
        assert_eq!(mask_card_number("5528790000000008"), "5528********0008");
    }

    #[test]
    fn masks_pan_with_spaces() {
        assert_eq!(mask_card_number("5528 7900 0000 0008"), "5528********0008");
    }

    #[test]
    fn masks_short_garbage_entirely() {
        assert_eq!(mask_card_number("123"), "********");
    }
}
