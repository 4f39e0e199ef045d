//! Token accounting for generation calls.
//!
//! Replies are billed by whitespace word count of the generator's text.
//! Balances live on user records; a call is refused up front when the
//! balance cannot cover even a minimal reply, and debits clamp at zero
//! so a balance never goes negative.

use thiserror::Error;

/// Smallest balance that still admits a generation call.
pub const MIN_TOKEN_BALANCE: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeterError {
    #[error(
        "not enough tokens to generate a response ({balance} left, {min} required)",
        min = MIN_TOKEN_BALANCE
    )]
    InsufficientTokens { balance: u64 },
}

/// Whitespace-separated word count, the billing basis for replies.
/// Empty and whitespace-only text costs nothing.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Gate a generation call on the caller's balance.
pub fn check_gate(balance: u64) -> Result<(), MeterError> {
    if balance < MIN_TOKEN_BALANCE {
        return Err(MeterError::InsufficientTokens { balance });
    }
    Ok(())
}

/// Subtract a reply's cost, clamping at zero.
pub fn debit(balance: u64, cost: u64) -> u64 {
    balance.saturating_sub(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t  "), 0);
        assert_eq!(count_words("one"), 1);
        assert_eq!(count_words("  split   on\nany\twhitespace "), 4);
    }

    #[test]
    fn test_gate_boundary() {
        assert_eq!(
            check_gate(9),
            Err(MeterError::InsufficientTokens { balance: 9 })
        );
        assert_eq!(check_gate(10), Ok(()));
        assert_eq!(check_gate(55_000), Ok(()));
    }

    #[test]
    fn test_debit_clamps_at_zero() {
        assert_eq!(debit(100, 30), 70);
        assert_eq!(debit(30, 100), 0);
        assert_eq!(debit(0, 1), 0);
    }

    #[test]
    fn test_gate_message_names_shortfall() {
        let err = check_gate(3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "not enough tokens to generate a response (3 left, 10 required)"
        );
    }
}
