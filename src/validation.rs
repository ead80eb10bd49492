//! Pure amount/term validation and form-text parsing
//!
//! These functions are stateless predicates run before any create/edit command
//! reaches the engine. Same input, same result; no I/O.
use crate::error::LifecycleError;

/// Minimum deposit amount in pesos.
pub const MIN_AMOUNT: u64 = 10_000;
pub const MIN_TERM_MONTHS: u32 = 1;
pub const MAX_TERM_MONTHS: u32 = 60;

pub fn validate_amount(amount: u64, min: u64) -> Result<(), LifecycleError> {
    if amount < min {
        return Err(LifecycleError::AmountTooLow { amount, min });
    }
    Ok(())
}

pub fn validate_term(term: u32, min: u32, max: u32) -> Result<(), LifecycleError> {
    if term < min || term > max {
        return Err(LifecycleError::TermOutOfRange { term, min, max });
    }
    Ok(())
}

/// Parse an amount as typed into a form field. Only whole base-10 numbers are
/// accepted; fractional or non-numeric text is refused.
pub fn parse_amount(input: &str) -> Result<u64, LifecycleError> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|_| LifecycleError::MalformedNumber {
            field: "amount",
            input: input.to_owned(),
        })
}

/// Parse a term in months as typed into a form field. Same contract as
/// [`parse_amount`]: whole numbers only.
pub fn parse_term(input: &str) -> Result<u32, LifecycleError> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| LifecycleError::MalformedNumber {
            field: "term_months",
            input: input.to_owned(),
        })
}
