//! Request validation.
//!
//! Structural and semantic checks applied before any lock is taken. A
//! validation failure is terminal for the request: no side effects occur.
//! CPF/CNPJ check-digit algorithms follow the Receita Federal rules.

use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::money::MAX_TRANSFER_CENTS;
use crate::domain::PixKeyType;

/// Closed set of request-shape failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("amount must be a positive number of cents")]
    NonPositiveAmount,

    #[error("amount exceeds the per-operation ceiling")]
    AmountTooLarge,

    #[error("pix key must not be empty")]
    EmptyPixKey,

    #[error("invalid CPF")]
    InvalidCpf,

    #[error("invalid CNPJ")]
    InvalidCnpj,

    #[error("invalid e-mail address")]
    InvalidEmail,

    #[error("invalid phone number")]
    InvalidPhone,

    #[error("invalid random pix key")]
    InvalidRandomKey,

    #[error("invalid bank account data: {0}")]
    InvalidBankData(&'static str),
}

/// Amount must be positive and within the absolute ceiling.
pub fn validate_amount(amount_cents: i64) -> Result<(), ValidationError> {
    if amount_cents <= 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    if amount_cents > MAX_TRANSFER_CENTS {
        return Err(ValidationError::AmountTooLarge);
    }
    Ok(())
}

/// Validate a PIX key against the format its type demands.
pub fn validate_pix_key(key: &str, key_type: PixKeyType) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::EmptyPixKey);
    }

    match key_type {
        PixKeyType::Cpf => validate_cpf(key),
        PixKeyType::Cnpj => validate_cnpj(key),
        PixKeyType::Email => validate_email(key),
        PixKeyType::Phone => validate_phone(key),
        PixKeyType::Random => validate_random_key(key),
    }
}

fn digits_only(s: &str) -> Vec<u32> {
    s.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn mod11_check_digit(sum: u32) -> u32 {
    let remainder = sum % 11;
    if remainder >= 2 {
        11 - remainder
    } else {
        0
    }
}

/// Validate a Brazilian CPF (11 digits plus two check digits).
pub fn validate_cpf(cpf: &str) -> Result<(), ValidationError> {
    let digits = digits_only(cpf);

    if digits.len() != 11 {
        return Err(ValidationError::InvalidCpf);
    }

    // CPFs made of a single repeated digit pass the check-digit math but
    // are explicitly invalid.
    if digits.iter().all(|&d| d == digits[0]) {
        return Err(ValidationError::InvalidCpf);
    }

    let sum: u32 = digits[..9]
        .iter()
        .enumerate()
        .map(|(i, &d)| d * (10 - i as u32))
        .sum();
    if digits[9] != mod11_check_digit(sum) {
        return Err(ValidationError::InvalidCpf);
    }

    let sum: u32 = digits[..10]
        .iter()
        .enumerate()
        .map(|(i, &d)| d * (11 - i as u32))
        .sum();
    if digits[10] != mod11_check_digit(sum) {
        return Err(ValidationError::InvalidCpf);
    }

    Ok(())
}

const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Validate a Brazilian CNPJ (12 digits plus two check digits).
pub fn validate_cnpj(cnpj: &str) -> Result<(), ValidationError> {
    let digits = digits_only(cnpj);

    if digits.len() != 14 {
        return Err(ValidationError::InvalidCnpj);
    }

    if digits.iter().all(|&d| d == digits[0]) {
        return Err(ValidationError::InvalidCnpj);
    }

    let sum: u32 = digits[..12]
        .iter()
        .zip(CNPJ_WEIGHTS_1)
        .map(|(&d, w)| d * w)
        .sum();
    if digits[12] != mod11_check_digit(sum) {
        return Err(ValidationError::InvalidCnpj);
    }

    let sum: u32 = digits[..13]
        .iter()
        .zip(CNPJ_WEIGHTS_2)
        .map(|(&d, w)| d * w)
        .sum();
    if digits[13] != mod11_check_digit(sum) {
        return Err(ValidationError::InvalidCnpj);
    }

    Ok(())
}

/// Minimal e-mail shape check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail);
    }
    if email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate a Brazilian phone number: country code 55 followed by an area
/// code and a 10-11 digit subscriber number. Accepts `+`, spaces, dashes
/// and parentheses as formatting.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let cleaned: String = phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone);
    }

    let national = cleaned
        .strip_prefix("55")
        .ok_or(ValidationError::InvalidPhone)?;
    if national.len() < 10 || national.len() > 11 {
        return Err(ValidationError::InvalidPhone);
    }

    Ok(())
}

/// Random PIX keys are opaque UUIDs.
pub fn validate_random_key(key: &str) -> Result<(), ValidationError> {
    Uuid::from_str(key)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidRandomKey)
}

/// Validate TED routing data: recipient name, CPF/CNPJ document, 3-digit
/// bank code, 4-5 digit branch, up to 12-digit account, account type.
pub fn validate_ted(
    recipient_name: &str,
    recipient_document: &str,
    recipient_bank: &str,
    recipient_branch: &str,
    recipient_account: &str,
    recipient_account_type: &str,
) -> Result<(), ValidationError> {
    if recipient_name.trim().is_empty() {
        return Err(ValidationError::InvalidBankData("recipient_name"));
    }

    if validate_cpf(recipient_document).is_err() && validate_cnpj(recipient_document).is_err() {
        return Err(ValidationError::InvalidBankData("recipient_document"));
    }

    if recipient_bank.len() != 3 || !recipient_bank.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidBankData("recipient_bank"));
    }

    let branch_digits = digits_only(recipient_branch);
    if branch_digits.len() < 4 || branch_digits.len() > 5 {
        return Err(ValidationError::InvalidBankData("recipient_branch"));
    }

    let account_digits = digits_only(recipient_account);
    if account_digits.is_empty() || account_digits.len() > 12 {
        return Err(ValidationError::InvalidBankData("recipient_account"));
    }

    if recipient_account_type != "checking" && recipient_account_type != "savings" {
        return Err(ValidationError::InvalidBankData("recipient_account_type"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_bounds() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(MAX_TRANSFER_CENTS).is_ok());
        assert_eq!(validate_amount(0), Err(ValidationError::NonPositiveAmount));
        assert_eq!(validate_amount(-5), Err(ValidationError::NonPositiveAmount));
        assert_eq!(
            validate_amount(MAX_TRANSFER_CENTS + 1),
            Err(ValidationError::AmountTooLarge)
        );
    }

    #[test]
    fn test_valid_cpf() {
        assert!(validate_cpf("52998224725").is_ok());
        // Formatting characters are stripped before the check.
        assert!(validate_cpf("529.982.247-25").is_ok());
    }

    #[test]
    fn test_invalid_cpf() {
        assert_eq!(validate_cpf("52998224724"), Err(ValidationError::InvalidCpf));
        assert_eq!(validate_cpf("11111111111"), Err(ValidationError::InvalidCpf));
        assert_eq!(validate_cpf("123"), Err(ValidationError::InvalidCpf));
        assert_eq!(validate_cpf(""), Err(ValidationError::InvalidCpf));
    }

    #[test]
    fn test_valid_cnpj() {
        assert!(validate_cnpj("11222333000181").is_ok());
        assert!(validate_cnpj("11.222.333/0001-81").is_ok());
    }

    #[test]
    fn test_invalid_cnpj() {
        assert_eq!(
            validate_cnpj("11222333000182"),
            Err(ValidationError::InvalidCnpj)
        );
        assert_eq!(
            validate_cnpj("00000000000000"),
            Err(ValidationError::InvalidCnpj)
        );
        assert_eq!(validate_cnpj("1122233300018"), Err(ValidationError::InvalidCnpj));
    }

    #[test]
    fn test_email() {
        assert!(validate_email("maria@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.com.br").is_ok());
        assert_eq!(validate_email("not-an-email"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("@example.com"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("user@"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("user@nodot"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("+5511999999999").is_ok());
        assert!(validate_phone("5511999999999").is_ok());
        assert!(validate_phone("+55 (11) 99999-9999").is_ok());
        // Area code + 8-digit landline.
        assert!(validate_phone("551133334444").is_ok());
        assert_eq!(validate_phone("11999999999"), Err(ValidationError::InvalidPhone));
        assert_eq!(validate_phone("+551199"), Err(ValidationError::InvalidPhone));
        assert_eq!(
            validate_phone("+55119999999990000"),
            Err(ValidationError::InvalidPhone)
        );
    }

    #[test]
    fn test_random_key() {
        assert!(validate_random_key("123e4567-e89b-12d3-a456-426614174000").is_ok());
        assert_eq!(
            validate_random_key("not-a-uuid"),
            Err(ValidationError::InvalidRandomKey)
        );
    }

    #[test]
    fn test_pix_key_dispatch() {
        assert!(validate_pix_key("52998224725", PixKeyType::Cpf).is_ok());
        assert!(validate_pix_key("maria@example.com", PixKeyType::Email).is_ok());
        assert_eq!(
            validate_pix_key("", PixKeyType::Email),
            Err(ValidationError::EmptyPixKey)
        );
        assert_eq!(
            validate_pix_key("   ", PixKeyType::Cpf),
            Err(ValidationError::EmptyPixKey)
        );
        assert_eq!(
            validate_pix_key("maria@example.com", PixKeyType::Cpf),
            Err(ValidationError::InvalidCpf)
        );
    }

    #[test]
    fn test_ted_data() {
        assert!(validate_ted(
            "Maria Silva",
            "52998224725",
            "341",
            "1234",
            "567890",
            "checking",
        )
        .is_ok());
        // CNPJ documents are accepted too.
        assert!(validate_ted(
            "ACME Ltda",
            "11222333000181",
            "001",
            "4321-5",
            "12345-6",
            "savings",
        )
        .is_ok());
    }

    #[test]
    fn test_ted_data_rejections() {
        let ok = ("Maria Silva", "52998224725", "341", "1234", "567890", "checking");

        assert_eq!(
            validate_ted("  ", ok.1, ok.2, ok.3, ok.4, ok.5),
            Err(ValidationError::InvalidBankData("recipient_name"))
        );
        assert_eq!(
            validate_ted(ok.0, "12345678901", ok.2, ok.3, ok.4, ok.5),
            Err(ValidationError::InvalidBankData("recipient_document"))
        );
        assert_eq!(
            validate_ted(ok.0, ok.1, "34", ok.3, ok.4, ok.5),
            Err(ValidationError::InvalidBankData("recipient_bank"))
        );
        assert_eq!(
            validate_ted(ok.0, ok.1, ok.2, "123", ok.4, ok.5),
            Err(ValidationError::InvalidBankData("recipient_branch"))
        );
        assert_eq!(
            validate_ted(ok.0, ok.1, ok.2, ok.3, "1234567890123", ok.5),
            Err(ValidationError::InvalidBankData("recipient_account"))
        );
        assert_eq!(
            validate_ted(ok.0, ok.1, ok.2, ok.3, ok.4, "investment"),
            Err(ValidationError::InvalidBankData("recipient_account_type"))
        );
    }
}
