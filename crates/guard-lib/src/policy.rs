// ============================
// guard-lib/src/policy.rs
// ============================
//! Password-strength evaluation.
//!
//! Pure functions: no I/O, no clocks, no side effects. Every rule is checked
//! independently and all violated rules are reported together, so a form can
//! show the user the complete list in one round trip.
use crate::config::PasswordRequirements;
use passguard_common::Violation;

/// Evaluate a candidate password against the requirements.
///
/// An empty candidate yields no violations: on a profile form a blank field
/// means "keep the current password", and whether blank is acceptable at all
/// is a required-field decision that belongs to the caller, not to this
/// policy.
///
/// Length is measured in Unicode scalar values, not bytes; uppercase is
/// Unicode-aware, so `Ž` satisfies the uppercase rule; any character outside
/// ASCII `[A-Za-z0-9]` counts as special, including non-ASCII letters.
pub fn evaluate_password(password: &str, requirements: &PasswordRequirements) -> Vec<Violation> {
    if password.is_empty() {
        return Vec::new();
    }

    let mut violations = Vec::new();

    if password.chars().count() < requirements.min_length {
        violations.push(Violation::TooShort);
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        violations.push(Violation::MissingUppercase);
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(Violation::MissingDigit);
    }

    if requirements.require_special && password.chars().all(|c| c.is_ascii_alphanumeric()) {
        violations.push(Violation::MissingSpecial);
    }

    violations
}

/// Hint text shown next to password fields.
pub fn password_hint(min_length: usize) -> String {
    format!(
        "Hint: Password must be at least {min_length} characters long and include \
         an uppercase letter, a number, and a special character."
    )
}
