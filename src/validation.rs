//! Validation rules shared by the page forms.
//!
//! Every rule returns `None` when the value passes. Format rules treat an
//! empty value as passing so that they compose after `validate_required`.

use std::sync::LazyLock;

use regex::Regex;

use crate::form::{FieldErrors, FieldKey, FieldValue, FormModel};

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());
static DIGIT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[0-9]").ok());

/// Length in UTF-16 code units, the unit browsers use for input lengths.
pub fn text_length(value: &str) -> usize {
    value.encode_utf16().count()
}

pub fn validate_required(value: &str, label: &str) -> Option<String> {
    value
        .trim()
        .is_empty()
        .then(|| format!("{label} is required"))
}

pub fn validate_required_value(value: Option<&FieldValue>, label: &str) -> Option<String> {
    match value {
        Some(FieldValue::Text(text)) => validate_required(text, label),
        Some(FieldValue::Flag(true)) => None,
        Some(FieldValue::Flag(false)) | None => Some(format!("{label} is required")),
    }
}

pub fn validate_email(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    let matches = EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value));
    (!matches).then(|| "Please enter a valid email address".to_string())
}

pub fn validate_password(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    if text_length(value) < MIN_PASSWORD_LEN {
        return Some(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    let has_digit = DIGIT_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value));
    (!has_digit).then(|| "Password must contain at least one number".to_string())
}

pub fn validate_password_match(password: &str, confirm_password: &str) -> Option<String> {
    if confirm_password.is_empty() {
        return None;
    }
    (password != confirm_password).then(|| "Passwords do not match".to_string())
}

/// Records the first failing rule for `key`, in order.
pub fn check<I>(errors: &mut FieldErrors, key: FieldKey, rules: I)
where
    I: IntoIterator<Item = Option<String>>,
{
    if let Some(message) = rules.into_iter().flatten().next() {
        errors.push(key, message);
    }
}

pub const EMAIL: FieldKey = FieldKey::new("email");
pub const PASSWORD: FieldKey = FieldKey::new("password");
pub const NAME: FieldKey = FieldKey::new("name");
pub const CONFIRM_PASSWORD: FieldKey = FieldKey::new("confirmPassword");

pub fn validate_login_form<T: FormModel>(values: &T) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let email = values.text(EMAIL.as_str());
    let password = values.text(PASSWORD.as_str());

    check(
        &mut errors,
        EMAIL,
        [validate_required(&email, "Email"), validate_email(&email)],
    );
    check(
        &mut errors,
        PASSWORD,
        [validate_required(&password, "Password")],
    );
    errors
}

pub fn validate_signup_form<T: FormModel>(values: &T) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let name = values.text(NAME.as_str());
    let email = values.text(EMAIL.as_str());
    let password = values.text(PASSWORD.as_str());
    let confirm_password = values.text(CONFIRM_PASSWORD.as_str());

    check(&mut errors, NAME, [validate_required(&name, "Name")]);
    check(
        &mut errors,
        EMAIL,
        [validate_required(&email, "Email"), validate_email(&email)],
    );
    check(
        &mut errors,
        PASSWORD,
        [
            validate_required(&password, "Password"),
            validate_password(&password),
        ],
    );
    check(
        &mut errors,
        CONFIRM_PASSWORD,
        [
            validate_required(&confirm_password, "Confirm password"),
            validate_password_match(&password, &confirm_password),
        ],
    );
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormValues;

    fn signup(name: &str, email: &str, password: &str, confirm: &str) -> FormValues {
        FormValues::new()
            .with("name", name.to_string())
            .with("email", email.to_string())
            .with("password", password.to_string())
            .with("confirmPassword", confirm.to_string())
    }

    #[test]
    fn email_format_rule() {
        assert!(validate_email("not-an-email").is_some());
        assert_eq!(validate_email("a@b.co"), None);
        assert_eq!(validate_email(""), None);
        assert!(validate_email("a b@c.de").is_some());
        assert!(validate_email("a@b").is_some());
    }

    #[test]
    fn required_rule_rejects_blank_text_and_unchecked_flags() {
        assert_eq!(
            validate_required("   ", "Email").as_deref(),
            Some("Email is required")
        );
        assert_eq!(validate_required(" x ", "Email"), None);
        assert_eq!(
            validate_required_value(Some(&FieldValue::Flag(false)), "Terms").as_deref(),
            Some("Terms is required")
        );
        assert_eq!(
            validate_required_value(Some(&FieldValue::Flag(true)), "Terms"),
            None
        );
    }

    #[test]
    fn password_strength_rule() {
        assert_eq!(
            validate_password("abc1").as_deref(),
            Some("Password must be at least 8 characters long")
        );
        assert_eq!(
            validate_password("abcdefgh").as_deref(),
            Some("Password must contain at least one number")
        );
        assert_eq!(validate_password("abcdefg1"), None);
    }

    #[test]
    fn password_rule_counts_utf16_units_and_ascii_digits() {
        assert_eq!(
            validate_password("abcdefg\u{0661}").as_deref(),
            Some("Password must contain at least one number")
        );
        assert_eq!(validate_password("\u{1F600}\u{1F600}\u{1F600}\u{1F600}1"), None);
        assert_eq!(text_length("\u{1F600}"), 2);
        assert_eq!(text_length("caf\u{e9}"), 4);
    }

    #[test]
    fn login_form_requires_both_fields() {
        let values = FormValues::new().with("email", "").with("password", "");
        let errors = validate_login_form(&values);
        assert_eq!(
            errors,
            FieldErrors::from([
                (EMAIL, "Email is required"),
                (PASSWORD, "Password is required"),
            ])
        );
    }

    #[test]
    fn login_form_checks_email_format_after_required() {
        let values = FormValues::new()
            .with("email", "not-an-email")
            .with("password", "secret");
        let errors = validate_login_form(&values);
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn signup_form_reports_strength_and_mismatch_together() {
        let errors = validate_signup_form(&signup("Ada", "ada@b.co", "abcdefgh", "abcdefgx"));
        assert_eq!(
            errors,
            FieldErrors::from([
                (PASSWORD, "Password must contain at least one number"),
                (CONFIRM_PASSWORD, "Passwords do not match"),
            ])
        );
    }

    #[test]
    fn signup_form_accepts_valid_input() {
        let errors = validate_signup_form(&signup("Ada", "ada@b.co", "abcdefg1", "abcdefg1"));
        assert!(errors.is_empty());
    }

    #[test]
    fn signup_form_requires_confirmation() {
        let errors = validate_signup_form(&signup("Ada", "ada@b.co", "abcdefg1", ""));
        assert_eq!(
            errors.get("confirmPassword"),
            Some("Confirm password is required")
        );
    }
}
