//! Server-side validation of contact submissions.
//!
//! Mirrors the client-side rules so a submission that bypasses the form
//! still gets the same treatment. Every failing field is reported, not just
//! the first, so the caller can highlight all invalid fields at once.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::notify::request::{ContactSubmission, NotificationRequest};

/// Field name (wire form) to human-readable error message.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// Local phone numbers: leading zero, 9-10 digits, optional separator
/// before the last seven (landline `0X-XXXXXXX` or mobile `05X-XXXXXXX`).
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0\d{1,2}-?\d{7}$|^05\d-?\d{7}$").expect("valid phone regex"));

/// Basic `local@domain.tld` shape; anything stricter rejects real addresses.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Minimum lengths after trimming.
const MIN_NAME_LEN: usize = 2;
const MIN_MESSAGE_LEN: usize = 10;

/// Validates and trims a raw submission.
///
/// # Errors
///
/// Returns the full set of field errors when any rule fails; no submission
/// proceeds to dispatch while invalid.
pub fn validate(raw: &ContactSubmission) -> Result<NotificationRequest, FieldErrors> {
    let subject = raw.subject.trim();
    let first_name = raw.first_name.trim();
    let last_name = raw.last_name.trim();
    let phone: String = raw.phone.split_whitespace().collect();
    let email = raw.email.trim();
    let message = raw.message.trim();

    let mut errors = FieldErrors::new();

    if subject.is_empty() {
        errors.insert("subject", "Please choose a subject".to_string());
    }

    if first_name.is_empty() {
        errors.insert("firstName", "Please fill in a first name".to_string());
    } else if first_name.chars().count() < MIN_NAME_LEN {
        errors.insert(
            "firstName",
            format!("First name must contain at least {MIN_NAME_LEN} characters"),
        );
    }

    if last_name.is_empty() {
        errors.insert("lastName", "Please fill in a last name".to_string());
    } else if last_name.chars().count() < MIN_NAME_LEN {
        errors.insert(
            "lastName",
            format!("Last name must contain at least {MIN_NAME_LEN} characters"),
        );
    }

    if phone.is_empty() {
        errors.insert("phone", "Please fill in a phone number".to_string());
    } else if !PHONE_PATTERN.is_match(&phone) {
        errors.insert("phone", "Please fill in a valid phone number".to_string());
    }

    if email.is_empty() {
        errors.insert("email", "Please fill in an email address".to_string());
    } else if !EMAIL_PATTERN.is_match(email) {
        errors.insert("email", "Please fill in a valid email address".to_string());
    }

    if message.is_empty() {
        errors.insert("message", "Please fill in a message".to_string());
    } else if message.chars().count() < MIN_MESSAGE_LEN {
        errors.insert(
            "message",
            format!("The message must contain at least {MIN_MESSAGE_LEN} characters"),
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NotificationRequest {
        subject: subject.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        phone,
        email: email.to_string(),
        message: message.to_string(),
        skip_email: raw.skip_email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_submission() -> ContactSubmission {
        ContactSubmission {
            subject: "donation".to_string(),
            first_name: "Dana".to_string(),
            last_name: "Cohen".to_string(),
            phone: "0501234567".to_string(),
            email: "d@x.com".to_string(),
            message: "Hello there, this is long enough.".to_string(),
            skip_email: false,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        let request = validate(&valid_submission()).unwrap();
        assert_eq!(request.subject, "donation");
        assert_eq!(request.full_name(), "Dana Cohen");
    }

    #[test]
    fn test_all_failing_fields_reported_together() {
        let submission = ContactSubmission {
            subject: "".to_string(),
            message: "abc".to_string(),
            ..valid_submission()
        };

        let errors = validate(&submission).unwrap_err();
        assert!(errors.contains_key("subject"));
        assert!(errors.contains_key("message"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let submission = ContactSubmission {
            subject: "  donation  ".to_string(),
            first_name: " Dana ".to_string(),
            ..valid_submission()
        };

        let request = validate(&submission).unwrap();
        assert_eq!(request.subject, "donation");
        assert_eq!(request.first_name, "Dana");
    }

    #[test]
    fn test_phone_whitespace_is_stripped() {
        let submission = ContactSubmission {
            phone: "050 123 4567".to_string(),
            ..valid_submission()
        };

        let request = validate(&submission).unwrap();
        assert_eq!(request.phone, "0501234567");
    }

    #[test]
    fn test_phone_patterns() {
        for phone in ["0501234567", "050-1234567", "031234567", "03-1234567"] {
            let submission = ContactSubmission {
                phone: phone.to_string(),
                ..valid_submission()
            };
            assert!(validate(&submission).is_ok(), "rejected {phone}");
        }

        for phone in ["123", "0501234", "15012345678", "+97250123456", "phone"] {
            let submission = ContactSubmission {
                phone: phone.to_string(),
                ..valid_submission()
            };
            let errors = validate(&submission).unwrap_err();
            assert!(errors.contains_key("phone"), "accepted {phone}");
        }
    }

    #[test]
    fn test_email_shapes() {
        for email in ["a@b.co", "first.last@sub.domain.org"] {
            let submission = ContactSubmission {
                email: email.to_string(),
                ..valid_submission()
            };
            assert!(validate(&submission).is_ok(), "rejected {email}");
        }

        for email in ["plain", "a@b", "a b@c.com", "@missing.local"] {
            let submission = ContactSubmission {
                email: email.to_string(),
                ..valid_submission()
            };
            let errors = validate(&submission).unwrap_err();
            assert!(errors.contains_key("email"), "accepted {email}");
        }
    }

    #[test]
    fn test_short_names_rejected() {
        let submission = ContactSubmission {
            first_name: "D".to_string(),
            last_name: "C".to_string(),
            ..valid_submission()
        };

        let errors = validate(&submission).unwrap_err();
        assert!(errors.contains_key("firstName"));
        assert!(errors.contains_key("lastName"));
    }

    #[test]
    fn test_message_minimum_length_counts_after_trim() {
        let submission = ContactSubmission {
            message: "  too short   ".to_string(),
            ..valid_submission()
        };

        let errors = validate(&submission).unwrap_err();
        assert!(errors.contains_key("message"));
    }
}
