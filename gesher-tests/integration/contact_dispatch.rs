//! Contact pipeline integration tests
//!
//! Runs submissions through validation and dispatch together, the way the
//! contact endpoint does, against scriptable relay mocks.

use std::sync::Arc;

use gesher_core::notify::test_support::{MockChatRelay, MockEmailRelay};
use gesher_core::notify::{ContactSubmission, NotificationDispatcher, validate};

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

#[tokio::test]
async fn invalid_submission_reports_every_field_and_skips_dispatch() {
    let submission = ContactSubmission {
        subject: "".to_string(),
        message: "abc".to_string(),
        ..valid_submission()
    };

    let errors = validate(&submission).unwrap_err();
    assert!(errors.contains_key("subject"));
    assert!(errors.contains_key("message"));

    // No submission proceeds to dispatch while invalid - the pipeline stops
    // at validation, so the relays must stay untouched.
    let email = Arc::new(MockEmailRelay::succeeds());
    let chat = Arc::new(MockChatRelay::succeeds());
    let _dispatcher = NotificationDispatcher::new(email.clone(), chat.clone());

    assert_eq!(email.invocations(), 0);
    assert_eq!(chat.invocations(), 0);
}

#[tokio::test]
async fn validated_submission_reaches_both_relays() {
    let email = Arc::new(MockEmailRelay::succeeds());
    let chat = Arc::new(MockChatRelay::succeeds());
    let dispatcher = NotificationDispatcher::new(email.clone(), chat.clone());

    let request = validate(&valid_submission()).unwrap();
    let outcome = dispatcher.dispatch(&request).await;

    assert!(outcome.email_succeeded && outcome.chat_succeeded);
    assert_eq!(email.invocations(), 1);
    assert_eq!(chat.invocations(), 1);

    // Relay sees the trimmed request, not the raw submission
    let delivered = email.last_request().unwrap();
    assert_eq!(delivered.subject, "donation");
    assert_eq!(delivered.phone, "0501234567");
}

#[tokio::test]
async fn whitespace_heavy_submission_is_normalized_before_delivery() {
    let submission = ContactSubmission {
        subject: "  donation  ".to_string(),
        phone: " 050 123 4567 ".to_string(),
        ..valid_submission()
    };

    let email = Arc::new(MockEmailRelay::succeeds());
    let chat = Arc::new(MockChatRelay::succeeds());
    let dispatcher = NotificationDispatcher::new(email, chat.clone());

    let request = validate(&submission).unwrap();
    dispatcher.dispatch(&request).await;

    let body = chat.last_body().unwrap();
    assert!(body.contains("Subject: donation"));
    assert!(body.contains("Phone: 0501234567"));
}

#[tokio::test]
async fn partial_failure_still_delivers_and_records_the_error() {
    let email = Arc::new(MockEmailRelay::fails_with("relay timeout"));
    let chat = Arc::new(MockChatRelay::succeeds());
    let dispatcher = NotificationDispatcher::new(email, chat);

    let request = validate(&valid_submission()).unwrap();
    let outcome = dispatcher.dispatch(&request).await;

    assert!(outcome.delivered());
    assert!(outcome.is_partial());
    assert_eq!(outcome.channel_errors.len(), 1);
    assert!(outcome.clone().require_delivery().is_ok());
}

#[tokio::test]
async fn total_failure_surfaces_as_error_with_both_reasons() {
    let email = Arc::new(MockEmailRelay::fails_with("email down"));
    let chat = Arc::new(MockChatRelay::fails_with("chat down"));
    let dispatcher = NotificationDispatcher::new(email, chat);

    let request = validate(&valid_submission()).unwrap();
    let outcome = dispatcher.dispatch(&request).await;

    let err = outcome.require_delivery().unwrap_err();
    match err {
        gesher_core::notify::NotifyError::AllChannelsFailed { errors } => {
            assert_eq!(errors.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}
