use chrono::Duration;
use uuid::Uuid;

use keystep_auth::domain::repository::OtpRepository;
use keystep_auth::domain::types::OtpPurpose;
use keystep_auth::error::AuthServiceError;
use keystep_auth::usecase::otp::{
    IssueOtpInput, IssueOtpUseCase, OtpConfig, VerifyOtpInput, VerifyOtpUseCase,
};

use crate::helpers::{MockDelivery, MockOtpRepo, test_code};

fn issue_uc(
    repo: MockOtpRepo,
    sms: MockDelivery,
    email: MockDelivery,
    config: OtpConfig,
) -> IssueOtpUseCase<MockOtpRepo, MockDelivery, MockDelivery> {
    IssueOtpUseCase {
        otp_codes: repo,
        sms,
        email,
        config,
    }
}

fn verify_input(user_id: Uuid, target: &str, code: &str) -> VerifyOtpInput {
    VerifyOtpInput {
        user_id,
        target: target.to_owned(),
        purpose: OtpPurpose::Login,
        code: code.to_owned(),
    }
}

#[tokio::test]
async fn should_issue_code_with_configured_width_and_ttl() {
    let repo = MockOtpRepo::empty();
    let handle = repo.codes_handle();
    let uc = issue_uc(
        repo,
        MockDelivery::ok(),
        MockDelivery::ok(),
        OtpConfig {
            ttl_minutes: 10,
            code_length: 6,
            time_zone: chrono_tz::UTC,
        },
    );

    let user_id = Uuid::new_v4();
    let out = uc
        .execute(IssueOtpInput {
            user_id,
            purpose: OtpPurpose::Login,
            phone: Some("15550100".to_owned()),
            email: Some("user@example.com".to_owned()),
            origin_ip: Some("203.0.113.9".to_owned()),
        })
        .await
        .unwrap();

    assert_eq!(out.code.len(), 6);
    assert!(out.code.chars().all(|c| c.is_ascii_digit()));

    let codes = handle.lock().unwrap();
    assert_eq!(codes.len(), 1);
    let record = &codes[0];
    assert_eq!(record.user_id, user_id);
    // Phone wins as the verification target when both channels are present.
    assert_eq!(record.target, "15550100");
    assert!(record.used_at.is_none());
    assert_eq!(record.expires_at - record.created_at, Duration::minutes(10));
}

#[tokio::test]
async fn should_respect_custom_ttl_and_width() {
    let repo = MockOtpRepo::empty();
    let handle = repo.codes_handle();
    let uc = issue_uc(
        repo,
        MockDelivery::ok(),
        MockDelivery::ok(),
        OtpConfig {
            ttl_minutes: 3,
            code_length: 4,
            time_zone: chrono_tz::Asia::Kolkata,
        },
    );

    let out = uc
        .execute(IssueOtpInput {
            user_id: Uuid::new_v4(),
            purpose: OtpPurpose::Login,
            phone: Some("15550100".to_owned()),
            email: None,
            origin_ip: None,
        })
        .await
        .unwrap();

    assert_eq!(out.code.len(), 4);
    let codes = handle.lock().unwrap();
    // The stored expiry is an absolute instant regardless of the zone it was
    // computed in.
    assert_eq!(
        codes[0].expires_at - codes[0].created_at,
        Duration::minutes(3)
    );
}

#[tokio::test]
async fn should_deliver_to_both_channels() {
    let sms = MockDelivery::ok();
    let email = MockDelivery::ok();
    let sms_sent = sms.sent_handle();
    let email_sent = email.sent_handle();
    let uc = issue_uc(MockOtpRepo::empty(), sms, email, OtpConfig::default());

    let out = uc
        .execute(IssueOtpInput {
            user_id: Uuid::new_v4(),
            purpose: OtpPurpose::Login,
            phone: Some("15550100".to_owned()),
            email: Some("user@example.com".to_owned()),
            origin_ip: None,
        })
        .await
        .unwrap();

    assert_eq!(
        *sms_sent.lock().unwrap(),
        vec![("15550100".to_owned(), out.code.clone())]
    );
    assert_eq!(
        *email_sent.lock().unwrap(),
        vec![("user@example.com".to_owned(), out.code)]
    );
}

#[tokio::test]
async fn should_not_fail_issuance_when_delivery_fails() {
    let repo = MockOtpRepo::empty();
    let handle = repo.codes_handle();
    let uc = issue_uc(
        repo,
        MockDelivery::failing(),
        MockDelivery::failing(),
        OtpConfig::default(),
    );

    let result = uc
        .execute(IssueOtpInput {
            user_id: Uuid::new_v4(),
            purpose: OtpPurpose::Login,
            phone: Some("15550100".to_owned()),
            email: Some("user@example.com".to_owned()),
            origin_ip: None,
        })
        .await;

    assert!(result.is_ok(), "delivery failure must not fail issuance");
    assert_eq!(handle.lock().unwrap().len(), 1, "record must still persist");
}

#[tokio::test]
async fn should_isolate_failure_to_one_channel() {
    let email = MockDelivery::ok();
    let email_sent = email.sent_handle();
    let uc = issue_uc(
        MockOtpRepo::empty(),
        MockDelivery::failing(),
        email,
        OtpConfig::default(),
    );

    uc.execute(IssueOtpInput {
        user_id: Uuid::new_v4(),
        purpose: OtpPurpose::Login,
        phone: Some("15550100".to_owned()),
        email: Some("user@example.com".to_owned()),
        origin_ip: None,
    })
    .await
    .unwrap();

    assert_eq!(
        email_sent.lock().unwrap().len(),
        1,
        "email must go out even when sms fails"
    );
}

#[tokio::test]
async fn should_verify_code_immediately_after_issuance() {
    let repo = MockOtpRepo::empty();
    let uc = issue_uc(
        repo.clone(),
        MockDelivery::ok(),
        MockDelivery::ok(),
        OtpConfig::default(),
    );

    let user_id = Uuid::new_v4();
    let out = uc
        .execute(IssueOtpInput {
            user_id,
            purpose: OtpPurpose::Login,
            phone: Some("15550100".to_owned()),
            email: None,
            origin_ip: None,
        })
        .await
        .unwrap();

    let verify = VerifyOtpUseCase { otp_codes: repo };
    let record = verify
        .execute(verify_input(user_id, "15550100", &out.code))
        .await
        .unwrap();
    assert!(record.is_valid());
}

#[tokio::test]
async fn should_fail_not_found_when_no_record_exists() {
    let verify = VerifyOtpUseCase {
        otp_codes: MockOtpRepo::empty(),
    };

    let result = verify
        .execute(verify_input(Uuid::new_v4(), "15550100", "9999"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::OtpNotFound)));
}

#[tokio::test]
async fn should_fail_expired_even_with_correct_code() {
    let user_id = Uuid::new_v4();
    let expired = test_code(user_id, "15550100", "4821", Duration::seconds(-1));
    let verify = VerifyOtpUseCase {
        otp_codes: MockOtpRepo::new(vec![expired]),
    };

    let result = verify
        .execute(verify_input(user_id, "15550100", "4821"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::OtpExpired)));
}

#[tokio::test]
async fn should_fail_mismatch_on_wrong_code() {
    let user_id = Uuid::new_v4();
    let verify = VerifyOtpUseCase {
        otp_codes: MockOtpRepo::new(vec![test_code(
            user_id,
            "15550100",
            "4821",
            Duration::minutes(10),
        )]),
    };

    let result = verify
        .execute(verify_input(user_id, "15550100", "1248"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::OtpMismatch)));
}

#[tokio::test]
async fn should_compare_codes_as_trimmed_strings() {
    let user_id = Uuid::new_v4();
    let verify = VerifyOtpUseCase {
        otp_codes: MockOtpRepo::new(vec![test_code(
            user_id,
            "15550100",
            "0421",
            Duration::minutes(10),
        )]),
    };

    // Leading zeros survive: the submitted text matches, a numeric
    // interpretation would not.
    verify
        .execute(verify_input(user_id, "15550100", " 0421 "))
        .await
        .unwrap();

    let result = verify.execute(verify_input(user_id, "15550100", "421")).await;
    assert!(matches!(result, Err(AuthServiceError::OtpMismatch)));
}

#[tokio::test]
async fn should_only_verify_latest_code_for_target() {
    let user_id = Uuid::new_v4();
    let mut older = test_code(user_id, "15550100", "1111", Duration::minutes(10));
    older.created_at -= Duration::minutes(1);
    let newer = test_code(user_id, "15550100", "2222", Duration::minutes(10));
    let verify = VerifyOtpUseCase {
        otp_codes: MockOtpRepo::new(vec![older, newer]),
    };

    verify
        .execute(verify_input(user_id, "15550100", "2222"))
        .await
        .unwrap();

    // The superseded code is no longer accepted even though its record remains.
    let result = verify
        .execute(verify_input(user_id, "15550100", "1111"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::OtpMismatch)));
}

#[tokio::test]
async fn should_reject_replay_after_consume() {
    let user_id = Uuid::new_v4();
    let repo = MockOtpRepo::new(vec![test_code(
        user_id,
        "15550100",
        "4821",
        Duration::minutes(10),
    )]);
    let verify = VerifyOtpUseCase {
        otp_codes: repo.clone(),
    };

    let record = verify
        .execute(verify_input(user_id, "15550100", "4821"))
        .await
        .unwrap();
    assert!(repo.consume(record.id).await.unwrap());

    let result = verify
        .execute(verify_input(user_id, "15550100", "4821"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::OtpUsed)));

    // A racing second consume loses.
    assert!(!repo.consume(record.id).await.unwrap());
}
