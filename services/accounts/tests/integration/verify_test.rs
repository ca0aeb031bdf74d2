use chrono::{Duration, Utc};

use phonepass_accounts::domain::types::{AuthCode, User};
use phonepass_accounts::error::AccountsServiceError;
use phonepass_accounts::usecase::otp::CodeCheck;
use phonepass_accounts::usecase::token::TokenIssuer;
use phonepass_accounts::usecase::verify::{VerifyCodeInput, VerifyCodeUseCase};
use phonepass_auth_types::token::is_well_formed;

use crate::helpers::{
    EXPIRE_SECS, MockAuthCodeRepo, MockAuthTokenRepo, MockUserRepo, TEST_PHONE, lifecycle,
    test_auth_code, test_user,
};

struct Fixture {
    users: MockUserRepo,
    codes: MockAuthCodeRepo,
    tokens: MockAuthTokenRepo,
}

impl Fixture {
    fn new(user: User, codes: Vec<AuthCode>) -> Self {
        Self {
            users: MockUserRepo::new(vec![user]),
            codes: MockAuthCodeRepo::new(codes),
            tokens: MockAuthTokenRepo::empty(),
        }
    }

    fn usecase(&self) -> VerifyCodeUseCase<MockUserRepo, MockAuthCodeRepo, MockAuthTokenRepo> {
        VerifyCodeUseCase {
            users: self.users.clone(),
            otp: lifecycle(self.codes.clone()),
            issuer: TokenIssuer {
                tokens: self.tokens.clone(),
            },
        }
    }
}

fn input(code: &str) -> VerifyCodeInput {
    VerifyCodeInput {
        phone_number: TEST_PHONE.to_owned(),
        code: code.to_owned(),
    }
}

#[tokio::test]
async fn should_issue_token_and_consume_fresh_code() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(5));
    let fx = Fixture::new(user.clone(), vec![code.clone()]);

    let token = fx.usecase().execute(input("12345")).await.unwrap();

    assert!(is_well_formed(&token.key));
    assert_eq!(token.user_id, user.id);
    assert!(!fx.codes.get(code.id).is_active, "code should be consumed");
    assert!(fx.users.get(user.id).is_verified);
}

#[tokio::test]
async fn should_accept_code_one_second_inside_window() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(EXPIRE_SECS - 1));
    let fx = Fixture::new(user, vec![code]);

    assert!(fx.usecase().execute(input("12345")).await.is_ok());
}

#[tokio::test]
async fn should_reject_and_deactivate_code_one_second_past_window() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(EXPIRE_SECS + 1));
    let fx = Fixture::new(user.clone(), vec![code.clone()]);

    let result = fx.usecase().execute(input("12345")).await;

    assert!(
        matches!(result, Err(AccountsServiceError::InvalidCode)),
        "expected InvalidCode, got {result:?}"
    );
    assert!(!fx.codes.get(code.id).is_active, "expired code should be deactivated");
    assert!(!fx.users.get(user.id).is_verified);
    assert!(fx.tokens.tokens_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_not_accept_same_code_twice() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(5));
    let fx = Fixture::new(user, vec![code]);

    fx.usecase().execute(input("12345")).await.unwrap();
    let second = fx.usecase().execute(input("12345")).await;

    assert!(matches!(second, Err(AccountsServiceError::InvalidCode)));
}

#[tokio::test]
async fn should_reject_wrong_code() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(5));
    let fx = Fixture::new(user, vec![code.clone()]);

    let result = fx.usecase().execute(input("54321")).await;

    assert!(matches!(result, Err(AccountsServiceError::InvalidCode)));
    assert!(fx.codes.get(code.id).is_active, "unrelated code must stay active");
}

#[tokio::test]
async fn should_not_accept_another_users_code() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let other = test_user("+447700900123", "BCDEF");
    let code = test_auth_code(other.id, "12345", Duration::seconds(5));
    let fx = Fixture::new(user, vec![code.clone()]);
    fx.users.users_handle().lock().unwrap().push(other);

    let result = fx.usecase().execute(input("12345")).await;

    assert!(matches!(result, Err(AccountsServiceError::InvalidCode)));
    assert!(fx.codes.get(code.id).is_active);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_phone() {
    let user = test_user("+447700900123", "ABCDE");
    let fx = Fixture::new(user, vec![]);

    let result = fx.usecase().execute(input("12345")).await;

    assert!(matches!(result, Err(AccountsServiceError::UserNotFound)));
}

#[tokio::test]
async fn should_reject_malformed_code_before_lookup() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let fx = Fixture::new(user, vec![]);

    for bad in ["1234", "123456", "12a45", "10345"] {
        let result = fx.usecase().execute(input(bad)).await;
        assert!(
            matches!(result, Err(AccountsServiceError::InvalidCodeFormat)),
            "{bad}: expected InvalidCodeFormat, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_disabled_user_even_with_valid_code() {
    let mut user = test_user(TEST_PHONE, "ABCDE");
    user.is_active = false;
    let code = test_auth_code(user.id, "12345", Duration::seconds(5));
    let fx = Fixture::new(user.clone(), vec![code.clone()]);

    let result = fx.usecase().execute(input("12345")).await;

    assert!(
        matches!(result, Err(AccountsServiceError::UserDisabled)),
        "expected UserDisabled, got {result:?}"
    );
    assert!(!fx.codes.get(code.id).is_active);
    assert!(!fx.users.get(user.id).is_verified);
    assert!(fx.tokens.tokens_handle().lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_return_same_token_on_repeat_verification() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let first_code = test_auth_code(user.id, "12345", Duration::seconds(30));
    let second_code = test_auth_code(user.id, "67891", Duration::seconds(5));
    let fx = Fixture::new(user, vec![first_code, second_code]);

    let first = fx.usecase().execute(input("12345")).await.unwrap();
    let second = fx.usecase().execute(input("67891")).await.unwrap();

    assert_eq!(first.key, second.key);
    assert_eq!(fx.tokens.tokens_handle().lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_use_most_recent_active_code_with_matching_value() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let stale = test_auth_code(user.id, "12345", Duration::seconds(EXPIRE_SECS + 60));
    let fresh = test_auth_code(user.id, "12345", Duration::seconds(5));
    let fx = Fixture::new(user, vec![stale.clone(), fresh.clone()]);

    fx.usecase().execute(input("12345")).await.unwrap();

    assert!(!fx.codes.get(fresh.id).is_active);
    assert!(fx.codes.get(stale.id).is_active, "older code is not looked at");
}

// ── OtpLifecycle ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_validate_without_consuming() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(5));
    let codes = MockAuthCodeRepo::new(vec![code.clone()]);
    let otp = lifecycle(codes.clone());

    assert!(otp.validate(user.id, "12345", Utc::now()).await.unwrap());
    assert!(otp.validate(user.id, "12345", Utc::now()).await.unwrap());
    assert!(codes.get(code.id).is_active);
}

#[tokio::test]
async fn should_report_expired_then_missing() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(EXPIRE_SECS + 1));
    let otp = lifecycle(MockAuthCodeRepo::new(vec![code]));

    let first = otp.check(user.id, "12345", Utc::now()).await.unwrap();
    let second = otp.check(user.id, "12345", Utc::now()).await.unwrap();

    assert_eq!(first, CodeCheck::Expired);
    assert_eq!(second, CodeCheck::Missing);
}

#[tokio::test]
async fn should_let_only_one_consumer_win() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(5));
    let otp = lifecycle(MockAuthCodeRepo::new(vec![code.clone()]));
    let now = Utc::now();

    assert!(otp.consume(&code, now).await.unwrap());
    assert!(!otp.consume(&code, now).await.unwrap());
}

#[tokio::test]
async fn should_not_consume_code_that_aged_out_after_check() {
    let user = test_user(TEST_PHONE, "ABCDE");
    let code = test_auth_code(user.id, "12345", Duration::seconds(EXPIRE_SECS - 1));
    let otp = lifecycle(MockAuthCodeRepo::new(vec![code.clone()]));

    let later = Utc::now() + Duration::seconds(5);
    assert!(!otp.consume(&code, later).await.unwrap());
}
