use sea_orm::DatabaseConnection;

use crate::infra::db::{
    DbAuthCodeRepository, DbAuthTokenRepository, DbOutboxRepository, DbUserRepository,
};
use crate::usecase::otp::OtpLifecycle;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// OTP expiry window in seconds.
    pub code_expire_time: i64,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn auth_code_repo(&self) -> DbAuthCodeRepository {
        DbAuthCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn auth_token_repo(&self) -> DbAuthTokenRepository {
        DbAuthTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn outbox_repo(&self) -> DbOutboxRepository {
        DbOutboxRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp(&self) -> OtpLifecycle<DbAuthCodeRepository> {
        OtpLifecycle {
            auth_codes: self.auth_code_repo(),
            expire_secs: self.code_expire_time,
        }
    }
}
