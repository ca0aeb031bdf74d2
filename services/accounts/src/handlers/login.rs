use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::User;
use crate::error::AccountsServiceError;
use crate::state::AppState;
use crate::usecase::directory::UserDirectory;
use crate::usecase::login::{RequestCodeInput, RequestCodeUseCase};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub phone_number: String,
}

/// Login acknowledgement. Never carries the issued code.
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub message: &'static str,
}

impl LoginResponse {
    pub fn new(user: User) -> Self {
        Self {
            user: UserSummary {
                id: user.id,
                phone_number: user.phone_number,
            },
            message: "verification code sent",
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AccountsServiceError> {
    let usecase = RequestCodeUseCase {
        directory: UserDirectory {
            repo: state.user_repo(),
        },
        otp: state.otp(),
    };
    let output = usecase
        .execute(RequestCodeInput {
            phone_number: body.phone_number,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(LoginResponse::new(output.user))))
}
