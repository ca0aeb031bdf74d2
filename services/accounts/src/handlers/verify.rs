use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AccountsServiceError;
use crate::state::AppState;
use crate::usecase::token::TokenIssuer;
use crate::usecase::verify::{VerifyCodeInput, VerifyCodeUseCase};

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub phone_number: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<TokenResponse>, AccountsServiceError> {
    let usecase = VerifyCodeUseCase {
        users: state.user_repo(),
        otp: state.otp(),
        issuer: TokenIssuer {
            tokens: state.auth_token_repo(),
        },
    };
    let token = usecase
        .execute(VerifyCodeInput {
            phone_number: body.phone_number,
            code: body.code,
        })
        .await?;
    Ok(Json(TokenResponse { token: token.key }))
}
