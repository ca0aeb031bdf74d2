use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::domain::types::Profile;
use crate::error::AccountsServiceError;
use crate::state::AppState;
use crate::usecase::user::{GetProfileUseCase, UpdateProfileInput, UpdateProfileUseCase};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub phone_number: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub referral_code: Option<String>,
    /// Referrer's phone number.
    pub referred_by: Option<String>,
    pub referrals: Vec<String>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.user.id,
            phone_number: profile.user.phone_number,
            email: profile.user.email,
            first_name: profile.user.first_name,
            last_name: profile.user.last_name,
            referral_code: profile.user.referral_code,
            referred_by: profile.referred_by,
            referrals: profile.referrals,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub referred_by_code: Option<String>,
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, AccountsServiceError> {
    let usecase = GetProfileUseCase {
        repo: state.user_repo(),
    };
    let profile = usecase.execute(user.id).await?;
    Ok(Json(profile.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ProfileResponse>, AccountsServiceError> {
    let usecase = UpdateProfileUseCase {
        repo: state.user_repo(),
    };
    let profile = usecase
        .execute(
            user,
            UpdateProfileInput {
                email: body.email,
                first_name: body.first_name,
                last_name: body.last_name,
                referred_by_code: body.referred_by_code,
            },
        )
        .await?;
    Ok(Json(profile.into()))
}
