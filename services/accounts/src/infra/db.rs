use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, LockBehavior, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use phonepass_accounts_schema::{auth_codes, auth_tokens, outbox_events, users};

use crate::domain::repository::{
    AuthCodeRepository, AuthTokenRepository, OutboxRepository, UserRepository,
};
use crate::domain::types::{
    AuthCode, AuthToken, CodeAssignment, InsertOutcome, OutboxEvent, PendingEvent, ProfileUpdate,
    User,
};
use crate::error::AccountsServiceError;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountsServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<User>, AccountsServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::PhoneNumber.eq(phone_number))
            .one(&self.db)
            .await
            .context("find user by phone")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<User>, AccountsServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::ReferralCode.eq(code))
            .one(&self.db)
            .await
            .context("find user by referral code")?;
        Ok(model.map(user_from_model))
    }

    async fn insert_if_absent(&self, user: &User) -> Result<InsertOutcome, AccountsServiceError> {
        let model = users::ActiveModel {
            id: Set(user.id),
            phone_number: Set(user.phone_number.clone()),
            referral_code: Set(user.referral_code.clone()),
            referred_by: Set(user.referred_by),
            email: Set(user.email.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            is_verified: Set(user.is_verified),
            is_active: Set(user.is_active),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        };
        // Only the phone conflict is swallowed; a referral code clash still errors.
        let result = users::Entity::insert(model)
            .on_conflict(
                OnConflict::column(users::Column::PhoneNumber)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;
        match result {
            Ok(0) => Ok(InsertOutcome::PhoneTaken),
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::ReferralCodeTaken),
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn assign_referral_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<CodeAssignment, AccountsServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::ReferralCode, Expr::value(code))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::ReferralCode.is_null())
            .exec(&self.db)
            .await;
        match result {
            Ok(res) if res.rows_affected > 0 => Ok(CodeAssignment::Assigned),
            Ok(_) => Ok(CodeAssignment::AlreadySet),
            Err(e) if is_unique_violation(&e) => Ok(CodeAssignment::CodeTaken),
            Err(e) => Err(anyhow::Error::new(e)
                .context("assign referral code")
                .into()),
        }
    }

    async fn set_referrer_if_unset(
        &self,
        user_id: Uuid,
        referrer_id: Uuid,
    ) -> Result<bool, AccountsServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::ReferredBy, Expr::value(referrer_id))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::ReferredBy.is_null())
            .exec(&self.db)
            .await
            .context("set referrer")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_verified(&self, user_id: Uuid) -> Result<(), AccountsServiceError> {
        users::Entity::update_many()
            .col_expr(users::Column::IsVerified, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .context("mark user verified")?;
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<(), AccountsServiceError> {
        let mut am = users::ActiveModel {
            id: Set(user_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(email) = &update.email {
            am.email = Set(Some(email.clone()));
        }
        if let Some(first_name) = &update.first_name {
            am.first_name = Set(Some(first_name.clone()));
        }
        if let Some(last_name) = &update.last_name {
            am.last_name = Set(Some(last_name.clone()));
        }
        am.update(&self.db).await.context("update profile")?;
        Ok(())
    }

    async fn list_referrals(&self, user_id: Uuid) -> Result<Vec<String>, AccountsServiceError> {
        let models = users::Entity::find()
            .filter(users::Column::ReferredBy.eq(user_id))
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list referrals")?;
        Ok(models.into_iter().map(|m| m.phone_number).collect())
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        phone_number: model.phone_number,
        referral_code: model.referral_code,
        referred_by: model.referred_by,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        is_verified: model.is_verified,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── AuthCode repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAuthCodeRepository {
    pub db: DatabaseConnection,
}

impl AuthCodeRepository for DbAuthCodeRepository {
    async fn create_with_outbox(
        &self,
        code: &AuthCode,
        event: &OutboxEvent,
    ) -> Result<(), AccountsServiceError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let code = code.clone();
                let event = event.clone();
                Box::pin(async move {
                    insert_auth_code(txn, &code).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("create auth code with outbox")?;
        Ok(())
    }

    async fn find_latest_active(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<AuthCode>, AccountsServiceError> {
        let model = auth_codes::Entity::find()
            .filter(auth_codes::Column::UserId.eq(user_id))
            .filter(auth_codes::Column::Code.eq(code))
            .filter(auth_codes::Column::IsActive.eq(true))
            .order_by_desc(auth_codes::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find latest active auth code")?;
        Ok(model.map(auth_code_from_model))
    }

    async fn consume(
        &self,
        id: Uuid,
        not_before: DateTime<Utc>,
    ) -> Result<bool, AccountsServiceError> {
        let result = auth_codes::Entity::update_many()
            .col_expr(auth_codes::Column::IsActive, Expr::value(false))
            .filter(auth_codes::Column::Id.eq(id))
            .filter(auth_codes::Column::IsActive.eq(true))
            .filter(auth_codes::Column::CreatedAt.gte(not_before))
            .exec(&self.db)
            .await
            .context("consume auth code")?;
        Ok(result.rows_affected > 0)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, AccountsServiceError> {
        let result = auth_codes::Entity::update_many()
            .col_expr(auth_codes::Column::IsActive, Expr::value(false))
            .filter(auth_codes::Column::Id.eq(id))
            .filter(auth_codes::Column::IsActive.eq(true))
            .exec(&self.db)
            .await
            .context("deactivate auth code")?;
        Ok(result.rows_affected > 0)
    }
}

async fn insert_auth_code(txn: &DatabaseTransaction, code: &AuthCode) -> Result<(), DbErr> {
    auth_codes::ActiveModel {
        id: Set(code.id),
        user_id: Set(code.user_id),
        code: Set(code.code.clone()),
        is_active: Set(code.is_active),
        created_at: Set(code.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(txn: &DatabaseTransaction, event: &OutboxEvent) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn auth_code_from_model(model: auth_codes::Model) -> AuthCode {
    AuthCode {
        id: model.id,
        user_id: model.user_id,
        code: model.code,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

// ── AuthToken repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAuthTokenRepository {
    pub db: DatabaseConnection,
}

impl AuthTokenRepository for DbAuthTokenRepository {
    async fn get_or_create(
        &self,
        candidate: &AuthToken,
    ) -> Result<AuthToken, AccountsServiceError> {
        auth_tokens::Entity::insert(auth_tokens::ActiveModel {
            key: Set(candidate.key.clone()),
            user_id: Set(candidate.user_id),
            created_at: Set(candidate.created_at),
        })
        .on_conflict(
            OnConflict::column(auth_tokens::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("insert auth token")?;

        let model = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(candidate.user_id))
            .one(&self.db)
            .await
            .context("find auth token by user")?
            .context("auth token missing after insert")?;
        Ok(auth_token_from_model(model))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<AuthToken>, AccountsServiceError> {
        let model = auth_tokens::Entity::find_by_id(key.to_owned())
            .one(&self.db)
            .await
            .context("find auth token by key")?;
        Ok(model.map(auth_token_from_model))
    }
}

fn auth_token_from_model(model: auth_tokens::Model) -> AuthToken {
    AuthToken {
        key: model.key,
        user_id: model.user_id,
        created_at: model.created_at,
    }
}

// ── Outbox repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOutboxRepository {
    pub db: DatabaseConnection,
}

impl OutboxRepository for DbOutboxRepository {
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<PendingEvent>, AccountsServiceError> {
        let events = self
            .db
            .transaction::<_, Vec<PendingEvent>, DbErr>(move |txn| {
                Box::pin(async move {
                    let models = outbox_events::Entity::find()
                        .filter(outbox_events::Column::ProcessedAt.is_null())
                        .filter(outbox_events::Column::FailedAt.is_null())
                        .filter(outbox_events::Column::NextAttemptAt.lte(now))
                        .order_by_asc(outbox_events::Column::NextAttemptAt)
                        .limit(limit)
                        .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
                        .all(txn)
                        .await?;
                    if models.is_empty() {
                        return Ok(Vec::new());
                    }

                    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
                    outbox_events::Entity::update_many()
                        .col_expr(outbox_events::Column::NextAttemptAt, Expr::value(lease_until))
                        .filter(outbox_events::Column::Id.is_in(ids))
                        .exec(txn)
                        .await?;

                    Ok(models.into_iter().map(pending_from_model).collect())
                })
            })
            .await
            .context("claim due outbox events")?;
        Ok(events)
    }

    async fn mark_processed(&self, id: Uuid, attempts: i32) -> Result<(), AccountsServiceError> {
        outbox_events::Entity::update_many()
            .col_expr(outbox_events::Column::Attempts, Expr::value(attempts))
            .col_expr(outbox_events::Column::ProcessedAt, Expr::value(Utc::now()))
            .filter(outbox_events::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark outbox event processed")?;
        Ok(())
    }

    async fn mark_retry(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), AccountsServiceError> {
        outbox_events::Entity::update_many()
            .col_expr(outbox_events::Column::Attempts, Expr::value(attempts))
            .col_expr(outbox_events::Column::LastError, Expr::value(error))
            .col_expr(outbox_events::Column::NextAttemptAt, Expr::value(next_attempt_at))
            .filter(outbox_events::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("schedule outbox retry")?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
    ) -> Result<(), AccountsServiceError> {
        outbox_events::Entity::update_many()
            .col_expr(outbox_events::Column::Attempts, Expr::value(attempts))
            .col_expr(outbox_events::Column::LastError, Expr::value(error))
            .col_expr(outbox_events::Column::FailedAt, Expr::value(Utc::now()))
            .filter(outbox_events::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark outbox event failed")?;
        Ok(())
    }
}

fn pending_from_model(model: outbox_events::Model) -> PendingEvent {
    PendingEvent {
        id: model.id,
        kind: model.kind,
        payload: model.payload,
        attempts: model.attempts,
    }
}
