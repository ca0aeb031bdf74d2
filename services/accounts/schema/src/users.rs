use sea_orm::entity::prelude::*;

/// Account keyed by phone number.
/// `referral_code` is assigned once at creation; `referred_by` is set at most once.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub phone_number: String,
    #[sea_orm(unique)]
    pub referral_code: Option<String>,
    pub referred_by: Option<Uuid>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReferredBy",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    Referrer,
    #[sea_orm(has_many = "super::auth_codes::Entity")]
    AuthCodes,
    #[sea_orm(has_one = "super::auth_tokens::Entity")]
    AuthToken,
}

impl Related<super::auth_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthCodes.def()
    }
}

impl Related<super::auth_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthToken.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
