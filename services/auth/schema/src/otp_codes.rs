use sea_orm::entity::prelude::*;

/// One-time code issued to a phone or email target.
/// Superseded codes are kept, never deleted; only the most recent record for a
/// (user, target, purpose) triple is eligible for verification.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: String,
    pub purpose: String,
    pub code: String,
    pub attempts: i32,
    pub origin_ip: Option<String>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub used_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
