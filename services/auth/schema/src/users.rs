use sea_orm::entity::prelude::*;

/// Identity record owned by the auth service.
/// `password` is either a PHC-format argon2 hash or a legacy plaintext
/// credential; the encoding is detected from the stored value at verify time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::otp_codes::Entity")]
    OtpCodes,
    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::otp_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OtpCodes.def()
    }
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
