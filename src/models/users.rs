use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub admin_id: Option<i32>, // Admin créateur (informatif, nullable)
    #[sea_orm(unique)]
    pub user_name: String,
    #[serde(skip_serializing)] // Ne jamais exposer le hash en JSON
    pub user_password: String, // Format: pbkdf2:sha256:iterations$salt$hash
    pub role: String,          // 'user' ou 'admin'
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::admin::Entity",
        from = "Column::AdminId",
        to = "super::admin::Column::Id"
    )]
    Admin,

    #[sea_orm(has_many = "super::user_stock::Entity")]
    UserStock,
}

impl Related<super::admin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl Related<super::user_stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserStock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
