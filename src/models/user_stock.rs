use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

// Contrainte UNIQUE (user_id, symbol) côté BD : l'upsert du endpoint
// POST /api/user/stocks met à jour la ligne existante au lieu de dupliquer.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_stocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub symbol: String,
    pub name: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub open: Decimal,
    pub last: Decimal,
    pub change: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
