use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

// Contrainte UNIQUE (exchange_id, symbol) côté BD : un symbole
// n'est unique qu'au sein de sa place de marché, pas globalement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub exchange_id: i32,
    pub symbol: String,
    pub name: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub high: Decimal,   // Ratchet monotone : ne redescend jamais
    pub low: Decimal,    // Ratchet monotone : ne remonte jamais
    pub open: Decimal,   // Fixé à la création, jamais modifié ensuite
    pub last: Decimal,
    pub change: Decimal, // Invariant : change = last - open
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exchange::Entity",
        from = "Column::ExchangeId",
        to = "super::exchange::Column::Id"
    )]
    Exchange,
}

impl Related<super::exchange::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exchange.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
