use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(schema_name = "pm", table_name = "bets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub bet_id: i64,

    pub user_id: i64,

    pub wallet_id: i64,

    pub event_id: i64,

    /// Stored with the local zone's offset; compares as an instant.
    pub bet_timestamp: DateTimeWithTimeZone,

    #[sea_orm(column_type = "Decimal(Some((24, 8)))")]
    pub cost: Decimal,

    #[sea_orm(unique, column_type = "Text")]
    pub transaction_hash: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub outcome: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub side: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub asset: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub condition_id: Option<String>,

    #[sea_orm(column_type = "Decimal(Some((24, 8)))")]
    pub price: Decimal,

    #[sea_orm(column_type = "Decimal(Some((24, 8)))")]
    pub size: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::UserId"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::WalletId"
    )]
    Wallet,
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::EventId"
    )]
    Event,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
