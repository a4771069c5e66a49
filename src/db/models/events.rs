use sea_orm::entity::prelude::*;

/// A market event. Rows are only created alongside a qualifying bet.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(schema_name = "pm", table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub event_id: i64,

    #[sea_orm(unique, column_type = "Text")]
    pub event_slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bets::Entity")]
    Bets,
}

impl Related<super::bets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
