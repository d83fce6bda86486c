//! `SeaORM` Entity for number_sequence_periods table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "number_sequence_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sequence_id: Uuid,
    pub period_year: i32,
    /// 0 for yearly sequences.
    pub period_month: i32,
    pub last_number: i64,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::number_sequences::Entity",
        from = "Column::SequenceId",
        to = "super::number_sequences::Column::Id",
        on_delete = "Cascade"
    )]
    NumberSequences,
}

impl Related<super::number_sequences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NumberSequences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
