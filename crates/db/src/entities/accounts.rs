//! `SeaORM` Entity for accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use freightledger_core::chart::{Account, AccountType, ChartError};
use freightledger_shared::types::AccountId;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub chart_year: i32,
    pub code: String,
    pub name: String,
    pub account_type: String,
    pub parent_id: Option<Uuid>,
    pub is_postable: bool,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Restrict"
    )]
    Parent,
    #[sea_orm(has_many = "super::journal_lines::Entity")]
    JournalLines,
}

impl Related<super::journal_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain account.
    ///
    /// # Errors
    ///
    /// Returns `ChartError::UnknownAccountType` if the stored type is not recognized.
    pub fn to_domain(&self) -> Result<Account, ChartError> {
        Ok(Account {
            id: AccountId::from_uuid(self.id),
            code: self.code.clone(),
            name: self.name.clone(),
            account_type: self.account_type.parse::<AccountType>()?,
            parent_id: self.parent_id.map(AccountId::from_uuid),
            chart_year: self.chart_year,
            is_postable: self.is_postable,
            is_active: self.is_active,
        })
    }
}
