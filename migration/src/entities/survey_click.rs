use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "survey_clicks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub survey_id: Option<String>,
    pub user_id: String,
    pub project_id: String,
    pub ip_address: Option<String>,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub raw_data: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
