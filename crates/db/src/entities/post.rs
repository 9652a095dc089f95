//! Post entity (the generic content row shared by all content kinds).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content kind.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[sea_orm(string_value = "microblog")]
    Microblog,
    #[sea_orm(string_value = "blog")]
    Blog,
    #[sea_orm(string_value = "discussion")]
    Discussion,
    #[sea_orm(string_value = "event")]
    Event,
    #[sea_orm(string_value = "journal")]
    Journal,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    pub kind: PostKind,

    /// Opaque URL-safe identifier; the unique index is the authoritative
    /// uniqueness check
    #[sea_orm(unique)]
    pub slug: String,

    /// Title (required for blog/discussion/event)
    #[sea_orm(nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Blob-store key of the attached image (blog/journal only)
    #[sea_orm(nullable)]
    pub image_key: Option<String>,

    /// When the event takes place (events only)
    #[sea_orm(nullable)]
    pub event_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,

    /// Soft-delete tombstone
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
