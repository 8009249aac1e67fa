//! `SeaORM` entities for the mirrored directory.

pub use department::Entity as DepartmentEntity;
pub use employee::Entity as EmployeeEntity;

pub mod department {
    use sea_orm::entity::prelude::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "departments")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub external_id: String,
        pub name: String,
        pub code: String,
        pub display_order: i32,
        pub manager_id: Option<String>,
        pub parent_id: Option<String>,
        pub external_created_at: Option<OffsetDateTime>,
        pub external_updated_at: Option<OffsetDateTime>,
        pub last_synced_at: Option<OffsetDateTime>,
        pub created_at: OffsetDateTime,
        pub updated_at: OffsetDateTime,
        pub deleted_at: Option<OffsetDateTime>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod employee {
    use sea_orm::entity::prelude::*;
    use time::{Date, OffsetDateTime};
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "employees")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub external_id: String,
        pub employee_number: String,
        pub name: String,
        pub email: Option<String>,
        pub phone_number: Option<String>,
        pub date_of_birth: Option<Date>,
        pub gender: Option<String>,
        pub hire_date: Option<Date>,
        pub status: String,
        pub department_id: Option<String>,
        pub department_name: Option<String>,
        pub department_code: Option<String>,
        pub position_id: Option<String>,
        pub position_name: Option<String>,
        pub rank_id: Option<String>,
        pub rank_name: Option<String>,
        pub rank_level: Option<i32>,
        pub manager_id: Option<String>,
        /// JSON array of role names.
        #[sea_orm(column_type = "Text")]
        pub roles: String,
        #[sea_orm(column_type = "Text", nullable)]
        pub exclusion_reason: Option<String>,
        pub excluded_by: Option<String>,
        pub excluded_at: Option<OffsetDateTime>,
        pub is_accessible: bool,
        pub last_synced_at: Option<OffsetDateTime>,
        pub created_at: OffsetDateTime,
        pub updated_at: OffsetDateTime,
        pub deleted_at: Option<OffsetDateTime>,
        pub version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
