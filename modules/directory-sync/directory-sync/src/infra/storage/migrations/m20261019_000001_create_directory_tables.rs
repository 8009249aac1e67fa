//! Initial migration for the mirrored directory tables.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Identity must be unique among live rows only, so that a retired
/// duplicate keeps its keys for the audit trail.
const LIVE_UNIQUE_INDEXES: [&str; 4] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_departments_external_id ON departments(external_id) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_departments_code ON departments(code) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_employees_external_id ON employees(external_id) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS ux_employees_employee_number ON employees(employee_number) WHERE deleted_at IS NULL",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Departments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Departments::ExternalId).string().not_null())
                    .col(ColumnDef::new(Departments::Name).string().not_null())
                    .col(ColumnDef::new(Departments::Code).string().not_null())
                    .col(
                        ColumnDef::new(Departments::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Departments::ManagerId).string())
                    .col(ColumnDef::new(Departments::ParentId).string())
                    .col(ColumnDef::new(Departments::ExternalCreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Departments::ExternalUpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Departments::LastSyncedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Departments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Departments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Departments::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Departments::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employees::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employees::ExternalId).string().not_null())
                    .col(ColumnDef::new(Employees::EmployeeNumber).string().not_null())
                    .col(ColumnDef::new(Employees::Name).string().not_null())
                    .col(ColumnDef::new(Employees::Email).string())
                    .col(ColumnDef::new(Employees::PhoneNumber).string())
                    .col(ColumnDef::new(Employees::DateOfBirth).date())
                    .col(ColumnDef::new(Employees::Gender).string())
                    .col(ColumnDef::new(Employees::HireDate).date())
                    .col(ColumnDef::new(Employees::Status).string().not_null())
                    .col(ColumnDef::new(Employees::DepartmentId).string())
                    .col(ColumnDef::new(Employees::DepartmentName).string())
                    .col(ColumnDef::new(Employees::DepartmentCode).string())
                    .col(ColumnDef::new(Employees::PositionId).string())
                    .col(ColumnDef::new(Employees::PositionName).string())
                    .col(ColumnDef::new(Employees::RankId).string())
                    .col(ColumnDef::new(Employees::RankName).string())
                    .col(ColumnDef::new(Employees::RankLevel).integer())
                    .col(ColumnDef::new(Employees::ManagerId).string())
                    .col(
                        ColumnDef::new(Employees::Roles)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Employees::ExclusionReason).text())
                    .col(ColumnDef::new(Employees::ExcludedBy).string())
                    .col(ColumnDef::new(Employees::ExcludedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Employees::IsAccessible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Employees::LastSyncedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Employees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Employees::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Employees::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Employees::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employees_email")
                    .table(Employees::Table)
                    .col(Employees::Email)
                    .to_owned(),
            )
            .await?;

        // Partial unique indexes are not expressible through the schema builder.
        let conn = manager.get_connection();
        for sql in LIVE_UNIQUE_INDEXES {
            conn.execute_unprepared(sql).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    ExternalId,
    Name,
    Code,
    DisplayOrder,
    ManagerId,
    ParentId,
    ExternalCreatedAt,
    ExternalUpdatedAt,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    Version,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    ExternalId,
    EmployeeNumber,
    Name,
    Email,
    PhoneNumber,
    DateOfBirth,
    Gender,
    HireDate,
    Status,
    DepartmentId,
    DepartmentName,
    DepartmentCode,
    PositionId,
    PositionName,
    RankId,
    RankName,
    RankLevel,
    ManagerId,
    Roles,
    ExclusionReason,
    ExcludedBy,
    ExcludedAt,
    IsAccessible,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    Version,
}
