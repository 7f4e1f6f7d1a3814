//! Initial schema migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create endpoints table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Endpoint::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Endpoint::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Endpoint::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Endpoint::Url).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Endpoint::ApiPath)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Endpoint::ApiKey).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Endpoint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create tunnels table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Tunnel::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tunnel::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tunnel::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Tunnel::EndpointId).big_integer().not_null())
                    .col(ColumnDef::new(Tunnel::InstanceId).string_len(255))
                    .col(
                        ColumnDef::new(Tunnel::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tunnels_endpoint_id")
                            .from(Tunnel::Table, Tunnel::EndpointId)
                            .to(Endpoint::Table, Endpoint::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tunnels_endpoint_id")
                    .table(Tunnel::Table)
                    .col(Tunnel::EndpointId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create tunnel_operation_logs table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TunnelOperationLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TunnelOperationLog::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TunnelOperationLog::TunnelId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TunnelOperationLog::TunnelName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TunnelOperationLog::Action)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TunnelOperationLog::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TunnelOperationLog::Message).text().not_null())
                    .col(
                        ColumnDef::new(TunnelOperationLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tunnel_operation_logs_tunnel_id")
                    .table(TunnelOperationLog::Table)
                    .col(TunnelOperationLog::TunnelId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tunnel_operation_logs_created_at")
                    .table(TunnelOperationLog::Table)
                    .col(TunnelOperationLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TunnelOperationLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tunnel::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Endpoint::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum Endpoint {
    #[sea_orm(iden = "endpoints")]
    Table,
    Id,
    Name,
    Url,
    ApiPath,
    ApiKey,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tunnel {
    #[sea_orm(iden = "tunnels")]
    Table,
    Id,
    Name,
    EndpointId,
    InstanceId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TunnelOperationLog {
    #[sea_orm(iden = "tunnel_operation_logs")]
    Table,
    Id,
    TunnelId,
    TunnelName,
    Action,
    Status,
    Message,
    CreatedAt,
}
