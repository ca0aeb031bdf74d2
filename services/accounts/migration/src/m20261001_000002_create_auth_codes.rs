use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthCodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthCodes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthCodes::UserId).uuid().not_null())
                    .col(ColumnDef::new(AuthCodes::Code).string_len(5).not_null())
                    .col(
                        ColumnDef::new(AuthCodes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AuthCodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AuthCodes::Table, AuthCodes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves both "latest active code for (user, code)" and the live-code count.
        manager
            .create_index(
                Index::create()
                    .table(AuthCodes::Table)
                    .col(AuthCodes::UserId)
                    .col(AuthCodes::CreatedAt)
                    .name("idx_auth_codes_user_id_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthCodes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AuthCodes {
    Table,
    Id,
    UserId,
    Code,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
