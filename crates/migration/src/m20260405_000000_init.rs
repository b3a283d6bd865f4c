use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    TelegramId,
    PairCode,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    CreatorId,
    Description,
    SourceKind,
    SourcePath,
    TotalMinor,
    Currency,
    CreatedAt,
}

#[derive(Iden)]
enum Obligations {
    Table,
    Id,
    ExpenseId,
    PayerId,
    PayeeId,
    AmountMinor,
    Currency,
    Label,
    Category,
    Status,
    CreatedAt,
    PaidAt,
}

#[derive(Iden)]
enum Friends {
    Table,
    Id,
    UserId,
    FriendUserId,
    Nickname,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::TelegramId).string())
                    .col(ColumnDef::new(Users::PairCode).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-username")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::CreatorId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::Description).string())
                    .col(ColumnDef::new(Expenses::SourceKind).string().not_null())
                    .col(ColumnDef::new(Expenses::SourcePath).string())
                    .col(
                        ColumnDef::new(Expenses::TotalMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Currency).string().not_null())
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-creator_id")
                            .from(Expenses::Table, Expenses::CreatorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-created_at")
                    .table(Expenses::Table)
                    .col(Expenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Obligations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Obligations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Obligations::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(Obligations::PayerId).uuid().not_null())
                    .col(ColumnDef::new(Obligations::PayeeId).uuid().not_null())
                    .col(
                        ColumnDef::new(Obligations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Obligations::Currency).string().not_null())
                    .col(ColumnDef::new(Obligations::Label).string())
                    .col(ColumnDef::new(Obligations::Category).string())
                    .col(ColumnDef::new(Obligations::Status).string().not_null())
                    .col(
                        ColumnDef::new(Obligations::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Obligations::PaidAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-obligations-expense_id")
                            .from(Obligations::Table, Obligations::ExpenseId)
                            .to(Expenses::Table, Expenses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-obligations-payer_id")
                            .from(Obligations::Table, Obligations::PayerId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-obligations-payee_id")
                            .from(Obligations::Table, Obligations::PayeeId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-obligations-payer_id-status")
                    .table(Obligations::Table)
                    .col(Obligations::PayerId)
                    .col(Obligations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-obligations-payee_id-status")
                    .table(Obligations::Table)
                    .col(Obligations::PayeeId)
                    .col(Obligations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-obligations-expense_id")
                    .table(Obligations::Table)
                    .col(Obligations::ExpenseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Friends::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Friends::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Friends::UserId).uuid().not_null())
                    .col(ColumnDef::new(Friends::FriendUserId).uuid().not_null())
                    .col(ColumnDef::new(Friends::Nickname).string().not_null())
                    .col(ColumnDef::new(Friends::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-friends-user_id")
                            .from(Friends::Table, Friends::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-friends-friend_user_id")
                            .from(Friends::Table, Friends::FriendUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-friends-user_id")
                    .table(Friends::Table)
                    .col(Friends::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friends::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Obligations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
