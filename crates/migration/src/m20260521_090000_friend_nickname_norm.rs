//! Adds the normalized nickname column used for case-insensitive friend
//! lookups and duplicate detection, backfilling existing rows.

use sea_orm::Statement;
use sea_orm_migration::prelude::*;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Friends {
    Table,
    UserId,
    NicknameNorm,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Friends::Table)
                    .add_column(
                        ColumnDef::new(Friends::NicknameNorm)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let rows = db
            .query_all(Statement::from_string(
                backend,
                "SELECT id, nickname FROM friends".to_owned(),
            ))
            .await?;

        for row in rows {
            let id: Uuid = row.try_get("", "id")?;
            let nickname: String = row.try_get("", "nickname")?;
            let norm = nickname.trim().nfkc().collect::<String>().to_lowercase();
            db.execute(Statement::from_sql_and_values(
                backend,
                "UPDATE friends SET nickname_norm = ? WHERE id = ?",
                [norm.into(), id.into()],
            ))
            .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx-friends-user_id-nickname_norm")
                    .table(Friends::Table)
                    .col(Friends::UserId)
                    .col(Friends::NicknameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx-friends-user_id-nickname_norm")
                    .table(Friends::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Friends::Table)
                    .drop_column(Friends::NicknameNorm)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
