//! Database connection and schema bootstrap.
//!
//! The schema is generated from the entity definitions with SeaORM's
//! `Schema::create_table_from_entity`, so the tables always match the Rust
//! structs without hand-written SQL. Creation is `IF NOT EXISTS`, safe to
//! run on every startup.

use crate::entities::{Envelope, PeriodReport, SystemState, Transaction};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the backing store.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all engine tables from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut envelope_table = schema.create_table_from_entity(Envelope);
    let mut transaction_table = schema.create_table_from_entity(Transaction);
    let mut report_table = schema.create_table_from_entity(PeriodReport);
    let mut system_state_table = schema.create_table_from_entity(SystemState);

    db.execute(builder.build(envelope_table.if_not_exists()))
        .await?;
    db.execute(builder.build(transaction_table.if_not_exists()))
        .await?;
    db.execute(builder.build(report_table.if_not_exists())).await?;
    db.execute(builder.build(system_state_table.if_not_exists()))
        .await?;

    Ok(())
}
