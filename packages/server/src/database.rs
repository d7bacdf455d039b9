use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::debug;

use crate::entity::*;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    create_tables(&db).await?;

    Ok(db)
}

/// Create every table (and its single-column indexes) that does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, user::Entity).await?;
    create_table(db, course::Entity).await?;
    create_table(db, course_permission::Entity).await?;
    create_table(db, course_instance::Entity).await?;
    create_table(db, course_instance_permission::Entity).await?;
    create_table(db, enrollment::Entity).await?;
    create_table(db, assessment::Entity).await?;
    create_table(db, assessment_question::Entity).await?;
    create_table(db, question::Entity).await?;
    create_table(db, variant::Entity).await?;
    create_table(db, submission::Entity).await?;
    create_table(db, workspace::Entity).await?;
    create_table(db, file::Entity).await?;
    create_table(db, file_edit::Entity).await?;
    create_table(db, job_sequence::Entity).await?;
    create_table(db, job::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute_raw(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute_raw(backend.build(&index)).await?;
    }

    debug!(table = entity.table_name(), "Ensured table exists");
    Ok(())
}
