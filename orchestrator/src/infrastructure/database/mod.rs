pub mod model;

use sea_orm::{ConnectOptions, DatabaseConnection};

/// Shared connection handle threaded into every repository.
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let mut options = ConnectOptions::new(url.to_owned());
        options.sqlx_logging(false);
        let connection = sea_orm::Database::connect(options).await?;
        Ok(Self { connection })
    }

    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}
