use crate::Result;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

#[derive(TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "rabbit".to_string())]
    database: String,
    #[builder(default = "rabbit".to_string())]
    username: String,
    #[builder(default = "rabbit".to_string())]
    password: String,
}

/// Test fixture for a disposable MySQL server.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Starts a MySQL container suitable for integration tests.
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", "8.4")
            .with_exposed_port(3306_u16.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        Ok(self.container.get_host().await?.to_string())
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(3306).await?)
    }

    pub async fn database_url(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    /// Opens a pool, retrying while the server finishes booting.
    ///
    /// MySQL logs "ready for connections" once for the init phase and once
    /// for the real server, so the first attempts can still be refused.
    pub async fn pool(&self) -> Result<MySqlPool> {
        let url = self.database_url().await?;
        let mut attempts = 0;

        loop {
            match MySqlPoolOptions::new()
                .max_connections(8)
                .connect(&url)
                .await
            {
                Ok(pool) => return Ok(pool),
                Err(err) if attempts >= 20 => return Err(err.into()),
                Err(_) => {
                    attempts += 1;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    /// Returns the underlying container reference.
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }
}
