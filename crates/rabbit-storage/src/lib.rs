//! Mapping store backends.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use rabbit_core::repository::{CodePage, ReadRepository, Repository, Result};
pub use rabbit_core::StorageError;

/// DDL for the `short_url_map` table.
pub const MYSQL_SHORT_URL_MAP_DDL: &str = include_str!("../ddl/mysql/short_url_map.sql");
