#![recursion_limit = "512"]

#[macro_use] pub extern crate diesel;
#[macro_use] extern crate diesel_migrations;
#[macro_use] extern crate error_chain;
#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;
pub extern crate chrono;

pub use diesel::prelude::*;
pub use diesel::pg::PgConnection;

pub type ConnManager = diesel::r2d2::ConnectionManager<PgConnection>;
pub type PooledConn = diesel::r2d2::PooledConnection<ConnManager>;
pub type Pool = diesel::r2d2::Pool<ConnManager>;

pub mod schema;
pub mod models;
pub mod errors;
pub use models::*;
pub use errors::*;

pub mod slug;
pub mod validate;
pub mod query;
pub mod owner;
pub mod user;
pub mod translation;
pub mod lesson;
pub mod training;
pub mod import;

pub mod db {
    use super::*;

    embed_migrations!();

    pub fn connect(database_url: &str) -> Result<PgConnection> {
        PgConnection::establish(database_url)
            .chain_err(|| "Error connecting to database!")
    }

    pub fn pool(database_url: &str) -> Result<Pool> {
        let manager = ConnManager::new(database_url);
        diesel::r2d2::Pool::builder()
            .build(manager)
            .chain_err(|| "Couldn't build the connection pool!")
    }

    pub fn run_migrations(conn: &PgConnection) -> Result<()> {
        embedded_migrations::run(conn)?;
        info!("Migrations checked.");
        Ok(())
    }

    /// Brings the schema up to date and tells whether any user exists yet.
    pub fn check(conn: &PgConnection) -> Result<bool> {
        run_migrations(conn).chain_err(|| "Couldn't run the migrations.")?;
        is_installed(conn)
    }

    pub fn is_installed(conn: &PgConnection) -> Result<bool> {
        let count: i64 = schema::users::table
            .count()
            .get_result(conn)?;

        Ok(count > 0)
    }
}
