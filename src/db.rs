use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Build, Rocket};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::migrate::Migrator;
use std::str::FromStr;
use crate::timetable::schema;

// macro to encode/decode a unit enum as SQL text, the enum provides as_str() and FromStr
#[macro_export]
macro_rules! impl_sqlx_text_enum_encode_decode {
    ($type:ident) => {
        impl<DB: sqlx::Database> sqlx::Type<DB> for $type
        where str: sqlx::Type<DB>
        {
            fn type_info() -> <DB as sqlx::Database>::TypeInfo {
                // TEXT columns only
                <&str as sqlx::Type<DB>>::type_info()
            }
            fn compatible(ty: &<DB as sqlx::Database>::TypeInfo) -> bool {
                <&str as sqlx::Type<DB>>::compatible(ty)
            }
        }

        impl<'r, DB: sqlx::Database> sqlx::Decode<'r, DB> for $type
        where &'r str: sqlx::Decode<'r, DB>
        {
            fn decode(value: <DB as sqlx::Database>::ValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let value = <&str as sqlx::Decode<DB>>::decode(value)?;
                Ok(value.parse::<$type>()?)
            }
        }

        impl<'q, DB: sqlx::Database> sqlx::Encode<'q, DB> for $type
        where &'q str: sqlx::Encode<'q, DB>
        {
            fn encode_by_ref(&self, buf: &mut <DB as sqlx::Database>::ArgumentBuffer<'q>) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<'q, DB>>::encode(self.as_str(), buf)
            }
        }
    };
}

pub static MIGRATOR: Migrator = sqlx::migrate!("db/migrations");

pub struct DbPool(pub SqlitePool);

pub async fn open_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(database_url)?;
    let pool = if database_url.contains(":memory:") {
        // every connection to an in-memory database sees its own database,
        // keep exactly one alive for the whole pool lifetime
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?
    } else {
        let opts = opts
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal); // use WAL for better concurrency
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?
    };
    Ok(pool)
}

pub struct DbPoolFairing();
#[rocket::async_trait]
impl Fairing for DbPoolFairing {
    fn info(&self) -> Info {
        Info {
            name: "SQLite Database Pool with Migrations",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let database_url = if cfg!(test) {
            "sqlite::memory:".to_string()
        } else {
            match rocket.figment().extract_inner::<String>("database_url") {
                Ok(url) => url,
                Err(err) => {
                    error!("Config key database_url is missing: {err}");
                    return Err(rocket);
                }
            }
        };

        info!("Opening database: {database_url}");
        let pool = match open_pool(&database_url).await {
            Ok(pool) => pool,
            Err(err) => {
                error!("Database connection error: {:?}", err);
                return Err(rocket);
            }
        };

        match MIGRATOR.run(&pool).await {
            Ok(_) => info!("Migrations applied successfully!"),
            Err(err) => {
                error!("Migration error: {:?}", err);
                return Err(rocket);
            }
        };

        match schema::verify(&pool).await {
            Ok(missing) if missing.is_empty() => debug!("Timetable schema matches snapshot"),
            Ok(missing) => warn!("Timetable schema drift, missing columns: {}", missing.join(", ")),
            Err(err) => warn!("Timetable schema check failed: {err}"),
        }

        Ok(rocket.manage(DbPool(pool)))
    }
}
