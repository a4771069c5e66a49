use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Alias, Expr, Index, OnConflict, Query};
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityName, EntityTrait, IdenStatic, QueryOrder,
    Schema, SqlxPostgresConnector, TransactionTrait,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::constants::{DB_SCHEMA, INSERT_CHUNK_SIZE};
use crate::db::models::{bets, events, users, wallets};
use crate::db::store::{EntityKind, NewBet, StoreTx, TradeStore};
use crate::error::{Error, Result};

pub struct Db {
    connection: DatabaseConnection,
}

impl Db {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        let connection = SqlxPostgresConnector::from_sqlx_postgres_pool(pool);

        info!("✅ Connected to PostgreSQL");
        Ok(Self { connection })
    }

    /// Creates the schema, the four tables and the bet time index if missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        info!("Ensuring schema {} exists...", DB_SCHEMA);

        self.connection
            .execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {}", DB_SCHEMA))
            .await
            .map_err(|e| Error::Database(format!("Failed to create schema: {}", e)))?;

        let backend = self.connection.get_database_backend();
        let schema = Schema::new(backend);

        // Bets reference the other three, so they go last.
        let tables = [
            schema.create_table_from_entity(users::Entity),
            schema.create_table_from_entity(wallets::Entity),
            schema.create_table_from_entity(events::Entity),
            schema.create_table_from_entity(bets::Entity),
        ];

        for mut stmt in tables {
            stmt.if_not_exists();
            self.connection
                .execute(backend.build(&stmt))
                .await
                .map_err(|e| Error::Database(format!("Failed to create table: {}", e)))?;
        }

        let index = Index::create()
            .if_not_exists()
            .name("idx_bets_bet_timestamp")
            .table(bets::Entity.table_ref())
            .col(bets::Column::BetTimestamp)
            .to_owned();

        self.connection
            .execute(backend.build(&index))
            .await
            .map_err(|e| Error::Database(format!("Failed to create index: {}", e)))?;

        info!("✅ Schema ready");
        Ok(())
    }
}

#[async_trait]
impl TradeStore for Db {
    type Tx = PgTx;

    async fn latest_bet_time(&self) -> Result<Option<DateTime<Utc>>> {
        let latest = bets::Entity::find()
            .order_by_desc(bets::Column::BetTimestamp)
            .one(&self.connection)
            .await?;

        Ok(latest.map(|bet| bet.bet_timestamp.with_timezone(&Utc)))
    }

    async fn begin(&self) -> Result<PgTx> {
        let txn = self.connection.begin().await?;
        Ok(PgTx { txn })
    }
}

/// One page's worth of writes.
pub struct PgTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn upsert(&mut self, kind: EntityKind, keys: &[String]) -> Result<u64> {
        let mut inserted = 0;

        for chunk in keys.chunks(INSERT_CHUNK_SIZE) {
            inserted += match kind {
                EntityKind::User => {
                    users::Entity::insert_many(chunk.iter().map(|name| users::ActiveModel {
                        user_id: ActiveValue::NotSet,
                        display_name: ActiveValue::Set(name.clone()),
                    }))
                    .on_conflict(OnConflict::column(users::Column::DisplayName).do_nothing().to_owned())
                    .exec_without_returning(&self.txn)
                    .await?
                }
                EntityKind::Wallet => {
                    wallets::Entity::insert_many(chunk.iter().map(|address| wallets::ActiveModel {
                        wallet_id: ActiveValue::NotSet,
                        wallet_address: ActiveValue::Set(address.clone()),
                    }))
                    .on_conflict(OnConflict::column(wallets::Column::WalletAddress).do_nothing().to_owned())
                    .exec_without_returning(&self.txn)
                    .await?
                }
                EntityKind::Event => {
                    events::Entity::insert_many(chunk.iter().map(|slug| events::ActiveModel {
                        event_id: ActiveValue::NotSet,
                        event_slug: ActiveValue::Set(slug.clone()),
                    }))
                    .on_conflict(OnConflict::column(events::Column::EventSlug).do_nothing().to_owned())
                    .exec_without_returning(&self.txn)
                    .await?
                }
            };
        }

        debug!("Upserted {} new {} from {} keys", inserted, kind.table(), keys.len());
        Ok(inserted)
    }

    async fn resolve_ids(&mut self, kind: EntityKind, keys: &[String]) -> Result<HashMap<String, i64>> {
        let mut ids = HashMap::with_capacity(keys.len());
        let backend = self.txn.get_database_backend();

        for chunk in keys.chunks(INSERT_CHUNK_SIZE) {
            let select = Query::select()
                .column(Alias::new(kind.natural_key_column()))
                .column(Alias::new(kind.surrogate_column()))
                .from((Alias::new(DB_SCHEMA), Alias::new(kind.table())))
                .and_where(Expr::col(Alias::new(kind.natural_key_column())).is_in(chunk.iter().cloned()))
                .to_owned();

            for row in self.txn.query_all(backend.build(&select)).await? {
                let key: String = row.try_get("", kind.natural_key_column())?;
                let id: i64 = row.try_get("", kind.surrogate_column())?;
                ids.insert(key, id);
            }
        }

        Ok(ids)
    }

    async fn stored_hashes(&mut self, hashes: &[String]) -> Result<HashSet<String>> {
        let mut stored = HashSet::new();
        let backend = self.txn.get_database_backend();

        for chunk in hashes.chunks(INSERT_CHUNK_SIZE) {
            let select = Query::select()
                .column(bets::Column::TransactionHash)
                .from(bets::Entity.table_ref())
                .and_where(Expr::col(bets::Column::TransactionHash).is_in(chunk.iter().cloned()))
                .to_owned();

            for row in self.txn.query_all(backend.build(&select)).await? {
                stored.insert(row.try_get::<String>("", bets::Column::TransactionHash.as_str())?);
            }
        }

        Ok(stored)
    }

    async fn insert_bets(&mut self, rows: &[NewBet]) -> Result<u64> {
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            let models = chunk.iter().map(bet_active_model).collect::<Result<Vec<_>>>()?;
            inserted += bets::Entity::insert_many(models)
                .on_conflict(OnConflict::column(bets::Column::TransactionHash).do_nothing().to_owned())
                .exec_without_returning(&self.txn)
                .await?;
        }

        Ok(inserted)
    }

    async fn commit(self) -> Result<()> {
        self.txn.commit().await?;
        Ok(())
    }
}

fn bet_active_model(bet: &NewBet) -> Result<bets::ActiveModel> {
    Ok(bets::ActiveModel {
        bet_id: ActiveValue::NotSet,
        user_id: ActiveValue::Set(bet.user_id),
        wallet_id: ActiveValue::Set(bet.wallet_id),
        event_id: ActiveValue::Set(bet.event_id),
        bet_timestamp: ActiveValue::Set(bet.bet_timestamp),
        cost: ActiveValue::Set(to_decimal(bet.cost)?),
        transaction_hash: ActiveValue::Set(bet.transaction_hash.clone()),
        title: ActiveValue::Set(bet.title.clone()),
        outcome: ActiveValue::Set(bet.outcome.clone()),
        side: ActiveValue::Set(bet.side.clone()),
        asset: ActiveValue::Set(bet.asset.clone()),
        condition_id: ActiveValue::Set(bet.condition_id.clone()),
        price: ActiveValue::Set(to_decimal(bet.price)?),
        size: ActiveValue::Set(to_decimal(bet.size)?),
    })
}

/// Rounds to the eight decimal places the numeric columns keep.
fn to_decimal(v: f64) -> Result<Decimal> {
    Decimal::from_str(&format!("{:.8}", v))
        .map_err(|e| Error::Database(format!("{} does not fit a numeric column: {}", v, e)))
}
