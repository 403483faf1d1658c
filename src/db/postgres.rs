use async_trait::async_trait;
use deadpool_postgres::{Config, Object, Pool, PoolConfig, Runtime};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tracing::{error, info, warn};

use super::{QuestionStore, UnitOfWork};
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::NewChoice;

/// PostgreSQL への接続プールを握るリポジトリ層。
/// Deadpool の `Pool` を内部に保持し、リクエストごとに 1 接続を貸し出す。
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// 接続プールを構築し、起動時に疎通確認まで実施する。
    ///
    /// # Arguments
    /// * `config` - The database configuration
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - Database instance or error
    pub async fn new(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!("Creating PostgreSQL connection pool for host: {}", config.display_host());

        let pool = Self::create_pool(config)?;

        let db = Database { pool };
        db.ping().await?;
        info!("Database connection test successful");

        Ok(db)
    }

    /// Deadpool 用の `Config` を組み立ててプールを生成する内部関数。
    /// 接続文字列の解釈 (`sslmode` を含む) は tokio-postgres に任せ、
    /// TLS コネクタは `native_tls` で差し込む。
    fn create_pool(config: &DatabaseConfig) -> Result<Pool, StoreError> {
        let mut pg_config = Config::new();
        pg_config.url = Some(config.connection_string.clone());

        pg_config.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(config.max_connections as usize);
        pool_config.timeouts.wait = Some(config.connection_timeout);
        pool_config.timeouts.create = Some(config.connection_timeout);
        pg_config.pool = Some(pool_config);

        let tls_connector = TlsConnector::builder()
            .build()
            .map_err(|e| {
                error!("Failed to create TLS connector: {}", e);
                StoreError::connection(format!("TLS connector creation failed: {}", e))
            })?;
        let tls = MakeTlsConnector::new(tls_connector);

        pg_config.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| {
                error!("Failed to create connection pool: {}", e);
                StoreError::connection(format!("Connection pool creation failed: {}", e))
            })
    }

    /// プールから接続を借りる小さなラッパー。
    /// `PoolError` はここで `StoreError` に変換される。
    async fn get_connection(&self) -> Result<Object, StoreError> {
        self.pool.get().await.map_err(StoreError::from)
    }

    /// アプリ起動時にテーブル群を CREATE する簡易マイグレーター。
    /// 何度実行しても同じ結果になるよう `IF NOT EXISTS` を付けている。
    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running database migrations");

        let client = self.get_connection().await?;

        let statements = [
            (
                "questions table",
                r#"
                CREATE TABLE IF NOT EXISTS questions (
                    id SERIAL PRIMARY KEY,
                    question_text VARCHAR NOT NULL
                )
                "#,
            ),
            (
                "questions question_text index",
                "CREATE INDEX IF NOT EXISTS ix_questions_question_text ON questions(question_text)",
            ),
            (
                "choices table",
                r#"
                CREATE TABLE IF NOT EXISTS choices (
                    id SERIAL PRIMARY KEY,
                    choice_txt VARCHAR NOT NULL,
                    is_correct BOOLEAN NOT NULL DEFAULT FALSE,
                    question_id INTEGER NOT NULL REFERENCES questions(id)
                )
                "#,
            ),
            (
                "choices choice_txt index",
                "CREATE INDEX IF NOT EXISTS ix_choices_choice_txt ON choices(choice_txt)",
            ),
            (
                "choices question_id index",
                "CREATE INDEX IF NOT EXISTS ix_choices_question_id ON choices(question_id)",
            ),
        ];

        for (name, sql) in statements {
            client.batch_execute(sql)
                .await
                .map_err(|e| {
                    error!("Failed to create {}: {}", name, e);
                    StoreError::from(e)
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for Database {
    /// 1 接続を借りて `BEGIN` を発行する。
    /// 接続は返却された `PgUnitOfWork` が所有し、スコープを抜けると必ず手放される。
    async fn begin<'a>(&'a self) -> Result<Box<dyn UnitOfWork + 'a>, StoreError> {
        let client = self.get_connection().await?;
        client.batch_execute("BEGIN").await.map_err(StoreError::from)?;

        Ok(Box::new(PgUnitOfWork {
            client: Some(client),
            open: true,
        }))
    }

    /// `SELECT 1` を投げて DB が生きているか確認する。
    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.get_connection().await?;

        client.execute("SELECT 1", &[])
            .await
            .map_err(|e| {
                error!("Database health check failed: {}", e);
                StoreError::from(e)
            })?;

        Ok(())
    }
}

/// トランザクションを開いたままの接続。
/// `open` のまま drop された場合 (エラー伝播やリクエストのキャンセル) は、
/// 接続をプールから切り離して破棄する。未完了のトランザクションが
/// 別のリクエストに引き継がれることはない。
struct PgUnitOfWork {
    client: Option<Object>,
    open: bool,
}

impl PgUnitOfWork {
    fn client(&mut self) -> Result<&mut Object, StoreError> {
        self.client
            .as_mut()
            .ok_or_else(|| StoreError::connection("Session already released"))
    }

    async fn finish(&mut self, statement: &str) -> Result<(), StoreError> {
        if !self.open {
            return Ok(());
        }

        self.client()?
            .batch_execute(statement)
            .await
            .map_err(StoreError::from)?;
        self.open = false;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    /// `RETURNING id` が flush の役割を果たし、コミット前に採番済み ID を得られる。
    async fn insert_question(&mut self, question_text: &str) -> Result<i32, StoreError> {
        let query = "INSERT INTO questions (question_text) VALUES ($1) RETURNING id";

        let row = self.client()?
            .query_one(query, &[&question_text])
            .await
            .map_err(StoreError::from)?;

        Ok(row.get(0))
    }

    async fn insert_choice(&mut self, question_id: i32, choice: &NewChoice) -> Result<i32, StoreError> {
        let query = r#"
            INSERT INTO choices (choice_txt, is_correct, question_id)
            VALUES ($1, $2, $3)
            RETURNING id
        "#;

        let row = self.client()?
            .query_one(query, &[&choice.choice_txt, &choice.is_correct, &question_id])
            .await
            .map_err(StoreError::from)?;

        Ok(row.get(0))
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PgUnitOfWork {
    fn drop(&mut self) {
        if !self.open {
            return;
        }

        if let Some(client) = self.client.take() {
            warn!("Discarding connection with an unfinished transaction");
            // Closing the socket makes the server abort the transaction
            drop(Object::take(client));
        }
    }
}
