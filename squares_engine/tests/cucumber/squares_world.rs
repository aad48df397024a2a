use cucumber::World;
use log::*;
use squares_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    SettlementApi,
    SqliteDatabase,
};
use tokio::time::sleep;

#[derive(Default, Debug, World)]
pub struct SquaresWorld {
    pub system: Option<SettlementSystem>,
    pub pool_id: Option<i64>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct SettlementSystem {
    pub db_path: String,
    pub api: SettlementApi<SqliteDatabase>,
}

impl SquaresWorld {
    pub fn api(&self) -> &SettlementApi<SqliteDatabase> {
        &self.system.as_ref().expect("SettlementApi not initialised").api
    }

    pub fn pool_id(&self) -> i64 {
        self.pool_id.expect("No pool has been created")
    }
}

impl SettlementSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(std::time::Duration::from_millis(50)).await;
        let api = SettlementApi::new(db, EventProducers::default());
        Self { db_path: url, api }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
