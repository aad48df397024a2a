#![allow(dead_code)]
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use sqp_common::{Cents, GameSnapshot, GameStatus};
use squares_engine::{
    axis::{AxisNumbers, AxisSet},
    db_types::NewPool,
    events::EventProducers,
    rules::RuleConfig,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    PoolDatabase,
    SettlementApi,
    SqliteDatabase,
};

pub const HOME: [u8; 10] = [5, 0, 3, 8, 1, 9, 2, 6, 4, 7];
pub const AWAY: [u8; 10] = [2, 9, 4, 0, 6, 1, 8, 3, 5, 7];

/// One dollar a square, so a full grid is a $100 pot.
pub const COST_PER_SQUARE: i64 = 100;

pub fn scenario_axis(number_sets: i64) -> AxisNumbers {
    let set = AxisSet::new(HOME, AWAY).expect("Scenario axis is valid");
    AxisNumbers::new((0..number_sets).map(|_| set).collect())
}

pub fn snap(home: i64, away: i64, period: i64, status: GameStatus) -> GameSnapshot {
    GameSnapshot::new(home, away, period, status)
}

pub fn live(home: i64, away: i64, period: i64) -> GameSnapshot {
    snap(home, away, period, GameStatus::In)
}

pub fn owner_of(position: i64) -> String {
    format!("owner{position:02}")
}

pub async fn setup() -> SettlementApi<SqliteDatabase> {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> SettlementApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    SettlementApi::new(db, producers)
}

pub async fn tear_down(mut api: SettlementApi<SqliteDatabase>) {
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

/// Creates a pool, hands out the given squares and locks it with the scenario axis.
pub async fn locked_pool<I>(api: &SettlementApi<SqliteDatabase>, rules: RuleConfig, squares: I) -> i64
where I: IntoIterator<Item = i64> {
    let number_sets = rules.number_sets;
    let pool_id = unlocked_pool(api, rules, squares).await;
    api.lock_pool_with_axis(pool_id, scenario_axis(number_sets)).await.expect("Error locking pool");
    pool_id
}

pub async fn unlocked_pool<I>(api: &SettlementApi<SqliteDatabase>, rules: RuleConfig, squares: I) -> i64
where I: IntoIterator<Item = i64> {
    let new_pool =
        NewPool::new("Big Game", Cents::from(COST_PER_SQUARE)).with_game_id("401547417").with_rules(rules);
    let pool = api.create_pool(new_pool).await.expect("Error creating pool");
    for position in squares {
        api.assign_square(pool.id, position, &owner_of(position), true).await.expect("Error assigning square");
    }
    pool.id
}

/// Feeds the snapshots through the pipeline, one after the other.
pub async fn play(api: &SettlementApi<SqliteDatabase>, pool_id: i64, snapshots: &[GameSnapshot]) {
    for s in snapshots {
        api.process_snapshot(pool_id, s).await.expect("Error processing snapshot");
    }
}

/// A complete game with a score change in every quarter.
///
/// | checkpoint | score |
/// |------------|-------|
/// | Q1         | 7-3   |
/// | HALF       | 14-10 |
/// | Q3         | 17-10 |
/// | FINAL      | 24-17 |
pub fn full_game() -> Vec<GameSnapshot> {
    vec![
        snap(0, 0, 1, GameStatus::In),
        live(7, 0, 1),
        live(7, 3, 1),
        live(7, 3, 2),
        live(14, 3, 2),
        live(14, 10, 2),
        live(14, 10, 3),
        live(17, 10, 3),
        live(17, 10, 4),
        live(24, 10, 4),
        live(24, 17, 4),
        snap(24, 17, 4, GameStatus::Post),
    ]
}
