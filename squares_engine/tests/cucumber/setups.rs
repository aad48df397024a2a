use cucumber::given;
use sqp_common::Cents;
use squares_engine::{
    axis::{AxisNumbers, AxisSet},
    db_types::NewPool,
    rules::RuleConfig,
    PoolQueries,
};

use crate::cucumber::{squares_world::SettlementSystem, SquaresWorld};

const HOME: [u8; 10] = [5, 0, 3, 8, 1, 9, 2, 6, 4, 7];
const AWAY: [u8; 10] = [2, 9, 4, 0, 6, 1, 8, 3, 5, 7];

#[given("a fresh install")]
async fn fresh_database(world: &mut SquaresWorld) {
    let system = SettlementSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a pool with {word} rules costing {int} cents a square")]
async fn create_pool(world: &mut SquaresWorld, rules: String, cost: i64) {
    let mut config = RuleConfig::default();
    match rules.as_str() {
        "standard" => {},
        "rollover" => config.quarterly_rollover = true,
        "reverse" => config.reverse_winners = true,
        "every-score" => config.every_score_pays = true,
        "quarterly" => config.number_sets = 4,
        _ => panic!("Unknown rule set {rules}"),
    }
    let pool = NewPool::new("Big Game", Cents::from(cost)).with_game_id("401547417").with_rules(config);
    let pool = world.api().create_pool(pool).await.expect("Error creating pool");
    world.pool_id = Some(pool.id);
}

#[given(expr = "squares {int} to {int} are sold")]
async fn sell_squares(world: &mut SquaresWorld, from: i64, to: i64) {
    let pool_id = world.pool_id();
    for position in from..=to {
        let owner = format!("owner{position:02}");
        world.api().assign_square(pool_id, position, &owner, true).await.expect("Error assigning square");
    }
}

#[given("the numbers are drawn")]
async fn draw_numbers(world: &mut SquaresWorld) {
    let pool_id = world.pool_id();
    let pool = world.api().db().fetch_pool(pool_id).await.expect("Error fetching pool").expect("Pool does not exist");
    let set = AxisSet::new(HOME, AWAY).expect("Axis is valid");
    let axis = AxisNumbers::new((0..pool.number_sets).map(|_| set).collect());
    world.api().lock_pool_with_axis(pool_id, axis).await.expect("Error locking pool");
}

#[given(expr = "square {int} is sold")]
async fn sell_square(world: &mut SquaresWorld, position: i64) {
    sell_squares(world, position, position).await;
}
