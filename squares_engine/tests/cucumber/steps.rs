use std::time::Duration;

use cucumber::{then, when};
use sqp_common::{Cents, GameSnapshot, GameStatus};
use squares_engine::{
    db_types::{AuditType, Checkpoint, Settlement, SettlementOutcome},
    PoolQueries,
};

use crate::cucumber::SquaresWorld;

async fn feed(world: &mut SquaresWorld, snapshot: GameSnapshot) {
    let pool_id = world.pool_id();
    world.last_error = world.api().process_snapshot(pool_id, &snapshot).await.err().map(|e| e.to_string());
}

#[when(expr = "the feed reports {int}-{int} in period {int}")]
async fn live_score(world: &mut SquaresWorld, home: i64, away: i64, period: i64) {
    feed(world, GameSnapshot::new(home, away, period, GameStatus::In)).await;
}

#[when(expr = "the feed reports a final score of {int}-{int}")]
async fn final_score(world: &mut SquaresWorld, home: i64, away: i64) {
    feed(world, GameSnapshot::new(home, away, 4, GameStatus::Post)).await;
}

#[when(expr = "the feed reports a final score of {int}-{int} after overtime")]
async fn final_score_after_overtime(world: &mut SquaresWorld, home: i64, away: i64) {
    feed(world, GameSnapshot::new(home, away, 5, GameStatus::Post)).await;
}

#[when("an admin fixes the pool")]
async fn fix_pool(world: &mut SquaresWorld) {
    let pool_id = world.pool_id();
    world.last_error = world.api().fix(pool_id).await.err().map(|e| e.to_string());
}

#[when("an admin resets the pool")]
async fn reset_pool(world: &mut SquaresWorld) {
    let pool_id = world.pool_id();
    world.api().reset(pool_id).await.expect("Error resetting pool");
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut SquaresWorld, ms: u64) {
    let delay = Duration::from_millis(ms);
    tokio::time::sleep(delay).await;
}

async fn settlement_for(world: &mut SquaresWorld, checkpoint: Checkpoint) -> Settlement {
    let pool_id = world.pool_id();
    let settlements = world.api().db().fetch_settlements(pool_id).await.expect("Error fetching settlements");
    let mut matching = settlements.into_iter().filter(|s| s.checkpoint == checkpoint).collect::<Vec<_>>();
    assert_eq!(matching.len(), 1, "Expected exactly one settlement for {checkpoint}");
    matching.remove(0)
}

#[then(expr = "{word} pays square {int} {int} cents")]
async fn check_paid(world: &mut SquaresWorld, checkpoint: Checkpoint, square: i64, amount: i64) {
    let settlement = settlement_for(world, checkpoint).await;
    assert_eq!(settlement.outcome, SettlementOutcome::Paid, "{checkpoint} was not paid");
    assert_eq!(settlement.square, square, "Wrong winning square for {checkpoint}");
    assert_eq!(settlement.amount, Cents::from(amount), "Wrong payout for {checkpoint}");
}

#[then(expr = "{word} lands on square {int} which is {word}")]
async fn check_unpaid(world: &mut SquaresWorld, checkpoint: Checkpoint, square: i64, outcome: String) {
    let settlement = settlement_for(world, checkpoint).await;
    let expected = match outcome.as_str() {
        "unclaimed" => SettlementOutcome::Unclaimed,
        "rolled-over" => SettlementOutcome::RolledOver,
        "a-repeat" => SettlementOutcome::Repeat,
        _ => panic!("Unknown outcome {outcome}"),
    };
    assert_eq!(settlement.square, square, "Wrong square for {checkpoint}");
    assert_eq!(settlement.outcome, expected, "Wrong outcome for {checkpoint}");
}

#[then(expr = "{word} has not been settled")]
async fn check_not_settled(world: &mut SquaresWorld, checkpoint: Checkpoint) {
    let pool_id = world.pool_id();
    let settlements = world.api().db().fetch_settlements(pool_id).await.expect("Error fetching settlements");
    assert!(settlements.iter().all(|s| s.checkpoint != checkpoint), "{checkpoint} was settled");
}

#[then(expr = "{int} winners have been paid {int} cents in total")]
async fn check_winners(world: &mut SquaresWorld, count: usize, total: i64) {
    let pool_id = world.pool_id();
    let winners = world.api().db().fetch_winners(pool_id).await.expect("Error fetching winners");
    assert_eq!(winners.len(), count, "Wrong number of winners");
    let paid = winners.iter().map(|w| w.amount).sum::<Cents>();
    assert_eq!(paid, Cents::from(total), "Wrong total paid");
}

#[then(expr = "the pool shows {int}-{int}")]
async fn check_score(world: &mut SquaresWorld, home: i64, away: i64) {
    let pool_id = world.pool_id();
    let pool = world.api().db().fetch_pool(pool_id).await.expect("Error fetching pool").expect("Pool does not exist");
    assert_eq!((pool.home_score, pool.away_score), (home, away), "Wrong score");
}

#[then(expr = "the pool is {word}")]
async fn check_state(world: &mut SquaresWorld, state: String) {
    let pool_id = world.pool_id();
    let pool = world.api().db().fetch_pool(pool_id).await.expect("Error fetching pool").expect("Pool does not exist");
    match state.as_str() {
        "suspended" => assert!(pool.suspended, "Pool is not suspended"),
        "running" => assert!(!pool.suspended, "Pool is suspended"),
        "locked" => assert!(pool.is_locked, "Pool is not locked"),
        "unlocked" => assert!(!pool.is_locked, "Pool is locked"),
        "finished" => assert_eq!(pool.game_status, GameStatus::Post, "Game is not over"),
        _ => panic!("Unknown pool state {state}"),
    }
}

#[then(expr = "the audit log has {int} {word} entries")]
async fn check_audit_count(world: &mut SquaresWorld, count: usize, audit_type: String) {
    let pool_id = world.pool_id();
    let audits = world.api().db().fetch_audit_events(pool_id).await.expect("Error fetching audit log");
    let found = audits.iter().filter(|a| a.event_type.to_string() == audit_type).count();
    assert_eq!(found, count, "Wrong number of {audit_type} entries");
}

#[then("the last operation failed")]
async fn check_failed(world: &mut SquaresWorld) {
    assert!(world.last_error.is_some(), "The last operation succeeded");
}

#[then("the last operation succeeded")]
async fn check_succeeded(world: &mut SquaresWorld) {
    assert!(world.last_error.is_none(), "The last operation failed: {:?}", world.last_error);
}

#[then("nothing has been paid twice")]
async fn check_no_duplicates(world: &mut SquaresWorld) {
    let pool_id = world.pool_id();
    let audits = world.api().db().fetch_audit_events(pool_id).await.expect("Error fetching audit log");
    let settlements = world.api().db().fetch_settlements(pool_id).await.expect("Error fetching settlements");
    let settled = audits.iter().filter(|a| a.event_type == AuditType::Settlement).count();
    let unique = settlements.iter().map(|s| (s.checkpoint, s.home_score, s.away_score)).collect::<std::collections::HashSet<_>>();
    assert_eq!(unique.len(), settlements.len(), "Duplicate settlement keys");
    assert!(settled <= settlements.len(), "More settlement audits than settlements");
}

#[when("an admin resumes the pool")]
async fn resume_pool(world: &mut SquaresWorld) {
    let pool_id = world.pool_id();
    world.api().resume(pool_id).await.expect("Error resuming pool");
}
