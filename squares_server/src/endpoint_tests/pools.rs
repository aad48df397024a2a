use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use squares_engine::{
    db_types::{AuditType, Severity},
    PoolDatabaseError,
    PoolQueryApi,
};

use super::{
    helpers::{get_request, sample_audit, sample_pool, sample_winner},
    mocks::MockPoolReader,
};
use crate::routes::{PoolAuditRoute, PoolLeaderboardRoute, PoolScoresRoute, PoolWinnersRoute};

#[actix_web::test]
async fn fetch_scores() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/pools/1/scores", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let scores: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(scores["pool_id"], 1);
    assert_eq!(scores["current"]["home"], 14);
    assert_eq!(scores["current"]["away"], 10);
    assert_eq!(scores["q1"]["home"], 7);
    assert_eq!(scores["q1"]["away"], 3);
    assert!(scores["half"].is_null());
    assert_eq!(scores["game_status"], "in");
    assert_eq!(scores["feed_status"], "degraded");
    assert_eq!(scores["suspended"], false);
}

#[actix_web::test]
async fn fetch_scores_for_missing_pool() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/pools/99/scores", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Pool #99 does not exist"}"#);
}

#[actix_web::test]
async fn fetch_scores_when_the_database_is_down() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/pools/13/scores", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Stored data is corrupt"));
}

#[actix_web::test]
async fn fetch_winners() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/pools/1/winners", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let winners: Value = serde_json::from_str(&body).unwrap();
    let winners = winners.as_array().unwrap();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0]["period"], "Q1");
    assert_eq!(winners[0]["square"], 60);
    assert_eq!(winners[0]["owner"], "owner60");
    assert_eq!(winners[0]["amount"], 2000);
}

#[actix_web::test]
async fn fetch_leaderboard() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/pools/1/leaderboard", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"[{"owner":"owner60","wins":1,"total":2000}]"#);
}

#[actix_web::test]
async fn fetch_audit_log() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/pools/1/audit", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let audit: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(audit[0]["event_type"], "FEED_FETCH_FAIL");
    assert_eq!(audit[0]["severity"], "ERROR");
    assert_eq!(audit[0]["message"], "feed fetch failed: degraded after 5 attempts");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut reader = MockPoolReader::new();
    reader.expect_fetch_pool().returning(|id| match id {
        1 => Ok(Some(sample_pool(1))),
        13 => Err(PoolDatabaseError::CorruptData("unknown game status 'halftime?'".into())),
        _ => Ok(None),
    });
    reader.expect_fetch_winners().returning(|id| Ok(vec![sample_winner(id)]));
    reader.expect_fetch_audit_events().returning(|id| {
        let message = "feed fetch failed: degraded after 5 attempts";
        Ok(vec![sample_audit(id, AuditType::FeedFetchFail, Severity::Error, message)])
    });
    let api = PoolQueryApi::new(reader);
    cfg.service(PoolScoresRoute::<MockPoolReader>::new())
        .service(PoolWinnersRoute::<MockPoolReader>::new())
        .service(PoolLeaderboardRoute::<MockPoolReader>::new())
        .service(PoolAuditRoute::<MockPoolReader>::new())
        .app_data(web::Data::new(api));
}
