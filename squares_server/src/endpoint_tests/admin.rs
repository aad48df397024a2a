use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::Value;
use squares_engine::{
    axis::{AxisNumbers, AxisSet},
    db_types::{AuditType, Severity},
    events::EventProducers,
    SettlementApi,
};

use super::{
    helpers::{post_request, sample_audit, sample_pool, ADMIN_TOKEN},
    mocks::MockPoolStore,
};
use crate::{
    config::AdminToken,
    routes::{FixPoolRoute, LockPoolRoute, ResetPoolRoute, ResumePoolRoute, SimulateRoute},
};

#[actix_web::test]
async fn admin_routes_need_a_token() {
    let _ = env_logger::try_init().ok();
    for path in ["/admin/pools/1/reset", "/admin/pools/1/resume", "/admin/pools/1/fix", "/admin/pools/1/lock"] {
        let (status, body) = post_request(None, path, "", configure).await.expect("Request failed");
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body, r#"{"error":"A valid admin token is required for this request."}"#);
    }
}

#[actix_web::test]
async fn admin_routes_reject_the_wrong_token() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request(Some("tr0ub4dor&3"), "/admin/pools/1/reset", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn reset_pool() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(ADMIN_TOKEN), "/admin/pools/1/reset", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let audit: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(audit["event_type"], "RESET");
    assert_eq!(audit["severity"], "WARNING");
}

#[actix_web::test]
async fn resume_missing_pool() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(Some(ADMIN_TOKEN), "/admin/pools/42/resume", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Pool #42 does not exist"}"#);
}

#[actix_web::test]
async fn lock_rejects_bad_numbers() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"axis": [{"home": [1, 2, 3], "away": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]}]}"#;
    let (status, _) =
        post_request(Some(ADMIN_TOKEN), "/admin/pools/1/lock", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn lock_with_given_numbers() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"axis": [{"home": [5, 0, 3, 8, 1, 9, 2, 6, 4, 7], "away": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]}]}"#;
    let (status, body) =
        post_request(Some(ADMIN_TOKEN), "/admin/pools/1/lock", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let lock: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(lock["pool_id"], 1);
    assert_eq!(lock["is_locked"], true);
    assert_eq!(lock["axis"][0]["home"][0], 5);
}

#[actix_web::test]
async fn simulate_rejects_unknown_actions() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"action": "fumble"}"#;
    let (status, body) =
        post_request(Some(ADMIN_TOKEN), "/admin/pools/1/simulate", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#), "{body}");
}

#[actix_web::test]
async fn simulate_rejects_impossible_snapshots() {
    let _ = env_logger::try_init().ok();
    let bodies = [
        r#"{"action": "snapshot", "homeScore": 3, "awayScore": 0, "period": 0, "status": "in"}"#,
        r#"{"action": "snapshot", "homeScore": 3, "awayScore": 0, "period": 9000000000000000000, "status": "in"}"#,
        r#"{"action": "snapshot", "homeScore": 3, "period": 1, "status": "in"}"#,
    ];
    for body in bodies {
        let (status, res) =
            post_request(Some(ADMIN_TOKEN), "/admin/pools/1/simulate", body, configure).await.expect("Request failed");
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(res.contains("period") || res.contains("awayScore"), "{res}");
    }
}

#[actix_web::test]
async fn simulate_after_the_final_whistle() {
    let _ = env_logger::try_init().ok();
    let body = r#"{"action": "score", "team": "home", "points": 3}"#;
    let (status, body) =
        post_request(Some(ADMIN_TOKEN), "/admin/pools/2/simulate", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("The game is already over"), "{body}");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut store = MockPoolStore::new();
    store.expect_fetch_pool().returning(|id| match id {
        1 => Ok(Some(sample_pool(1))),
        2 => {
            let mut pool = sample_pool(2);
            pool.game_status = sqp_common::GameStatus::Post;
            Ok(Some(pool))
        },
        _ => Ok(None),
    });
    store
        .expect_reset_pool()
        .returning(|id| Ok(sample_audit(id, AuditType::Reset, Severity::Warning, "pool reset by admin")));
    store.expect_assign_axis_numbers().returning(|id, _| Ok(sample_pool(id)));
    store.expect_fetch_axis_numbers().returning(|_| {
        let set = AxisSet::from_digit_strings("5038192647", "0123456789").unwrap();
        Ok(Some(AxisNumbers::new(vec![set])))
    });
    let api = SettlementApi::new(store, EventProducers::default());
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| crate::errors::ServerError::InvalidRequestBody(err.to_string()).into());
    cfg.service(LockPoolRoute::<MockPoolStore>::new())
        .service(SimulateRoute::<MockPoolStore>::new())
        .service(FixPoolRoute::<MockPoolStore>::new())
        .service(ResetPoolRoute::<MockPoolStore>::new())
        .service(ResumePoolRoute::<MockPoolStore>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(AdminToken::new(ADMIN_TOKEN)))
        .app_data(json_config);
}
