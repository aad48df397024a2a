use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use sqp_common::{Cents, GameStatus};
use squares_engine::db_types::{AuditEvent, AuditType, Checkpoint, FeedStatus, Pool, Severity, Winner};

pub const ADMIN_TOKEN: &str = "correct-horse-battery-staple";

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> anyhow::Result<(StatusCode, String)> {
    call(TestRequest::get().uri(path), configure).await
}

pub async fn post_request(
    token: Option<&str>,
    path: &str,
    body: &str,
    configure: fn(&mut ServiceConfig),
) -> anyhow::Result<(StatusCode, String)> {
    let mut req = TestRequest::post().uri(path).insert_header(("Content-Type", "application/json"));
    if let Some(token) = token {
        req = req.insert_header(("X-Admin-Token", token));
    }
    call(req.set_payload(body.to_string()), configure).await
}

async fn call(req: TestRequest, configure: fn(&mut ServiceConfig)) -> anyhow::Result<(StatusCode, String)> {
    let req = req.to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| anyhow::anyhow!("{e}"))?.into_parts();
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().map_err(|_| anyhow::anyhow!("Could not read response body"))?;
    Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
}

pub fn sample_pool(id: i64) -> Pool {
    let timestamp = Utc.with_ymd_and_hms(2024, 2, 11, 23, 30, 0).unwrap();
    Pool {
        id,
        name: "Big Game".to_string(),
        external_game_id: Some("401547417".to_string()),
        cost_per_square: Cents::from(100),
        every_score_pays: false,
        quarterly_rollover: false,
        reverse_winners: false,
        number_sets: 1,
        payout_q1: 2_000,
        payout_half: 3_000,
        payout_q3: 2_000,
        payout_final: 3_000,
        payout_per_score: 0,
        is_locked: true,
        game_status: GameStatus::In,
        period: 2,
        clock: Some("7:12".to_string()),
        home_score: 14,
        away_score: 10,
        q1_home: Some(7),
        q1_away: Some(3),
        half_home: None,
        half_away: None,
        q3_home: None,
        q3_away: None,
        final_home: None,
        final_away: None,
        rollover_pot: Cents::from(0),
        last_home_digit: Some(7),
        last_away_digit: Some(3),
        feed_status: FeedStatus::Degraded,
        suspended: false,
        suspended_reason: None,
        version: 4,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

pub fn sample_winner(pool_id: i64) -> Winner {
    Winner {
        id: 1,
        pool_id,
        settlement_id: 1,
        period: Checkpoint::Q1,
        home_digit: 7,
        away_digit: 3,
        square: 60,
        owner: "owner60".to_string(),
        amount: Cents::from(2_000),
        description: "Touchdown + PAT".to_string(),
        home_score: 7,
        away_score: 3,
        created_at: Utc.with_ymd_and_hms(2024, 2, 11, 23, 55, 0).unwrap(),
    }
}

pub fn sample_audit(pool_id: i64, event_type: AuditType, severity: Severity, message: &str) -> AuditEvent {
    AuditEvent {
        id: 7,
        pool_id,
        event_type,
        severity,
        message: message.to_string(),
        payload: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 12, 1, 0, 0).unwrap(),
    }
}
