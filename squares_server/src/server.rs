use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use squares_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    PoolQueryApi,
    SettlementApi,
    SettlementConfig,
    SqliteDatabase,
};

use crate::{
    config::{AdminToken, ServerConfig},
    errors::ServerError,
    integrations::score_feed::FeedClient,
    poll_worker::{start_poll_supervisor, PollWorkerConfig},
    routes::{
        health,
        FixPoolRoute,
        LockPoolRoute,
        PoolAuditRoute,
        PoolEventsRoute,
        PoolLeaderboardRoute,
        PoolScoresRoute,
        PoolWinnersRoute,
        ResetPoolRoute,
        ResumePoolRoute,
        SimulateRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(128, alert_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    if config.disable_poller {
        info!("🕰️ Poller disabled. Not starting the poll supervisor.");
    } else {
        let feed = FeedClient::new(config.feed.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        let worker_config = PollWorkerConfig {
            poller: config.poller,
            settlement: config.settlement,
            supervisor_interval: config.supervisor_interval,
        };
        // Runs for the life of the server
        let _supervisor = start_poll_supervisor(db.clone(), producers.clone(), feed, worker_config);
    }
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Warnings and errors from the audit log also go to the server log, so that operators do not have to poll the
/// audit endpoint to notice a stalled pool.
fn alert_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_audit_recorded(|ev| {
        Box::pin(async move {
            if ev.is_alert() {
                let a = &ev.audit;
                warn!("📬️ Pool #{} {} [{}]: {}", a.pool_id, a.severity, a.event_type, a.message);
            }
        })
    });
    hooks.on_winner_settled(|ev| {
        Box::pin(async move {
            let w = &ev.winner;
            info!("📬️ Pool #{} {} winner: square {} ({}) wins {}", ev.pool_id, w.period, w.square, w.owner, w.amount);
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let admin_token = AdminToken::from_config(&config);
    let settlement_config: SettlementConfig = config.settlement;
    let srv = HttpServer::new(move || {
        let query_api = PoolQueryApi::new(db.clone());
        let settlement_api = SettlementApi::new(db.clone(), producers.clone()).with_config(settlement_config);
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sqp::access_log"))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(admin_token.clone()))
            .app_data(json_config)
            .service(health)
            .service(PoolScoresRoute::<SqliteDatabase>::new())
            .service(PoolWinnersRoute::<SqliteDatabase>::new())
            .service(PoolLeaderboardRoute::<SqliteDatabase>::new())
            .service(PoolAuditRoute::<SqliteDatabase>::new())
            .service(PoolEventsRoute::<SqliteDatabase>::new())
            .service(LockPoolRoute::<SqliteDatabase>::new())
            .service(SimulateRoute::<SqliteDatabase>::new())
            .service(FixPoolRoute::<SqliteDatabase>::new())
            .service(ResetPoolRoute::<SqliteDatabase>::new())
            .service(ResumePoolRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
