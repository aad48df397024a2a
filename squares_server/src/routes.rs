//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database, so none of them block.
//!
//! Read routes (`/pools/...`) are public. Admin routes (`/admin/...`) require the `X-Admin-Token` header.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use squares_engine::{simulation::SimulationRequest, PoolDatabase, PoolQueries, PoolQueryApi, SettlementApi};

use crate::{
    config::AdminToken,
    data_objects::{LockRequest, LockResponse, SettlementSummary},
    errors::ServerError,
    helpers::{check_admin_token, optional_json},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Pools  ----------------------------------------------------
route!(pool_scores => Get "/pools/{id}/scores" impl PoolQueries);
/// The current score, the score at each checkpoint, and the pool's health: feed status and any suspension.
pub async fn pool_scores<B: PoolQueries>(
    path: web::Path<i64>,
    api: web::Data<PoolQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pool_id = path.into_inner();
    debug!("💻️ GET scores for pool #{pool_id}");
    let scores = api.scores(pool_id).await?;
    Ok(HttpResponse::Ok().json(scores))
}

route!(pool_winners => Get "/pools/{id}/winners" impl PoolQueries);
pub async fn pool_winners<B: PoolQueries>(
    path: web::Path<i64>,
    api: web::Data<PoolQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pool_id = path.into_inner();
    debug!("💻️ GET winners for pool #{pool_id}");
    let winners = api.winners(pool_id).await?;
    Ok(HttpResponse::Ok().json(winners))
}

route!(pool_leaderboard => Get "/pools/{id}/leaderboard" impl PoolQueries);
pub async fn pool_leaderboard<B: PoolQueries>(
    path: web::Path<i64>,
    api: web::Data<PoolQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pool_id = path.into_inner();
    debug!("💻️ GET leaderboard for pool #{pool_id}");
    let leaderboard = api.leaderboard(pool_id).await?;
    Ok(HttpResponse::Ok().json(leaderboard))
}

route!(pool_audit => Get "/pools/{id}/audit" impl PoolQueries);
/// The audit log, newest entry last.
pub async fn pool_audit<B: PoolQueries>(
    path: web::Path<i64>,
    api: web::Data<PoolQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pool_id = path.into_inner();
    debug!("💻️ GET audit log for pool #{pool_id}");
    let audit = api.audit_log(pool_id).await?;
    Ok(HttpResponse::Ok().json(audit))
}

route!(pool_events => Get "/pools/{id}/events" impl PoolQueries);
pub async fn pool_events<B: PoolQueries>(
    path: web::Path<i64>,
    api: web::Data<PoolQueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let pool_id = path.into_inner();
    debug!("💻️ GET score events for pool #{pool_id}");
    let events = api.score_events(pool_id).await?;
    Ok(HttpResponse::Ok().json(events))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(lock_pool => Post "/admin/pools/{id}/lock" impl PoolDatabase);
/// Locks the pool and assigns its axis numbers.
///
/// The body is optional. `{"axis": [{"home": [...], "away": [...]}]}` uses the given numbers (one set, or four for
/// quarterly numbers); an empty body draws them at random. Numbers are never replaced once drawn.
pub async fn lock_pool<B: PoolDatabase>(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Bytes,
    token: web::Data<AdminToken>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_admin_token(&req, &token)?;
    let pool_id = path.into_inner();
    let request = optional_json::<LockRequest>(&body)?;
    info!("💻️ Admin lock for pool #{pool_id} ({})", if request.is_some() { "given numbers" } else { "random draw" });
    let pool = match request {
        Some(LockRequest { axis }) => api.lock_pool_with_axis(pool_id, axis).await?,
        None => api.lock_pool(pool_id).await?,
    };
    let axis = api.db().fetch_axis_numbers(pool_id).await?;
    Ok(HttpResponse::Ok().json(LockResponse::new(&pool, axis)))
}

route!(simulate => Post "/admin/pools/{id}/simulate" impl PoolDatabase);
/// Injects the next game state through the settlement pipeline, exactly as if the feed had reported it.
///
/// Accepts a [`SimulationRequest`], e.g. `{"action": "score", "team": "home", "points": 7}`,
/// `{"action": "end_period"}`, `{"action": "random_play"}` or a full snapshot with `{"action": "snapshot", ...}`.
pub async fn simulate<B: PoolDatabase>(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SimulationRequest>,
    token: web::Data<AdminToken>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_admin_token(&req, &token)?;
    let pool_id = path.into_inner();
    let request = body.into_inner();
    info!("💻️ Admin simulation for pool #{pool_id}: {request:?}");
    let outcome = api.simulate(pool_id, request).await?;
    Ok(HttpResponse::Ok().json(SettlementSummary::from_outcome(pool_id, outcome)))
}

route!(fix_pool => Post "/admin/pools/{id}/fix" impl PoolDatabase);
/// Resettles the pool from its stored score history. Only what is missing gets written.
pub async fn fix_pool<B: PoolDatabase>(
    req: HttpRequest,
    path: web::Path<i64>,
    token: web::Data<AdminToken>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_admin_token(&req, &token)?;
    let pool_id = path.into_inner();
    info!("💻️ Admin fix for pool #{pool_id}");
    let result = api.fix(pool_id).await?;
    Ok(HttpResponse::Ok().json(SettlementSummary::from_result("resettled", result)))
}

route!(reset_pool => Post "/admin/pools/{id}/reset" impl PoolDatabase);
/// Clears the scores, axis numbers and winners of the pool. The audit log and the grid survive.
pub async fn reset_pool<B: PoolDatabase>(
    req: HttpRequest,
    path: web::Path<i64>,
    token: web::Data<AdminToken>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_admin_token(&req, &token)?;
    let pool_id = path.into_inner();
    warn!("💻️ Admin reset for pool #{pool_id}");
    let audit = api.reset(pool_id).await?;
    Ok(HttpResponse::Ok().json(audit))
}

route!(resume_pool => Post "/admin/pools/{id}/resume" impl PoolDatabase);
pub async fn resume_pool<B: PoolDatabase>(
    req: HttpRequest,
    path: web::Path<i64>,
    token: web::Data<AdminToken>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    check_admin_token(&req, &token)?;
    let pool_id = path.into_inner();
    info!("💻️ Admin resume for pool #{pool_id}");
    let audit = api.resume(pool_id).await?;
    Ok(HttpResponse::Ok().json(audit))
}
