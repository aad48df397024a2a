use std::{collections::HashMap, time::Duration};

use log::*;
use squares_engine::{
    events::EventProducers,
    poller::{PollerConfig, PoolPoller},
    PoolQueries,
    SettlementApi,
    SettlementConfig,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

use crate::integrations::score_feed::FeedClient;

/// Everything the supervisor needs to spin up pollers.
#[derive(Debug, Clone)]
pub struct PollWorkerConfig {
    pub poller: PollerConfig,
    pub settlement: SettlementConfig,
    pub supervisor_interval: Duration,
}

/// Starts the poll supervisor. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `supervisor_interval` the supervisor looks up the pools that should be watched (those with a game id that
/// are neither finished nor suspended) and makes sure each one has exactly one running poller. Pollers stop by
/// themselves when their game ends or their pool is suspended; a resumed pool is picked up again on the next pass.
pub fn start_poll_supervisor(
    db: SqliteDatabase,
    producers: EventProducers,
    feed: FeedClient,
    config: PollWorkerConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.supervisor_interval);
        let mut pollers = HashMap::<i64, JoinHandle<()>>::new();
        info!("🕰️ Poll supervisor started");
        loop {
            timer.tick().await;
            pollers.retain(|_, handle| !handle.is_finished());
            let pools = match db.fetch_active_pools().await {
                Ok(pools) => pools,
                Err(e) => {
                    error!("🕰️ Could not fetch the active pools. {e}");
                    continue;
                },
            };
            for pool in pools {
                if pollers.contains_key(&pool.id) {
                    continue;
                }
                debug!("🕰️ Starting poller for pool #{} ({})", pool.id, pool.name);
                let api = SettlementApi::new(db.clone(), producers.clone()).with_config(config.settlement);
                let poller = PoolPoller::new(pool.id, api, feed.clone(), config.poller);
                pollers.insert(pool.id, tokio::spawn(poller.run()));
            }
            trace!("🕰️ {} pollers running", pollers.len());
        }
    })
}
