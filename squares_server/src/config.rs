use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use score_feed_tools::ScoreFeedConfig;
use sqp_common::{
    helpers::{parse_boolean_flag, parse_setting},
    Secret,
};
use squares_engine::{poller::PollerConfig, SettlementConfig};

const DEFAULT_SQP_HOST: &str = "127.0.0.1";
const DEFAULT_SQP_PORT: u16 = 8360;
const DEFAULT_SUPERVISOR_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Required in the `X-Admin-Token` header of every admin request. If empty, the admin routes are closed.
    pub admin_token: Secret<String>,
    pub feed: ScoreFeedConfig,
    pub poller: PollerConfig,
    pub settlement: SettlementConfig,
    /// How often the supervisor looks for pools that need a poller.
    pub supervisor_interval: Duration,
    /// Run the HTTP endpoints only. Scores then only change through the admin routes.
    pub disable_poller: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SQP_HOST.to_string(),
            port: DEFAULT_SQP_PORT,
            database_url: String::default(),
            admin_token: Secret::default(),
            feed: ScoreFeedConfig::default(),
            poller: PollerConfig::default(),
            settlement: SettlementConfig::default(),
            supervisor_interval: DEFAULT_SUPERVISOR_INTERVAL,
            disable_poller: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let host = env::var("SQP_HOST").ok().unwrap_or_else(|| DEFAULT_SQP_HOST.into());
        let port = env_setting("SQP_PORT", DEFAULT_SQP_PORT);
        let database_url = env::var("SQP_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SQP_DATABASE_URL is not set. Please set it to the URL for the squares database.");
            String::default()
        });
        let admin_token = Secret::new(env::var("SQP_ADMIN_TOKEN").ok().unwrap_or_else(|| {
            warn!("🪛️ SQP_ADMIN_TOKEN is not set. All admin requests will be refused.");
            String::default()
        }));
        let feed = ScoreFeedConfig::new_from_env_or_default();
        let poller = PollerConfig {
            live_interval: env_secs("SQP_POLL_LIVE_SECS", defaults.poller.live_interval),
            pre_game_interval: env_secs("SQP_POLL_PRE_GAME_SECS", defaults.poller.pre_game_interval),
            feed_timeout: feed.timeout,
            max_attempts: env_setting("SQP_FEED_MAX_ATTEMPTS", defaults.poller.max_attempts),
            initial_backoff: Duration::from_millis(env_setting(
                "SQP_FEED_BACKOFF_MS",
                defaults.poller.initial_backoff.as_millis() as u64,
            )),
            max_backoff: defaults.poller.max_backoff,
        };
        let settlement = SettlementConfig {
            max_attempts: env_setting("SQP_SETTLEMENT_MAX_ATTEMPTS", defaults.settlement.max_attempts),
        };
        let supervisor_interval = env_secs("SQP_SUPERVISOR_SECS", DEFAULT_SUPERVISOR_INTERVAL);
        let disable_poller = parse_boolean_flag(env::var("SQP_DISABLE_POLLER").ok(), false);
        if disable_poller {
            warn!("🪛️ The score poller is disabled. Scores will only change through the admin API.");
        }
        Self {
            host,
            port,
            database_url,
            admin_token,
            feed,
            poller,
            settlement,
            supervisor_interval,
            disable_poller,
        }
    }
}

/// Reads a setting from the environment, falling back to `default` (with a warning) if it is not a valid value.
fn env_setting<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match parse_setting::<T>(env::var(name).ok()) {
        Ok(Some(v)) => v,
        Ok(None) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
        Err(e) => {
            warn!("🪛️ Invalid configuration value for {name}. {e} Using the default, {default}, instead.");
            default
        },
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_setting(name, default.as_secs()))
}

//-------------------------------------------------  AdminToken  -------------------------------------------------------
/// The part of the configuration the admin routes need. Kept apart from [`ServerConfig`] so that the rest of the
/// configuration is not handed to every request handler.
#[derive(Clone, Debug, Default)]
pub struct AdminToken(Secret<String>);

impl AdminToken {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(Secret::new(token.into()))
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self(config.admin_token.clone())
    }

    /// An empty token never matches, so a server without a configured token has no working admin routes.
    pub fn accepts(&self, candidate: &str) -> bool {
        !self.0.is_empty() && self.0.matches(candidate)
    }
}
