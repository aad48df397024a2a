use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The scoreboard event shape used by several public sports APIs. Every field is optional here; validation happens
/// when the event is flattened and handed to [`sqp_common::GameSnapshot::from_json`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScoreboardEvent {
    #[serde(default)]
    pub status: Option<ScoreboardStatus>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardStatus {
    pub period: Option<Value>,
    pub display_clock: Option<String>,
    #[serde(rename = "type")]
    pub status_type: Option<StatusType>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusType {
    /// One of `pre`, `in` or `post`
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    /// `home` or `away`
    pub home_away: Option<String>,
    pub score: Option<Value>,
}

impl ScoreboardEvent {
    /// Whether the given payload looks like a scoreboard event rather than a flat snapshot.
    pub fn is_scoreboard_shape(value: &Value) -> bool {
        value.get("competitors").map(Value::is_array).unwrap_or(false)
    }

    fn score_for(&self, side: &str) -> Value {
        self.competitors
            .iter()
            .find(|c| c.home_away.as_deref().map(|s| s.eq_ignore_ascii_case(side)).unwrap_or(false))
            .and_then(|c| c.score.clone())
            .unwrap_or(Value::Null)
    }

    /// Flattens the event into the `{status, homeScore, awayScore, period, clock}` shape. Missing values become
    /// `null`, which the snapshot parser rejects.
    pub fn to_flat_json(&self) -> Value {
        let status = self.status.as_ref();
        json!({
            "status": status.and_then(|s| s.status_type.as_ref()).and_then(|t| t.state.clone()),
            "homeScore": self.score_for("home"),
            "awayScore": self.score_for("away"),
            "period": status.and_then(|s| s.period.clone()),
            "clock": status.and_then(|s| s.display_clock.clone()),
        })
    }
}
