use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION: f64 = 15.0;
pub const DEFAULT_MOOD: f64 = 5.0;
pub const DEFAULT_PRODUCTIVITY: f64 = 5.0;

/// One logged routine. Partitioned by `user_id`, sorted by `timestamp`.
///
/// Field names on the wire match what the dashboard reads: camelCase keys,
/// except `solver_score`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutineEntry {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Seconds since epoch at write time.
    pub timestamp: i64,
    #[serde(rename = "routineId")]
    pub routine_id: String,
    /// Calendar date, `YYYY-MM-DD` when defaulted; stored as supplied otherwise.
    pub date: String,
    pub duration: f64,
    pub mood: f64,
    pub productivity: f64,
    pub activities: Vec<String>,
    pub solver_score: f64,
}
