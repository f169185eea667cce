use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sanitize::{as_float, field};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub target: u64,
    pub current: u64,
}

/// Like and follower goals (`goals.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalState {
    pub likes: Goal,
    pub followers: Goal,
}

impl Default for GoalState {
    fn default() -> Self {
        Self {
            likes: Goal { target: 1000, current: 0 },
            followers: Goal { target: 10, current: 0 },
        }
    }
}

fn goal_from_value(raw: Option<&Value>, def: Goal) -> Goal {
    let Some(raw) = raw.filter(|v| v.is_object()) else {
        return def;
    };
    let target = field(raw, "target")
        .and_then(as_float)
        .filter(|f| *f > 0.0)
        .map(|f| f as u64)
        .filter(|n| *n > 0)
        .unwrap_or(def.target);
    let current = field(raw, "current")
        .and_then(as_float)
        .filter(|f| *f >= 0.0)
        .map(|f| f as u64)
        .unwrap_or(def.current);
    Goal { target, current }
}

impl GoalState {
    pub fn from_value(raw: &Value) -> Self {
        let def = Self::default();
        Self {
            likes: goal_from_value(field(raw, "likes"), def.likes),
            followers: goal_from_value(field(raw, "followers"), def.followers),
        }
    }
}
