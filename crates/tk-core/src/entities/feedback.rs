use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{EntityType, ScoreSource};

/// A named score attached to a trace or span. Unique per `(entity, name)`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FeedbackScore {
    pub entity_id: Uuid,
    pub entity_type: EntityType,
    pub project_id: Uuid,
    pub name: String,
    pub value: f64,
    pub reason: Option<String>,
    pub source: ScoreSource,
    pub created_at: DateTime<Utc>,
}
