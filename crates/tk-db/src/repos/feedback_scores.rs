//! Feedback score repository: upsert by `(entity, name)`, list, bulk delete.

use tk_core::entities::FeedbackScore;
use tk_core::enums::EntityType;
use uuid::Uuid;

use crate::TraceDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, parse_datetime, parse_enum, parse_uuid};

fn row_to_score(row: &libsql::Row) -> Result<FeedbackScore, DatabaseError> {
    Ok(FeedbackScore {
        entity_id: parse_uuid(&row.get::<String>(0)?)?,
        entity_type: parse_enum(&row.get::<String>(1)?)?,
        project_id: parse_uuid(&row.get::<String>(2)?)?,
        name: row.get::<String>(3)?,
        value: row.get::<f64>(4)?,
        reason: row.get::<Option<String>>(5)?,
        source: parse_enum(&row.get::<String>(6)?)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

impl TraceDb {
    /// Insert or replace the score named `score.name` on its entity.
    pub async fn upsert_feedback_score(
        &self,
        workspace_id: &str,
        score: &FeedbackScore,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO feedback_scores (entity_id, entity_type, workspace_id, project_id, name,
                     value, reason, source, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(entity_id, entity_type, name) DO UPDATE SET
                     value = ?6, reason = ?7, source = ?8",
                libsql::params![
                    score.entity_id.to_string(),
                    score.entity_type.as_str(),
                    workspace_id,
                    score.project_id.to_string(),
                    score.name.as_str(),
                    score.value,
                    score.reason.as_deref(),
                    score.source.as_str(),
                    format_datetime(&score.created_at)
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn list_feedback_scores(
        &self,
        workspace_id: &str,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<Vec<FeedbackScore>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT entity_id, entity_type, project_id, name, value, reason, source, created_at
                 FROM feedback_scores
                 WHERE workspace_id = ?1 AND entity_type = ?2 AND entity_id = ?3
                 ORDER BY name",
                libsql::params![workspace_id, entity_type.as_str(), entity_id.to_string()],
            )
            .await?;
        let mut scores = Vec::new();
        while let Some(row) = rows.next().await? {
            scores.push(row_to_score(&row)?);
        }
        Ok(scores)
    }

    /// Remove every score on the entity. Returns rows removed.
    pub async fn delete_feedback_scores_for(
        &self,
        workspace_id: &str,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "DELETE FROM feedback_scores
                 WHERE workspace_id = ?1 AND entity_type = ?2 AND entity_id = ?3
                 RETURNING 1",
                libsql::params![workspace_id, entity_type.as_str(), entity_id.to_string()],
            )
            .await?;
        let mut removed = 0;
        while rows.next().await?.is_some() {
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{score_for, test_db};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn upsert_replaces_same_named_score() {
        let db = test_db().await;
        let trace_id = Uuid::now_v7();
        let project_id = Uuid::now_v7();
        db.upsert_feedback_score("ws-a", &score_for(trace_id, project_id, "relevance", 0.2))
            .await
            .unwrap();
        db.upsert_feedback_score("ws-a", &score_for(trace_id, project_id, "relevance", 0.9))
            .await
            .unwrap();

        let scores = db
            .list_feedback_scores("ws-a", EntityType::Trace, trace_id)
            .await
            .unwrap();
        assert_eq!(scores.len(), 1);
        assert!((scores[0].value - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn delete_removes_only_the_entity_scores() {
        let db = test_db().await;
        let project_id = Uuid::now_v7();
        let target = Uuid::now_v7();
        let other = Uuid::now_v7();
        db.upsert_feedback_score("ws-a", &score_for(target, project_id, "a", 1.0))
            .await
            .unwrap();
        db.upsert_feedback_score("ws-a", &score_for(target, project_id, "b", 0.0))
            .await
            .unwrap();
        db.upsert_feedback_score("ws-a", &score_for(other, project_id, "a", 1.0))
            .await
            .unwrap();

        let removed = db
            .delete_feedback_scores_for("ws-a", EntityType::Trace, target)
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            db.list_feedback_scores("ws-a", EntityType::Trace, other)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
