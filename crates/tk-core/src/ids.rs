//! Identifier generation and validation.
//!
//! Traces and projects are keyed by UUID version 7. The leading 48 bits are a
//! Unix millisecond timestamp, so the hyphenated text form sorts in creation
//! order. Ids supplied by clients must carry the same version.

use uuid::Uuid;

use crate::errors::CoreError;

/// Lock and error label for trace entities.
pub const TRACE_KEY: &str = "Trace";

/// Lock and error label for project entities.
pub const PROJECT_KEY: &str = "Project";

/// Version every tracekit id must carry.
pub const ID_VERSION: usize = 7;

/// Generate a fresh time-ordered id.
#[must_use]
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}

/// Reject ids that are not UUID version 7.
///
/// # Errors
///
/// Returns `CoreError::InvalidIdentifier` naming `entity` when the version differs.
pub fn validate_version(id: Uuid, entity: &str) -> Result<(), CoreError> {
    if id.get_version_num() == ID_VERSION {
        return Ok(());
    }
    Err(CoreError::InvalidIdentifier {
        entity_type: entity.to_string(),
        id: id.to_string(),
        reason: format!(
            "expected UUID version {ID_VERSION}, got version {}",
            id.get_version_num()
        ),
    })
}

/// Parse a textual id and apply the version check.
///
/// # Errors
///
/// Returns `CoreError::InvalidIdentifier` if the text is not a UUID or has the
/// wrong version.
pub fn parse_id(text: &str, entity: &str) -> Result<Uuid, CoreError> {
    let id = Uuid::parse_str(text.trim()).map_err(|e| CoreError::InvalidIdentifier {
        entity_type: entity.to_string(),
        id: text.to_string(),
        reason: e.to_string(),
    })?;
    validate_version(id, entity)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_pass_validation() {
        let id = generate_id();
        assert!(validate_version(id, TRACE_KEY).is_ok());
    }

    #[test]
    fn generated_ids_sort_in_creation_order() {
        let first = generate_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generate_id();
        assert!(first.to_string() < second.to_string());
    }

    #[test]
    fn v4_id_is_rejected() {
        let err = validate_version(Uuid::new_v4(), TRACE_KEY).unwrap_err();
        match err {
            CoreError::InvalidIdentifier { entity_type, reason, .. } => {
                assert_eq!(entity_type, "Trace");
                assert!(reason.contains("version 4"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nil_id_is_rejected() {
        assert!(validate_version(Uuid::nil(), TRACE_KEY).is_err());
    }

    #[test]
    fn parse_id_accepts_v7_text() {
        let id = generate_id();
        let parsed = parse_id(&format!(" {id} "), TRACE_KEY).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(
            parse_id("not-a-uuid", TRACE_KEY),
            Err(CoreError::InvalidIdentifier { .. })
        ));
    }
}
