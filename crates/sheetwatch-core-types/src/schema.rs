//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across the detection,
//! filtering, delivery and monitoring stages.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_CYCLE_ID: &str = "cycle_id";

// Entity identifiers
pub const FIELD_CHARACTER_ID: &str = "character_id";
pub const FIELD_FIELD_PATH: &str = "field_path";
pub const FIELD_DETECTOR: &str = "detector";
pub const FIELD_ENDPOINT: &str = "endpoint";
pub const FIELD_GROUP: &str = "group";

// Delivery
pub const FIELD_ATTEMPT: &str = "attempt";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_RETRY_AFTER_MS: &str = "retry_after_ms";

// Collection sizes
pub const FIELD_CHANGES_LEN: &str = "changes_len";
pub const FIELD_KEPT_LEN: &str = "kept_len";
pub const FIELD_MESSAGES_LEN: &str = "messages_len";

// OperationLog records
pub const FIELD_LEVEL: &str = "level";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_DETAILS: &str = "details";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_RECORD: &str = "record";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_COMPONENT.is_empty());
        assert!(!FIELD_OP.is_empty());
        assert!(!EVENT_START.is_empty());
        assert!(!EVENT_END.is_empty());
        assert!(!EVENT_END_ERROR.is_empty());
        assert!(!EVENT_RECORD.is_empty());
    }

    #[test]
    fn test_event_names_are_distinct() {
        let events = [EVENT_START, EVENT_END, EVENT_END_ERROR, EVENT_RECORD];
        for (i, a) in events.iter().enumerate() {
            for b in events.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
