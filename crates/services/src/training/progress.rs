use serde::Serialize;

/// Aggregated view of training progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub total: usize,
    pub processed: usize,
    pub remaining: usize,
    pub is_completed: bool,
    pub is_paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_fields() {
        let progress = SessionProgress {
            total: 3,
            processed: 1,
            remaining: 2,
            is_completed: false,
            is_paused: true,
        };
        let json = serde_json::to_value(progress).unwrap();
        assert_eq!(json["remaining"], 2);
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["isPaused"], true);
    }
}
