use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

/// Body for both create and rename.
#[derive(Debug, Deserialize, Validate)]
pub struct TriggerRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
}

impl TriggerRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Trigger {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_before_length_check() {
        let req = TriggerRequest { name: "   a   ".into() }.normalized();
        assert_eq!(req.name, "a");
        assert!(req.validate().is_err());

        let req = TriggerRequest { name: "  Stress ".into() }.normalized();
        assert_eq!(req.name, "Stress");
        assert!(req.validate().is_ok());
    }
}
