use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMedicationRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(length(max = 100))]
    pub dosage: Option<String>,
}

/// `dosage` is always replaced: leaving it out clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMedicationRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub dosage: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub dosage: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Trims text fields; an all-blank dosage counts as no dosage.
pub fn clean_dosage(dosage: Option<String>) -> Option<String> {
    dosage
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

impl CreateMedicationRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            dosage: clean_dosage(self.dosage),
        }
    }
}

impl UpdateMedicationRequest {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            dosage: clean_dosage(self.dosage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_validates() {
        let req = CreateMedicationRequest {
            name: "  Paracetamol ".into(),
            dosage: Some(" 500mg ".into()),
        }
        .normalized();
        assert_eq!(req.name, "Paracetamol");
        assert_eq!(req.dosage.as_deref(), Some("500mg"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_dosage_is_none() {
        assert_eq!(clean_dosage(Some("   ".into())), None);
        assert_eq!(clean_dosage(None), None);
    }

    #[test]
    fn rejects_long_dosage_and_short_name() {
        let req = CreateMedicationRequest {
            name: "x".into(),
            dosage: Some("m".repeat(101)),
        }
        .normalized();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("dosage"));
    }

    #[test]
    fn update_without_dosage_clears_it() {
        let req: UpdateMedicationRequest = serde_json::from_str(r#"{"name":"Ibuprofen"}"#).unwrap();
        let req = req.normalized();
        assert_eq!(req.name.as_deref(), Some("Ibuprofen"));
        assert!(req.dosage.is_none());
    }
}
