use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_valid() {
        let req: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_ok());
        assert!(req.name.is_none() && req.email.is_none());
    }

    #[test]
    fn present_fields_are_checked() {
        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"name":"Al","email":"nope"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn email_longer_than_column_is_rejected() {
        let email = format!("ana@{}.{}.com", "a".repeat(60), "b".repeat(60));
        let req = UpdateUserRequest { name: None, email: Some(email) };
        assert!(req.validate().unwrap_err().field_errors().contains_key("email"));
    }
}
