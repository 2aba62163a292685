use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Minimum username length after trimming whitespace.
const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length after trimming whitespace.
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keep the password out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check the form rules before anything is sent to the server.
    /// Lengths are measured without surrounding whitespace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().chars().count() < MIN_USERNAME_LENGTH {
            return Err(ValidationError(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LENGTH
            )));
        }
        if self.password.trim().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    /// Copy with surrounding whitespace removed from the username.
    /// The password is kept exactly as typed.
    pub fn trimmed(&self) -> Self {
        Self::new(self.username.trim(), self.password.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_valid_credentials() {
        assert!(Credentials::new("foo", "12345678").validate().is_ok());
        assert!(Credentials::new("  bob  ", " password1 ").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_username() {
        let err = Credentials::new(" ab ", "12345678").validate().unwrap_err();
        assert_eq!(err.to_string(), "Username must be at least 3 characters");
    }

    #[test]
    fn test_validate_rejects_short_password() {
        let err = Credentials::new("foo", "  1234567  ").validate().unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters");
    }

    #[test]
    fn test_trimmed_keeps_password_verbatim() {
        let trimmed = Credentials::new("  foo ", "  pass phrase  ").trimmed();
        assert_eq!(trimmed.username, "foo");
        assert_eq!(trimmed.password, "  pass phrase  ");
    }

    #[test]
    fn test_debug_masks_password() {
        let debug = format!("{:?}", Credentials::new("foo", "supersecret"));
        assert!(debug.contains("foo"));
        assert!(!debug.contains("supersecret"));
    }

    #[test]
    fn test_parse_login_response() {
        let json = r#"{"message":"Here is your token, foo!","token":"abc.def.ghi"}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("Failed to parse login JSON");
        assert_eq!(resp.token, "abc.def.ghi");
        assert_eq!(resp.message, "Here is your token, foo!");
    }
}
