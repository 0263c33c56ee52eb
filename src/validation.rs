/*!
 * Validation Engine Module
 *
 * Format checks that run at the boundary which creates or edits records.
 * The directory itself accepts any non-empty strings; these rules keep
 * values inside what the data file can carry:
 * - usernames, emails and passwords are single whitespace-free tokens
 * - emails have the minimal `local@domain.tld` shape
 * - passwords have a minimum length
 * - task titles are bounded and single-line
 * - due dates are `DD/MM/YYYY` within a configured year range
 */

use regex::Regex;

use crate::error::{Result, StoreError};

/// Validation engine configuration
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub min_password_length: usize,
    pub max_title_length: usize,
    pub min_year: u32,
    pub max_year: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_password_length: 3,
            max_title_length: 100,
            min_year: 2024,
            max_year: 2030,
        }
    }
}

/// A value stored as one whitespace-delimited field of the data file.
pub fn require_token(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StoreError::validation(field, "must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(StoreError::validation(field, "must not contain whitespace"));
    }
    Ok(())
}

/// Titles are written with spaces escaped, so they may hold spaces but no
/// other whitespace or control characters.
pub fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(StoreError::validation("title", "must not be empty"));
    }
    if title.chars().any(|c| (c != ' ' && c.is_whitespace()) || c.is_control()) {
        return Err(StoreError::validation("title", "only plain spaces are allowed as separators"));
    }
    Ok(())
}

pub struct ValidationEngine {
    config: ValidationConfig,
    due_date_pattern: Regex,
}

impl ValidationEngine {
    pub fn new(config: Option<ValidationConfig>) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            config: config.unwrap_or_default(),
            due_date_pattern: Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$")?,
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate_username(&self, username: &str) -> Result<()> {
        require_token("username", username)
    }

    /// `@` neither first nor last, followed by a `.` that is neither directly
    /// after the `@` nor the final character.
    pub fn validate_email(&self, email: &str) -> Result<()> {
        require_token("email", email)?;
        let at = email
            .find('@')
            .ok_or_else(|| StoreError::validation("email", "missing `@`"))?;
        if at == 0 || at == email.len() - 1 {
            return Err(StoreError::validation("email", "`@` cannot start or end the address"));
        }
        let dot = email[at + 1..]
            .find('.')
            .map(|offset| at + 1 + offset)
            .ok_or_else(|| StoreError::validation("email", "missing `.` in the domain"))?;
        if dot == at + 1 || dot == email.len() - 1 {
            return Err(StoreError::validation("email", "malformed domain"));
        }
        Ok(())
    }

    pub fn validate_password(&self, password: &str) -> Result<()> {
        require_token("password", password)?;
        if password.chars().count() < self.config.min_password_length {
            return Err(StoreError::validation(
                "password",
                format!("must be at least {} characters", self.config.min_password_length),
            ));
        }
        Ok(())
    }

    pub fn validate_title(&self, title: &str) -> Result<()> {
        require_title(title)?;
        if title.chars().count() > self.config.max_title_length {
            return Err(StoreError::validation(
                "title",
                format!("must be at most {} characters", self.config.max_title_length),
            ));
        }
        Ok(())
    }

    pub fn validate_due_date(&self, due_date: &str) -> Result<()> {
        let captures = self
            .due_date_pattern
            .captures(due_date)
            .ok_or_else(|| StoreError::validation("due date", "expected DD/MM/YYYY"))?;
        let field = |index: usize| -> u32 {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        let (day, month, year) = (field(1), field(2), field(3));
        if !(1..=31).contains(&day) {
            return Err(StoreError::validation("due date", "day must be between 01 and 31"));
        }
        if !(1..=12).contains(&month) {
            return Err(StoreError::validation("due date", "month must be between 01 and 12"));
        }
        if !(self.config.min_year..=self.config.max_year).contains(&year) {
            return Err(StoreError::validation(
                "due date",
                format!("year must be between {} and {}", self.config.min_year, self.config.max_year),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ValidationEngine {
        ValidationEngine::new(None).unwrap()
    }

    #[test]
    fn test_email_shapes() {
        let engine = engine();
        assert!(engine.validate_email("tanvir@gmail.com").is_ok());
        assert!(engine.validate_email("a@b.co").is_ok());
        for bad in ["", "plain", "@x.com", "a@", "a@.com", "a@com.", "a@com", "a b@x.com"] {
            assert!(engine.validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_password_length() {
        let engine = engine();
        assert!(engine.validate_password("abc").is_ok());
        assert!(engine.validate_password("ab").is_err());
        assert!(engine.validate_password("has space").is_err());
    }

    #[test]
    fn test_due_date_ranges() {
        let engine = engine();
        assert!(engine.validate_due_date("01/01/2024").is_ok());
        assert!(engine.validate_due_date("31/12/2030").is_ok());
        for bad in ["1/1/2025", "00/05/2025", "32/05/2025", "10/13/2025", "10/00/2025", "10/05/2023", "10/05/2031", "10-05-2025"] {
            assert!(engine.validate_due_date(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_title_rules() {
        let engine = engine();
        assert!(engine.validate_title("Buy milk").is_ok());
        assert!(engine.validate_title("   ").is_err());
        assert!(engine.validate_title(&"x".repeat(100)).is_ok());
        assert!(engine.validate_title(&"x".repeat(101)).is_err());
        assert!(engine.validate_title("two\nlines").is_err());
        assert!(engine.validate_title("tab\there").is_err());
    }

    #[test]
    fn test_username_rules() {
        let engine = engine();
        assert!(engine.validate_username("tanvir").is_ok());
        assert!(engine.validate_username("").is_err());
        assert!(engine.validate_username("two words").is_err());
    }
}
