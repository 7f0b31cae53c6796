use std::fmt;

use super::error::DomainError;

/// A subscriber address that passed the same shape check a browser applies to `type="email"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::validation("email address is required"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(
                "email address must not contain whitespace",
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::validation("email address must contain `@`"));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::validation("email address is malformed"));
        }
        if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
            return Err(DomainError::validation("email domain is malformed"));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw newsletter form input. `botcheck` is a hidden honeypot that people leave empty.
#[derive(Debug, Clone, Default)]
pub struct SignupRequest {
    pub email: String,
    pub botcheck: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<EmailAddress, DomainError> {
        if self
            .botcheck
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
        {
            return Err(DomainError::validation("honeypot field was filled"));
        }
        EmailAddress::parse(&self.email)
    }
}
