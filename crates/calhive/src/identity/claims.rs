use serde::{Deserialize, Serialize};

/// Claims read from access and ID tokens.
///
/// Only `sub` is required. Access tokens carry no `email` or `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "cognito:username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cognito_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl TokenClaims {
    #[cfg(test)]
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            name: None,
            cognito_username: None,
            token_use: None,
            exp: None,
            iss: None,
        }
    }

    /// First non-empty of `name`, `cognito:username`, `email`, then `sub`.
    pub fn display_name(&self) -> String {
        [&self.name, &self.cognito_username, &self.email]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| self.sub.clone())
    }
}
