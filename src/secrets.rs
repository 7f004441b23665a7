use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret '{0}' is not configured")]
    NotConfigured(String),

    #[error("secret '{0}' is empty")]
    Empty(String),
}

/// Credential lookup for the lock cache. Implementations must never log
/// the secret value itself.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret_value(&self, secret_id: &str) -> Result<String, SecretError>;
}

/// Reads secrets from the process environment (populated by dotenv in
/// development, by the deployment platform in production).
pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret_value(&self, secret_id: &str) -> Result<String, SecretError> {
        match std::env::var(secret_id) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) => Err(SecretError::Empty(secret_id.to_string())),
            Err(_) => Err(SecretError::NotConfigured(secret_id.to_string())),
        }
    }
}

/// Recognized API-key fields inside a JSON-formatted secret, in the order
/// they are tried.
const API_KEY_FIELDS: [&str; 7] = [
    "apiKey",
    "token",
    "key",
    "value",
    "momento_api_key",
    "momentoApiKey",
    "MOMENTO_API_KEY",
];

/// Fetches the lock-cache credential and pulls the API key out of the
/// payload. Secret payloads are either a bare string or a JSON object
/// using one of the recognized field names.
pub async fn fetch_api_key(
    provider: &dyn SecretProvider,
    secret_id: &str,
) -> Result<String, SecretError> {
    let raw = provider.get_secret_value(secret_id).await?;
    debug!("Secret retrieved, length: {}", raw.len());
    Ok(extract_api_key(&raw))
}

pub fn extract_api_key(raw: &str) -> String {
    let parsed: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => {
            debug!("Secret is not valid JSON, using as plain string");
            return raw.to_string();
        }
    };

    if let Some(object) = parsed.as_object() {
        for field in API_KEY_FIELDS {
            if let Some(value) = object.get(field).and_then(|v| v.as_str()) {
                debug!("Using '{}' field from secret JSON", field);
                return value.to_string();
            }
        }
        warn!("No recognized API key field found in secret JSON, using raw string");
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_secret_is_used_as_is() {
        assert_eq!(extract_api_key("s3cr3t-token"), "s3cr3t-token");
    }

    #[test]
    fn api_key_field_wins_over_later_fields() {
        let raw = r#"{"token":"second","apiKey":"first"}"#;
        assert_eq!(extract_api_key(raw), "first");
    }

    #[test]
    fn fields_are_tried_in_order() {
        let raw = r#"{"momento_api_key":"m1","value":"v1"}"#;
        assert_eq!(extract_api_key(raw), "v1");

        let raw = r#"{"MOMENTO_API_KEY":"shouty"}"#;
        assert_eq!(extract_api_key(raw), "shouty");
    }

    #[test]
    fn json_without_known_fields_falls_back_to_raw() {
        let raw = r#"{"unrelated":"x"}"#;
        assert_eq!(extract_api_key(raw), raw);
    }

    #[tokio::test]
    async fn env_provider_rejects_missing_and_blank_secrets() {
        let provider = EnvSecretProvider;

        let err = provider
            .get_secret_value("BATTLE_SERVER_TEST_UNSET_SECRET")
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::NotConfigured(_)));

        std::env::set_var("BATTLE_SERVER_TEST_BLANK_SECRET", "   ");
        let err = provider
            .get_secret_value("BATTLE_SERVER_TEST_BLANK_SECRET")
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::Empty(_)));
    }
}
