use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Config, resolve_tokens_path};

pub const TOKEN_ENV_VAR: &str = "MAILVIEW_ACCESS_TOKEN";

/// Bearer credential issued by the external sign-in flow.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Non-secret token metadata left by the sign-in flow, e.g.
/// `~/.config/mailview/tokens.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// The access token, unless missing, empty or expired at `now`.
    pub fn usable_token(self, now: i64) -> Option<AccessToken> {
        let token = self.access_token.filter(|t| !t.is_empty())?;
        match self.expires_at_epoch {
            Some(exp) if now >= exp => {
                debug!("cached access token expired at {exp}");
                None
            }
            _ => Some(AccessToken(token)),
        }
    }
}

pub fn load_tokens(path: &Path) -> Result<Option<TokensFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let tf: TokensFile =
        serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(tf))
}

/// Finds a usable access token: the environment first, then the tokens file.
/// `Ok(None)` means the caller is not signed in.
pub fn load_access_token(cfg: &Config) -> Result<Option<AccessToken>> {
    if let Ok(t) = std::env::var(TOKEN_ENV_VAR)
        && !t.trim().is_empty()
    {
        return Ok(Some(AccessToken(t.trim().to_string())));
    }

    let path = resolve_tokens_path(cfg)?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    Ok(load_tokens(&path)?.and_then(|tf| tf.usable_token(now)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_secret() {
        let token = AccessToken::new("ya29.secret");
        assert!(!format!("{token:?}").contains("ya29"));
    }

    #[test]
    fn expired_token_is_unusable() {
        let tf = TokensFile {
            access_token: Some("abc".into()),
            expires_at_epoch: Some(1_000),
        };
        assert!(tf.usable_token(1_000).is_none());
    }

    #[test]
    fn fresh_token_or_no_expiry_is_usable() {
        let tf = TokensFile {
            access_token: Some("abc".into()),
            expires_at_epoch: Some(2_000),
        };
        assert_eq!(tf.usable_token(1_000), Some(AccessToken::new("abc")));

        let tf = TokensFile {
            access_token: Some("abc".into()),
            expires_at_epoch: None,
        };
        assert!(tf.usable_token(1_000).is_some());
    }

    #[test]
    fn empty_token_is_unusable() {
        let tf = TokensFile {
            access_token: Some(String::new()),
            expires_at_epoch: None,
        };
        assert!(tf.usable_token(0).is_none());
    }

    #[test]
    fn tokens_file_round_trip_on_disk() {
        let path =
            std::env::temp_dir().join(format!("mailview-tokens-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"access_token": "tok", "expires_at_epoch": 4102444800}"#,
        )
        .unwrap();
        let tf = load_tokens(&path).unwrap().unwrap();
        assert_eq!(tf.access_token.as_deref(), Some("tok"));
        let _ = fs::remove_file(&path);

        assert!(load_tokens(&path).unwrap().is_none());
    }
}
