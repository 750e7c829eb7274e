use crate::config::ModelConfig;
use crate::constants::TOKEN_CACHE_FILE;
use crate::error::Result;
use crate::run::{RunOptions, Runner};
use crate::{status, warning};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// everything needed to talk to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEndpoint {
    pub model: String,
    pub base_url: String,
    /// absent when a browser login didn't produce one; the request then fails upstream
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenCache {
    #[serde(default)]
    tokens: HashMap<String, CachedToken>,
}

#[derive(Debug, Deserialize)]
struct CachedToken {
    access_token: String,
    expiry: String,
}

pub fn default_token_cache() -> anyhow::Result<PathBuf> {
    use anyhow::Context;
    let home = dirs::home_dir().context("failed to determine home directory")?;
    Ok(home.join(TOKEN_CACHE_FILE))
}

fn account_host(account: &str) -> String {
    format!("https://{account}.cloud.databricks.com")
}

/// turns a `ModelConfig` into a `ModelEndpoint`, logging in when needed
pub struct CredentialResolver<'a> {
    runner: &'a dyn Runner,
    token_cache: PathBuf,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(runner: &'a dyn Runner, token_cache: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            token_cache: token_cache.into(),
        }
    }

    pub fn resolve(&self, config: &ModelConfig, now: DateTime<Utc>) -> Result<ModelEndpoint> {
        match config {
            ModelConfig::Token {
                model_name,
                endpoint,
                token,
            } => Ok(ModelEndpoint {
                model: model_name.clone(),
                base_url: endpoint.clone(),
                token: Some(token.clone()),
            }),
            ModelConfig::BrowserAccount {
                model_name,
                account,
            } => {
                let token = match cached_token(&self.token_cache, account, now) {
                    Some(token) => Some(token),
                    None => {
                        self.login(account);
                        cached_token(&self.token_cache, account, now)
                    }
                };
                if token.is_none() {
                    warning!("no valid token for account {} after login", account);
                }
                Ok(ModelEndpoint {
                    model: model_name.clone(),
                    base_url: format!("{}/serving-endpoints", account_host(account)),
                    token,
                })
            }
        }
    }

    /// blocking browser login; failures surface later as an auth error
    fn login(&self, account: &str) {
        status!("logging in to {}...", account);
        let Some(command) = login_command(account) else {
            warning!("can't log in to account {:?}", account);
            return;
        };
        if let Err(e) = self.runner.run(&command, None, RunOptions::passthrough()) {
            warning!("login failed: {}", e);
        }
    }
}

/// `databricks auth login` for `account`, every argument shell-quoted
fn login_command(account: &str) -> Option<String> {
    let host = account_host(account);
    shlex::try_join([
        "databricks",
        "auth",
        "login",
        "--profile",
        account,
        "--host",
        host.as_str(),
    ])
    .ok()
}

/// the cached access token for `account`, if it expires strictly after `now`
fn cached_token(cache: &Path, account: &str, now: DateTime<Utc>) -> Option<String> {
    let content = std::fs::read_to_string(cache).ok()?;
    let cache: TokenCache = match serde_json::from_str(&content) {
        Ok(cache) => cache,
        Err(e) => {
            warning!("ignoring unreadable token cache {}: {}", cache.display(), e);
            return None;
        }
    };

    let entry = cache.tokens.get(account)?;
    let expiry = DateTime::parse_from_rfc3339(&entry.expiry).ok()?;
    (expiry.with_timezone(&Utc) > now).then(|| entry.access_token.clone())
}
