use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_SEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Address outgoing mail is sent from; also the keyring user for the API key.
    pub from_address: String,
    pub send_api_url: Option<String>,
    pub db_path: Option<String>,
}

impl Config {
    pub fn send_api_url(&self) -> Result<String> {
        let raw = self
            .send_api_url
            .as_deref()
            .unwrap_or(DEFAULT_SEND_API_URL);
        let parsed = url::Url::parse(raw).map_err(|e| anyhow!("invalid send_api_url {raw}: {e}"))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed.to_string()),
            other => Err(anyhow!("send_api_url must be http(s), got {other}")),
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("rs_inbox"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn default_db_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("inbox.db");
    Ok(p)
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    if cfg.from_address.trim().is_empty() {
        return Err(anyhow!("from_address must not be empty"));
    }
    Ok(cfg)
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        // create a template config for users to edit
        let sample = Config {
            from_address: "you@example.com".to_string(),
            send_api_url: Some(DEFAULT_SEND_API_URL.to_string()),
            db_path: None,
        };
        let tom = toml::to_string_pretty(&sample)?;
        fs::write(&path, tom)?;
        return Err(anyhow::anyhow!(
            "Created template config at {}; edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    parse_config(&s)
}

pub fn resolve_db_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.db_path {
        Ok(PathBuf::from(p))
    } else {
        default_db_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(r#"from_address = "me@example.org""#).unwrap();
        assert_eq!(cfg.send_api_url().unwrap(), DEFAULT_SEND_API_URL);
        assert_eq!(cfg.db_path, None);
    }

    #[test]
    fn explicit_values_are_kept() {
        let cfg = parse_config(
            r#"
            from_address = "me@example.org"
            send_api_url = "http://localhost:8025/api/send"
            db_path = "/tmp/inbox.db"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.send_api_url().unwrap(), "http://localhost:8025/api/send");
        assert_eq!(resolve_db_path(&cfg).unwrap(), PathBuf::from("/tmp/inbox.db"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_config(r#"from_address = "  ""#).is_err());
        assert!(parse_config("db_path = \"x\"").is_err());

        let cfg = parse_config(
            r#"
            from_address = "me@example.org"
            send_api_url = "ftp://example.org/send"
            "#,
        )
        .unwrap();
        assert!(cfg.send_api_url().is_err());
    }

    #[test]
    fn template_round_trips() {
        let sample = Config {
            from_address: "you@example.com".into(),
            send_api_url: Some(DEFAULT_SEND_API_URL.into()),
            db_path: None,
        };
        let s = toml::to_string_pretty(&sample).unwrap();
        assert_eq!(parse_config(&s).unwrap(), sample);
    }
}
