use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

const SERVICE: &str = "rs_inbox";
pub const API_KEY_ENV: &str = "RS_INBOX_API_KEY";

/// Save the send API key into the OS keyring under the sender address
pub fn save_api_key(from_address: &str, api_key: &str) -> Result<()> {
    let entry = Entry::new(SERVICE, from_address);
    entry?
        .set_password(api_key)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Load the send API key from the keyring
pub fn load_api_key(from_address: &str) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE, from_address);
    match entry?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// Keyring first, then the environment. A keyring that cannot be reached is
/// not fatal; sending will report the missing key instead.
pub fn resolve_api_key(from_address: &str) -> Option<String> {
    match load_api_key(from_address) {
        Ok(Some(k)) => return Some(k),
        Ok(None) => {}
        Err(e) => log::warn!("keyring unavailable: {e}"),
    }
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}
