use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

static MOBILE_PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("valid mobile phone pattern"));

pub fn ensure_directory(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

pub fn save_json(data: &impl serde::Serialize, path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let json_string = serde_json::to_string_pretty(data)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

/// Mainland China mobile number: 11 digits, `1` then `3`-`9`.
pub fn is_valid_mobile_phone_number(phone: &str) -> bool {
    MOBILE_PHONE_NUMBER.is_match(phone)
}
