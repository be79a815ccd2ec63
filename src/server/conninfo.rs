//! Connection string handling
//!
//! Accepts both `postgres://` URLs and libpq `key=value` strings.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::{Error, Result};

const KNOWN_KEYS: &[&str] = &[
    "host",
    "hostaddr",
    "port",
    "user",
    "password",
    "dbname",
    "application_name",
    "sslmode",
];

/// Splits a libpq keyword/value string into pairs.
///
/// Values may be single-quoted; inside quotes `\'` and `\\` are escapes.
pub fn parse_keyword_pairs(conninfo: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = conninfo.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.next() != Some('=') {
            return Err(Error::InvalidConnInfo(format!("missing \"=\" after \"{}\"", key)));
        }
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'\'') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '\'' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(Error::InvalidConnInfo("unterminated quoted string".to_string()));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }

        if !KNOWN_KEYS.contains(&key.as_str()) {
            return Err(Error::InvalidConnInfo(format!("invalid connection option \"{}\"", key)));
        }
        pairs.push((key, value));
    }

    Ok(pairs)
}

/// Builds connection options from a URL or keyword/value string.
pub fn parse_conninfo(conninfo: &str) -> Result<PgConnectOptions> {
    let trimmed = conninfo.trim();
    if trimmed.starts_with("postgres://") || trimmed.starts_with("postgresql://") {
        return PgConnectOptions::from_str(trimmed)
            .map_err(|e| Error::InvalidConnInfo(e.to_string()));
    }

    let mut options = PgConnectOptions::new();
    for (key, value) in parse_keyword_pairs(trimmed)? {
        options = match key.as_str() {
            "host" | "hostaddr" => options.host(&value),
            "port" => {
                let port = value
                    .parse::<u16>()
                    .map_err(|_| Error::InvalidConnInfo(format!("invalid port number: \"{}\"", value)))?;
                options.port(port)
            }
            "user" => options.username(&value),
            "password" => options.password(&value),
            "dbname" => options.database(&value),
            "application_name" => options.application_name(&value),
            "sslmode" => {
                let mode = PgSslMode::from_str(&value)
                    .map_err(|e| Error::InvalidConnInfo(e.to_string()))?;
                options.ssl_mode(mode)
            }
            _ => options,
        };
    }

    Ok(options)
}
