//! INI configuration loader for the UDP sender.
//!
//! Reads a `[udp_sender]` section with `rust-ini` and turns it into a
//! [`UdpSenderBuilder`]. Files may be stored in any encoding `encoding_rs`
//! knows by label; UTF-8 is assumed when none is given.
//!
//! ```ini
//! [udp_sender]
//! remote_host = logs.internal
//! remote_port = 5140
//! local_ip = 10.0.0.5
//! write_timeout_ms = 500
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::Encoding;
use ini::{Ini, Properties};
use thiserror::Error;

use crate::handlers::UdpSenderBuilder;

/// Section holding the sender options.
pub const SECTION: &str = "udp_sender";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} doesn't exist")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{0} is an empty file")]
    Empty(String),
    #[error("unknown encoding {0}")]
    UnknownEncoding(String),
    #[error("{path} could not be decoded as {encoding}")]
    Decode { path: String, encoding: String },
    #[error("{path} is invalid: {message}")]
    Parse { path: String, message: String },
    #[error("{path} has no [udp_sender] section")]
    MissingSection { path: String },
    #[error("missing required key {0:?}")]
    MissingKey(&'static str),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[error("unknown key {0:?}")]
    UnknownKey(String),
}

/// Load a builder from the INI file at `path`.
pub fn load_builder(
    path: impl AsRef<Path>,
    encoding: Option<&str>,
) -> Result<UdpSenderBuilder, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let bytes = read_file_bytes(path, &display)?;
    if bytes.is_empty() {
        return Err(ConfigError::Empty(display));
    }
    let text = decode_with_encoding(&display, &bytes, encoding.unwrap_or("utf-8"))?;
    builder_from_str(&display, &text)
}

fn read_file_bytes(path: &Path, display: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(display.to_owned()),
        _ => ConfigError::Io {
            path: display.to_owned(),
            source: err,
        },
    })
}

fn decode_with_encoding(path: &str, bytes: &[u8], label: &str) -> Result<String, ConfigError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_owned()))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConfigError::Decode {
            path: path.to_owned(),
            encoding: encoding.name().to_owned(),
        });
    }
    Ok(decoded.into_owned())
}

/// Parse INI `text` into a builder. `path` is only used in error messages.
pub fn builder_from_str(path: &str, text: &str) -> Result<UdpSenderBuilder, ConfigError> {
    let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Parse {
        path: path.to_owned(),
        message: err.to_string(),
    })?;
    let section = ini
        .section(Some(SECTION))
        .ok_or_else(|| ConfigError::MissingSection {
            path: path.to_owned(),
        })?;
    apply_section(section)
}

fn apply_section(section: &Properties) -> Result<UdpSenderBuilder, ConfigError> {
    let host = section
        .get("remote_host")
        .ok_or(ConfigError::MissingKey("remote_host"))?;
    let port = section
        .get("remote_port")
        .ok_or(ConfigError::MissingKey("remote_port"))
        .and_then(|value| parse_value::<u16>("remote_port", value))?;
    let mut builder = UdpSenderBuilder::new().with_remote(host, port);

    for (key, value) in section.iter() {
        builder = match key {
            "remote_host" | "remote_port" => builder,
            "local_ip" => builder.with_local_ip(value),
            "local_port" => builder.with_local_port(parse_value(key, value)?),
            "write_timeout_ms" => builder.with_write_timeout_ms(parse_value(key, value)?),
            "warn_interval_ms" => builder.with_warn_interval_ms(parse_value(key, value)?),
            other => return Err(ConfigError::UnknownKey(other.to_owned())),
        };
    }
    Ok(builder)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}
