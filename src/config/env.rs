//! Environment configuration
//!
//! Tunnel backends can be supplied through `SOCKS_CONNECT*` variables, each
//! holding a comma-separated list of `host:port` entries.

use super::UplinkConfig;
use crate::error::DispatchError;

/// Listen host variable (read by the CLI)
pub const ENV_SERVER_HOST: &str = "SOCKS_SERVER_HOST";

/// Listen port variable (read by the CLI)
pub const ENV_SERVER_PORT: &str = "SOCKS_SERVER_PORT";

/// Prefix of backend list variables
pub const ENV_CONNECT_PREFIX: &str = "SOCKS_CONNECT";

/// Collect tunnel backends from `SOCKS_CONNECT*` variables
///
/// Variables are read in name order. Every malformed variable is reported in
/// the returned error.
pub fn connect_uplinks_from_env<I>(vars: I) -> Result<Vec<UplinkConfig>, DispatchError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut connect_vars: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(key, _)| key.starts_with(ENV_CONNECT_PREFIX))
        .collect();
    connect_vars.sort();

    let mut uplinks = Vec::new();
    let mut errors = Vec::new();

    for (key, value) in connect_vars {
        let value: String = value.chars().filter(|c| *c != ' ').collect();
        match parse_connect_list(&value) {
            Some(mut parsed) => uplinks.append(&mut parsed),
            None => errors.push(format!("invalid {}: '{}'", key, value)),
        }
    }

    if !errors.is_empty() {
        return Err(DispatchError::Config(errors.join("; ")));
    }

    Ok(uplinks)
}

fn parse_connect_list(value: &str) -> Option<Vec<UplinkConfig>> {
    value
        .split(',')
        .map(|entry| {
            let (host, port) = entry.split_once(':')?;
            let port = port.parse::<u16>().ok().filter(|p| *p > 0)?;
            if host.is_empty() {
                return None;
            }
            Some(UplinkConfig {
                address: host.to_string(),
                port: Some(port),
                weight: 1,
                interface: None,
            })
        })
        .collect()
}
