//! Server settings read from the environment.
//!
//! | Variable           | Default     |
//! |--------------------|-------------|
//! | `TIMETABLE_HOST`   | `127.0.0.1` |
//! | `TIMETABLE_PORT`   | `8080`      |
//! | `TIMETABLE_LOG`    | `info`      |
//! | `TIMETABLE_CONFIG` | unset       |
//!
//! `TIMETABLE_CONFIG` points at a TOML [`SchedulerConfig`] file.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::config::SchedulerConfig;
use crate::error::ScheduleError;

/// Settings controlling the HTTP server binding and logging.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub scheduler_config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            scheduler_config: None,
        }
    }
}

impl ServerConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self, ScheduleError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ScheduleError> {
        let defaults = Self::default();
        let port = match lookup("TIMETABLE_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                ScheduleError::Config(format!("TIMETABLE_PORT must be a valid u16, got '{raw}'"))
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: lookup("TIMETABLE_HOST").unwrap_or(defaults.host),
            port,
            log_level: lookup("TIMETABLE_LOG").unwrap_or(defaults.log_level),
            scheduler_config: lookup("TIMETABLE_CONFIG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ScheduleError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self.host.parse().map_err(|_| {
            ScheduleError::Config(format!(
                "TIMETABLE_HOST must parse to an IPv4 or IPv6 address, got '{}'",
                self.host
            ))
        })?;

        Ok(SocketAddr::new(ip, self.port))
    }

    /// Scheduler tunables from `TIMETABLE_CONFIG`, or the defaults.
    pub fn scheduler(&self) -> Result<SchedulerConfig, ScheduleError> {
        match &self.scheduler_config {
            Some(path) => SchedulerConfig::from_file(path),
            None => Ok(SchedulerConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_missing() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
        assert_eq!(config.scheduler().unwrap(), SchedulerConfig::default());
    }

    #[test]
    fn test_accepts_localhost_host() {
        let vars = [("TIMETABLE_HOST", "localhost"), ("TIMETABLE_PORT", "9000")];
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 9000));
    }

    #[test]
    fn test_invalid_port_and_host() {
        let err = ServerConfig::from_lookup(lookup(&[("TIMETABLE_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));

        let config = ServerConfig::from_lookup(lookup(&[("TIMETABLE_HOST", "not-an-ip")])).unwrap();
        assert!(matches!(config.socket_addr(), Err(ScheduleError::Config(_))));
    }

    #[test]
    fn test_missing_scheduler_file_is_config_error() {
        let vars = [("TIMETABLE_CONFIG", "/nonexistent/timetable.toml")];
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(matches!(config.scheduler(), Err(ScheduleError::Config(_))));
    }
}
