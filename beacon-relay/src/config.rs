use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelayConfig,
    pub server: ServerConfig,
    pub reporter: ReporterConfig,
    pub scanner: ScannerConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelayConfig {
    /// Only advertisements carrying this local name are processed
    pub device_name: Option<String>,
    /// Only frames broadcasting this 16-character identifier are processed
    pub beacon_uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address for the health/stats HTTP server to listen on
    pub http_addr: SocketAddr,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReporterConfig {
    Http {
        /// Measurement endpoint that receives the POSTed readings
        endpoint: String,
        /// Request timeout in seconds
        timeout_secs: u64,
    },
    Memory,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScannerConfig {
    Mock {
        /// Interval in milliseconds between new readings
        interval_ms: u64,
        /// How many times each reading is broadcast
        repeats: u32,
        /// Deliver frames without the flags preamble
        #[serde(default)]
        strip_flags: bool,
    },
    Tcp {
        addr: SocketAddr,
    },
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay: RelayConfig {
                device_name: Some("GTI".to_string()),
                beacon_uuid: None,
            },
            server: ServerConfig {
                http_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            },
            reporter: ReporterConfig::Memory,
            scanner: ScannerConfig::Mock {
                interval_ms: 1000,
                repeats: 3,
                strip_flags: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_file() -> color_eyre::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"
[relay]
device_name = "GTI"
beacon_uuid = "EPSG-GTI-PROY-3A"

[server]
http_addr = "127.0.0.1:8081"

[reporter]
type = "http"
endpoint = "http://127.0.0.1:8080/api/medicion"
timeout_secs = 5

[scanner]
type = "tcp"
addr = "127.0.0.1:7070"
"#
        )?;

        let config = Config::load(file.path())?;

        assert_eq!(config.relay.device_name.as_deref(), Some("GTI"));
        assert_eq!(config.relay.beacon_uuid.as_deref(), Some("EPSG-GTI-PROY-3A"));
        assert!(matches!(
            config.reporter,
            ReporterConfig::Http { ref endpoint, timeout_secs: 5 }
                if endpoint == "http://127.0.0.1:8080/api/medicion"
        ));
        assert!(matches!(config.scanner, ScannerConfig::Tcp { addr } if addr.port() == 7070));
        Ok(())
    }

    #[test]
    fn relay_section_is_optional() {
        let config: Config = toml::from_str(
            r#"
[server]
http_addr = "0.0.0.0:8081"

[reporter]
type = "memory"

[scanner]
type = "mock"
interval_ms = 250
repeats = 2
"#,
        )
        .unwrap();

        assert!(config.relay.device_name.is_none());
        assert!(matches!(config.reporter, ReporterConfig::Memory));
        assert!(matches!(
            config.scanner,
            ScannerConfig::Mock {
                interval_ms: 250,
                repeats: 2,
                strip_flags: false
            }
        ));
    }
}
