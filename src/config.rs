use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PayrailConfig {
    pub server: ServerConfig,
    pub payments: PaymentsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub rpc_port: u16,
    pub db_path: String,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PaymentsConfig {
    /// Chain identifier stamped onto transfers created by the executor.
    #[serde(default = "default_chain")]
    pub default_chain: String,
    /// Token symbol stamped onto transfers created by the executor.
    #[serde(default = "default_token")]
    pub default_token: String,
    /// How many recent transfers the analysis handler reads.
    #[serde(default = "default_analysis_window")]
    pub analysis_window: usize,
    /// Base URL of the external name resolution collaborator.
    #[serde(default = "default_resolver_endpoint")]
    pub resolver_endpoint: String,
}

fn default_chain() -> String {
    "base".to_string()
}

fn default_token() -> String {
    "USDC".to_string()
}

fn default_analysis_window() -> usize {
    50
}

fn default_resolver_endpoint() -> String {
    "https://api.ensideas.com/ens/resolve".to_string()
}

impl Default for PayrailConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                rpc_port: 9000,
                db_path: "./data/payrail".to_string(),
                log_level: "info".to_string(),
            },
            payments: PaymentsConfig {
                default_chain: default_chain(),
                default_token: default_token(),
                analysis_window: default_analysis_window(),
                resolver_endpoint: default_resolver_endpoint(),
            },
        }
    }
}

impl PayrailConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        println!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        eprintln!("Config parse error in {}: {} (using defaults)", path, e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Could not read {}: {} (using defaults)", path, e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PayrailConfig::default();
        assert_eq!(config.server.rpc_port, 9000);
        assert_eq!(config.payments.default_chain, "base");
        assert_eq!(config.payments.default_token, "USDC");
        assert_eq!(config.payments.analysis_window, 50);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = PayrailConfig::load_or_default("/nonexistent/payrail.toml");
        assert_eq!(config.server.rpc_port, 9000);
    }

    #[test]
    fn test_partial_payments_table_uses_field_defaults() {
        let parsed: PayrailConfig = toml::from_str(
            r#"
            [server]
            rpc_port = 9100
            db_path = "./data/test"
            log_level = "debug"

            [payments]
            default_token = "EURC"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.server.rpc_port, 9100);
        assert_eq!(parsed.payments.default_token, "EURC");
        assert_eq!(parsed.payments.default_chain, "base");
        assert_eq!(parsed.payments.analysis_window, 50);
    }
}
