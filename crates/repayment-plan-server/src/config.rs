use clap::{Parser, ValueEnum};

/// Listen address used when `--http.addr` is not given.
pub const DEFAULT_HTTP_ADDR: &str = ":8080";

/// Startup options for the repayment plan service.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "repayment-plan-server",
    version,
    about = "Serve monthly loan repayment plans over HTTP"
)]
pub struct Config {
    /// HTTP listen address. A bare `:port` listens on all interfaces.
    #[arg(long = "http.addr", default_value = DEFAULT_HTTP_ADDR)]
    pub http_addr: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Address in a form `TcpListener::bind` accepts.
    pub fn listen_addr(&self) -> String {
        match self.http_addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => self.http_addr.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listens_on_all_interfaces() {
        let config = Config::try_parse_from(["repayment-plan-server"]).unwrap();
        assert_eq!(config.http_addr, ":8080");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_explicit_host_is_kept() {
        let config = Config::try_parse_from([
            "repayment-plan-server",
            "--http.addr",
            "127.0.0.1:9000",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
