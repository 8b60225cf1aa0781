use shared::DEFAULT_PORT;
use std::time::Duration;

/// Runtime settings for the chess server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    pub port: u16,
    /// How long a new connection may take to send its join message
    pub handshake_timeout: Duration,
    /// Longest accepted display name, in characters
    pub max_name_len: usize,
    /// Assign colors at random instead of first-queued-plays-white
    pub random_colors: bool,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            handshake_timeout: Duration::from_secs(30),
            max_name_len: 32,
            random_colors: false,
        }
    }
}
