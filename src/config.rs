use std::{env, net::SocketAddr, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
}

impl AppConfig {
    /// Reads `PORT` and `APP_DATA_PATH`. Unparseable ports fall back to the
    /// default.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            data_path: resolve_data_path(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

pub fn resolve_data_path() -> PathBuf {
    match env::var("APP_DATA_PATH") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_DATA_PATH),
    }
}
