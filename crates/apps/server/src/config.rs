use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
const DEFAULT_ADDR: &str = "127.0.0.1:5173";

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub backend_url: String,
    pub addr: SocketAddr,
    pub static_root: Option<PathBuf>,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let backend_url = lookup("BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let default_addr = SocketAddr::from(([127, 0, 0, 1], 5173));
        let addr = match lookup("PROXY_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid PROXY_ADDR, using {DEFAULT_ADDR}");
                default_addr
            }),
            None => default_addr,
        };
        let static_root = lookup("STATIC_ROOT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Self {
            backend_url,
            addr,
            static_root,
        }
    }
}
