use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MediTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory (~/MediTrack/ unless overridden)
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDITRACK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MediTrack")
}

/// Path of the SQLite database file
pub fn db_path() -> PathBuf {
    app_data_dir().join("meditrack.db")
}

/// Server bind address, `MEDITRACK_BIND` override or 127.0.0.1:5000
pub fn bind_addr() -> SocketAddr {
    std::env::var("MEDITRACK_BIND")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5000)))
}

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> &'static str {
    "meditrack=info,tower_http=info"
}
