use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;
use parking_lot::Mutex;
use std::path::Path;

/// State wrapper for configuration manager
pub type ConfigManagerState = Mutex<ConfigManager>;

/// Initialize config manager state, at `path` or in the platform config directory
pub fn init_config_manager(path: Option<&Path>) -> Result<ConfigManagerState, String> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new().map_err(|e| format!("Failed to locate config: {}", e))?,
    };
    Ok(Mutex::new(manager))
}

/// Save entire application configuration
pub fn save_config(state: &ConfigManagerState, config: &AppConfig) -> Result<(), String> {
    state
        .lock()
        .save(config)
        .map_err(|e| format!("Failed to save config: {}", e))
}

/// Load entire application configuration
pub fn load_config(state: &ConfigManagerState) -> Result<AppConfig, String> {
    state
        .lock()
        .load()
        .map_err(|e| format!("Failed to load config: {}", e))
}

/// Load configuration, writing the defaults first if no file exists yet
pub fn load_or_init_config(state: &ConfigManagerState) -> Result<AppConfig, String> {
    let manager = state.lock();
    if !manager.config_exists() {
        let config = AppConfig::default();
        manager
            .save(&config)
            .map_err(|e| format!("Failed to write default config: {}", e))?;
        tracing::info!(path = %manager.config_file_path().display(), "Wrote default config");
        return Ok(config);
    }
    manager
        .load()
        .map_err(|e| format!("Failed to load config: {}", e))
}

/// Get config file path
pub fn get_config_path(state: &ConfigManagerState) -> String {
    state.lock().config_file_path().display().to_string()
}
