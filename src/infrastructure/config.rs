// Configuration loading
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub engine: EngineSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Engine defaults applied when a request omits its own bounds.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    pub default_tolerance_percentage: f64,
    pub default_confidence_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_tolerance_percentage: 10.0,
            default_confidence_threshold: 0.8,
        }
    }
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080_i64)?
        .set_default("engine.default_tolerance_percentage", 10.0)?
        .set_default("engine.default_confidence_threshold", 0.8)?
        .add_source(config::File::with_name("config/server").required(false))
        .build()?;

    Ok(settings.try_deserialize()?)
}
