use serde::{Deserialize, Serialize};

/// Tunables for the shift materializer.
///
/// Loaded from `{data_dir}/generator.json`. Every field is optional in
/// the file; absent fields keep their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Cycle length used when the assignment's position cannot be found.
    pub fallback_cycle_length: u32,
    /// Days after today covered when a request gives no end date.
    pub default_range_days: u32,
    pub morning_start_hour: u32,
    pub afternoon_start_hour: u32,
    pub night_start_hour: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fallback_cycle_length: 15,
            default_range_days: 30,
            morning_start_hour: 6,
            afternoon_start_hour: 14,
            night_start_hour: 22,
        }
    }
}

impl GeneratorConfig {
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/generator.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GeneratorConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "default_range_days": 14 }"#).unwrap();
        assert_eq!(config.default_range_days, 14);
        assert_eq!(config.fallback_cycle_length, 15);
        assert_eq!(config.afternoon_start_hour, 14);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = GeneratorConfig::load("/nonexistent/rota-data").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rota-data/generator.json"));
    }
}
