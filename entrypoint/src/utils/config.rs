use std::path::Path;

use common::config::PipelineConfig;
use tracing::debug;

use crate::errors::MonitorError;

/// Command line values that win over the config file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub max_pages: Option<u64>,
    pub concurrency: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(max_pages) = self.max_pages {
            config.max_pages = Some(max_pages);
        }

        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }

        config
    }
}

pub async fn load_config(
    path: impl AsRef<Path>,
    overrides: &ConfigOverrides,
) -> Result<PipelineConfig, MonitorError> {
    let path = path.as_ref();
    let display_path = path.display().to_string();

    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| MonitorError::ConfigRead {
            path: display_path.clone(),
            source,
        })?;

    let config = PipelineConfig::from_json(&json).map_err(|source| MonitorError::ConfigParse {
        path: display_path,
        source,
    })?;

    let config = overrides.apply(config);

    debug!("Loaded config: {config:?}");

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    const CONFIG: &str = r#"{
        "baseUrl": "https://example.com/listings?page={page}",
        "selectors": {
            "listing": ".listing-item",
            "title": ".listing-title",
            "price": ".listing-price",
            "area": ".listing-area",
            "link": "a.listing-link"
        },
        "maxPages": 3
    }"#;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn overrides_win_over_file() {
        let path = write_temp("monitor-config.json", CONFIG);
        let overrides = ConfigOverrides {
            max_pages: Some(10),
            concurrency: Some(3),
        };

        let config = load_config(&path, &overrides).await.unwrap();

        assert_eq!(config.max_pages, Some(10));
        assert_eq!(config.concurrency, 3);

        let config = load_config(&path, &ConfigOverrides::default()).await.unwrap();
        assert_eq!(config.max_pages, Some(3));
        assert_eq!(config.concurrency, 1);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn reports_missing_and_malformed_files() {
        let missing = load_config("/definitely/not/here.json", &ConfigOverrides::default()).await;
        assert!(matches!(missing, Err(MonitorError::ConfigRead { .. })));

        let path = write_temp("monitor-broken.json", "{ \"baseUrl\": ");
        let broken = load_config(&path, &ConfigOverrides::default()).await;
        assert!(matches!(broken, Err(MonitorError::ConfigParse { .. })));

        std::fs::remove_file(&path).unwrap();
    }
}
