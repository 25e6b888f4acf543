use anyhow::Context as _;
use opendata_upstream::GatewayConfig;
use std::path::{Path, PathBuf};

/// `$XDG_CONFIG_HOME/opendata/gateway.yaml`, or `~/.config/opendata/gateway.yaml` when
/// `XDG_CONFIG_HOME` is unset.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let base = if let Ok(v) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(v)
    } else {
        let home = std::env::var("HOME").context("HOME is not set")?;
        PathBuf::from(home).join(".config")
    };
    Ok(base.join("opendata").join("gateway.yaml"))
}

/// Load a YAML/JSON gateway config. A missing file yields the defaults.
pub fn load_config(path: &Path) -> anyhow::Result<GatewayConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(GatewayConfig::default()),
        Err(e) => return Err(e).with_context(|| format!("read config {}", path.display())),
    };
    GatewayConfig::from_yaml_str(&text).with_context(|| format!("parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(cfg, GatewayConfig::default());
    }

    #[test]
    fn yaml_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.yaml");
        std::fs::write(
            &path,
            "riksdagen:\n  baseUrl: http://127.0.0.1:9\nsafety:\n  maxItems: 50\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.riksdagen.base_url, "http://127.0.0.1:9");
        assert_eq!(cfg.safety.max_items, 50);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "riksdagen: [not, a, map]\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.yaml"), "{err:#}");
    }
}
