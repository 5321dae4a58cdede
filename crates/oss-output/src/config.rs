use serde::Deserialize;

/// OSS output settings, typically the `[output]` table of a player config.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OssConfig {
    /// Device node to play through. When unset the default nodes are searched.
    pub device: Option<String>,
}

impl OssConfig {
    /// The configured device path, ignoring blank values.
    pub fn device(&self) -> Option<&str> {
        self.device
            .as_deref()
            .map(str::trim)
            .filter(|device| !device.is_empty())
    }
}
