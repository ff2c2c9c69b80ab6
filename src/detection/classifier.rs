use crate::config::ClassificationConfig;

/// Classifies device names as IT-owned or server by keyword
#[derive(Debug, Clone)]
pub struct DeviceClassifier {
    it_devices: Vec<String>,
    servers: Vec<String>,
}

impl DeviceClassifier {
    pub fn new(config: &ClassificationConfig) -> Self {
        DeviceClassifier {
            it_devices: config.it_devices.clone(),
            servers: config.servers.clone(),
        }
    }

    /// True if any IT keyword occurs in the trimmed name (case-sensitive)
    pub fn is_it_device(&self, name: &str) -> bool {
        Self::matches_any(&self.it_devices, name)
    }

    /// True if any server keyword occurs in the trimmed name (case-sensitive)
    pub fn is_server(&self, name: &str) -> bool {
        Self::matches_any(&self.servers, name)
    }

    /// A non-IT device talking to a server
    pub fn is_unauthorized_server_access(&self, source: &str, destination: &str) -> bool {
        self.is_server(destination) && !self.is_it_device(source)
    }

    fn matches_any(keywords: &[String], name: &str) -> bool {
        let name = name.trim();
        keywords.iter().any(|keyword| name.contains(keyword.as_str()))
    }
}

impl Default for DeviceClassifier {
    fn default() -> Self {
        Self::new(&ClassificationConfig::default())
    }
}
