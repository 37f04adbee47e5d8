use std::path::Path;

use serde::{Deserialize, Serialize};

fn default_authoring_collection() -> String {
    "authoring".to_string()
}

fn default_published_collection() -> String {
    "published".to_string()
}

fn default_roles() -> Vec<String> {
    vec![super::access::ROLE_AUTHOR.to_string()]
}

/// The local actor: who is operating this workspace, and with which roles.
///
/// Non-secret only. Tokens are never written here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Display name of the operator.
    #[serde(default)]
    pub name: String,

    /// Email of the operator.
    #[serde(default)]
    pub email: String,

    /// Role names granted to the operator.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            roles: default_roles(),
        }
    }
}

/// Workspace configuration for the document registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Name of the authoring collection directory.
    pub authoring_collection: String,

    /// Name of the published collection directory.
    pub published_collection: String,

    /// The local operator identity and roles.
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            authoring_collection: default_authoring_collection(),
            published_collection: default_published_collection(),
            actor: ActorConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_authoring_collection")]
        authoring_collection: String,

        #[serde(default = "default_published_collection")]
        published_collection: String,

        #[serde(default)]
        actor: ActorConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                authoring_collection,
                published_collection,
                actor,
            } => Self {
                authoring_collection,
                published_collection,
                actor,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            authoring_collection: config.authoring_collection,
            published_collection: config.published_collection,
            actor: config.actor,
        }
    }
}
