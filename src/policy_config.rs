//! Policy conventions: BGP communities and local-preference per relationship.
//!
//! The values are a configuration convention. The only semantic constraint
//! is the preference order customer > peer > provider, and each tag must be
//! distinguishable from the others.

use crate::inventory::Relationship;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Community tags attached to routes on ingress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    pub customer: String,
    pub provider: String,
    pub peer: String,
    /// Tag for routes originated by the router itself
    pub local: String,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            customer: "100:10".to_string(),
            provider: "100:20".to_string(),
            peer: "100:30".to_string(),
            local: "100:40".to_string(),
        }
    }
}

/// Local-preference values per relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalPreferenceConfig {
    pub customer: u32,
    pub peer: u32,
    pub provider: u32,
}

impl Default for LocalPreferenceConfig {
    fn default() -> Self {
        Self {
            customer: 200,
            peer: 150,
            provider: 100,
        }
    }
}

/// Policy configuration, loadable from YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub communities: CommunityConfig,
    pub local_preference: LocalPreferenceConfig,
}

/// Policy configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum PolicyConfigError {
    #[error("Invalid community '{0}': expected <asn>:<value>")]
    InvalidCommunity(String),
    #[error("Community '{0}' is assigned to more than one route class")]
    DuplicateCommunity(String),
    #[error("Local preference must rank customer > peer > provider (got {customer} / {peer} / {provider})")]
    PreferenceOrder { customer: u32, peer: u32, provider: u32 },
}

fn is_valid_community(community: &str) -> bool {
    match community.split_once(':') {
        Some((high, low)) => high.parse::<u16>().is_ok() && low.parse::<u16>().is_ok(),
        None => false,
    }
}

impl PolicyConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), PolicyConfigError> {
        let communities = [
            &self.communities.customer,
            &self.communities.provider,
            &self.communities.peer,
            &self.communities.local,
        ];
        for (i, community) in communities.iter().enumerate() {
            if !is_valid_community(community) {
                return Err(PolicyConfigError::InvalidCommunity(community.to_string()));
            }
            if communities[..i].contains(community) {
                return Err(PolicyConfigError::DuplicateCommunity(community.to_string()));
            }
        }

        let pref = &self.local_preference;
        if !(pref.customer > pref.peer && pref.peer > pref.provider) {
            return Err(PolicyConfigError::PreferenceOrder {
                customer: pref.customer,
                peer: pref.peer,
                provider: pref.provider,
            });
        }
        Ok(())
    }

    /// Community attached to routes learned from a neighbor in `role`
    pub fn community_for(&self, role: Relationship) -> &str {
        match role {
            Relationship::Customer => &self.communities.customer,
            Relationship::Provider => &self.communities.provider,
            Relationship::Peer => &self.communities.peer,
        }
    }

    /// Local-preference for routes learned from a neighbor in `role`
    pub fn local_preference_for(&self, role: Relationship) -> u32 {
        match role {
            Relationship::Customer => self.local_preference.customer,
            Relationship::Provider => self.local_preference.provider,
            Relationship::Peer => self.local_preference.peer,
        }
    }
}

/// Load and validate a policy configuration from a YAML file
pub fn load_policy_config(path: &Path) -> Result<PolicyConfig> {
    info!("Loading policy configuration from: {:?}", path);

    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open policy file '{}'", path.display()))?;
    let config: PolicyConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse policy file '{}'", path.display()))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = PolicyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.community_for(Relationship::Customer), "100:10");
        assert_eq!(config.local_preference_for(Relationship::Peer), 150);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
communities:
  local: "65000:999"
local_preference:
  customer: 300
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_policy_config(temp_file.path()).unwrap();
        assert_eq!(config.communities.local, "65000:999");
        assert_eq!(config.communities.customer, "100:10");
        assert_eq!(config.local_preference.customer, 300);
        assert_eq!(config.local_preference.provider, 100);
    }

    #[test]
    fn test_preference_order_enforced() {
        let mut config = PolicyConfig::default();
        config.local_preference.peer = 250;
        assert!(matches!(
            config.validate(),
            Err(PolicyConfigError::PreferenceOrder { .. })
        ));
    }

    #[test]
    fn test_communities_checked() {
        let mut config = PolicyConfig::default();
        config.communities.peer = "100:10".to_string();
        assert!(matches!(
            config.validate(),
            Err(PolicyConfigError::DuplicateCommunity(_))
        ));

        config.communities.peer = "not-a-community".to_string();
        assert!(matches!(
            config.validate(),
            Err(PolicyConfigError::InvalidCommunity(_))
        ));
    }

    #[test]
    fn test_invalid_yaml_file_rejected() {
        let yaml = r#"
local_preference:
  customer: 10
  peer: 20
  provider: 30
"#;
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();
        assert!(load_policy_config(temp_file.path()).is_err());
    }
}
