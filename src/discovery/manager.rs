//! Aggregated discovery group manager.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Root path the aggregated discovery document is served under.
pub const DISCOVERY_ROOT: &str = "apis";

const DISCOVERY_KIND: &str = "APIGroupDiscoveryList";
const DISCOVERY_API_VERSION: &str = "apidiscovery.k8s.io/v2";

/// Whether a resource lives inside a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceScope {
    Namespaced,
    Cluster,
}

/// One resource served by a group version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceDiscovery {
    pub resource: String,
    pub kind: String,
    pub scope: ResourceScope,
    pub verbs: Vec<String>,
}

/// A served version of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersionDiscovery {
    pub version: String,
    pub resources: Vec<ApiResourceDiscovery>,
}

/// Discovery entry for a single API group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiGroupDiscovery {
    pub name: String,
    pub versions: Vec<ApiVersionDiscovery>,
}

/// The document served at the discovery root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    pub kind: String,
    pub api_version: String,
    pub items: Vec<ApiGroupDiscovery>,
}

#[derive(Debug, Default)]
struct GroupEntry {
    priority: u32,
    versions: Vec<ApiVersionDiscovery>,
}

/// Registry of API groups advertised through aggregated discovery.
///
/// Clones share the same registry.
#[derive(Debug, Clone)]
pub struct ResourceManager {
    root: String,
    groups: Arc<DashMap<String, GroupEntry>>,
}

impl ResourceManager {
    /// Create an empty manager serving under `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            groups: Arc::new(DashMap::new()),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Add or replace a version of `group`.
    pub fn add_group_version(&self, group: &str, version: ApiVersionDiscovery) {
        let mut entry = self.groups.entry(group.to_string()).or_default();
        match entry.versions.iter_mut().find(|v| v.version == version.version) {
            Some(existing) => *existing = version,
            None => entry.versions.push(version),
        }
        tracing::debug!(group, versions = entry.versions.len(), "Discovery group updated");
    }

    /// Remove a version; the group disappears with its last version.
    pub fn remove_group_version(&self, group: &str, version: &str) {
        let now_empty = match self.groups.get_mut(group) {
            Some(mut entry) => {
                entry.versions.retain(|v| v.version != version);
                entry.versions.is_empty()
            }
            None => return,
        };
        if now_empty {
            self.groups.remove(group);
        }
    }

    /// Higher priority groups are listed first.
    pub fn set_group_priority(&self, group: &str, priority: u32) {
        if let Some(mut entry) = self.groups.get_mut(group) {
            entry.priority = priority;
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Snapshot of all groups, ordered by priority (descending) then name.
    pub fn discovery_document(&self) -> DiscoveryDocument {
        let mut groups: Vec<(u32, ApiGroupDiscovery)> = self
            .groups
            .iter()
            .map(|entry| {
                (
                    entry.priority,
                    ApiGroupDiscovery {
                        name: entry.key().clone(),
                        versions: entry.versions.clone(),
                    },
                )
            })
            .collect();
        groups.sort_by(|(pa, a), (pb, b)| pb.cmp(pa).then_with(|| a.name.cmp(&b.name)));

        DiscoveryDocument {
            kind: DISCOVERY_KIND.to_string(),
            api_version: DISCOVERY_API_VERSION.to_string(),
            items: groups.into_iter().map(|(_, g)| g).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(name: &str, resource: &str) -> ApiVersionDiscovery {
        ApiVersionDiscovery {
            version: name.to_string(),
            resources: vec![ApiResourceDiscovery {
                resource: resource.to_string(),
                kind: "Thing".to_string(),
                scope: ResourceScope::Namespaced,
                verbs: vec!["get".to_string(), "list".to_string()],
            }],
        }
    }

    #[test]
    fn orders_by_priority_then_name() {
        let manager = ResourceManager::new(DISCOVERY_ROOT);
        manager.add_group_version("b.example.com", version("v1", "bees"));
        manager.add_group_version("a.example.com", version("v1", "ants"));
        manager.add_group_version("z.example.com", version("v1", "zebras"));
        manager.set_group_priority("z.example.com", 100);

        let doc = manager.discovery_document();
        let names: Vec<_> = doc.items.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["z.example.com", "a.example.com", "b.example.com"]);
        assert_eq!(doc.kind, "APIGroupDiscoveryList");
    }

    #[test]
    fn replaces_existing_version() {
        let manager = ResourceManager::new(DISCOVERY_ROOT);
        manager.add_group_version("g", version("v1", "old"));
        manager.add_group_version("g", version("v1", "new"));
        manager.add_group_version("g", version("v2", "newer"));

        let doc = manager.discovery_document();
        assert_eq!(doc.items[0].versions.len(), 2);
        assert_eq!(doc.items[0].versions[0].resources[0].resource, "new");
    }

    #[test]
    fn removing_last_version_drops_group() {
        let manager = ResourceManager::new(DISCOVERY_ROOT);
        manager.add_group_version("g", version("v1", "things"));
        manager.remove_group_version("g", "v1");
        assert_eq!(manager.group_count(), 0);
        manager.remove_group_version("missing", "v1");
    }

    #[test]
    fn clones_share_registry() {
        let manager = ResourceManager::new(DISCOVERY_ROOT);
        let clone = manager.clone();
        clone.add_group_version("g", version("v1", "things"));
        assert_eq!(manager.group_count(), 1);
        assert_eq!(manager.root(), "apis");
    }

    #[test]
    fn serializes_camel_case() {
        let manager = ResourceManager::new(DISCOVERY_ROOT);
        manager.add_group_version("g", version("v1", "things"));
        let json = serde_json::to_value(manager.discovery_document()).unwrap();
        assert_eq!(json["apiVersion"], "apidiscovery.k8s.io/v2");
        assert_eq!(json["items"][0]["versions"][0]["resources"][0]["scope"], "Namespaced");
    }
}
