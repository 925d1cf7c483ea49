use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A dependency and the version of it in use at one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    pub repo_url: String,
    pub version: String,
}

impl Pin {
    pub fn new(
        name: impl Into<String>,
        repo_url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo_url: repo_url.into(),
            version: version.into(),
        }
    }
}

/// Pins in manifest order
pub type PinList = Vec<Pin>;

/// A pin present on both sides with a different version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinChange {
    pub name: String,
    /// URL from the newer manifest
    pub repo_url: String,
    pub old_version: String,
    pub new_version: String,
}

/// Classification of every name found in either pin list.
///
/// Each name lands in exactly one bucket; buckets are sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinDelta {
    pub added: Vec<Pin>,
    pub removed: Vec<Pin>,
    pub changed: Vec<PinChange>,
    pub unchanged: Vec<String>,
}

impl PinDelta {
    /// Whether anything would show up in a report
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.changed.is_empty()
    }
}

fn by_name(pins: &[Pin]) -> BTreeMap<&str, &Pin> {
    // Later entries win, as they do when manifests are merged
    pins.iter().map(|pin| (pin.name.as_str(), pin)).collect()
}

/// Compare two pin lists by name
pub fn diff(old: &[Pin], new: &[Pin]) -> PinDelta {
    let old_map = by_name(old);
    let new_map = by_name(new);

    let names: BTreeSet<&str> = old_map.keys().chain(new_map.keys()).copied().collect();

    let mut delta = PinDelta::default();
    for name in names {
        match (old_map.get(name), new_map.get(name)) {
            (None, Some(new_pin)) => delta.added.push((*new_pin).clone()),
            (Some(old_pin), None) => delta.removed.push((*old_pin).clone()),
            (Some(old_pin), Some(new_pin)) if old_pin.version != new_pin.version => {
                delta.changed.push(PinChange {
                    name: name.to_string(),
                    repo_url: new_pin.repo_url.clone(),
                    old_version: old_pin.version.clone(),
                    new_version: new_pin.version.clone(),
                });
            }
            (Some(_), Some(_)) => delta.unchanged.push(name.to_string()),
            (None, None) => {}
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_old() -> PinList {
        vec![
            Pin::new("nova", "https://github.com/openstack/nova", "aaa"),
            Pin::new("glance", "https://github.com/openstack/glance", "bbb"),
            Pin::new("swift", "https://github.com/openstack/swift", "ccc"),
        ]
    }

    fn sample_new() -> PinList {
        vec![
            Pin::new("nova", "https://github.com/openstack/nova", "aaa2"),
            Pin::new("glance", "https://github.com/openstack/glance", "bbb"),
            Pin::new("tempest", "https://github.com/openstack/tempest", "ddd"),
        ]
    }

    #[test]
    fn test_diff_classifies_each_name_once() {
        let delta = diff(&sample_old(), &sample_new());

        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.added[0].name, "tempest");
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.removed[0].name, "swift");
        assert_eq!(delta.changed.len(), 1);
        assert_eq!(delta.changed[0].name, "nova");
        assert_eq!(delta.changed[0].old_version, "aaa");
        assert_eq!(delta.changed[0].new_version, "aaa2");
        assert_eq!(delta.unchanged, vec!["glance".to_string()]);
        assert!(delta.has_changes());
    }

    #[test]
    fn test_diff_ignores_input_order() {
        let mut old = sample_old();
        let mut new = sample_new();
        let forward = diff(&old, &new);

        old.reverse();
        new.rotate_left(1);
        let shuffled = diff(&old, &new);

        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_diff_empty_old_marks_everything_added() {
        let new = vec![Pin::new("test", "https://github.com/example/test", "master")];
        let delta = diff(&[], &new);

        assert_eq!(delta.added, new);
        assert!(delta.removed.is_empty());
        assert!(delta.changed.is_empty());
        assert!(delta.unchanged.is_empty());
    }

    #[test]
    fn test_diff_identical_lists() {
        let delta = diff(&sample_old(), &sample_old());

        assert!(!delta.has_changes());
        assert_eq!(delta.unchanged.len(), 3);
    }

    #[test]
    fn test_diff_url_change_alone_is_unchanged() {
        let old = vec![Pin::new("nova", "https://git.openstack.org/openstack/nova", "aaa")];
        let new = vec![Pin::new("nova", "https://github.com/openstack/nova", "aaa")];

        let delta = diff(&old, &new);
        assert_eq!(delta.unchanged, vec!["nova".to_string()]);
    }

    #[test]
    fn test_diff_duplicate_names_last_wins() {
        let new = vec![
            Pin::new("nova", "https://github.com/openstack/nova", "first"),
            Pin::new("nova", "https://github.com/openstack/nova", "second"),
        ];
        let old = vec![Pin::new("nova", "https://github.com/openstack/nova", "zero")];

        let delta = diff(&old, &new);
        assert_eq!(delta.changed[0].new_version, "second");
    }
}
