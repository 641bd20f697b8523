//! Damageable ship system nodes.
//!
//! Status is a pure function of the damage ratio; collapse is reached at max
//! damage and clears once repairs bring damage back below the ceiling. Suit
//! legality for repairs is the caller's concern, not this module's.

use serde::{Deserialize, Serialize};

use crate::constants::{LOG_NODE_COLLAPSED, LOG_NODE_RESTORED};

/// Status bands derived from `damage / max_damage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Stable,
    Unstable,
    Corrupted,
}

impl NodeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Unstable => "unstable",
            Self::Corrupted => "corrupted",
        }
    }
}

/// Ratio thresholds separating the status bands. Must be monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeThresholds {
    /// Damage ratio up to which a node counts as stable
    #[serde(default = "NodeThresholds::default_stable_max")]
    pub stable_max: f32,
    /// Damage ratio up to which a node counts as unstable
    #[serde(default = "NodeThresholds::default_unstable_max")]
    pub unstable_max: f32,
}

impl Default for NodeThresholds {
    fn default() -> Self {
        Self {
            stable_max: Self::default_stable_max(),
            unstable_max: Self::default_unstable_max(),
        }
    }
}

impl NodeThresholds {
    const fn default_stable_max() -> f32 {
        1.0 / 3.0
    }

    const fn default_unstable_max() -> f32 {
        2.0 / 3.0
    }

    /// Validate monotonicity of the bands.
    ///
    /// # Errors
    ///
    /// Returns a message when the thresholds are out of order or out of range.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.stable_max) || !(0.0..=1.0).contains(&self.unstable_max) {
            return Err(String::from("node thresholds must lie in 0..=1"));
        }
        if self.stable_max >= self.unstable_max {
            return Err(String::from("node thresholds must be monotonic"));
        }
        Ok(())
    }

    #[must_use]
    pub fn status_for(&self, damage: i32, max_damage: i32) -> NodeStatus {
        if max_damage <= 0 {
            return NodeStatus::Stable;
        }
        let ratio = damage as f32 / max_damage as f32;
        if ratio <= self.stable_max {
            NodeStatus::Stable
        } else if ratio <= self.unstable_max {
            NodeStatus::Unstable
        } else {
            NodeStatus::Corrupted
        }
    }
}

/// Static description of a node, supplied by the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub name: String,
    #[serde(default = "NodeSpec::default_max_damage")]
    pub max_damage: i32,
}

impl NodeSpec {
    const fn default_max_damage() -> i32 {
        10
    }
}

/// A single damageable ship system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipNode {
    pub id: String,
    pub name: String,
    pub damage: i32,
    pub max_damage: i32,
    pub status: NodeStatus,
    pub collapsed: bool,
}

impl ShipNode {
    #[must_use]
    pub fn from_spec(spec: &NodeSpec) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            damage: 0,
            max_damage: spec.max_damage.max(1),
            status: NodeStatus::Stable,
            collapsed: false,
        }
    }

    #[must_use]
    pub fn damage_ratio(&self) -> f32 {
        self.damage as f32 / self.max_damage as f32
    }
}

/// Default node roster used when a scenario omits its own.
#[must_use]
pub fn default_node_specs() -> Vec<NodeSpec> {
    [
        ("life_support", "Life Support"),
        ("navigation", "Navigation"),
        ("reactor", "Reactor"),
        ("comms", "Communications"),
    ]
    .into_iter()
    .map(|(id, name)| NodeSpec {
        id: String::from(id),
        name: String::from(name),
        max_damage: NodeSpec::default_max_damage(),
    })
    .collect()
}

/// Owner of the node roster; the only writer of node damage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSystem {
    nodes: Vec<ShipNode>,
    thresholds: NodeThresholds,
}

/// Result of a damage or repair application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeChange {
    pub applied: i32,
    pub status: NodeStatus,
    pub collapsed: bool,
    /// Log key describing a collapse/restore transition, when one occurred
    pub transition_log: Option<&'static str>,
}

impl NodeSystem {
    /// Create the fixed node roster from scenario specs. Thresholds are
    /// assumed validated at catalog load.
    #[must_use]
    pub fn initialize(specs: &[NodeSpec], thresholds: NodeThresholds) -> Self {
        let specs = if specs.is_empty() {
            default_node_specs()
        } else {
            specs.to_vec()
        };
        Self {
            nodes: specs.iter().map(ShipNode::from_spec).collect(),
            thresholds,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[ShipNode] {
        &self.nodes
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ShipNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Count of nodes that have not collapsed.
    #[must_use]
    pub fn intact_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.collapsed).count()
    }

    /// Node with the highest damage that is still repairable, if any damage
    /// exists at all.
    #[must_use]
    pub fn most_damaged(&self) -> Option<&ShipNode> {
        self.nodes
            .iter()
            .filter(|node| node.damage > 0)
            .max_by_key(|node| node.damage)
    }

    /// Increase damage, clamped to the ceiling. Recomputes status and sets
    /// collapse when the ceiling is reached.
    pub fn damage_node(&mut self, id: &str, amount: i32) -> Option<NodeChange> {
        let thresholds = self.thresholds;
        let node = self.nodes.iter_mut().find(|node| node.id == id)?;
        let before = node.damage;
        node.damage = (node.damage + amount.max(0)).min(node.max_damage);
        node.status = thresholds.status_for(node.damage, node.max_damage);
        let was_collapsed = node.collapsed;
        node.collapsed = node.damage >= node.max_damage;
        let transition_log = (!was_collapsed && node.collapsed).then_some(LOG_NODE_COLLAPSED);
        Some(NodeChange {
            applied: node.damage - before,
            status: node.status,
            collapsed: node.collapsed,
            transition_log,
        })
    }

    /// Decrease damage, clamped at zero. Clears collapse once damage falls
    /// below the ceiling.
    pub fn repair_node(&mut self, id: &str, amount: i32) -> Option<NodeChange> {
        let thresholds = self.thresholds;
        let node = self.nodes.iter_mut().find(|node| node.id == id)?;
        let before = node.damage;
        node.damage = (node.damage - amount.max(0)).max(0);
        node.status = thresholds.status_for(node.damage, node.max_damage);
        let was_collapsed = node.collapsed;
        node.collapsed = node.damage >= node.max_damage;
        let transition_log = (was_collapsed && !node.collapsed).then_some(LOG_NODE_RESTORED);
        Some(NodeChange {
            applied: before - node.damage,
            status: node.status,
            collapsed: node.collapsed,
            transition_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> NodeSystem {
        NodeSystem::initialize(&default_node_specs(), NodeThresholds::default())
    }

    #[test]
    fn damage_and_repair_stay_clamped() {
        let mut system = system();
        system.damage_node("reactor", 999);
        let node = system.get("reactor").unwrap();
        assert_eq!(node.damage, node.max_damage);
        assert!(node.collapsed);
        assert_eq!(node.status, NodeStatus::Corrupted);

        system.repair_node("reactor", 999);
        let node = system.get("reactor").unwrap();
        assert_eq!(node.damage, 0);
        assert!(!node.collapsed);
        assert_eq!(node.status, NodeStatus::Stable);
    }

    #[test]
    fn collapse_tracks_max_damage_exactly() {
        let mut system = system();
        system.damage_node("comms", 9);
        assert!(!system.get("comms").unwrap().collapsed);
        let change = system.damage_node("comms", 1).unwrap();
        assert!(change.collapsed);
        assert_eq!(change.transition_log, Some(LOG_NODE_COLLAPSED));

        let change = system.repair_node("comms", 1).unwrap();
        assert!(!change.collapsed);
        assert_eq!(change.transition_log, Some(LOG_NODE_RESTORED));
    }

    #[test]
    fn status_bands_follow_thresholds() {
        let mut system = system();
        system.damage_node("navigation", 3);
        assert_eq!(system.get("navigation").unwrap().status, NodeStatus::Stable);
        system.damage_node("navigation", 2);
        assert_eq!(
            system.get("navigation").unwrap().status,
            NodeStatus::Unstable
        );
        system.damage_node("navigation", 3);
        assert_eq!(
            system.get("navigation").unwrap().status,
            NodeStatus::Corrupted
        );
    }

    #[test]
    fn thresholds_validate_monotonicity() {
        let bad = NodeThresholds {
            stable_max: 0.7,
            unstable_max: 0.5,
        };
        assert!(bad.validate().is_err());
        assert!(NodeThresholds::default().validate().is_ok());
    }

    #[test]
    fn most_damaged_ignores_pristine_nodes() {
        let mut system = system();
        assert!(system.most_damaged().is_none());
        system.damage_node("comms", 2);
        system.damage_node("reactor", 6);
        assert_eq!(system.most_damaged().unwrap().id, "reactor");
    }
}
