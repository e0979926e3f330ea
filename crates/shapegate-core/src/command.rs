//! FortiOS CLI scripts for toggling shaping policies.

use shapegate_types::action::ShapingState;

/// The set of shaping policies the service toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapingPolicies {
    ids: Vec<u32>,
}

impl ShapingPolicies {
    pub fn new(ids: Vec<u32>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Render the `config firewall shaping-policy` block that sets every
    /// policy to `state`.
    pub fn script(&self, state: ShapingState) -> String {
        let mut script = String::from("config firewall shaping-policy\n");
        for id in &self.ids {
            script.push_str(&format!("edit {id}\nset status {state}\nnext\n"));
        }
        script.push_str("end");
        script
    }
}
