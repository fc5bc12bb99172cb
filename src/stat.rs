use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    /// Nodes generated and added to the frontier (or recursed into).
    pub expanded_nodes: usize,
    /// Nodes goal-tested.
    pub tested_nodes: usize,
    pub elapsed_secs: f64,
}

impl Stats {
    pub(crate) fn print(&self) {
        info!(
            "Time(seconds) {:.6} Expanded nodes number: {:?} Tested nodes number: {:?}",
            self.elapsed_secs, self.expanded_nodes, self.tested_nodes
        );
    }
}
