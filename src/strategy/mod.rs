//periodic momentum ranking into a holding mask

pub mod rebalance;
pub mod signals;

pub use rebalance::{find_rebalance_indices, RebalanceRule};
pub use signals::{generate_signals, rebalance_days, select_top_k};
