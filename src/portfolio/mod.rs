pub mod account;
pub mod allocation;

pub use account::Account;
pub use allocation::{compute_positions, AllocationPolicy, WeightTable, WEIGHT_TOLERANCE};
