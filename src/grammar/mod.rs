pub mod eliminate_left_recursion;
pub mod first_follow;
pub mod grammar;
pub mod left_factoring;
pub mod ll1_table;
pub mod parse;
pub mod pretty_print;
pub mod simulate;

pub use first_follow::FirstFollowSets;
pub use grammar::{Grammar, Production, Symbol};
pub use ll1_table::LL1Table;
pub use simulate::Simulation;

pub const EPSILON: &str = "ε";
pub const END_MARK: &str = "$";
