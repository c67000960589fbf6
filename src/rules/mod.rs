//! Rule model
//!
//! Rules, their sample listings, rule files and the pattern expansion that
//! renders them.

pub mod expand;
pub mod file;
pub mod listing;
pub mod rule;

pub use expand::{expand_rule, render_rule, skipjack, ExpansionReport, Render, SampleBundle};
pub use file::{load_rules, parse_rules, save_rules};
pub use listing::{format_samples, parse_samples, Direction, SampleListing};
pub use rule::{Color, Rule};
