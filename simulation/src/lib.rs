//! # dpsim Simulation
//!
//! Command-line support for the data preservation simulator: parameter and
//! snapshot handling for the `dpsim` binary, plus the reference scenarios.
//!
//! ## Scenarios
//!
//! | Scenario | Network | Expected |
//! |----------|---------|----------|
//! | A | one data and one storage node, 10 m apart | direct path, cost = transmit + receive |
//! | B | 5 packets, one storage node of capacity 3 | 3 stored, value 300, 2 left |
//! | C | zero battery everywhere | no transfers |
//! | D | storage nodes at 10 m and 20 m | the nearer one fills first |
//!
//! ```rust
//! use dpsim_simulation::scenarios::Scenario;
//!
//! let report = Scenario::B.run().unwrap();
//! assert!(report.passed);
//! ```

pub mod params;
pub mod scenarios;

pub use params::{GenerationOverrides, NetworkOverrides, load_network, load_params};
pub use scenarios::{Scenario, ScenarioReport};
