//! Infrastructure configuration modules.

pub mod logging;
pub mod proposal;
pub mod removal;
pub mod settings;
pub mod wallet;
