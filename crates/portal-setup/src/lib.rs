pub mod cli;
pub mod prompt;
pub mod setup;

pub use cli::Cli;
pub use setup::{run_setup, DatabaseSetup, SetupOptions, SetupOutcome, SetupSteps, SuperuserOutcome};
