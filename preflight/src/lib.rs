pub mod cli;

pub use cli::{
    execute, resolve_config, Args, CliError, RunOutcome, EXIT_CHECK_FAILED, EXIT_CONFIG_ERROR,
};
