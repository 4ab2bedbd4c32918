pub mod cli;
pub mod deploy;
