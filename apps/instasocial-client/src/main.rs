use clap::Parser;

mod actions;
mod app;
mod cli;
mod deployment;
mod prompt;
mod ui;

use app::{block_on_detached, App};
use cli::Args;
use instasocial::utils::logging::init_logger;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);
    let app = App::new(&args)?;
    block_on_detached(app.run())?
}
