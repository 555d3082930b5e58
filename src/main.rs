use clap::Parser;
use std::process;

mod args;
mod check;
mod errors;
mod fixtures;
mod resources;
mod response;
mod runner;
mod utils;

fn main() {
    let args = args::Args::parse();
    env_logger::init();
    log::info!(
        "Starting permcheck {} for resource {} against {}",
        env!("CARGO_PKG_VERSION"),
        args.resource,
        args.base_url
    );

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &args::Args) -> errors::Result<()> {
    let target = resources::Target::new(&args.base_url)?;
    let fixtures = fixtures::prepare(args.resource, args, &target)?;
    let mut group = resources::group(args.resource, &target, &fixtures);

    let session = runner::Session::new(args, &args.user_name, &args.password)?;
    session.run(&mut group)?;

    println!(
        "All {} {} checks passed as {}",
        group.len(),
        args.resource,
        session.username()
    );
    Ok(())
}
