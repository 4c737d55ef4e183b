mod error;
mod path;
mod input;
mod config;
mod formatting;
mod service;
mod catalog;
mod transfer;
mod deletion;
mod state;
mod cli;

fn main() {
    use tracing_subscriber::{FmtSubscriber, EnvFilter};

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .expect("failed to initialize global tracing subscriber");

    if let Err(err) = cli::start() {
        println!("{}", err);

        std::process::exit(1);
    }
}
