use clap::{Parser, Subcommand};
use sharebox_api::client::ApiClient;
use sharebox_api::client::files::Ping;

use crate::config::{Config, ConfigArgs};
use crate::error::{self, Context};
use crate::formatting::OutputOptions;
use crate::input;
use crate::state::AppState;

mod files;

/// a cli for a remote file share.
///
/// lists, uploads, downloads and deletes files on the service. if no command
/// is provided then it will enter interactive mode.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Option<BaseCmds>
}

pub type State = AppState<ApiClient>;

pub fn start() -> error::Result {
    let args = Cli::parse();
    let config = Config::from_args(args.config)?;
    let client = config.api_client()?;

    let mut state = AppState::new(client, config.max_upload_size);

    match args.command {
        Some(BaseCmds::Ping) => ping(&state),
        Some(cmd) => {
            load(&mut state);

            handle(&mut state, &config, cmd)
        },
        None => {
            load(&mut state);

            Interactive::handle(&mut state, &config)
        }
    }
}

/// the initial fetch. a failure is reported but does not stop the cli
fn load(state: &mut State) {
    if let Err(err) = state.load() {
        println!("failed to load files: {}", err);
    }
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
enum Interactive {
    #[command(flatten)]
    Base(BaseCmds),

    /// leaves interactive mode
    #[command(alias = "exit")]
    Quit
}

impl Interactive {
    fn handle(state: &mut State, config: &Config) -> error::Result {
        loop {
            let Some(given) = input::read_stdin("> ")? else {
                break;
            };
            let trimmed = given.trim();

            if trimmed.is_empty() {
                continue;
            }

            let Ok(args_list) = shell_words::split(trimmed) else {
                println!("failed to parse command line args");
                continue;
            };

            let cmd = match Interactive::try_parse_from(args_list) {
                Ok(c) => c,
                Err(err) => {
                    println!("{}", err);
                    continue;
                }
            };

            let result = match cmd {
                Interactive::Base(cmd) => handle(state, config, cmd),
                Interactive::Quit => break,
            };

            if let Err(err) = result {
                println!("{}", err);
            }
        }

        Ok(())
    }
}

#[derive(Debug, Subcommand)]
enum BaseCmds {
    /// lists the files currently known
    #[command(alias = "ls")]
    List(OutputOptions),

    /// shows the details of a single file
    Show(files::ShowArgs),

    /// chooses a local file to upload
    Select(files::SelectArgs),

    /// drops the currently selected file
    Clear,

    /// uploads the selected file or the one given
    Upload(files::UploadArgs),

    /// shows the state of the current upload
    Status,

    /// deletes a file from the service
    #[command(alias = "rm")]
    Delete(files::DeleteArgs),

    /// retrieves the contents of a file
    Download(files::DownloadArgs),

    /// checks that the service is reachable
    Ping,
}

fn handle(state: &mut State, config: &Config, command: BaseCmds) -> error::Result {
    match command {
        BaseCmds::List(given) => files::list(state, given),
        BaseCmds::Show(given) => files::show(state, given),
        BaseCmds::Select(given) => files::select(state, given),
        BaseCmds::Clear => files::clear(state),
        BaseCmds::Upload(given) => files::upload(state, given),
        BaseCmds::Status => files::status(state),
        BaseCmds::Delete(given) => files::delete(state, config, given),
        BaseCmds::Download(given) => files::download(state, given),
        BaseCmds::Ping => ping(state),
    }
}

fn ping(state: &State) -> error::Result {
    let health = Ping::new()
        .send(&state.service)
        .context("failed to ping service")?;

    if let Some(msg) = health.message {
        println!("{}: {}", health.status, msg);
    } else {
        println!("{}", health.status);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_interactive_commands() {
        let cmd = Interactive::try_parse_from(["delete", "2", "--yes"]).unwrap();

        assert!(matches!(cmd, Interactive::Base(BaseCmds::Delete(_))));

        let cmd = Interactive::try_parse_from(["quit"]).unwrap();

        assert!(matches!(cmd, Interactive::Quit));

        assert!(Interactive::try_parse_from(["upload", "a.txt", "b.txt"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "sharebox", "--host", "10.0.0.2", "--port", "3000", "--yes", "ls", "--size-format", "raw"
        ]).unwrap();

        assert_eq!(cli.config.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(cli.config.port, Some(3000));
        assert!(cli.config.yes);
        assert!(matches!(cli.command, Some(BaseCmds::List(_))));
    }
}
