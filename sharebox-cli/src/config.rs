use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Deserialize;
use sharebox_api::client::ApiClient;

use crate::error::{self, Context};
use crate::path::{metadata, normalize_from};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// yaml or json file to load settings from
    ///
    /// values given on the command line take precedence over the file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// host name of the service
    ///
    /// will be used in a url so the value must be valid for the hostname part
    /// of a url. examples: example.com | 10.0.0.2 | [fd34::2]
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// port of the service. defaults to 8080
    #[arg(short, long)]
    pub port: Option<u16>,

    /// to use https
    #[arg(short, long)]
    pub secure: bool,

    /// path prefix the service is mounted under
    #[arg(long)]
    pub base_path: Option<String>,

    /// largest file in bytes that will be accepted for upload
    #[arg(long)]
    pub max_upload_size: Option<u64>,

    /// request timeout in seconds, no timeout if not given
    #[arg(long)]
    pub timeout: Option<u64>,

    /// answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: Option<bool>,
    pub base_path: Option<String>,
    pub max_upload_size: Option<u64>,
    pub timeout: Option<u64>,
    pub assume_yes: Option<bool>,
}

impl ConfigFile {
    pub fn load<P>(path: P) -> error::Result<Self>
    where
        P: AsRef<Path>
    {
        let cwd = std::env::current_dir()
            .context("failed to retrieve current working directory")?;
        let config_path = normalize_from(&cwd, path);

        metadata(&config_path)
            .context("failed to retrieve metadata for config file")?
            .context(format!("config file not found: \"{}\"", config_path.display()))?;

        let ext = config_path.extension()
            .context("failed to retrieve the file extension of the config file")?
            .to_ascii_lowercase();

        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(&config_path)
            .context("failed to open the specified config file")?;
        let reader = std::io::BufReader::new(file);

        if ext == "yaml" || ext == "yml" {
            serde_yaml::from_reader(reader)
                .context("failed to parse the yaml config file")
        } else if ext == "json" {
            serde_json::from_reader(reader)
                .context("failed to parse the json config file")
        } else {
            Err("the specified config type is not yaml or json".into())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub base_path: String,
    pub max_upload_size: u64,
    pub timeout: Option<Duration>,
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            secure: false,
            base_path: String::from("/"),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            timeout: None,
            assume_yes: false,
        }
    }
}

impl Config {
    /// command line over file over defaults
    pub fn merge(args: ConfigArgs, file: ConfigFile) -> Self {
        let default = Config::default();

        Config {
            host: args.host.or(file.host).unwrap_or(default.host),
            port: args.port.or(file.port).unwrap_or(default.port),
            secure: args.secure || file.secure.unwrap_or(default.secure),
            base_path: args.base_path.or(file.base_path).unwrap_or(default.base_path),
            max_upload_size: args.max_upload_size
                .or(file.max_upload_size)
                .unwrap_or(default.max_upload_size),
            timeout: args.timeout.or(file.timeout)
                .map(Duration::from_secs)
                .or(default.timeout),
            assume_yes: args.yes || file.assume_yes.unwrap_or(default.assume_yes),
        }
    }

    pub fn from_args(mut args: ConfigArgs) -> error::Result<Self> {
        let file = if let Some(path) = args.config.take() {
            ConfigFile::load(path)?
        } else {
            ConfigFile::default()
        };

        let config = Config::merge(args, file);

        tracing::debug!("{:?}", config);

        Ok(config)
    }

    pub fn api_client(&self) -> error::Result<ApiClient> {
        let mut builder = ApiClient::builder();
        builder.secure(self.secure);
        builder.host(self.host.clone());
        builder.port(Some(self.port));
        builder.base_path(self.base_path.clone());

        if let Some(timeout) = self.timeout {
            builder.timeout(timeout);
        }

        builder.build().context("failed to create api client")
    }
}
