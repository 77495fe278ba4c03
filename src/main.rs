//! devassist - development assistant service
//!
//! Entry point: resolves configuration from the command line, config files
//! and the environment, then starts the HTTP server.

use devassist_core::config::{load_config, load_from_file, sample_config};
use devassist_core::DevAssistConfig;
use std::path::PathBuf;

const USAGE: &str = "Usage: devassist [OPTIONS]

Options:
  -r, --repo <PATH>     Repository the assistant works on (default: REPO_PATH or cwd)
  -p, --port <PORT>     Port to listen on (default: PORT or 8080)
  -c, --config <FILE>   Read configuration from FILE instead of the default locations
      --sample-config   Print an example configuration file and exit
  -h, --help            Print this help and exit";

/// Command-line arguments
#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Repository path override
    repo: Option<PathBuf>,
    /// Port override
    port: Option<u16>,
    /// Explicit config file
    config: Option<PathBuf>,
    /// Print the sample config and exit
    sample_config: bool,
    /// Print usage and exit
    help: bool,
}

impl Args {
    /// Parse command-line arguments
    fn parse() -> anyhow::Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut args = args.into_iter();
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--repo" | "-r" => {
                    parsed.repo = Some(PathBuf::from(required_value(&arg, args.next())?));
                }
                "--port" | "-p" => {
                    let value = required_value(&arg, args.next())?;
                    parsed.port = Some(
                        value
                            .parse()
                            .map_err(|_| anyhow::anyhow!("Invalid port: {}", value))?,
                    );
                }
                "--config" | "-c" => {
                    parsed.config = Some(PathBuf::from(required_value(&arg, args.next())?));
                }
                "--sample-config" => parsed.sample_config = true,
                "--help" | "-h" => parsed.help = true,
                other => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
            }
        }

        Ok(parsed)
    }

    /// Command-line flags win over files and environment
    fn apply(&self, config: &mut DevAssistConfig) {
        if let Some(ref repo) = self.repo {
            config.repo_path = Some(repo.clone());
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

fn required_value(flag: &str, value: Option<String>) -> anyhow::Result<String> {
    value.ok_or_else(|| anyhow::anyhow!("Missing value for {}", flag))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse()?;

    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    if args.sample_config {
        print!("{}", sample_config());
        return Ok(());
    }

    let mut config = match args.config {
        Some(ref path) => load_from_file(path)?,
        None => load_config(&std::env::current_dir()?)?,
    };
    args.apply(&mut config);

    devassist_server::run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        Args::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_flags() {
        let args = parse(&["--repo", "/srv/site", "-p", "9000", "--config", "dev.toml"]).unwrap();
        assert_eq!(
            args,
            Args {
                repo: Some(PathBuf::from("/srv/site")),
                port: Some(9000),
                config: Some(PathBuf::from("dev.toml")),
                sample_config: false,
                help: false,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&["--port", "eighty"]).is_err());
        assert!(parse(&["--repo"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = DevAssistConfig::default();
        parse(&["--port", "3001", "--repo", "/tmp/checkout"])
            .unwrap()
            .apply(&mut config);

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.repo_path, Some(PathBuf::from("/tmp/checkout")));
    }
}
