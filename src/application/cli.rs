use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use super::chat;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::services::ArtifactScanner;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn read_scan_input(file: Option<&String>) -> Result<String> {
    if let Some(file) = file {
        return Ok(fs::read_to_string(file).await?);
    }

    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    return Ok(text);
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_ask() -> Command {
    return Command::new("ask")
        .about("Sends a single prompt and streams the answer to stdout.")
        .arg(
            Arg::new("prompt")
                .short('p')
                .long("prompt")
                .help("Prompt to send to the model.")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new("image")
                .short('i')
                .long("image")
                .help("Path to an image to attach to the prompt. Can be repeated.")
                .action(ArgAction::Append),
        );
}

fn subcommand_scan() -> Command {
    return Command::new("scan")
        .about("Lists diagrams and remote commands found in a text. Reads stdin when no file is given.")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .help("Path to a file holding a model answer.")
                .num_args(1),
        );
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("MUESLI_BACKEND")
        .num_args(1)
        .help(format!(
            "The initial backend hosting a model to connect to. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS))
        .global(true);
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("MUESLI_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        )
        .global(true);
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("MUESLI_MODEL")
        .num_args(1)
        .help("The initial model on a backend to consume. Defaults to the first model available from the backend if not set.")
        .global(true);
}

pub fn build() -> Command {
    let commands_text = chat::help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("muesli")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a new interactive chat."))
        .subcommand(subcommand_ask())
        .subcommand(Command::new("models").about("Lists the models available from the backend."))
        .subcommand(subcommand_scan())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_model())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("MUESLI_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::OllamaURL.to_string())
                .long(ConfigKey::OllamaURL.to_string())
                .env("MUESLI_OLLAMA_URL")
                .num_args(1)
                .help(format!("Ollama API URL when using the Ollama backend. [default: {}]", Config::default(ConfigKey::OllamaURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .env("MUESLI_REQUEST_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for a completion request to be answered. [default: {}]", Config::default(ConfigKey::RequestTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StreamIdleTimeout.to_string())
                .long(ConfigKey::StreamIdleTimeout.to_string())
                .env("MUESLI_STREAM_IDLE_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for the next line of a streamed answer. [default: {}]", Config::default(ConfigKey::StreamIdleTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Retries.to_string())
                .long(ConfigKey::Retries.to_string())
                .env("MUESLI_RETRIES")
                .num_args(1)
                .help(format!("Number of times a request is retried when the backend can't be reached. [default: {}]", Config::default(ConfigKey::Retries)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RemoteHost.to_string())
                .long(ConfigKey::RemoteHost.to_string())
                .env("MUESLI_REMOTE_HOST")
                .num_args(1)
                .help("Host commands found in model answers are run on, over ssh.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::RenderDir.to_string())
                .long(ConfigKey::RenderDir.to_string())
                .env("MUESLI_RENDER_DIR")
                .num_args(1)
                .help(format!("Directory rendered diagrams are written to. [default: {}]", Config::default(ConfigKey::RenderDir)))
                .global(true),
        );
}

pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            chat::start().await?;
        }
        Some(("ask", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let prompt = subcmd_matches
                .get_one::<String>("prompt")
                .map(|e| return e.to_string())
                .unwrap_or_default();
            let images: Vec<String> = subcmd_matches
                .get_many::<String>("image")
                .map(|paths| return paths.map(|e| return e.to_string()).collect())
                .unwrap_or_default();
            chat::ask(&prompt, &images).await?;
        }
        Some(("models", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            chat::print_models().await?;
        }
        Some(("scan", subcmd_matches)) => {
            let text = read_scan_input(subcmd_matches.get_one::<String>("file")).await?;
            let artifacts = ArtifactScanner::scan(&text);
            if artifacts.is_empty() {
                println!("No artifacts found.");
            } else {
                println!("{}", chat::format_artifacts(&artifacts));
            }
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
            }
            _ => {
                subcommand_config().print_long_help()?;
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
            chat::start().await?;
        }
    }

    return Ok(());
}
