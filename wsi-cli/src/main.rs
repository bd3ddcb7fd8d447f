use anyhow::{Error, Result};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use log::error;
use wsi::{Wsi, WsiBuilder};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cmd = cmd();
    let matches = cmd.get_matches();
    if let Err(e) = init_logger_from_matches(&matches) {
        eprintln!("Error creating logger: {e}");
        std::process::exit(126);
    }

    let status = match make_wsi(&matches) {
        Ok(mut wsi) => match wsi.install_sdk().await {
            Ok(()) => 0,
            Err(e) => {
                print_err(&e);
                1
            }
        },
        Err(e) => {
            print_err(&e);
            127
        }
    };
    std::process::exit(status);
}

const MAX_TERM_WIDTH: usize = 100;

fn cmd() -> Command {
    Command::new("wsi")
        .version(env!("CARGO_PKG_VERSION"))
        .about("The WASI SDK installer")
        .arg(Arg::new("tag").help(concat!(
            "The release tag to install, like wasi-sdk-20.0. If this is not given, the available",
            " tags are listed and you are prompted for one, with the newest stable release as the",
            " default. The tag is passed through as-is; an unknown tag fails once no release",
            " matches it.",
        )))
        .arg(Arg::new("install-dir").help(concat!(
            "The directory to unpack the SDK into. It must be empty or missing. If this is not",
            " given you are prompted, with ~/opt/wasi-sdk/<version> as the default.",
        )))
        // Anything past the first two positionals is accepted and ignored.
        .arg(
            Arg::new("extra")
                .num_args(0..)
                .hide(true)
                .value_name("IGNORED"),
        )
        .arg(Arg::new("api-base-url").long("api-base-url").help(concat!(
            "The base URL for the release API. This is useful for testing. This should be",
            " something like `https://api.github.com/repos/WebAssembly/wasi-sdk`.",
        )))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output."),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debugging output."),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppresses most output."),
        )
        .group(ArgGroup::new("log-level").args(["verbose", "debug", "quiet"]))
        .max_term_width(MAX_TERM_WIDTH)
}

fn init_logger_from_matches(matches: &ArgMatches) -> Result<(), log::SetLoggerError> {
    let level = if matches.get_flag("debug") {
        log::LevelFilter::Debug
    } else if matches.get_flag("verbose") {
        log::LevelFilter::Info
    } else if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Warn
    };

    wsi::init_logger(level)
}

fn make_wsi(matches: &ArgMatches) -> Result<Wsi> {
    let mut builder = WsiBuilder::new();
    if let Some(t) = matches.get_one::<String>("tag") {
        builder = builder.tag(t);
    }
    if let Some(d) = matches.get_one::<String>("install-dir") {
        builder = builder.install_dir(d);
    }
    if let Some(u) = matches.get_one::<String>("api-base-url") {
        builder = builder.api_base_url(u);
    }
    builder.build()
}

fn print_err(e: &Error) {
    error!("{e}");
}
