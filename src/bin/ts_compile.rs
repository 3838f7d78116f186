use anyhow::{Context, Result};
use clap::{Arg, Command};
use std::path::PathBuf;

use viewport_ruler::{init_logging, CompileCommand, CompileError, Compiler, SettingsStore};

fn cli() -> Command {
    Command::new("ts-compile")
        .about("Runs tsc or ngc through node and mirrors the compiler output")
        .arg(
            Arg::new("settings")
                .long("settings")
                .value_name("FILE")
                .help("Settings file (defaults to $VIEWPORT_RULER_SETTINGS or ./viewport-ruler.json)"),
        )
        .arg(
            Arg::new("node")
                .long("node")
                .value_name("PATH")
                .help("Node executable used to launch the compiler"),
        )
        .arg(
            Arg::new("package-root")
                .long("package-root")
                .value_name("DIR")
                .help("Directory containing node_modules/typescript"),
        )
        .arg(
            Arg::new("compiler")
                .required(true)
                .value_parser(["tsc", "ngc"])
                .help("Compiler binary to run"),
        )
        .arg(
            Arg::new("flags")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .help("Flags passed through to the compiler"),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = cli().get_matches();

    let store = match matches.get_one::<String>("settings") {
        Some(path) => SettingsStore::new(PathBuf::from(path))?,
        None => SettingsStore::from_env()?,
    };

    let mut settings = store.compiler();
    if let Some(node) = matches.get_one::<String>("node") {
        settings.node_binary = node.clone();
    }
    if let Some(root) = matches.get_one::<String>("package-root") {
        settings.package_root = PathBuf::from(root);
    }

    let compiler: Compiler = matches
        .get_one::<String>("compiler")
        .context("compiler argument missing")?
        .parse()?;
    let flags: Vec<String> = matches
        .get_many::<String>("flags")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    match CompileCommand::from_settings(compiler, flags, &settings)
        .run()
        .await
    {
        Ok(()) => Ok(()),
        Err(CompileError::Failed { compiler, code }) => {
            log::error!("{compiler} compilation failure");
            std::process::exit(code.unwrap_or(1));
        }
        Err(err) => Err(err.into()),
    }
}
