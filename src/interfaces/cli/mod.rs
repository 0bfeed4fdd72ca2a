//! Command-line interface of the `sharpo` binary.

use std::path::{Path, PathBuf};

use anyhow::{self, format_err, Context};
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::interfaces::input::Input;
use crate::interfaces::InputHandle;
use crate::io::format::{log_macsec_begin, log_macsec_end, sharpo_error, sharpo_output};
use crate::io::{read_sharpo_yaml, write_sharpo_yaml};

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted Sharpo heading to the `sharpo-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    sharpo_output!("╭─────────────────────────────────────────────────────────────────────────────────────────────────────╮");
    sharpo_output!("│                                                                                                     │");
    sharpo_output!("│      ####   #    #    ##    #####   #####    ####                                                   │");
    sharpo_output!("│     #       #    #   #  #   #    #  #    #  #    #                                                  │");
    sharpo_output!("│      ####   ######  #    #  #    #  #    #  #    #                                                  │");
    sharpo_output!("│          #  #    #  ######  #####   #####   #    #                                                  │");
    sharpo_output!("│     #    #  #    #  #    #  #   #   #       #    #                                                  │");
    sharpo_output!("│      ####   #    #  #    #  #    #  #        ####                                                   │");
    sharpo_output!("│                                                                                                     │");
    sharpo_output!("│     Spherical HARmonics - Projected Orbitals                                                        │");
    sharpo_output!("│                                                                                       {version:>13} │");
    sharpo_output!("╰─────────────────────────────────────────────────────────────────────────────────────────────────────╯");
    sharpo_output!("");
}

/// Initialises the loggers.
///
/// The `sharpo-output` logger writes to the console and to `<output>.sharpo.out`. Every other
/// target is routed to `<output>.sharpo.log` at debug level.
///
/// # Arguments
///
/// * `output` - The stem of the output files.
pub fn setup_logger<P: AsRef<Path>>(output: P) -> Result<(), anyhow::Error> {
    let stem = output.as_ref().display().to_string();
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    let outfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .append(false)
        .build(format!("{stem}.sharpo.out"))
        .with_context(|| format!("Unable to create {stem}.sharpo.out"))?;
    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}",
        )))
        .append(false)
        .build(format!("{stem}.sharpo.log"))
        .with_context(|| format!("Unable to create {stem}.sharpo.log"))?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("outfile", Box::new(outfile)))
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .logger(
            Logger::builder()
                .appender("console")
                .appender("outfile")
                .additive(false)
                .build("sharpo-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("logfile").build(LevelFilter::Debug))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Command-line arguments of the `sharpo` binary.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML input file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stem of the output and log files. Defaults to the stem of the input file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Writes a template YAML input file named after `--output` (or `sharpo_template`) and exits.
    #[arg(short, long)]
    pub template: bool,

    /// Only prints the molecular-orbital energy table without projecting anything.
    #[arg(short, long)]
    pub mo_energies_only: bool,
}

impl Cli {
    /// The stem of the output and log files.
    fn output_stem(&self) -> Result<PathBuf, anyhow::Error> {
        match (self.output.as_ref(), self.config.as_ref()) {
            (Some(output), _) => Ok(output.clone()),
            (None, Some(config)) => Ok(config.with_extension("")),
            (None, None) => Err(format_err!(
                "Neither an input file nor an output stem has been specified."
            )),
        }
    }

    /// Runs the binary as requested on the command line.
    pub fn run(&self) -> Result<(), anyhow::Error> {
        if self.template {
            let name = self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("sharpo_template"));
            write_sharpo_yaml(&name, &Input::default())?;
            println!("Template input written to {}.", name.with_extension("yml").display());
            return Ok(());
        }

        let config = self
            .config
            .as_ref()
            .ok_or_else(|| format_err!("No input file specified. Use `--config <FILE>`."))?;
        setup_logger(self.output_stem()?)?;
        log_heading();

        let outcome = read_sharpo_yaml::<Input, _>(config).and_then(|input| {
            if self.mo_energies_only {
                log_macsec_begin("Molecular orbital energies");
                let res = input.log_orbital_energies();
                log_macsec_end("Molecular orbital energies");
                res
            } else {
                input.handle()
            }
        });
        if let Err(err) = outcome.as_ref() {
            sharpo_error!("{err:#}");
        }
        outcome
    }
}
