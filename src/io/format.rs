//! Nice Sharpo output formatting.

use std::fmt;

use log;

const SHARPO_BANNER_LENGTH: usize = 103;

/// Logs an error to the `sharpo-output` logger.
macro_rules! sharpo_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "sharpo-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `sharpo-output` logger.
macro_rules! sharpo_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "sharpo-output", $fmt, $($($arg)*)?); }
}

/// Logs a main output line to the `sharpo-output` logger.
macro_rules! sharpo_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "sharpo-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {sharpo_error, sharpo_output, sharpo_warn};

/// Writes a nicely formatted section title.
pub(crate) fn write_title(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let length = title.chars().count().max(SHARPO_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    writeln!(f, "┌──{bar}──┐")?;
    writeln!(f, "│§ {title:^length$} §│")?;
    writeln!(f, "└──{bar}──┘")?;
    Ok(())
}

/// Logs a nicely formatted section title to the `sharpo-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(SHARPO_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    sharpo_output!("┌──{bar}──┐");
    sharpo_output!("│§ {title:^length$} §│");
    sharpo_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let bar = "═".repeat(subtitle.chars().count());
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `sharpo-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let bar = "═".repeat(subtitle.chars().count());
    sharpo_output!("{}", subtitle);
    sharpo_output!("{}", bar);
}

/// Logs a nicely formatted macro-section beginning to the `sharpo-output` logger.
pub(crate) fn log_macsec_begin(sectitle: &str) {
    let width = SHARPO_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    sharpo_output!("❬❬❬❬❬ [Begin] {sectitle_space:❬<width$}");
}

/// Logs a nicely formatted macro-section ending to the `sharpo-output` logger.
pub(crate) fn log_macsec_end(sectitle: &str) {
    let width = SHARPO_BANNER_LENGTH - 14;
    let sectitle_space = sectitle.to_string() + " ";
    sharpo_output!("❭❭❭❭❭ [ End ] {sectitle_space:❭<width$}");
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging Sharpo outputs nicely.
pub(crate) trait SharpoOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            sharpo_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> SharpoOutput for T where T: fmt::Debug + fmt::Display {}
