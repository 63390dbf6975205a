//! Techno-economic analysis of energy assets: levelised cost of energy (LCOE), depreciation,
//! cash flows, internal rate of return and payback.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod depreciation;
pub mod finance;
pub mod input;
pub mod log;
pub mod metrics;
pub mod output;
pub mod parameters;
pub mod settings;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config dir for the program.
///
/// If the user's config dir cannot be determined, the current directory is used instead.
pub fn get_enliten_config_dir() -> PathBuf {
    let mut dir = dirs::config_dir().unwrap_or_default();
    dir.push("enliten");

    dir
}
