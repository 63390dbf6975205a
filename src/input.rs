//! Common routines for reading the description of an asset from file.
use crate::parameters::{self, LcoeParameters};
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::{DeserializeOwned, Deserializer};
use std::fs;
use std::iter;
use std::path::Path;

/// The name of the file describing an asset, for bundled examples
pub const INPUT_FILE_NAME: &str = "inputs.toml";

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a fraction, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?;
    }

    Ok(Dimensionless(value))
}

/// Expand a schedule of augment costs to cover the base year and the analysis period.
///
/// A zero is inserted for the base year. If the result is too long it is truncated; if it is too
/// short, the schedule (including the base-year zero) is repeated to fill the remaining years,
/// aligned so that the final entry of the schedule falls in the final year.
///
/// # Arguments
///
/// * `schedule` - Augment costs for years 1, 2, ...
/// * `len` - Required length of the output, i.e. `analysis_period + 1`
pub fn expand_augment_schedule(schedule: &[Money], len: usize) -> Vec<Money> {
    let with_base_year: Vec<Money> = iter::once(Money(0.0))
        .chain(schedule.iter().copied())
        .collect();
    let current = with_base_year.len();
    if len <= current {
        return with_base_year[..len].to_vec();
    }

    let shortfall = len - current;
    let tiled_len = shortfall.div_ceil(current) * current;
    let repeated: Vec<Money> = with_base_year
        .iter()
        .copied()
        .cycle()
        .take(tiled_len)
        .skip(tiled_len - shortfall)
        .collect();

    with_base_year.into_iter().chain(repeated).collect()
}

/// Represents the contents of an asset description file.
///
/// Financial assumptions which are omitted take their default values.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct AssetFile {
    system_capex: Money,
    annual_fixed_om: Money,
    annual_variable_om: Money,
    annual_production_mwh: f64,
    /// Augment costs for every year, including the base year
    system_augment: Option<Vec<Money>>,
    /// Augment costs from year 1, to be expanded with [`expand_augment_schedule`]
    augment_schedule: Option<Vec<Money>>,
    #[serde(default = "parameters::default_investment_tax_credit")]
    #[serde(deserialize_with = "deserialise_proportion")]
    investment_tax_credit: Dimensionless,
    #[serde(default = "parameters::default_debt_fraction")]
    #[serde(deserialize_with = "deserialise_proportion")]
    debt_fraction: Dimensionless,
    #[serde(default = "parameters::default_cost_of_equity")]
    cost_of_equity: Dimensionless,
    #[serde(default = "parameters::default_interest_rate")]
    interest_rate: Dimensionless,
    #[serde(default = "parameters::default_grant_percentage")]
    #[serde(deserialize_with = "deserialise_proportion")]
    grant_percentage: Dimensionless,
    #[serde(default = "parameters::default_tax_rate")]
    #[serde(deserialize_with = "deserialise_proportion")]
    tax_rate: Dimensionless,
    #[serde(default = "parameters::default_inflation")]
    inflation: Dimensionless,
    #[serde(default = "parameters::default_property_tax_rate")]
    #[serde(deserialize_with = "deserialise_proportion")]
    property_tax_rate: Dimensionless,
    #[serde(default = "parameters::default_insurance_rate")]
    #[serde(deserialize_with = "deserialise_proportion")]
    insurance_rate: Dimensionless,
    #[serde(default = "parameters::default_depreciation_period")]
    depreciation_period: u32,
    #[serde(default = "parameters::default_escalation")]
    escalation: Dimensionless,
    #[serde(default = "parameters::default_analysis_period")]
    analysis_period: u32,
    #[serde(default = "parameters::default_variable_om_unit_cost")]
    variable_om_unit_cost: MoneyPerEnergy,
    #[serde(default = "parameters::default_electricity_sale_price")]
    electricity_sale_price: MoneyPerEnergy,
}

impl AssetFile {
    /// Convert the file contents into parameters for the LCOE engine
    fn into_parameters(self) -> Result<LcoeParameters> {
        let len = self.analysis_period as usize + 1;
        let system_augment = match (self.system_augment, self.augment_schedule) {
            (Some(_), Some(_)) => {
                bail!("Only one of system_augment and augment_schedule can be specified")
            }
            (Some(system_augment), None) => system_augment,
            (None, Some(schedule)) => expand_augment_schedule(&schedule, len),
            (None, None) => vec![Money(0.0); len],
        };

        Ok(LcoeParameters {
            system_capex: self.system_capex,
            annual_fixed_om: self.annual_fixed_om,
            annual_variable_om: self.annual_variable_om,
            annual_production: Energy::from_mwh(self.annual_production_mwh),
            system_augment,
            investment_tax_credit: self.investment_tax_credit,
            debt_fraction: self.debt_fraction,
            cost_of_equity: self.cost_of_equity,
            interest_rate: self.interest_rate,
            grant_percentage: self.grant_percentage,
            tax_rate: self.tax_rate,
            inflation: self.inflation,
            property_tax_rate: self.property_tax_rate,
            insurance_rate: self.insurance_rate,
            depreciation_period: self.depreciation_period,
            escalation: self.escalation,
            analysis_period: self.analysis_period,
            variable_om_unit_cost: self.variable_om_unit_cost,
            electricity_sale_price: self.electricity_sale_price,
        })
    }
}

/// Read the parameters for an asset from a TOML file.
///
/// The parameters are not validated; see [`LcoeParameters::validate`].
///
/// # Arguments
///
/// * `file_path` - Path to the asset description file
pub fn load_parameters(file_path: &Path) -> Result<LcoeParameters> {
    let asset_file: AssetFile = read_toml(file_path)?;
    asset_file
        .into_parameters()
        .with_context(|| input_err_msg(file_path))
}
