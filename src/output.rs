//! The module responsible for writing output data to disk.
use crate::metrics::LcoeMetrics;
use crate::units::{Dimensionless, Energy, Money};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which input-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "enliten_results";

/// The output file name for the annual series
pub const ANNUAL_CASH_FLOW_FILE_NAME: &str = "annual_cash_flow.csv";

/// The output file name for scalar metrics
pub const METRICS_FILE_NAME: &str = "metrics.csv";

/// Get the default output directory for the input file at the specified path
pub fn get_output_dir(input_path: &Path) -> Result<PathBuf> {
    let input_name = input_path
        .file_stem()
        .context("Input path has no file name")?
        .to_str()
        .context("Invalid chars in input file name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, input_name].iter().collect())
}

/// Create a new output directory, if it doesn't already exist.
///
/// If the directory exists and is not empty, it is only replaced if `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Already exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please change the output path or use --overwrite."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents one year of the annual series in the output CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AnnualCashFlowRow {
    year: u32,
    fixed_om: Money,
    variable_om: Money,
    electricity_purchases: Money,
    system_augment: Money,
    electricity_sales: Money,
    energy_production_kwh: Energy,
    depreciation: Money,
    depreciable_fraction: Dimensionless,
    revenue: Money,
    cost: Money,
    other_tax: Money,
    depreciation_claimed: Money,
    taxable_income: Money,
    taxes: Money,
    net_cash_flow: Money,
    cumulative_cash_flow: Money,
}

impl AnnualCashFlowRow {
    /// Create a new [`AnnualCashFlowRow`] for the given year
    fn new(metrics: &LcoeMetrics, year: u32) -> Self {
        let i = year as usize;
        let series = &metrics.series;
        let cash_flows = &metrics.cash_flows;
        Self {
            year,
            fixed_om: series.fixed_om[i],
            variable_om: series.variable_om[i],
            electricity_purchases: series.electricity_purchases[i],
            system_augment: series.system_augment[i],
            electricity_sales: series.electricity_sales[i],
            energy_production_kwh: series.energy_production[i],
            depreciation: metrics.depreciation.values[i],
            depreciable_fraction: metrics.depreciation.fractions[i],
            revenue: cash_flows.revenues[i],
            cost: cash_flows.costs[i],
            other_tax: cash_flows.other_tax[i],
            depreciation_claimed: cash_flows.depreciation_claimed[i],
            taxable_income: cash_flows.taxable_income[i],
            taxes: cash_flows.taxes[i],
            net_cash_flow: cash_flows.net_cash_flow[i],
            cumulative_cash_flow: cash_flows.cumulative_cash_flow[i],
        }
    }
}

/// Represents a single scalar result in the output CSV file.
///
/// Undefined values (e.g. an IRR with no sign change) are written as empty fields.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct MetricRow {
    metric: String,
    value: Option<f64>,
}

impl MetricRow {
    fn new(metric: &str, value: Option<f64>) -> Self {
        Self {
            metric: metric.to_string(),
            value,
        }
    }
}

/// Flatten the scalar results into rows
fn metric_rows(metrics: &LcoeMetrics) -> Vec<MetricRow> {
    let rates = &metrics.discount_rates;
    let npv = &metrics.net_present_values;
    let annualised = &metrics.annualised;
    let defined = |metric: &str, value: f64| MetricRow::new(metric, Some(value));

    vec![
        defined("wacc_nominal", rates.wacc_nominal.0),
        defined("wacc_real", rates.wacc_real.0),
        defined("capital_recovery_factor", rates.capital_recovery_factor.0),
        defined(
            "present_value_of_depreciation",
            metrics.present_value_of_depreciation.0,
        ),
        defined(
            "fixed_charge_rate_after_tax",
            metrics.fixed_charge_rates.after_tax.0,
        ),
        defined(
            "fixed_charge_rate_before_tax",
            metrics.fixed_charge_rates.before_tax.0,
        ),
        defined("npv_fixed_om", npv.fixed_om.0),
        defined("npv_variable_om", npv.variable_om.0),
        defined("npv_depreciation", npv.depreciation.0),
        defined("npv_energy_production_kwh", npv.energy_production.0),
        defined("npv_electricity_sales", npv.electricity_sales.0),
        defined("npv_electricity_purchases", npv.electricity_purchases.0),
        defined("npv_system_augment", npv.system_augment.0),
        defined("npv_costs", npv.costs.0),
        defined("npv_other_tax", npv.other_tax.0),
        defined("npv_cash_flow", npv.cash_flow.0),
        defined("annualised_capex_after_tax", annualised.capex.after_tax.0),
        defined("annualised_capex_before_tax", annualised.capex.before_tax.0),
        defined("annualised_fixed_om_after_tax", annualised.fixed_om.after_tax.0),
        defined(
            "annualised_fixed_om_before_tax",
            annualised.fixed_om.before_tax.0,
        ),
        defined(
            "annualised_variable_om_after_tax",
            annualised.variable_om.after_tax.0,
        ),
        defined(
            "annualised_variable_om_before_tax",
            annualised.variable_om.before_tax.0,
        ),
        defined(
            "annualised_system_augment_after_tax",
            annualised.system_augment.after_tax.0,
        ),
        defined(
            "annualised_system_augment_before_tax",
            annualised.system_augment.before_tax.0,
        ),
        defined(
            "annual_revenue_required_after_tax",
            metrics.annual_revenue_required.after_tax.0,
        ),
        defined(
            "annual_revenue_required_before_tax",
            metrics.annual_revenue_required.before_tax.0,
        ),
        defined("initial_investment", metrics.initial_investment.0),
        MetricRow::new("irr", metrics.irr.map(|irr| irr.0)),
        MetricRow::new("payback_period", metrics.payback_period.map(f64::from)),
        defined(
            "total_lifecycle_cost_after_tax",
            metrics.total_lifecycle_cost.after_tax.0,
        ),
        defined(
            "total_lifecycle_cost_before_tax",
            metrics.total_lifecycle_cost.before_tax.0,
        ),
        defined("lcoe_after_tax", metrics.lcoe.after_tax.0),
        defined("lcoe_before_tax", metrics.lcoe.before_tax.0),
        defined("lcoe_real_after_tax", metrics.lcoe_real.after_tax.0),
        defined("lcoe_real_before_tax", metrics.lcoe_real.before_tax.0),
        defined(
            "annual_electricity_purchases",
            metrics.annual_electricity_purchases.0,
        ),
        defined("annual_electricity_sales", metrics.annual_electricity_sales.0),
    ]
}

/// Write the metrics for an asset to CSV files.
///
/// # Arguments
///
/// * `output_path` - Folder where files will be saved
/// * `metrics` - The results to write
pub fn write_metrics(output_path: &Path, metrics: &LcoeMetrics) -> Result<()> {
    let new_writer = |file_name| {
        let file_path = output_path.join(file_name);
        csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))
    };

    let mut annual_writer = new_writer(ANNUAL_CASH_FLOW_FILE_NAME)?;
    let years = u32::try_from(metrics.cash_flows.net_cash_flow.len())?;
    for year in 0..years {
        annual_writer.serialize(AnnualCashFlowRow::new(metrics, year))?;
    }
    annual_writer.flush()?;

    let mut metrics_writer = new_writer(METRICS_FILE_NAME)?;
    for row in metric_rows(metrics) {
        metrics_writer.serialize(row)?;
    }
    metrics_writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, calculator};
    use crate::metrics::LcoeCalculator;
    use crate::parameters::LcoeOverrides;
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_get_output_dir() {
        assert_eq!(
            get_output_dir(Path::new("some/dir/my_asset.toml")).unwrap(),
            PathBuf::from("enliten_results/my_asset")
        );
    }

    #[test]
    fn test_create_output_directory_new_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output");
        let result = create_output_directory(&output_dir, false).unwrap();
        assert!(!result);
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_existing_empty_directory() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output");
        fs::create_dir(&output_dir).unwrap();

        let result = create_output_directory(&output_dir, false).unwrap();
        assert!(!result);
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_existing_with_files() {
        let temp_dir = tempdir().unwrap();
        let output_dir = temp_dir.path().join("output");
        fs::create_dir(&output_dir).unwrap();
        File::create(output_dir.join("file.txt")).unwrap();

        // Refused without overwrite
        assert_error!(
            create_output_directory(&output_dir, false),
            "Output folder already exists and is not empty. \
            Please change the output path or use --overwrite."
        );
        assert!(output_dir.join("file.txt").exists());

        // Replaced with overwrite
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(output_dir.is_dir());
        assert!(!output_dir.join("file.txt").exists());
    }

    #[rstest]
    fn test_write_metrics(calculator: LcoeCalculator) {
        let metrics = calculator.calculate_metrics(&LcoeOverrides::default());
        let dir = tempdir().unwrap();
        write_metrics(dir.path(), &metrics).unwrap();

        let rows: Vec<AnnualCashFlowRow> =
            csv::Reader::from_path(dir.path().join(ANNUAL_CASH_FLOW_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(rows.len(), 31);
        assert_eq!(rows[0].year, 0);
        assert_eq!(rows[30].year, 30);
        assert_eq!(rows[0].net_cash_flow, -metrics.initial_investment);
        assert_approx_eq!(
            Money,
            rows[1].depreciation,
            Money(291_600.0),
            epsilon = 1e-6
        );

        let rows: Vec<MetricRow> = csv::Reader::from_path(dir.path().join(METRICS_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        let lcoe = rows.iter().find(|row| row.metric == "lcoe_after_tax").unwrap();
        assert_approx_eq!(f64, lcoe.value.unwrap(), metrics.lcoe.after_tax.0);
        let payback = rows.iter().find(|row| row.metric == "payback_period").unwrap();
        assert_eq!(payback.value, Some(5.0));
    }

    #[rstest]
    fn test_write_metrics_undefined_values(calculator: LcoeCalculator) {
        // Sales never recover the investment
        let overrides = LcoeOverrides {
            annual_production: Some(Energy::from_mwh(100.0)),
            ..Default::default()
        };
        let metrics = calculator.calculate_metrics(&overrides);
        let dir = tempdir().unwrap();
        write_metrics(dir.path(), &metrics).unwrap();

        let rows: Vec<MetricRow> = csv::Reader::from_path(dir.path().join(METRICS_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        for metric in ["irr", "payback_period"] {
            let row = rows.iter().find(|row| row.metric == metric).unwrap();
            assert_eq!(row.value, None);
        }
    }
}
