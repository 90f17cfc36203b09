use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use crate::core::{
    AddOnId, AffordabilityRequest, ClaimsBand, Condition, ConfigError, Coverage, DownPayment,
    DownPaymentMode, DriverAgeBand, InsuranceQuoteRequest, LoanQuoteRequest, QuoteError,
    RateTables, ValuationPurpose, ValuationRequest, VehicleAgeBand, amortization_schedule,
    assess_affordability, compare_bank_offers, estimate_premium, estimate_value, structure_loan,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliDownPaymentMode {
    Percent,
    Amount,
}

impl From<CliDownPaymentMode> for DownPaymentMode {
    fn from(value: CliDownPaymentMode) -> Self {
        match value {
            CliDownPaymentMode::Percent => DownPaymentMode::Percent,
            CliDownPaymentMode::Amount => DownPaymentMode::Amount,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCoverage {
    Comprehensive,
    ThirdParty,
    ThirdPartyFire,
}

impl From<CliCoverage> for Coverage {
    fn from(value: CliCoverage) -> Self {
        match value {
            CliCoverage::Comprehensive => Coverage::Comprehensive,
            CliCoverage::ThirdParty => Coverage::ThirdParty,
            CliCoverage::ThirdPartyFire => Coverage::ThirdPartyFire,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliAddOn {
    Roadside,
    AgencyRepair,
    ReplacementCar,
    PersonalAccident,
}

impl From<CliAddOn> for AddOnId {
    fn from(value: CliAddOn) -> Self {
        match value {
            CliAddOn::Roadside => AddOnId::Roadside,
            CliAddOn::AgencyRepair => AddOnId::AgencyRepair,
            CliAddOn::ReplacementCar => AddOnId::ReplacementCar,
            CliAddOn::PersonalAccident => AddOnId::PersonalAccident,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl From<CliCondition> for Condition {
    fn from(value: CliCondition) -> Self {
        match value {
            CliCondition::Excellent => Condition::Excellent,
            CliCondition::Good => Condition::Good,
            CliCondition::Fair => Condition::Fair,
            CliCondition::Poor => Condition::Poor,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliPurpose {
    Resale,
    TradeIn,
}

impl From<CliPurpose> for ValuationPurpose {
    fn from(value: CliPurpose) -> Self {
        match value {
            CliPurpose::Resale => ValuationPurpose::Resale,
            CliPurpose::TradeIn => ValuationPurpose::TradeIn,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "carquote",
    about = "Car finance, insurance and valuation quotes for pre-owned vehicles"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Rate table file (.toml or .json) overriding the built-in terms"
    )]
    rates: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Monthly payment for a financed vehicle
    Loan(LoanArgs),
    /// Month-by-month repayment schedule
    Schedule(LoanArgs),
    /// The same loan priced at every partner bank
    Banks(LoanArgs),
    /// Debt-burden eligibility check
    Afford(AffordArgs),
    /// Annual motor insurance premium
    Insurance(InsuranceArgs),
    /// Resale or trade-in value band
    Valuation(ValuationArgs),
}

#[derive(Args, Debug, Clone)]
struct LoanArgs {
    #[arg(long, help = "Vehicle price")]
    price: f64,
    #[arg(long, default_value_t = 20.0, help = "Down payment, percent or amount")]
    down_payment: f64,
    #[arg(long, value_enum, default_value_t = CliDownPaymentMode::Percent)]
    down_payment_mode: CliDownPaymentMode,
    #[arg(long, default_value_t = 60, help = "Loan term in months (at most 1200)")]
    term_months: u32,
    #[arg(
        long,
        default_value_t = 3.99,
        help = "Annual interest rate in percent, e.g. 3.99"
    )]
    rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Insurance premium financed together with the vehicle"
    )]
    bundled_premium: f64,
}

#[derive(Args, Debug, Clone)]
struct AffordArgs {
    #[arg(long, help = "Gross monthly income")]
    income: f64,
    #[arg(long, default_value_t = 0.0, help = "Existing monthly debt repayments")]
    obligations: f64,
    #[arg(long, help = "Proposed monthly car payment")]
    payment: f64,
}

#[derive(Args, Debug, Clone)]
struct InsuranceArgs {
    #[arg(long, help = "Insured vehicle value")]
    value: f64,
    #[arg(long, default_value = "0-2", help = "Vehicle age band: 0-2, 2-5 or 5+")]
    vehicle_age: String,
    #[arg(long, default_value = "25-35", help = "Driver age band: <25, 25-35 or 35+")]
    driver_age: String,
    #[arg(long, default_value = "0", help = "Claims in the last year: 0, 1 or 2+")]
    claims: String,
    #[arg(long, value_enum, default_value_t = CliCoverage::Comprehensive)]
    coverage: CliCoverage,
    #[arg(long = "add-on", value_enum, help = "Optional cover, repeatable")]
    add_ons: Vec<CliAddOn>,
}

#[derive(Args, Debug, Clone)]
struct ValuationArgs {
    #[arg(long)]
    make: String,
    #[arg(long)]
    model: String,
    #[arg(long)]
    year: u32,
    #[arg(long, help = "Odometer reading in km")]
    mileage: f64,
    #[arg(long, value_enum, default_value_t = CliCondition::Good)]
    condition: CliCondition,
    #[arg(long, default_value_t = 0, help = "Number of damaged body areas")]
    damage_areas: u32,
    #[arg(long, help = "New-vehicle list price; looked up by make when omitted")]
    list_price: Option<f64>,
    #[arg(long, help = "Valuation year; defaults to the rate table reference year")]
    as_of_year: Option<u32>,
    #[arg(long, value_enum, default_value_t = CliPurpose::Resale)]
    purpose: CliPurpose,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

fn loan_request(args: &LoanArgs) -> LoanQuoteRequest {
    LoanQuoteRequest {
        vehicle_price: args.price,
        down_payment: DownPayment {
            mode: args.down_payment_mode.into(),
            value: args.down_payment,
        },
        term_months: args.term_months,
        annual_rate_percent: args.rate,
        bundled_premium: args.bundled_premium,
    }
}

fn insurance_request(args: &InsuranceArgs) -> Result<InsuranceQuoteRequest, QuoteError> {
    Ok(InsuranceQuoteRequest {
        vehicle_value: args.value,
        vehicle_age_band: args.vehicle_age.parse::<VehicleAgeBand>()?,
        driver_age_band: args.driver_age.parse::<DriverAgeBand>()?,
        claims_band: args.claims.parse::<ClaimsBand>()?,
        coverage: args.coverage.into(),
        add_ons: args
            .add_ons
            .iter()
            .map(|id| AddOnId::from(*id))
            .collect::<BTreeSet<_>>(),
    })
}

fn valuation_request(args: &ValuationArgs) -> ValuationRequest {
    ValuationRequest {
        make: args.make.clone(),
        model: args.model.clone(),
        year: args.year,
        mileage: args.mileage,
        condition: args.condition.into(),
        damage_area_count: args.damage_areas,
        list_price: args.list_price,
        as_of_year: args.as_of_year,
        purpose: args.purpose.into(),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Run one parsed command and return its JSON output.
pub fn run(cli: Cli) -> Result<String, CliError> {
    let tables = match &cli.rates {
        Some(path) => RateTables::from_path(path)?,
        None => RateTables::default(),
    };
    execute(&cli.command, &tables)
}

fn execute(command: &Command, tables: &RateTables) -> Result<String, CliError> {
    match command {
        Command::Loan(args) => render(&structure_loan(&loan_request(args))?),
        Command::Schedule(args) => {
            let quote = structure_loan(&loan_request(args))?;
            render(&amortization_schedule(
                quote.principal,
                args.rate,
                args.term_months,
            )?)
        }
        Command::Banks(args) => render(&compare_bank_offers(&loan_request(args), tables)?),
        Command::Afford(args) => render(&assess_affordability(
            &AffordabilityRequest {
                monthly_income: args.income,
                monthly_obligations: args.obligations,
                proposed_payment: args.payment,
            },
            tables,
        )?),
        Command::Insurance(args) => {
            render(&estimate_premium(&insurance_request(args)?, tables)?)
        }
        Command::Valuation(args) => render(&estimate_value(&valuation_request(args), tables)?),
    }
}
