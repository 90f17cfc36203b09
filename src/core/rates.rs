//! Rate and multiplier tables shared by every calculator.
//!
//! The defaults reproduce the dealership's published terms. A deployment can
//! override any subset of them from a TOML or JSON file; omitted keys keep
//! their defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::types::{AddOnId, ClaimsBand, Condition, Coverage, DriverAgeBand, VehicleAgeBand};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTables {
    /// Annual comprehensive premium as a fraction of vehicle value.
    #[serde(default = "default_base_comprehensive_rate")]
    pub base_comprehensive_rate: f64,
    #[serde(default)]
    pub coverage: CoverageMultipliers,
    #[serde(default)]
    pub vehicle_age: VehicleAgeMultipliers,
    #[serde(default)]
    pub driver_age: DriverAgeMultipliers,
    #[serde(default)]
    pub claims: ClaimsMultipliers,
    #[serde(default)]
    pub add_ons: AddOnPrices,
    #[serde(default = "default_banks")]
    pub banks: Vec<BankRate>,
    #[serde(default)]
    pub eligibility: EligibilityLimits,
    #[serde(default)]
    pub valuation: ValuationCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMultipliers {
    #[serde(default = "one")]
    pub comprehensive: f64,
    #[serde(default = "default_third_party")]
    pub third_party: f64,
    #[serde(default = "default_third_party_fire")]
    pub third_party_fire: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleAgeMultipliers {
    #[serde(default = "one")]
    pub up_to_two_years: f64,
    #[serde(default = "default_two_to_five_years")]
    pub two_to_five_years: f64,
    #[serde(default = "default_over_five_years")]
    pub over_five_years: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverAgeMultipliers {
    #[serde(default = "default_under_25")]
    pub under_25: f64,
    #[serde(default = "one")]
    pub from_25_to_35: f64,
    #[serde(default = "default_over_35")]
    pub over_35: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsMultipliers {
    #[serde(default = "one")]
    pub no_claims: f64,
    #[serde(default = "default_one_claim")]
    pub one_claim: f64,
    #[serde(default = "default_two_or_more_claims")]
    pub two_or_more: f64,
}

/// Flat annual prices per optional cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOnPrices {
    #[serde(default = "default_roadside")]
    pub roadside: f64,
    #[serde(default = "default_agency_repair")]
    pub agency_repair: f64,
    #[serde(default = "default_replacement_car")]
    pub replacement_car: f64,
    #[serde(default = "default_personal_accident")]
    pub personal_accident: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRate {
    pub name: String,
    pub annual_rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityLimits {
    /// Highest share of monthly income that may go to debt repayments.
    #[serde(default = "default_max_debt_burden_percent")]
    pub max_debt_burden_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionMultipliers {
    #[serde(default = "one")]
    pub excellent: f64,
    #[serde(default = "default_condition_good")]
    pub good: f64,
    #[serde(default = "default_condition_fair")]
    pub fair: f64,
    #[serde(default = "default_condition_poor")]
    pub poor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationCurve {
    /// Year used as "today" when a request does not carry one.
    #[serde(default = "default_reference_year")]
    pub reference_year: u32,
    /// New-vehicle price used when neither the request nor `reference_prices` has one.
    #[serde(default = "default_reference_price")]
    pub default_reference_price: f64,
    /// New-vehicle reference price keyed by lowercase make.
    #[serde(default = "default_reference_prices")]
    pub reference_prices: BTreeMap<String, f64>,
    #[serde(default = "default_first_year_depreciation")]
    pub first_year_depreciation: f64,
    #[serde(default = "default_annual_depreciation")]
    pub annual_depreciation: f64,
    /// Age depreciation never takes the value below this fraction of the reference price.
    #[serde(default = "default_residual_floor")]
    pub residual_floor: f64,
    #[serde(default = "default_expected_annual_mileage")]
    pub expected_annual_mileage: f64,
    /// Fractional deduction per 10,000 km above the expected mileage.
    #[serde(default = "default_mileage_penalty_per_10k")]
    pub mileage_penalty_per_10k: f64,
    #[serde(default = "default_max_mileage_penalty")]
    pub max_mileage_penalty: f64,
    #[serde(default)]
    pub condition: ConditionMultipliers,
    /// Fraction of the undamaged base value deducted per damaged body area.
    #[serde(default = "default_damage_deduction_per_area")]
    pub damage_deduction_per_area: f64,
    #[serde(default = "default_max_damage_deduction")]
    pub max_damage_deduction: f64,
    /// Ratio high / low of the reported band.
    #[serde(default = "default_band_spread")]
    pub band_spread: f64,
    #[serde(default = "default_trade_in_multiplier")]
    pub trade_in_multiplier: f64,
}

fn one() -> f64 {
    1.0
}

fn default_base_comprehensive_rate() -> f64 {
    0.025
}

fn default_third_party() -> f64 {
    0.4
}

fn default_third_party_fire() -> f64 {
    0.6
}

fn default_two_to_five_years() -> f64 {
    1.1
}

fn default_over_five_years() -> f64 {
    1.25
}

fn default_under_25() -> f64 {
    1.3
}

fn default_over_35() -> f64 {
    0.9
}

fn default_one_claim() -> f64 {
    1.2
}

fn default_two_or_more_claims() -> f64 {
    1.5
}

fn default_roadside() -> f64 {
    150.0
}

fn default_agency_repair() -> f64 {
    500.0
}

fn default_replacement_car() -> f64 {
    300.0
}

fn default_personal_accident() -> f64 {
    200.0
}

fn default_banks() -> Vec<BankRate> {
    [
        ("Emirates NBD", 3.99),
        ("Abu Dhabi Commercial Bank", 4.25),
        ("First Abu Dhabi Bank", 4.49),
        ("Dubai Islamic Bank", 4.15),
        ("Mashreq", 4.75),
    ]
    .into_iter()
    .map(|(name, rate)| BankRate {
        name: name.to_string(),
        annual_rate_percent: rate,
    })
    .collect()
}

fn default_max_debt_burden_percent() -> f64 {
    50.0
}

fn default_condition_good() -> f64 {
    0.92
}

fn default_condition_fair() -> f64 {
    0.80
}

fn default_condition_poor() -> f64 {
    0.65
}

fn default_reference_year() -> u32 {
    2025
}

fn default_reference_price() -> f64 {
    90_000.0
}

fn default_reference_prices() -> BTreeMap<String, f64> {
    [
        ("toyota", 110_000.0),
        ("nissan", 95_000.0),
        ("honda", 90_000.0),
        ("hyundai", 75_000.0),
        ("kia", 72_000.0),
        ("mitsubishi", 70_000.0),
        ("ford", 120_000.0),
        ("chevrolet", 115_000.0),
        ("lexus", 210_000.0),
        ("bmw", 230_000.0),
        ("mercedes-benz", 250_000.0),
        ("audi", 200_000.0),
        ("land rover", 330_000.0),
        ("porsche", 420_000.0),
    ]
    .into_iter()
    .map(|(make, price)| (make.to_string(), price))
    .collect()
}

fn default_first_year_depreciation() -> f64 {
    0.20
}

fn default_annual_depreciation() -> f64 {
    0.12
}

fn default_residual_floor() -> f64 {
    0.10
}

fn default_expected_annual_mileage() -> f64 {
    20_000.0
}

fn default_mileage_penalty_per_10k() -> f64 {
    0.02
}

fn default_max_mileage_penalty() -> f64 {
    0.30
}

fn default_damage_deduction_per_area() -> f64 {
    0.03
}

fn default_max_damage_deduction() -> f64 {
    0.25
}

fn default_band_spread() -> f64 {
    1.15
}

fn default_trade_in_multiplier() -> f64 {
    0.90
}

impl Default for RateTables {
    fn default() -> Self {
        Self {
            base_comprehensive_rate: default_base_comprehensive_rate(),
            coverage: CoverageMultipliers::default(),
            vehicle_age: VehicleAgeMultipliers::default(),
            driver_age: DriverAgeMultipliers::default(),
            claims: ClaimsMultipliers::default(),
            add_ons: AddOnPrices::default(),
            banks: default_banks(),
            eligibility: EligibilityLimits::default(),
            valuation: ValuationCurve::default(),
        }
    }
}

impl Default for CoverageMultipliers {
    fn default() -> Self {
        Self {
            comprehensive: one(),
            third_party: default_third_party(),
            third_party_fire: default_third_party_fire(),
        }
    }
}

impl Default for VehicleAgeMultipliers {
    fn default() -> Self {
        Self {
            up_to_two_years: one(),
            two_to_five_years: default_two_to_five_years(),
            over_five_years: default_over_five_years(),
        }
    }
}

impl Default for DriverAgeMultipliers {
    fn default() -> Self {
        Self {
            under_25: default_under_25(),
            from_25_to_35: one(),
            over_35: default_over_35(),
        }
    }
}

impl Default for ClaimsMultipliers {
    fn default() -> Self {
        Self {
            no_claims: one(),
            one_claim: default_one_claim(),
            two_or_more: default_two_or_more_claims(),
        }
    }
}

impl Default for AddOnPrices {
    fn default() -> Self {
        Self {
            roadside: default_roadside(),
            agency_repair: default_agency_repair(),
            replacement_car: default_replacement_car(),
            personal_accident: default_personal_accident(),
        }
    }
}

impl Default for EligibilityLimits {
    fn default() -> Self {
        Self {
            max_debt_burden_percent: default_max_debt_burden_percent(),
        }
    }
}

impl Default for ConditionMultipliers {
    fn default() -> Self {
        Self {
            excellent: one(),
            good: default_condition_good(),
            fair: default_condition_fair(),
            poor: default_condition_poor(),
        }
    }
}

impl Default for ValuationCurve {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            default_reference_price: default_reference_price(),
            reference_prices: default_reference_prices(),
            first_year_depreciation: default_first_year_depreciation(),
            annual_depreciation: default_annual_depreciation(),
            residual_floor: default_residual_floor(),
            expected_annual_mileage: default_expected_annual_mileage(),
            mileage_penalty_per_10k: default_mileage_penalty_per_10k(),
            max_mileage_penalty: default_max_mileage_penalty(),
            condition: ConditionMultipliers::default(),
            damage_deduction_per_area: default_damage_deduction_per_area(),
            max_damage_deduction: default_max_damage_deduction(),
            band_spread: default_band_spread(),
            trade_in_multiplier: default_trade_in_multiplier(),
        }
    }
}

impl RateTables {
    pub fn coverage_multiplier(&self, coverage: Coverage) -> f64 {
        match coverage {
            Coverage::Comprehensive => self.coverage.comprehensive,
            Coverage::ThirdParty => self.coverage.third_party,
            Coverage::ThirdPartyFire => self.coverage.third_party_fire,
        }
    }

    pub fn vehicle_age_multiplier(&self, band: VehicleAgeBand) -> f64 {
        match band {
            VehicleAgeBand::UpToTwoYears => self.vehicle_age.up_to_two_years,
            VehicleAgeBand::TwoToFiveYears => self.vehicle_age.two_to_five_years,
            VehicleAgeBand::OverFiveYears => self.vehicle_age.over_five_years,
        }
    }

    pub fn driver_age_multiplier(&self, band: DriverAgeBand) -> f64 {
        match band {
            DriverAgeBand::Under25 => self.driver_age.under_25,
            DriverAgeBand::From25To35 => self.driver_age.from_25_to_35,
            DriverAgeBand::Over35 => self.driver_age.over_35,
        }
    }

    pub fn claims_multiplier(&self, band: ClaimsBand) -> f64 {
        match band {
            ClaimsBand::NoClaims => self.claims.no_claims,
            ClaimsBand::OneClaim => self.claims.one_claim,
            ClaimsBand::TwoOrMore => self.claims.two_or_more,
        }
    }

    pub fn add_on_price(&self, id: AddOnId) -> f64 {
        match id {
            AddOnId::Roadside => self.add_ons.roadside,
            AddOnId::AgencyRepair => self.add_ons.agency_repair,
            AddOnId::ReplacementCar => self.add_ons.replacement_car,
            AddOnId::PersonalAccident => self.add_ons.personal_accident,
        }
    }

    pub fn condition_multiplier(&self, condition: Condition) -> f64 {
        let table = &self.valuation.condition;
        match condition {
            Condition::Excellent => table.excellent,
            Condition::Good => table.good,
            Condition::Fair => table.fair,
            Condition::Poor => table.poor,
        }
    }

    /// Reference new price for a make, case-insensitive, falling back to the default.
    pub fn reference_price(&self, make: &str) -> f64 {
        let key = make.trim().to_lowercase();
        self.valuation
            .reference_prices
            .get(&key)
            .copied()
            .unwrap_or(self.valuation.default_reference_price)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let tables: RateTables = toml::from_str(raw)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let tables: RateTables = serde_json::from_str(raw)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Load tables from a `.toml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let tables = match extension.as_str() {
            "toml" => Self::from_toml_str(&raw)?,
            "json" => Self::from_json_str(&raw)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        tracing::info!(
            path = %path.display(),
            banks = tables.banks.len(),
            makes = tables.valuation.reference_prices.len(),
            "loaded rate tables"
        );
        Ok(tables)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("base_comprehensive_rate", self.base_comprehensive_rate, 0.0, 1.0)?;

        for (field, value) in [
            ("coverage.comprehensive", self.coverage.comprehensive),
            ("coverage.third_party", self.coverage.third_party),
            ("coverage.third_party_fire", self.coverage.third_party_fire),
            ("vehicle_age.up_to_two_years", self.vehicle_age.up_to_two_years),
            ("vehicle_age.two_to_five_years", self.vehicle_age.two_to_five_years),
            ("vehicle_age.over_five_years", self.vehicle_age.over_five_years),
            ("driver_age.under_25", self.driver_age.under_25),
            ("driver_age.from_25_to_35", self.driver_age.from_25_to_35),
            ("driver_age.over_35", self.driver_age.over_35),
            ("claims.no_claims", self.claims.no_claims),
            ("claims.one_claim", self.claims.one_claim),
            ("claims.two_or_more", self.claims.two_or_more),
            ("add_ons.roadside", self.add_ons.roadside),
            ("add_ons.agency_repair", self.add_ons.agency_repair),
            ("add_ons.replacement_car", self.add_ons.replacement_car),
            ("add_ons.personal_accident", self.add_ons.personal_accident),
            (
                "valuation.default_reference_price",
                self.valuation.default_reference_price,
            ),
            (
                "valuation.expected_annual_mileage",
                self.valuation.expected_annual_mileage,
            ),
            (
                "valuation.mileage_penalty_per_10k",
                self.valuation.mileage_penalty_per_10k,
            ),
            (
                "valuation.damage_deduction_per_area",
                self.valuation.damage_deduction_per_area,
            ),
        ] {
            check_non_negative(field, value)?;
        }

        // Narrower cover must never cost more than broader cover.
        let coverage = &self.coverage;
        if coverage.third_party > coverage.third_party_fire
            || coverage.third_party_fire > coverage.comprehensive
        {
            return Err(invalid(
                "coverage",
                format!(
                    "expected third_party <= third_party_fire <= comprehensive, got {}/{}/{}",
                    coverage.third_party, coverage.third_party_fire, coverage.comprehensive
                ),
            ));
        }

        for bank in &self.banks {
            if bank.name.trim().is_empty() {
                return Err(invalid("banks.name", "must not be empty"));
            }
            check_non_negative("banks.annual_rate_percent", bank.annual_rate_percent)?;
        }

        check_range(
            "eligibility.max_debt_burden_percent",
            self.eligibility.max_debt_burden_percent,
            0.0,
            100.0,
        )?;

        let curve = &self.valuation;
        for (make, price) in &curve.reference_prices {
            if make.trim().to_lowercase() != *make {
                return Err(invalid(
                    "valuation.reference_prices",
                    format!("make key '{make}' must be lowercase and trimmed"),
                ));
            }
            check_non_negative("valuation.reference_prices", *price)?;
        }
        check_below_one(
            "valuation.first_year_depreciation",
            curve.first_year_depreciation,
        )?;
        check_below_one("valuation.annual_depreciation", curve.annual_depreciation)?;
        check_range("valuation.residual_floor", curve.residual_floor, 0.0, 1.0)?;
        check_below_one("valuation.max_mileage_penalty", curve.max_mileage_penalty)?;
        check_below_one("valuation.max_damage_deduction", curve.max_damage_deduction)?;
        for (field, value) in [
            ("valuation.condition.excellent", curve.condition.excellent),
            ("valuation.condition.good", curve.condition.good),
            ("valuation.condition.fair", curve.condition.fair),
            ("valuation.condition.poor", curve.condition.poor),
            ("valuation.trade_in_multiplier", curve.trade_in_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(invalid(field, format!("must be in (0, 1], got {value}")));
            }
        }
        if !curve.band_spread.is_finite() || curve.band_spread < 1.0 {
            return Err(invalid(
                "valuation.band_spread",
                format!("must be >= 1, got {}", curve.band_spread),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be a finite number >= 0, got {value}")));
    }
    Ok(())
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(min..=max).contains(&value) {
        return Err(invalid(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ));
    }
    Ok(())
}

fn check_below_one(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(invalid(field, format!("must be in [0, 1), got {value}")));
    }
    Ok(())
}
