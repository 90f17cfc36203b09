use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::QuoteError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DownPaymentMode {
    Percent,
    Amount,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Coverage {
    Comprehensive,
    ThirdParty,
    ThirdPartyFire,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VehicleAgeBand {
    UpToTwoYears,
    TwoToFiveYears,
    OverFiveYears,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DriverAgeBand {
    Under25,
    From25To35,
    Over35,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ClaimsBand {
    NoClaims,
    OneClaim,
    TwoOrMore,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum AddOnId {
    Roadside,
    AgencyRepair,
    ReplacementCar,
    PersonalAccident,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ValuationPurpose {
    #[default]
    Resale,
    TradeIn,
}

impl DownPaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DownPaymentMode::Percent => "percent",
            DownPaymentMode::Amount => "amount",
        }
    }
}

impl Coverage {
    pub fn as_str(self) -> &'static str {
        match self {
            Coverage::Comprehensive => "comprehensive",
            Coverage::ThirdParty => "third-party",
            Coverage::ThirdPartyFire => "third-party-fire",
        }
    }
}

impl VehicleAgeBand {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleAgeBand::UpToTwoYears => "0-2",
            VehicleAgeBand::TwoToFiveYears => "2-5",
            VehicleAgeBand::OverFiveYears => "5+",
        }
    }
}

impl DriverAgeBand {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverAgeBand::Under25 => "<25",
            DriverAgeBand::From25To35 => "25-35",
            DriverAgeBand::Over35 => "35+",
        }
    }
}

impl ClaimsBand {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimsBand::NoClaims => "0",
            ClaimsBand::OneClaim => "1",
            ClaimsBand::TwoOrMore => "2+",
        }
    }
}

impl AddOnId {
    pub const ALL: [AddOnId; 4] = [
        AddOnId::Roadside,
        AddOnId::AgencyRepair,
        AddOnId::ReplacementCar,
        AddOnId::PersonalAccident,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AddOnId::Roadside => "roadside",
            AddOnId::AgencyRepair => "agency-repair",
            AddOnId::ReplacementCar => "replacement-car",
            AddOnId::PersonalAccident => "personal-accident",
        }
    }
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }
}

impl ValuationPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            ValuationPurpose::Resale => "resale",
            ValuationPurpose::TradeIn => "trade-in",
        }
    }
}

// Form fields arrive as free text; anything outside the known set is rejected
// rather than mapped to a neighbouring band.
fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(['_', ' '], "-")
}

impl FromStr for DownPaymentMode {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "percent" | "pct" | "percentage" | "%" => Ok(DownPaymentMode::Percent),
            "amount" | "absolute" | "fixed" => Ok(DownPaymentMode::Amount),
            _ => Err(QuoteError::invalid(
                "downPayment.mode",
                format!("unknown down payment mode '{raw}'"),
            )),
        }
    }
}

impl FromStr for Coverage {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "comprehensive" => Ok(Coverage::Comprehensive),
            "third-party" | "thirdparty" | "tpl" => Ok(Coverage::ThirdParty),
            "third-party-fire" | "thirdpartyfire" | "tpft" => Ok(Coverage::ThirdPartyFire),
            _ => Err(QuoteError::invalid(
                "coverage",
                format!("unknown coverage type '{raw}'"),
            )),
        }
    }
}

impl FromStr for VehicleAgeBand {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "0-2" => Ok(VehicleAgeBand::UpToTwoYears),
            "2-5" => Ok(VehicleAgeBand::TwoToFiveYears),
            "5+" => Ok(VehicleAgeBand::OverFiveYears),
            _ => Err(QuoteError::invalid(
                "vehicleAgeBand",
                format!("unknown vehicle age band '{raw}'"),
            )),
        }
    }
}

impl FromStr for DriverAgeBand {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "<25" | "under-25" => Ok(DriverAgeBand::Under25),
            "25-35" => Ok(DriverAgeBand::From25To35),
            "35+" | "over-35" => Ok(DriverAgeBand::Over35),
            _ => Err(QuoteError::invalid(
                "driverAgeBand",
                format!("unknown driver age band '{raw}'"),
            )),
        }
    }
}

impl FromStr for ClaimsBand {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "0" | "none" => Ok(ClaimsBand::NoClaims),
            "1" | "one" => Ok(ClaimsBand::OneClaim),
            "2+" => Ok(ClaimsBand::TwoOrMore),
            _ => Err(QuoteError::invalid(
                "claimsBand",
                format!("unknown claims band '{raw}'"),
            )),
        }
    }
}

impl FromStr for AddOnId {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "roadside" | "roadside-assistance" | "roadsideassistance" => Ok(AddOnId::Roadside),
            "agency-repair" | "agencyrepair" => Ok(AddOnId::AgencyRepair),
            "replacement-car" | "replacementcar" => Ok(AddOnId::ReplacementCar),
            "personal-accident" | "personalaccident" => Ok(AddOnId::PersonalAccident),
            _ => Err(QuoteError::invalid(
                "addOns",
                format!("unknown add-on '{raw}'"),
            )),
        }
    }
}

impl FromStr for Condition {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "excellent" => Ok(Condition::Excellent),
            "good" => Ok(Condition::Good),
            "fair" => Ok(Condition::Fair),
            "poor" => Ok(Condition::Poor),
            _ => Err(QuoteError::invalid(
                "condition",
                format!("unknown condition '{raw}'"),
            )),
        }
    }
}

impl FromStr for ValuationPurpose {
    type Err = QuoteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize(raw).as_str() {
            "resale" | "sell" | "sale" => Ok(ValuationPurpose::Resale),
            "trade-in" | "tradein" => Ok(ValuationPurpose::TradeIn),
            _ => Err(QuoteError::invalid(
                "purpose",
                format!("unknown valuation purpose '{raw}'"),
            )),
        }
    }
}

// JSON bodies go through the same `FromStr` as CLI flags. Bare numbers are
// accepted so `"claimsBand": 0` reads like `"claimsBand": "0"`.
struct IdentifierVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for IdentifierVisitor<T>
where
    T: FromStr<Err = QuoteError>,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an identifier string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        value.parse().map_err(E::custom)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        self.visit_str(&value.to_string())
    }
}

macro_rules! string_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    deserializer.deserialize_any(IdentifierVisitor(PhantomData))
                }
            }
        )+
    };
}

string_enum!(
    DownPaymentMode,
    Coverage,
    VehicleAgeBand,
    DriverAgeBand,
    ClaimsBand,
    AddOnId,
    Condition,
    ValuationPurpose,
);

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownPayment {
    pub mode: DownPaymentMode,
    pub value: f64,
}

impl DownPayment {
    pub fn percent(value: f64) -> Self {
        Self {
            mode: DownPaymentMode::Percent,
            value,
        }
    }

    pub fn amount(value: f64) -> Self {
        Self {
            mode: DownPaymentMode::Amount,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuoteRequest {
    pub vehicle_price: f64,
    pub down_payment: DownPayment,
    pub term_months: u32,
    pub annual_rate_percent: f64,
    #[serde(default)]
    pub bundled_premium: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuoteResult {
    pub down_payment_amount: f64,
    pub principal: f64,
    pub periodic_payment: f64,
    pub total_interest: f64,
    pub total_payable: f64,
    pub principal_share_percent: u32,
    pub interest_share_percent: u32,
}

/// Unrounded reducing-balance figures for a single loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Amortization {
    pub payment: f64,
    pub total_interest: f64,
    pub total_payable: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub period: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankOffer {
    pub bank: String,
    pub annual_rate_percent: f64,
    #[serde(flatten)]
    pub quote: LoanQuoteResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityRequest {
    pub monthly_income: f64,
    #[serde(default)]
    pub monthly_obligations: f64,
    pub proposed_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityResult {
    pub debt_burden_percent: f64,
    pub max_debt_burden_percent: f64,
    pub eligible: bool,
    pub max_affordable_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceQuoteRequest {
    pub vehicle_value: f64,
    pub vehicle_age_band: VehicleAgeBand,
    pub driver_age_band: DriverAgeBand,
    pub claims_band: ClaimsBand,
    pub coverage: Coverage,
    #[serde(default)]
    pub add_ons: BTreeSet<AddOnId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceQuoteResult {
    pub composed_rate: f64,
    pub base_premium: f64,
    pub add_on_total: f64,
    pub total_premium: f64,
    pub monthly_equivalent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRequest {
    pub make: String,
    pub model: String,
    pub year: u32,
    pub mileage: f64,
    pub condition: Condition,
    #[serde(default)]
    pub damage_area_count: u32,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default)]
    pub as_of_year: Option<u32>,
    #[serde(default)]
    pub purpose: ValuationPurpose,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub purpose: ValuationPurpose,
    pub base_value: f64,
    pub low: f64,
    pub high: f64,
}
