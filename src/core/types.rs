use serde::Serialize;
use thiserror::Error;

use super::month::YearMonth;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("month {0} is out of range 1-12")]
    MonthOutOfRange(u32),
    #[error("invalid year-month `{0}`, expected YYYY-MM")]
    InvalidYearMonth(String),
    #[error("{field} must be a finite number")]
    NonFiniteAmount { field: String },
    #[error("bonus month {0} is out of range 1-12")]
    BonusMonthOutOfRange(u32),
    #[error("investment return rate {rate} is out of range -1 to 1")]
    ReturnRateOutOfRange { rate: f64 },
    #[error("housing purchase event is missing {missing}")]
    IncompleteHousingPurchase { missing: &'static str },
    #[error("event references unknown rental {rental_id}")]
    UnknownRental { rental_id: u64 },
    #[error("birth month {birth} is after the first projected month {first}")]
    BirthAfterStart { birth: YearMonth, first: YearMonth },
    #[error("end age {end_age} is already exceeded at the first projected month")]
    UnreachableEndAge { end_age: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthWindow {
    pub start: YearMonth,
    pub end: Option<YearMonth>,
}

impl MonthWindow {
    pub fn contains(&self, month: YearMonth) -> bool {
        self.start <= month && self.end.is_none_or(|end| month <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    pub birth: YearMonth,
    pub spouse_birth: Option<YearMonth>,
    pub pension_start_age: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub start_offset_months: i32,
    pub end_age: u32,
    pub pension_amount_single: f64,
    pub pension_amount_spouse: f64,
    pub transaction_cost_rate: f64,
    pub real_estate_tax_rate: f64,
    pub real_estate_evaluation_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusPlanChange {
    pub effective: YearMonth,
    pub amount_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomeStream {
    pub take_home_monthly: f64,
    pub raise_rate: f64,
    pub bonus_months: Vec<u32>,
    pub bonus_amount: f64,
    pub bonus_change: Option<BonusPlanChange>,
    pub active: MonthWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseCategory {
    Living,
    Housing,
    Education,
    Insurance,
    Leisure,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub amount_monthly: f64,
    pub inflation_rate: f64,
    pub category: ExpenseCategory,
    pub active: MonthWindow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rental {
    pub id: u64,
    pub rent_monthly: f64,
    pub active: MonthWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mortgage {
    pub purchased: YearMonth,
    pub building_price: f64,
    pub land_price: f64,
    pub down_payment: f64,
    pub annual_rate: f64,
    pub term_years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeEventCategory {
    RetirementBonus,
    HousingPurchase,
    CarPurchase,
    Travel,
    Education,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoToggle {
    HousingPurchaseStopRent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifeEvent {
    pub amount: f64,
    pub anchor: YearMonth,
    pub category: LifeEventCategory,
    pub repeat_interval_years: Option<u32>,
    pub stop_after_occurrences: Option<u32>,
    pub stop_after_age: Option<u32>,
    pub auto_toggle: Option<AutoToggle>,
    pub target_rental_id: Option<u64>,
    pub building_price: Option<f64>,
    pub land_price: Option<f64>,
    pub down_payment: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Asset {
    pub cash_balance: f64,
    pub investment_balance: f64,
    pub return_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub birth: YearMonth,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInput {
    pub current_year_month: YearMonth,
    pub profile: Profile,
    pub settings: SimulationSettings,
    pub children: Vec<Child>,
    pub income_streams: Vec<IncomeStream>,
    pub expenses: Vec<Expense>,
    pub rentals: Vec<Rental>,
    pub assets: Vec<Asset>,
    pub mortgages: Vec<Mortgage>,
    pub life_events: Vec<LifeEvent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyResult {
    pub year_month: YearMonth,
    pub age: u32,
    pub spouse_age: Option<u32>,
    pub total_income: f64,
    pub total_expense: f64,
    pub event_amount: f64,
    pub net_cashflow: f64,
    pub cash_balance: f64,
    pub investment_balance: f64,
    pub total_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub months: Vec<MonthlyResult>,
    pub depletion_year_month: Option<YearMonth>,
}
