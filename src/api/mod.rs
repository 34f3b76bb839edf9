use std::net::SocketAddr;
use std::path::Path;

use axum::{
    Router,
    extract::Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::{
    Asset, AutoToggle, BonusPlanChange, Child, Expense, ExpenseCategory, IncomeStream, LifeEvent,
    LifeEventCategory, Money, MonthWindow, MonthlyResult, Mortgage, Profile, Rental, Rounding,
    SimulationInput, SimulationResult, SimulationSettings, YearMonth,
    calculate_mortgage_principal, simulate_life_plan,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ApiExpenseCategory {
    Living,
    Housing,
    Education,
    Insurance,
    Leisure,
    Other,
}

impl From<ApiExpenseCategory> for ExpenseCategory {
    fn from(value: ApiExpenseCategory) -> Self {
        match value {
            ApiExpenseCategory::Living => ExpenseCategory::Living,
            ApiExpenseCategory::Housing => ExpenseCategory::Housing,
            ApiExpenseCategory::Education => ExpenseCategory::Education,
            ApiExpenseCategory::Insurance => ExpenseCategory::Insurance,
            ApiExpenseCategory::Leisure => ExpenseCategory::Leisure,
            ApiExpenseCategory::Other => ExpenseCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ApiLifeEventCategory {
    RetirementBonus,
    HousingPurchase,
    CarPurchase,
    Travel,
    Education,
    Other,
}

impl From<ApiLifeEventCategory> for LifeEventCategory {
    fn from(value: ApiLifeEventCategory) -> Self {
        match value {
            ApiLifeEventCategory::RetirementBonus => LifeEventCategory::RetirementBonus,
            ApiLifeEventCategory::HousingPurchase => LifeEventCategory::HousingPurchase,
            ApiLifeEventCategory::CarPurchase => LifeEventCategory::CarPurchase,
            ApiLifeEventCategory::Travel => LifeEventCategory::Travel,
            ApiLifeEventCategory::Education => LifeEventCategory::Education,
            ApiLifeEventCategory::Other => LifeEventCategory::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum ApiAutoToggle {
    #[serde(
        rename = "HOUSING_PURCHASE_STOP_RENT",
        alias = "housing_purchase_stop_rent"
    )]
    HousingPurchaseStopRent,
}

impl From<ApiAutoToggle> for AutoToggle {
    fn from(value: ApiAutoToggle) -> Self {
        match value {
            ApiAutoToggle::HousingPurchaseStopRent => AutoToggle::HousingPurchaseStopRent,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    current_year_month: Option<String>,
    profile: ProfilePayload,
    settings: SettingsPayload,
    children: Vec<ChildPayload>,
    income_streams: Vec<IncomeStreamPayload>,
    expenses: Vec<ExpensePayload>,
    rentals: Vec<RentalPayload>,
    assets: Vec<AssetPayload>,
    mortgages: Vec<MortgagePayload>,
    life_events: Vec<LifeEventPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfilePayload {
    birth_year_month: Option<String>,
    spouse_birth_year_month: Option<String>,
    pension_start_age: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SettingsPayload {
    start_offset_months: Option<i32>,
    end_age: Option<u32>,
    pension_amount_single: Option<f64>,
    pension_amount_spouse: Option<f64>,
    transaction_cost_rate: Option<f64>,
    real_estate_tax_rate: Option<f64>,
    real_estate_evaluation_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ChildPayload {
    birth_year_month: Option<String>,
    label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IncomeStreamPayload {
    take_home_monthly: Option<f64>,
    raise_rate: Option<f64>,
    bonus_months: Vec<u32>,
    bonus_amount: Option<f64>,
    change_year_month: Option<String>,
    bonus_amount_after: Option<f64>,
    start_year_month: Option<String>,
    end_year_month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExpensePayload {
    amount_monthly: Option<f64>,
    inflation_rate: Option<f64>,
    category: Option<ApiExpenseCategory>,
    start_year_month: Option<String>,
    end_year_month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RentalPayload {
    id: Option<u64>,
    rent_monthly: Option<f64>,
    start_year_month: Option<String>,
    end_year_month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssetPayload {
    cash_balance: Option<f64>,
    investment_balance: Option<f64>,
    return_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MortgagePayload {
    purchased_year_month: Option<String>,
    building_price: Option<f64>,
    land_price: Option<f64>,
    down_payment: Option<f64>,
    annual_rate: Option<f64>,
    term_years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LifeEventPayload {
    amount: Option<f64>,
    year_month: Option<String>,
    category: Option<ApiLifeEventCategory>,
    repeat_interval_years: Option<u32>,
    stop_after_occurrences: Option<u32>,
    stop_after_age: Option<u32>,
    auto_toggle_key: Option<ApiAutoToggle>,
    target_rental_id: Option<u64>,
    building_price: Option<f64>,
    land_price: Option<f64>,
    down_payment: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn parse_month(raw: &str, field: &str) -> Result<YearMonth, String> {
    YearMonth::parse(raw).map_err(|_| format!("{field} must be a YYYY-MM year-month, got `{raw}`"))
}

fn required_month(raw: Option<&String>, field: &str) -> Result<YearMonth, String> {
    match raw {
        Some(raw) => parse_month(raw, field),
        None => Err(format!("{field} is required")),
    }
}

fn optional_month(raw: Option<&String>, field: &str) -> Result<Option<YearMonth>, String> {
    raw.map(|raw| parse_month(raw, field)).transpose()
}

fn record_window(
    start: Option<&String>,
    end: Option<&String>,
    record: &str,
) -> Result<MonthWindow, String> {
    let start = required_month(start, &format!("{record}.startYearMonth"))?;
    let end = optional_month(end, &format!("{record}.endYearMonth"))?;
    if let Some(end) = end {
        if end < start {
            return Err(format!("{record}.endYearMonth must not precede its start"));
        }
    }
    Ok(MonthWindow { start, end })
}

pub fn build_input(payload: SimulatePayload) -> Result<SimulationInput, String> {
    let current_year_month =
        required_month(payload.current_year_month.as_ref(), "currentYearMonth")?;

    let profile = Profile {
        birth: required_month(
            payload.profile.birth_year_month.as_ref(),
            "profile.birthYearMonth",
        )?,
        spouse_birth: optional_month(
            payload.profile.spouse_birth_year_month.as_ref(),
            "profile.spouseBirthYearMonth",
        )?,
        pension_start_age: payload.profile.pension_start_age.unwrap_or(65),
    };

    let settings = SimulationSettings {
        start_offset_months: payload.settings.start_offset_months.unwrap_or(0),
        end_age: payload.settings.end_age.unwrap_or(95),
        pension_amount_single: payload.settings.pension_amount_single.unwrap_or(65_000.0),
        pension_amount_spouse: payload.settings.pension_amount_spouse.unwrap_or(55_000.0),
        transaction_cost_rate: payload.settings.transaction_cost_rate.unwrap_or(1.1),
        real_estate_tax_rate: payload.settings.real_estate_tax_rate.unwrap_or(0.014),
        real_estate_evaluation_rate: payload
            .settings
            .real_estate_evaluation_rate
            .unwrap_or(0.7),
    };

    if settings.transaction_cost_rate < 1.0 {
        return Err("settings.transactionCostRate must be >= 1".to_string());
    }
    if !(0.0..=1.0).contains(&settings.real_estate_tax_rate) {
        return Err("settings.realEstateTaxRate must be between 0 and 1".to_string());
    }
    if !(0.0..=1.0).contains(&settings.real_estate_evaluation_rate) {
        return Err("settings.realEstateEvaluationRate must be between 0 and 1".to_string());
    }

    let mut children = Vec::with_capacity(payload.children.len());
    for (index, child) in payload.children.iter().enumerate() {
        children.push(Child {
            birth: required_month(
                child.birth_year_month.as_ref(),
                &format!("children[{index}].birthYearMonth"),
            )?,
            label: child.label.clone().unwrap_or_default(),
        });
    }

    let mut income_streams = Vec::with_capacity(payload.income_streams.len());
    for (index, stream) in payload.income_streams.iter().enumerate() {
        let record = format!("incomeStreams[{index}]");
        let take_home_monthly = stream
            .take_home_monthly
            .ok_or_else(|| format!("{record}.takeHomeMonthly is required"))?;
        let change = optional_month(
            stream.change_year_month.as_ref(),
            &format!("{record}.changeYearMonth"),
        )?;
        let bonus_change = match (change, stream.bonus_amount_after) {
            (Some(effective), Some(amount_after)) => Some(BonusPlanChange {
                effective,
                amount_after,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(format!(
                    "{record}.bonusAmountAfter is required when changeYearMonth is set"
                ));
            }
            (None, Some(_)) => {
                return Err(format!(
                    "{record}.changeYearMonth is required when bonusAmountAfter is set"
                ));
            }
        };
        income_streams.push(IncomeStream {
            take_home_monthly,
            raise_rate: stream.raise_rate.unwrap_or(0.0),
            bonus_months: stream.bonus_months.clone(),
            bonus_amount: stream.bonus_amount.unwrap_or(0.0),
            bonus_change,
            active: record_window(
                stream.start_year_month.as_ref(),
                stream.end_year_month.as_ref(),
                &record,
            )?,
        });
    }

    let mut expenses = Vec::with_capacity(payload.expenses.len());
    for (index, expense) in payload.expenses.iter().enumerate() {
        let record = format!("expenses[{index}]");
        expenses.push(Expense {
            amount_monthly: expense
                .amount_monthly
                .ok_or_else(|| format!("{record}.amountMonthly is required"))?,
            inflation_rate: expense.inflation_rate.unwrap_or(0.0),
            category: expense
                .category
                .map(ExpenseCategory::from)
                .unwrap_or(ExpenseCategory::Other),
            active: record_window(
                expense.start_year_month.as_ref(),
                expense.end_year_month.as_ref(),
                &record,
            )?,
        });
    }

    let mut rentals = Vec::with_capacity(payload.rentals.len());
    for (index, rental) in payload.rentals.iter().enumerate() {
        let record = format!("rentals[{index}]");
        rentals.push(Rental {
            id: rental.id.ok_or_else(|| format!("{record}.id is required"))?,
            rent_monthly: rental
                .rent_monthly
                .ok_or_else(|| format!("{record}.rentMonthly is required"))?,
            active: record_window(
                rental.start_year_month.as_ref(),
                rental.end_year_month.as_ref(),
                &record,
            )?,
        });
    }

    let assets = payload
        .assets
        .iter()
        .map(|asset| Asset {
            cash_balance: asset.cash_balance.unwrap_or(0.0),
            investment_balance: asset.investment_balance.unwrap_or(0.0),
            return_rate: asset.return_rate.unwrap_or(0.0),
        })
        .collect();

    let mut mortgages = Vec::with_capacity(payload.mortgages.len());
    for (index, mortgage) in payload.mortgages.iter().enumerate() {
        let record = format!("mortgages[{index}]");
        mortgages.push(Mortgage {
            purchased: required_month(
                mortgage.purchased_year_month.as_ref(),
                &format!("{record}.purchasedYearMonth"),
            )?,
            building_price: mortgage
                .building_price
                .ok_or_else(|| format!("{record}.buildingPrice is required"))?,
            land_price: mortgage
                .land_price
                .ok_or_else(|| format!("{record}.landPrice is required"))?,
            down_payment: mortgage
                .down_payment
                .ok_or_else(|| format!("{record}.downPayment is required"))?,
            annual_rate: mortgage.annual_rate.unwrap_or(0.0),
            term_years: mortgage.term_years.unwrap_or(35),
        });
    }

    let mut life_events = Vec::with_capacity(payload.life_events.len());
    for (index, event) in payload.life_events.iter().enumerate() {
        let record = format!("lifeEvents[{index}]");
        let category = event
            .category
            .ok_or_else(|| format!("{record}.category is required"))?;
        life_events.push(LifeEvent {
            amount: event.amount.unwrap_or(0.0),
            anchor: required_month(event.year_month.as_ref(), &format!("{record}.yearMonth"))?,
            category: category.into(),
            repeat_interval_years: event.repeat_interval_years,
            stop_after_occurrences: event.stop_after_occurrences,
            stop_after_age: event.stop_after_age,
            auto_toggle: event.auto_toggle_key.map(AutoToggle::from),
            target_rental_id: event.target_rental_id,
            building_price: event.building_price,
            land_price: event.land_price,
            down_payment: event.down_payment,
        });
    }

    Ok(SimulationInput {
        current_year_month,
        profile,
        settings,
        children,
        income_streams,
        expenses,
        rentals,
        assets,
        mortgages,
        life_events,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/simulate", post(simulate_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("lifeplan HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_handler(Json(payload): Json<SimulatePayload>) -> Response {
    let input = match build_input(payload) {
        Ok(input) => input,
        Err(msg) => {
            tracing::warn!("rejected simulate payload: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    match simulate_life_plan(&input) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => {
            tracing::warn!("simulation failed: {err}");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

pub fn run_simulate_file(path: &Path, recent_years: Option<u32>) -> Result<(), String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let payload: SimulatePayload =
        serde_json::from_str(&raw).map_err(|e| format!("invalid simulation payload: {e}"))?;
    let input = build_input(payload)?;
    let result = simulate_life_plan(&input).map_err(|e| e.to_string())?;
    print_projection(&input, &result, recent_years);
    Ok(())
}

fn visible_rows(months: &[MonthlyResult], recent_years: Option<u32>) -> &[MonthlyResult] {
    match recent_years {
        Some(years) => {
            let keep = years as usize * 12;
            &months[months.len().saturating_sub(keep)..]
        }
        None => months,
    }
}

fn amount_cell(value: f64) -> String {
    Money::new(value, "amount")
        .map(|m| m.grouped(Rounding::HalfUp))
        .unwrap_or_else(|_| value.to_string())
}

fn print_projection(
    input: &SimulationInput,
    result: &SimulationResult,
    recent_years: Option<u32>,
) {
    for mortgage in &input.mortgages {
        let principal = calculate_mortgage_principal(
            mortgage.building_price,
            mortgage.land_price,
            mortgage.down_payment,
            input.settings.transaction_cost_rate,
        );
        println!(
            "mortgage from {}: financed principal {}",
            mortgage.purchased,
            amount_cell(principal)
        );
    }

    println!(
        "{:>7} {:>4} {:>7} {:>13} {:>13} {:>13} {:>13} {:>13} {:>13} {:>13}",
        "month", "age", "spouse", "income", "expense", "events", "net", "cash", "invest", "total"
    );
    for row in visible_rows(&result.months, recent_years) {
        let spouse = row
            .spouse_age
            .map(|age| age.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>7} {:>4} {:>7} {:>13} {:>13} {:>13} {:>13} {:>13} {:>13} {:>13}",
            row.year_month.to_string(),
            row.age,
            spouse,
            amount_cell(row.total_income),
            amount_cell(row.total_expense),
            amount_cell(row.event_amount),
            amount_cell(row.net_cashflow),
            amount_cell(row.cash_balance),
            amount_cell(row.investment_balance),
            amount_cell(row.total_balance),
        );
    }

    match result.depletion_year_month {
        Some(month) => println!("assets first go negative in {month}"),
        None => println!("assets stay non-negative through the horizon"),
    }
}
