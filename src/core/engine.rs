use super::event::{ExpandedEvents, calculate_real_estate_tax_monthly, expand_life_events};
use super::money::Money;
use super::month::{YearMonth, age_at};
use super::types::{
    MonthlyResult, Profile, SimulationError, SimulationInput, SimulationResult,
    SimulationSettings,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelinePoint {
    pub year_month: YearMonth,
    pub age: u32,
    pub spouse_age: Option<u32>,
}

pub fn generate_monthly_timeline(
    current: YearMonth,
    profile: &Profile,
    settings: &SimulationSettings,
) -> Result<Vec<TimelinePoint>, SimulationError> {
    let first = current.add_months(settings.start_offset_months);

    let first_age = age_at(profile.birth, first);
    if first_age < 0 {
        return Err(SimulationError::BirthAfterStart {
            birth: profile.birth,
            first,
        });
    }
    if first_age as u32 > settings.end_age {
        return Err(SimulationError::UnreachableEndAge {
            end_age: settings.end_age,
        });
    }
    if let Some(spouse_birth) = profile.spouse_birth {
        if age_at(spouse_birth, first) < 0 {
            return Err(SimulationError::BirthAfterStart {
                birth: spouse_birth,
                first,
            });
        }
    }

    let mut points = Vec::new();
    let mut month = first;
    loop {
        let age = age_at(profile.birth, month) as u32;
        let spouse_age = profile
            .spouse_birth
            .map(|birth| age_at(birth, month) as u32);
        points.push(TimelinePoint {
            year_month: month,
            age,
            spouse_age,
        });
        if age >= settings.end_age {
            break;
        }
        month = month.add_months(1);
    }
    Ok(points)
}

// One compounding step per full elapsed year since the record's own start.
fn compounded(amount: f64, annual_rate: f64, start: YearMonth, at: YearMonth) -> f64 {
    let elapsed_months = at.months_since(start);
    if elapsed_months < 12 || annual_rate == 0.0 {
        return amount;
    }
    amount * (1.0 + annual_rate).powi((elapsed_months / 12) as i32)
}

fn income_for_month(
    input: &SimulationInput,
    point: &TimelinePoint,
    events: &ExpandedEvents,
) -> f64 {
    let month = point.year_month;
    let mut total = 0.0;

    for stream in &input.income_streams {
        if !stream.active.contains(month) {
            continue;
        }
        total += compounded(
            stream.take_home_monthly,
            stream.raise_rate,
            stream.active.start,
            month,
        );
        if stream.bonus_months.contains(&month.month()) {
            total += match &stream.bonus_change {
                Some(change) if month >= change.effective => change.amount_after,
                _ => stream.bonus_amount,
            };
        }
    }

    let threshold = input.profile.pension_start_age;
    if point.age >= threshold {
        total += input.settings.pension_amount_single;
    }
    if point.spouse_age.is_some_and(|age| age >= threshold) {
        total += input.settings.pension_amount_spouse;
    }

    total + events.retirement_bonus_at(month)
}

fn expense_for_month(
    input: &SimulationInput,
    point: &TimelinePoint,
    events: &ExpandedEvents,
) -> f64 {
    let month = point.year_month;
    let mut total = 0.0;

    for expense in &input.expenses {
        if expense.active.contains(month) {
            total += compounded(
                expense.amount_monthly,
                expense.inflation_rate,
                expense.active.start,
                month,
            );
        }
    }

    for rental in &input.rentals {
        if rental.active.contains(month) && !events.rent_stopped(rental.id, month) {
            total += rental.rent_monthly;
        }
    }

    total += events.real_estate_tax_at(month);
    for mortgage in &input.mortgages {
        if mortgage.purchased <= month {
            total += calculate_real_estate_tax_monthly(
                mortgage.building_price,
                mortgage.land_price,
                input.settings.real_estate_evaluation_rate,
                input.settings.real_estate_tax_rate,
            );
        }
    }

    total
}

#[derive(Debug, Clone, Copy)]
struct Ledger {
    cash: f64,
    investment: f64,
    return_rate: f64,
}

impl Ledger {
    fn seed(input: &SimulationInput) -> Self {
        let assets = &input.assets;
        let cash = assets.iter().map(|a| a.cash_balance).sum();
        let investment: f64 = assets.iter().map(|a| a.investment_balance).sum();
        let return_rate = if assets.is_empty() {
            0.0
        } else if investment != 0.0 {
            assets
                .iter()
                .map(|a| a.return_rate * a.investment_balance)
                .sum::<f64>()
                / investment
        } else {
            assets.iter().map(|a| a.return_rate).sum::<f64>() / assets.len() as f64
        };
        Self {
            cash,
            investment,
            return_rate,
        }
    }

    // Settle the month's cashflow first, then grow the investment side.
    // Deficits pin cash at zero and draw the remainder from investment,
    // which may go negative.
    fn advance(&mut self, net_cashflow: f64) {
        let settled = self.cash + net_cashflow;
        if settled >= 0.0 {
            self.cash = settled;
        } else {
            self.cash = 0.0;
            self.investment += settled;
        }
        self.investment *= 1.0 + self.return_rate;
    }

    fn total(&self) -> f64 {
        self.cash + self.investment
    }
}

fn finite_amount(value: f64, field: &str) -> Result<(), SimulationError> {
    Money::new(value, field).map(|_| ())
}

fn finite_rate(value: f64, field: &str) -> Result<(), SimulationError> {
    if !value.is_finite() {
        return Err(SimulationError::NonFiniteAmount {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_input(input: &SimulationInput) -> Result<(), SimulationError> {
    let settings = &input.settings;
    finite_amount(settings.pension_amount_single, "settings.pension_amount_single")?;
    finite_amount(settings.pension_amount_spouse, "settings.pension_amount_spouse")?;
    finite_rate(settings.transaction_cost_rate, "settings.transaction_cost_rate")?;
    finite_rate(settings.real_estate_tax_rate, "settings.real_estate_tax_rate")?;
    finite_rate(
        settings.real_estate_evaluation_rate,
        "settings.real_estate_evaluation_rate",
    )?;

    for stream in &input.income_streams {
        finite_amount(stream.take_home_monthly, "income_stream.take_home_monthly")?;
        finite_amount(stream.bonus_amount, "income_stream.bonus_amount")?;
        finite_rate(stream.raise_rate, "income_stream.raise_rate")?;
        if let Some(change) = &stream.bonus_change {
            finite_amount(change.amount_after, "income_stream.bonus_amount_after")?;
        }
        for &bonus_month in &stream.bonus_months {
            if !(1..=12).contains(&bonus_month) {
                return Err(SimulationError::BonusMonthOutOfRange(bonus_month));
            }
        }
    }

    for expense in &input.expenses {
        finite_amount(expense.amount_monthly, "expense.amount_monthly")?;
        finite_rate(expense.inflation_rate, "expense.inflation_rate")?;
    }

    for rental in &input.rentals {
        finite_amount(rental.rent_monthly, "rental.rent_monthly")?;
    }

    for asset in &input.assets {
        finite_amount(asset.cash_balance, "asset.cash_balance")?;
        finite_amount(asset.investment_balance, "asset.investment_balance")?;
        finite_rate(asset.return_rate, "asset.return_rate")?;
        if !(-1.0..=1.0).contains(&asset.return_rate) {
            return Err(SimulationError::ReturnRateOutOfRange {
                rate: asset.return_rate,
            });
        }
    }

    for mortgage in &input.mortgages {
        finite_amount(mortgage.building_price, "mortgage.building_price")?;
        finite_amount(mortgage.land_price, "mortgage.land_price")?;
        finite_amount(mortgage.down_payment, "mortgage.down_payment")?;
        finite_rate(mortgage.annual_rate, "mortgage.annual_rate")?;
    }

    for event in &input.life_events {
        finite_amount(event.amount, "life_event.amount")?;
        if let Some(price) = event.building_price {
            finite_amount(price, "life_event.building_price")?;
        }
        if let Some(price) = event.land_price {
            finite_amount(price, "life_event.land_price")?;
        }
        if let Some(payment) = event.down_payment {
            finite_amount(payment, "life_event.down_payment")?;
        }
    }

    Ok(())
}

pub fn simulate_life_plan(input: &SimulationInput) -> Result<SimulationResult, SimulationError> {
    validate_input(input)?;

    let timeline =
        generate_monthly_timeline(input.current_year_month, &input.profile, &input.settings)?;
    let horizon_start = timeline[0].year_month;
    let horizon_end = timeline[timeline.len() - 1].year_month;

    let events = expand_life_events(
        &input.life_events,
        &input.rentals,
        &input.profile,
        &input.settings,
        horizon_start,
        horizon_end,
    )?;

    let mut ledger = Ledger::seed(input);
    let mut months = Vec::with_capacity(timeline.len());
    for point in &timeline {
        let total_income = income_for_month(input, point, &events);
        let total_expense = expense_for_month(input, point, &events);
        let event_amount = events.other_amount_at(point.year_month);
        let net_cashflow = total_income - total_expense + event_amount;
        ledger.advance(net_cashflow);
        months.push(MonthlyResult {
            year_month: point.year_month,
            age: point.age,
            spouse_age: point.spouse_age,
            total_income,
            total_expense,
            event_amount,
            net_cashflow,
            cash_balance: ledger.cash,
            investment_balance: ledger.investment,
            total_balance: ledger.total(),
        });
    }

    let depletion_year_month = months
        .iter()
        .find(|row| row.total_balance < 0.0)
        .map(|row| row.year_month);

    Ok(SimulationResult {
        months,
        depletion_year_month,
    })
}
