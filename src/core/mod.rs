mod engine;
mod event;
mod money;
mod month;
mod types;

pub use engine::{TimelinePoint, generate_monthly_timeline, simulate_life_plan};
pub use event::{calculate_mortgage_principal, calculate_real_estate_tax_monthly};
pub use money::{Money, Rounding};
pub use month::YearMonth;
pub use types::{
    Asset, AutoToggle, BonusPlanChange, Child, Expense, ExpenseCategory, IncomeStream, LifeEvent,
    LifeEventCategory, MonthWindow, MonthlyResult, Mortgage, Profile, Rental, SimulationError,
    SimulationInput, SimulationResult, SimulationSettings,
};
