use super::month::{YearMonth, age_at};
use super::types::{
    AutoToggle, LifeEvent, LifeEventCategory, Profile, Rental, SimulationError,
    SimulationSettings,
};

#[derive(Debug, Clone, Copy)]
pub(crate) struct EventOccurrence {
    pub month: YearMonth,
    pub amount: f64,
    pub category: LifeEventCategory,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct HousingPurchase {
    pub month: YearMonth,
    pub monthly_tax: f64,
    pub stops_rental: Option<u64>,
}

#[derive(Debug, Default)]
pub(crate) struct ExpandedEvents {
    pub occurrences: Vec<EventOccurrence>,
    pub purchases: Vec<HousingPurchase>,
}

impl ExpandedEvents {
    pub fn retirement_bonus_at(&self, month: YearMonth) -> f64 {
        self.occurrences
            .iter()
            .filter(|o| o.month == month && o.category == LifeEventCategory::RetirementBonus)
            .map(|o| o.amount)
            .sum()
    }

    pub fn other_amount_at(&self, month: YearMonth) -> f64 {
        self.occurrences
            .iter()
            .filter(|o| o.month == month && o.category != LifeEventCategory::RetirementBonus)
            .map(|o| o.amount)
            .sum()
    }

    pub fn rent_stopped(&self, rental_id: u64, month: YearMonth) -> bool {
        self.purchases
            .iter()
            .any(|p| p.stops_rental == Some(rental_id) && p.month <= month)
    }

    pub fn real_estate_tax_at(&self, month: YearMonth) -> f64 {
        self.purchases
            .iter()
            .filter(|p| p.month <= month)
            .map(|p| p.monthly_tax)
            .sum()
    }
}

pub fn calculate_mortgage_principal(
    building_price: f64,
    land_price: f64,
    down_payment: f64,
    transaction_cost_rate: f64,
) -> f64 {
    (building_price + land_price - down_payment) * transaction_cost_rate
}

pub fn calculate_real_estate_tax_monthly(
    building_price: f64,
    land_price: f64,
    evaluation_rate: f64,
    tax_rate: f64,
) -> f64 {
    (building_price + land_price) * evaluation_rate * tax_rate / 12.0
}

struct ResolvedHousing {
    monthly_tax: f64,
    stops_rental: Option<u64>,
}

// Purchase side effects are resolved once per event, not per occurrence:
// missing required fields and dangling rental references are fatal even
// when the anchor falls outside the projected horizon.
fn resolve_housing(
    event: &LifeEvent,
    rentals: &[Rental],
    settings: &SimulationSettings,
) -> Result<ResolvedHousing, SimulationError> {
    let building_price = event.building_price.ok_or(
        SimulationError::IncompleteHousingPurchase {
            missing: "building_price",
        },
    )?;
    let land_price = event
        .land_price
        .ok_or(SimulationError::IncompleteHousingPurchase {
            missing: "land_price",
        })?;
    event
        .down_payment
        .ok_or(SimulationError::IncompleteHousingPurchase {
            missing: "down_payment",
        })?;

    let stops_rental = match (event.auto_toggle, event.target_rental_id) {
        (Some(AutoToggle::HousingPurchaseStopRent), Some(rental_id)) => Some(rental_id),
        _ => None,
    };
    if let Some(rental_id) = event.target_rental_id {
        if !rentals.iter().any(|r| r.id == rental_id) {
            return Err(SimulationError::UnknownRental { rental_id });
        }
    }

    Ok(ResolvedHousing {
        monthly_tax: calculate_real_estate_tax_monthly(
            building_price,
            land_price,
            settings.real_estate_evaluation_rate,
            settings.real_estate_tax_rate,
        ),
        stops_rental,
    })
}

// All months the event fires at, from its anchor up to the horizon end.
// Months before the timeline start are kept here (a past housing purchase
// still shapes rent and tax) and filtered by the caller for cash effects.
fn occurrence_months(
    event: &LifeEvent,
    profile: &Profile,
    horizon_end: YearMonth,
) -> Vec<YearMonth> {
    let interval_years = match event.repeat_interval_years {
        Some(years) if years > 0 => years,
        _ => {
            return if event.anchor <= horizon_end {
                vec![event.anchor]
            } else {
                Vec::new()
            };
        }
    };

    if event.stop_after_occurrences == Some(0) {
        return Vec::new();
    }

    let mut months = Vec::new();
    let mut month = event.anchor;
    let mut count = 0u32;
    while month <= horizon_end {
        if let Some(limit) = event.stop_after_age {
            if age_at(profile.birth, month) > limit as i32 {
                break;
            }
        }
        months.push(month);
        count += 1;
        if event.stop_after_occurrences.is_some_and(|limit| count >= limit) {
            break;
        }
        month = month.add_months(interval_years as i32 * 12);
    }
    months
}

pub(crate) fn expand_life_events(
    events: &[LifeEvent],
    rentals: &[Rental],
    profile: &Profile,
    settings: &SimulationSettings,
    horizon_start: YearMonth,
    horizon_end: YearMonth,
) -> Result<ExpandedEvents, SimulationError> {
    let mut expanded = ExpandedEvents::default();
    for event in events {
        let housing = if event.category == LifeEventCategory::HousingPurchase {
            Some(resolve_housing(event, rentals, settings)?)
        } else {
            None
        };

        for month in occurrence_months(event, profile, horizon_end) {
            if month >= horizon_start {
                expanded.occurrences.push(EventOccurrence {
                    month,
                    amount: event.amount,
                    category: event.category,
                });
            }
            if let Some(housing) = &housing {
                expanded.purchases.push(HousingPurchase {
                    month,
                    monthly_tax: housing.monthly_tax,
                    stops_rental: housing.stops_rental,
                });
            }
        }
    }
    Ok(expanded)
}
