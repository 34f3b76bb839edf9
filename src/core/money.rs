use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use super::types::SimulationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Money(f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    HalfUp,
    HalfEven,
    TowardZero,
}

impl Money {
    pub const ZERO: Money = Money(0.0);

    pub fn new(value: f64, field: &str) -> Result<Self, SimulationError> {
        if !value.is_finite() {
            return Err(SimulationError::NonFiniteAmount {
                field: field.to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn rounded(self, mode: Rounding) -> Money {
        let value = match mode {
            Rounding::HalfUp => self.0.round(),
            Rounding::HalfEven => self.0.round_ties_even(),
            Rounding::TowardZero => self.0.trunc(),
        };
        Money(value)
    }

    pub fn grouped(self, mode: Rounding) -> String {
        let units = self.rounded(mode).0 as i64;
        let digits = units.unsigned_abs().to_string();
        let bytes = digits.as_bytes();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if units < 0 {
            out.push('-');
        }
        for (i, b) in bytes.iter().enumerate() {
            if i > 0 && (bytes.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(*b as char);
        }
        out
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Mul<f64> for Money {
    type Output = Money;

    fn mul(self, rhs: f64) -> Money {
        Money(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Money::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_values() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                Money::new(bad, "rent_monthly"),
                Err(SimulationError::NonFiniteAmount {
                    field: "rent_monthly".to_string()
                })
            );
        }
        assert!(Money::new(0.0, "rent_monthly").is_ok());
        assert!(Money::new(-120_000.5, "rent_monthly").is_ok());
    }

    #[test]
    fn arithmetic_behaves_like_plain_numbers() {
        let a = Money::new(1_500.0, "a").expect("finite");
        let b = Money::new(400.0, "b").expect("finite");
        assert_eq!((a + b).value(), 1_900.0);
        assert_eq!((a - b).value(), 1_100.0);
        assert_eq!((-b).value(), -400.0);
        assert_eq!((b * 2.5).value(), 1_000.0);
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.value(), 2_300.0);
    }

    #[test]
    fn rounding_modes_differ_on_ties() {
        let half = Money::new(2.5, "v").expect("finite");
        assert_eq!(half.rounded(Rounding::HalfUp).value(), 3.0);
        assert_eq!(half.rounded(Rounding::HalfEven).value(), 2.0);
        assert_eq!(half.rounded(Rounding::TowardZero).value(), 2.0);

        let negative_half = Money::new(-2.5, "v").expect("finite");
        assert_eq!(negative_half.rounded(Rounding::HalfUp).value(), -3.0);
        assert_eq!(negative_half.rounded(Rounding::HalfEven).value(), -2.0);
        assert_eq!(negative_half.rounded(Rounding::TowardZero).value(), -2.0);
    }

    #[test]
    fn groups_thousands_for_display() {
        let fmt = |v: f64| Money::new(v, "v").expect("finite").grouped(Rounding::HalfUp);
        assert_eq!(fmt(0.0), "0");
        assert_eq!(fmt(999.0), "999");
        assert_eq!(fmt(1_000.0), "1,000");
        assert_eq!(fmt(1_234_567.4), "1,234,567");
        assert_eq!(fmt(-1_234_567.8), "-1,234,568");
        assert_eq!(fmt(25_000_000.0), "25,000,000");
    }
}
