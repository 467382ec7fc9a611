use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const KILOWATT_HOURS_PER_MEGAWATT_HOUR: u32 = 1_000;
pub const TERAJOULES_PER_MEGAWATT_HOUR: f64 = 0.0036;
pub const SQUARE_METRES_PER_SQUARE_KILOMETRE: u32 = 1_000_000;

/// EPSG code of Irish Transverse Mercator, the projected reference system shared by building
/// coordinates and boundary polygons.
pub const IRISH_TRANSVERSE_MERCATOR_EPSG: u32 = 2157;

pub(crate) fn kwh_to_mwh(kwh: f64) -> f64 {
    kwh / KILOWATT_HOURS_PER_MEGAWATT_HOUR as f64
}

pub(crate) fn mwh_to_tj(mwh: f64) -> f64 {
    mwh * TERAJOULES_PER_MEGAWATT_HOUR
}

pub(crate) fn m2_to_km2(m2: f64) -> f64 {
    m2 / SQUARE_METRES_PER_SQUARE_KILOMETRE as f64
}

// 5 year average for Dublin Airport between 2015 and 2020
pub const DUBLIN_AIRPORT_DEGREE_DAYS: DegreeDays = DegreeDays(2175.);
// degree days the CIBSE TM46 benchmarks were derived against
pub const TM46_DEGREE_DAYS: DegreeDays = DegreeDays(2021.);

/// An annual heating degree-day total. Always strictly positive, as degree-day totals are used as
/// the denominator of climate scaling factors.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DegreeDays(f64);

impl DegreeDays {
    pub fn new(total: f64) -> Result<Self, DegreeDaysError> {
        if !total.is_finite() || total <= 0. {
            return Err(DegreeDaysError::NotPositive(total));
        }

        Ok(Self(total))
    }

    /// Factor by which a weather-dependent intensity measured in the `reference` climate is
    /// scaled to represent this climate.
    pub fn ratio_to(&self, reference: DegreeDays) -> f64 {
        self.0 / reference.0
    }
}

impl TryFrom<f64> for DegreeDays {
    type Error = DegreeDaysError;

    fn try_from(total: f64) -> Result<Self, Self::Error> {
        Self::new(total)
    }
}

impl From<DegreeDays> for f64 {
    fn from(degree_days: DegreeDays) -> Self {
        degree_days.0
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DegreeDaysError {
    #[error("Degree days must be a finite number greater than zero, but {0} was given")]
    NotPositive(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_convert_kwh_to_mwh() {
        assert_eq!(kwh_to_mwh(2500.), 2.5);
    }

    #[rstest]
    fn should_convert_mwh_to_tj() {
        assert_relative_eq!(mwh_to_tj(1000.), 3.6);
    }

    #[rstest]
    fn should_convert_m2_to_km2() {
        assert_eq!(m2_to_km2(2_500_000.), 2.5);
    }

    mod degree_days {
        use super::*;
        use pretty_assertions::assert_eq;

        #[rstest]
        fn test_ratio_of_dublin_to_tm46() {
            let dublin = DegreeDays::new(2175.).unwrap();
            let tm46 = DegreeDays::new(2021.).unwrap();
            assert_relative_eq!(dublin.ratio_to(tm46), 1.0761999, epsilon = 1e-7);
        }

        #[rstest]
        #[case(0.)]
        #[case(-1.)]
        #[case(f64::NAN)]
        #[case(f64::INFINITY)]
        fn test_invalid_degree_days(#[case] total: f64) {
            assert!(matches!(
                DegreeDays::new(total),
                Err(DegreeDaysError::NotPositive(_))
            ));
        }

        #[rstest]
        fn test_deserialize_rejects_zero() {
            assert!(serde_json::from_str::<DegreeDays>("0").is_err());
            assert_eq!(
                serde_json::from_str::<DegreeDays>("2175").unwrap(),
                DegreeDays(2175.)
            );
        }
    }
}
