//! Sunset time of day from the almanac sunrise/sunset equation.
//!
//! Accurate to a couple of minutes between the polar circles, which is well
//! inside what a lighting schedule needs.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime};

use crate::error::Error;

/// Official sunset: upper limb on the horizon, with refraction.
const ZENITH_DEG: f64 = 90.833;

pub trait SunsetSource {
    /// Local time of day of sunset on `date`, expressed in `offset`.
    fn sunset(&self, date: NaiveDate, offset: FixedOffset) -> Result<NaiveTime, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarCalculator {
    pub latitude: f64,
    pub longitude: f64,
}

impl SolarCalculator {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Sunset in fractional UTC hours, `None` when the sun does not set.
    fn sunset_utc_hours(&self, date: NaiveDate) -> Option<f64> {
        let day_of_year = f64::from(date.ordinal());
        let lng_hour = self.longitude / 15.0;
        let t = day_of_year + (18.0 - lng_hour) / 24.0;

        let mean_anomaly = 0.9856 * t - 3.289;
        let true_longitude = (mean_anomaly
            + 1.916 * sin_deg(mean_anomaly)
            + 0.020 * sin_deg(2.0 * mean_anomaly)
            + 282.634)
            .rem_euclid(360.0);

        let mut right_ascension = (0.91764 * tan_deg(true_longitude))
            .atan()
            .to_degrees()
            .rem_euclid(360.0);
        // Same quadrant as the true longitude.
        right_ascension += (true_longitude / 90.0).floor() * 90.0
            - (right_ascension / 90.0).floor() * 90.0;
        let right_ascension_hours = right_ascension / 15.0;

        let sin_dec = 0.39782 * sin_deg(true_longitude);
        let cos_dec = sin_dec.asin().cos();

        let cos_hour_angle = (cos_deg(ZENITH_DEG) - sin_dec * sin_deg(self.latitude))
            / (cos_dec * cos_deg(self.latitude));
        if !(-1.0..=1.0).contains(&cos_hour_angle) {
            return None;
        }

        let hour_angle = cos_hour_angle.acos().to_degrees() / 15.0;
        let local_mean_time = hour_angle + right_ascension_hours - 0.06571 * t - 6.622;
        Some((local_mean_time - lng_hour).rem_euclid(24.0))
    }
}

impl SunsetSource for SolarCalculator {
    fn sunset(&self, date: NaiveDate, offset: FixedOffset) -> Result<NaiveTime, Error> {
        let utc_hours = self.sunset_utc_hours(date).ok_or(Error::NoSunset {
            date,
            latitude: self.latitude,
        })?;

        let offset_hours = f64::from(offset.local_minus_utc()) / 3600.0;
        let local_hours = (utc_hours + offset_hours).rem_euclid(24.0);
        let seconds = (local_hours * 3600.0).round() as u32 % 86_400;

        NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
            .ok_or_else(|| Error::InvalidTimeWindow(format!("sunset at {local_hours}h")))
    }
}

fn sin_deg(value: f64) -> f64 {
    value.to_radians().sin()
}

fn cos_deg(value: f64) -> f64 {
    value.to_radians().cos()
}

fn tan_deg(value: f64) -> f64 {
    value.to_radians().tan()
}
