//! Age-stratified population model.
//!
//! A pyramid is twenty five-year cohorts (`0, 5, ..., 95+`), each with a male
//! and a female count. [`PopulationPyramid::tick`] advances one month:
//!
//! 1. Aging: every band hands 1/60 of its start-of-month count to the next
//!    band. The 95+ band keeps its people.
//! 2. Births: `min(men, women)` aged 20..=55, times the birth rate, spread over
//!    a 75-year reproductive lifetime. Boys get a +2% skew.
//! 3. Deaths: a per-band monthly fraction that climbs steeply as age nears
//!    life expectancy. Men die 2% more often.
//!
//! Total population is always summed from the bands.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

/// Number of five-year age bands.
pub const BAND_COUNT: usize = 20;

/// Width of one age band in years.
pub const BAND_YEARS: u8 = 5;

/// Youngest age counted as reproductive (and conscriptable).
pub const REPRODUCTIVE_AGE_MIN: u8 = 20;

/// Oldest band lower bound counted as reproductive.
pub const REPRODUCTIVE_AGE_MAX: u8 = 55;

/// Months a person spends in a band on average; 1/60 of a band ages out each month.
pub const MONTHS_PER_BAND: u64 = 60;

/// Baseline sustainable density at urbanization level 1, before the ×2 factor.
pub const BASE_MAX_DENSITY: f64 = 10_000.0;

/// Starting headcount per sex in the youngest band of a fresh pyramid.
pub const STARTING_YOUNGEST_BAND: u64 = 2_000;

/// One five-year cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    /// Lower bound of the band, in years.
    pub age: u8,
    /// Men in this band.
    pub male: u64,
    /// Women in this band.
    pub female: u64,
}

impl AgeBand {
    /// Men plus women.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.male + self.female
    }

    /// Whether this band is of reproductive (and fighting) age.
    #[must_use]
    pub const fn is_reproductive(&self) -> bool {
        self.age >= REPRODUCTIVE_AGE_MIN && self.age <= REPRODUCTIVE_AGE_MAX
    }
}

/// Sustainable density for an urbanization level.
#[must_use]
pub fn max_density(urbanization: u32) -> f64 {
    BASE_MAX_DENSITY * f64::from(urbanization.max(1)) * 2.0
}

/// Relative birth rate, floored at 0.1.
///
/// Crowding lowers it and a strong economy raises it.
#[must_use]
pub fn birth_rate(density: f64, max_density: f64, economy: u32) -> f64 {
    (1.0 - density * 5.0 / max_density + f64::from(economy) * 0.05).max(0.1)
}

/// Life expectancy in years.
#[must_use]
pub fn life_expectancy(density: f64, max_density: f64, economy: u32) -> f64 {
    75.0 - density / max_density + f64::from(economy) * 0.1
}

/// Fraction of a band that dies in one month.
#[must_use]
pub fn death_rate(age: u8, life_expectancy: f64) -> f64 {
    let x = (f64::from(age) / life_expectancy).tanh() / 3.0;
    x.powf(2.5) / 3.5 + 0.001 / 3.5
}

/// Population of one faction, by age and sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationPyramid {
    bands: [AgeBand; BAND_COUNT],
    months: u32,
}

impl Default for PopulationPyramid {
    /// A young population that thins out linearly with age.
    fn default() -> Self {
        let mut pyramid = Self::empty();
        for (i, band) in pyramid.bands.iter_mut().enumerate() {
            let count = STARTING_YOUNGEST_BAND * (BAND_COUNT - i) as u64 / BAND_COUNT as u64;
            band.male = count;
            band.female = count;
        }
        pyramid
    }
}

impl PopulationPyramid {
    /// A pyramid with every band at zero.
    #[must_use]
    pub fn empty() -> Self {
        let mut bands = [AgeBand {
            age: 0,
            male: 0,
            female: 0,
        }; BAND_COUNT];
        for (i, band) in bands.iter_mut().enumerate() {
            band.age = i as u8 * BAND_YEARS;
        }
        Self { bands, months: 0 }
    }

    /// Build a pyramid from `(male, female)` counts, youngest band first.
    #[must_use]
    pub fn from_counts(counts: &[(u64, u64); BAND_COUNT]) -> Self {
        let mut pyramid = Self::empty();
        for (band, &(male, female)) in pyramid.bands.iter_mut().zip(counts) {
            band.male = male;
            band.female = female;
        }
        pyramid
    }

    /// The bands, youngest first.
    #[must_use]
    pub const fn bands(&self) -> &[AgeBand; BAND_COUNT] {
        &self.bands
    }

    /// Months simulated so far.
    #[must_use]
    pub const fn months(&self) -> u32 {
        self.months
    }

    /// Sum of every band.
    #[must_use]
    pub fn total_population(&self) -> u64 {
        self.bands.iter().map(AgeBand::total).sum()
    }

    /// People aged 20..=55 (band lower bounds).
    #[must_use]
    pub fn reproductive_population(&self) -> u64 {
        self.bands
            .iter()
            .filter(|band| band.is_reproductive())
            .map(AgeBand::total)
            .sum()
    }

    /// Advance one month.
    pub fn tick(&mut self, economy: u32, density: u64, urbanization: u32) {
        self.months += 1;
        self.age_bands();

        let max_density = max_density(urbanization);
        let density = density as f64;

        let births = self.births(birth_rate(density, max_density, economy));
        self.bands[0].male += births + births / 50;
        self.bands[0].female += births;

        let life_expectancy = life_expectancy(density, max_density, economy);
        log::debug!("births this month: {births}, life expectancy: {life_expectancy:.2}");

        for band in &mut self.bands {
            let rate = death_rate(band.age, life_expectancy);
            let male_deaths = (band.male as f64 * rate) as u64;
            let female_deaths = (band.female as f64 * rate) as u64;
            band.male = band.male.saturating_sub(male_deaths + male_deaths / 50);
            band.female = band.female.saturating_sub(female_deaths);
        }
    }

    fn age_bands(&mut self) {
        let mut outflow = [(0u64, 0u64); BAND_COUNT];
        for (i, band) in self.bands.iter().enumerate().take(BAND_COUNT - 1) {
            outflow[i] = (band.male / MONTHS_PER_BAND, band.female / MONTHS_PER_BAND);
        }
        for i in 0..BAND_COUNT - 1 {
            let (male, female) = outflow[i];
            self.bands[i].male -= male;
            self.bands[i].female -= female;
            self.bands[i + 1].male += male;
            self.bands[i + 1].female += female;
        }
    }

    fn births(&self, birth_rate: f64) -> u64 {
        let (men, women) = self
            .bands
            .iter()
            .filter(|band| band.is_reproductive())
            .fold((0u64, 0u64), |(m, f), band| (m + band.male, f + band.female));
        let parents = men.min(women) as f64;
        (parents * birth_rate / 12.0 / 75.0) as u64
    }

    /// Remove combat losses from the fighting-age bands.
    ///
    /// Losses are spread evenly over the 20..=55 bands and both sexes; any
    /// remainder goes to the youngest of those buckets. Bands never go below
    /// zero, so removing more people than exist empties them.
    pub fn remove_casualties(&mut self, casualties: u64) {
        let buckets = self.bands.iter().filter(|b| b.is_reproductive()).count() as u64 * 2;
        if buckets == 0 || casualties == 0 {
            return;
        }
        let share = casualties / buckets;
        let mut remainder = casualties % buckets;

        for band in self.bands.iter_mut().filter(|b| b.is_reproductive()) {
            for count in [&mut band.male, &mut band.female] {
                let extra = u64::from(remainder > 0);
                remainder -= extra;
                *count = count.saturating_sub(share + extra);
            }
        }
    }
}
