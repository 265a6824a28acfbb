use crate::error::CovmobError;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Absolute susceptible, infected and recovered counts of one population.
///
/// Values are real valued and never clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SirState {
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl SirState {
    pub fn new(susceptible: f64, infected: f64, recovered: f64) -> Self {
        Self {
            susceptible,
            infected,
            recovered,
        }
    }

    /// N = S + I + R
    pub fn population(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.susceptible * factor,
            self.infected * factor,
            self.recovered * factor,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.susceptible.is_finite() && self.infected.is_finite() && self.recovered.is_finite()
    }

    /// One forward Euler step with unit time step.
    ///
    /// ```text
    /// dS = -b*S*I/N
    /// dI =  b*S*I/N - g*I
    /// dR =  g*I
    /// ```
    pub fn step(&self, params: &SirParams) -> Result<Self, CovmobError> {
        let population = self.population();
        if population == 0.0 {
            return Err(CovmobError::ZeroPopulation(format!("{:?}", self)));
        }

        let contagion = params.infection_rate * self.susceptible * self.infected / population;
        let recovery = params.recovery_rate * self.infected;
        let next = Self::new(
            self.susceptible - contagion,
            self.infected + contagion - recovery,
            self.recovered + recovery,
        );

        if !next.is_finite() {
            return Err(CovmobError::NonFinite(format!("SIR step from {:?}", self)));
        }
        Ok(next)
    }
}

impl Add for SirState {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.susceptible + rhs.susceptible,
            self.infected + rhs.infected,
            self.recovered + rhs.recovered,
        )
    }
}

impl Sub for SirState {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.susceptible - rhs.susceptible,
            self.infected - rhs.infected,
            self.recovered - rhs.recovered,
        )
    }
}

impl AddAssign for SirState {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for SirState {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// Transition rates of the SIR model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirParams {
    /// New infections per infected individual and time step (beta)
    pub infection_rate: f64,
    /// Share of the infected that recover or die per time step (gamma)
    pub recovery_rate: f64,
}

impl SirParams {
    pub fn new(infection_rate: f64, recovery_rate: f64) -> Self {
        Self {
            infection_rate,
            recovery_rate,
        }
    }

    /// Basic reproduction number beta / gamma.
    pub fn r0(&self) -> f64 {
        self.infection_rate / self.recovery_rate
    }
}

/// Time series of one population, all vectors have equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SirSeries {
    pub susceptible: Vec<f64>,
    pub infected: Vec<f64>,
    pub recovered: Vec<f64>,
    /// Step index 0..=timeframe
    pub scale: Vec<usize>,
}

impl SirSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            susceptible: Vec::with_capacity(capacity),
            infected: Vec::with_capacity(capacity),
            recovered: Vec::with_capacity(capacity),
            scale: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, step: usize, state: SirState) {
        self.susceptible.push(state.susceptible);
        self.infected.push(state.infected);
        self.recovered.push(state.recovered);
        self.scale.push(step);
    }

    pub fn len(&self) -> usize {
        self.scale.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scale.is_empty()
    }

    pub fn state_at(&self, step: usize) -> Option<SirState> {
        Some(SirState::new(
            *self.susceptible.get(step)?,
            *self.infected.get(step)?,
            *self.recovered.get(step)?,
        ))
    }

    pub fn last(&self) -> Option<SirState> {
        self.state_at(self.len().checked_sub(1)?)
    }
}

/// Runs the SIR model for one isolated population.
///
/// Returns `timeframe + 1` values per compartment, starting with `initial`.
///
/// # Example
///
/// ```
/// use covmob_rs::model::{SirParams, SirState, closed_sir};
///
/// # fn main() -> Result<(), covmob_rs::CovmobError> {
/// let series = closed_sir(SirState::new(990.0, 10.0, 0.0), &SirParams::new(0.3, 0.1), 1)?;
/// assert!((series.susceptible[1] - 987.03).abs() < 1e-9);
/// assert!((series.infected[1] - 11.97).abs() < 1e-9);
/// assert!((series.recovered[1] - 1.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
pub fn closed_sir(
    initial: SirState,
    params: &SirParams,
    timeframe: usize,
) -> Result<SirSeries, CovmobError> {
    let mut series = SirSeries::with_capacity(timeframe + 1);
    let mut state = initial;
    series.push(0, state);

    for step in 1..=timeframe {
        state = state.step(params)?;
        series.push(step, state);
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step_scenario() -> Result<(), CovmobError> {
        let series = closed_sir(SirState::new(990.0, 10.0, 0.0), &SirParams::new(0.3, 0.1), 1)?;

        assert_eq!(series.scale, vec![0, 1]);
        assert_eq!(series.susceptible[0], 990.0);
        assert!((series.susceptible[1] - 987.03).abs() < 1e-9);
        assert!((series.infected[1] - 11.97).abs() < 1e-9);
        assert!((series.recovered[1] - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_series_lengths() -> Result<(), CovmobError> {
        let series = closed_sir(SirState::new(500.0, 5.0, 0.0), &SirParams::new(0.2, 0.05), 30)?;

        assert_eq!(series.len(), 31);
        assert_eq!(series.susceptible.len(), 31);
        assert_eq!(series.infected.len(), 31);
        assert_eq!(series.recovered.len(), 31);
        assert_eq!(series.scale.last(), Some(&30));

        let empty = closed_sir(SirState::new(1.0, 0.0, 0.0), &SirParams::new(0.2, 0.05), 0)?;
        assert_eq!(empty.len(), 1);
        Ok(())
    }

    #[test]
    fn test_population_is_conserved() -> Result<(), CovmobError> {
        let initial = SirState::new(83_000.0, 1_250.0, 430.0);
        for (beta, gamma) in [(0.0, 0.0), (0.3, 0.1), (0.9, 0.02), (0.05, 0.9)] {
            let series = closed_sir(initial, &SirParams::new(beta, gamma), 200)?;
            for t in 0..series.len() {
                let total = series.state_at(t).map(|s| s.population()).unwrap_or_default();
                assert!((total - initial.population()).abs() < 1e-6 * initial.population());
            }
        }
        Ok(())
    }

    #[test]
    fn test_no_infection_only_recovers() -> Result<(), CovmobError> {
        let series = closed_sir(SirState::new(900.0, 100.0, 0.0), &SirParams::new(0.0, 0.2), 50)?;

        for t in 1..series.len() {
            assert!(series.infected[t] <= series.infected[t - 1]);
            assert!(series.recovered[t] >= series.recovered[t - 1]);
            assert_eq!(series.susceptible[t], 900.0);
        }
        Ok(())
    }

    #[test]
    fn test_zero_population_is_reported() {
        let result = SirState::default().step(&SirParams::new(0.3, 0.1));
        assert!(matches!(result, Err(CovmobError::ZeroPopulation(_))));
    }

    #[test]
    fn test_non_finite_is_reported() {
        let state = SirState::new(f64::MAX, f64::MAX, 0.0);
        let result = state.step(&SirParams::new(0.3, 0.1));
        assert!(matches!(result, Err(CovmobError::NonFinite(_))));
    }

    #[test]
    fn test_state_arithmetic() {
        let mut a = SirState::new(10.0, 2.0, 1.0);
        a += SirState::new(1.0, 1.0, 1.0);
        a -= SirState::new(0.5, 0.5, 0.5);

        assert_eq!(a, SirState::new(10.5, 2.5, 1.5));
        assert_eq!(a.scaled(2.0).population(), 29.0);
        assert!((SirParams::new(0.3, 0.1).r0() - 3.0).abs() < 1e-12);
    }
}
