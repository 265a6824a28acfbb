use crate::cases::{CaseQuery, CaseSource};
use crate::error::CovmobError;
use crate::model::SirState;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

/// Official population of every federal state.
const GERMAN_STATES: [(&str, u64); 16] = [
    ("Baden-Württemberg", 11_100_394),
    ("Bayern", 13_124_737),
    ("Berlin", 3_669_491),
    ("Brandenburg", 2_521_893),
    ("Bremen", 681_202),
    ("Hamburg", 1_847_253),
    ("Hessen", 6_288_080),
    ("Mecklenburg-Vorpommern", 1_608_138),
    ("Niedersachsen", 7_993_608),
    ("Nordrhein-Westfalen", 17_947_221),
    ("Rheinland-Pfalz", 4_093_903),
    ("Saarland", 986_887),
    ("Sachsen", 4_071_971),
    ("Sachsen-Anhalt", 2_194_782),
    ("Schleswig-Holstein", 2_903_773),
    ("Thüringen", 2_133_378),
];

/// Lookup table of state populations.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePopulations(BTreeMap<String, u64>);

impl StatePopulations {
    pub fn new(populations: BTreeMap<String, u64>) -> Self {
        Self(populations)
    }

    /// The 16 German federal states.
    pub fn germany() -> Self {
        Self(
            GERMAN_STATES
                .iter()
                .map(|(name, population)| (name.to_string(), *population))
                .collect(),
        )
    }

    pub fn get(&self, state: &str) -> Result<u64, CovmobError> {
        self.0
            .get(state)
            .copied()
            .ok_or_else(|| CovmobError::UnknownRegion(state.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(name, population)| (name.as_str(), *population))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StatePopulations {
    fn default() -> Self {
        Self::germany()
    }
}

/// Shares of a state population per compartment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialShares {
    pub rel_susceptible: f64,
    pub rel_infected: f64,
    pub rel_recovered: f64,
}

impl InitialShares {
    /// Dead count as recovered. Fails for a zero population.
    pub fn from_counts(
        currently_infected: i64,
        recovered: i64,
        dead: i64,
        population: u64,
    ) -> Result<Self, CovmobError> {
        if population == 0 {
            return Err(CovmobError::ZeroPopulation("state population".to_string()));
        }
        let population = population as f64;
        let rel_infected = currently_infected as f64 / population;
        let rel_recovered = (recovered + dead) as f64 / population;
        Ok(Self {
            rel_susceptible: 1.0 - rel_infected - rel_recovered,
            rel_infected,
            rel_recovered,
        })
    }

    /// Absolute state of a region holding `population` people.
    ///
    /// The shares come from official state figures while `population` is
    /// usually a mobility snapshot of the region.
    pub fn seed(&self, population: f64) -> SirState {
        SirState::new(
            population * self.rel_susceptible,
            population * self.rel_infected,
            population * self.rel_recovered,
        )
    }
}

/// Initial shares keyed by state name.
pub type InitialDistribution = BTreeMap<String, InitialShares>;

/// Initial shares of every state on `date`, from cases reported between
/// `start` and `date`.
pub fn init_state_sir(
    date: NaiveDate,
    start: NaiveDate,
    source: &dyn CaseSource,
    populations: &StatePopulations,
) -> Result<InitialDistribution, CovmobError> {
    let mut distribution = InitialDistribution::new();

    for (state, population) in populations.iter() {
        let counts = source.counts(&CaseQuery::until(date).from(start).state(state))?;
        let shares = InitialShares::from_counts(
            counts.currently_infected(),
            counts.recovered,
            counts.dead,
            population,
        )?;
        debug!(
            "{}: {} currently infected, {} recovered, {} dead",
            state,
            counts.currently_infected(),
            counts.recovered,
            counts.dead
        );
        distribution.insert(state.to_string(), shares);
    }

    Ok(distribution)
}

/// Shares for `state`, an error for states missing from the distribution.
pub(crate) fn shares_for<'a>(
    distribution: &'a InitialDistribution,
    state: &str,
) -> Result<&'a InitialShares, CovmobError> {
    distribution
        .get(state)
        .ok_or_else(|| CovmobError::UnknownRegion(state.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::{CaseCounts, default_start};
    use std::cell::RefCell;

    struct FixedCounts;

    impl CaseSource for FixedCounts {
        fn counts(&self, query: &CaseQuery) -> Result<CaseCounts, CovmobError> {
            let infected = match query.state.as_deref() {
                Some("Bremen") => 6_812,
                _ => 0,
            };
            Ok(CaseCounts {
                infected,
                recovered: infected / 2,
                dead: infected / 4,
            })
        }
    }

    #[test]
    fn test_germany_table() -> Result<(), CovmobError> {
        let populations = StatePopulations::germany();

        assert_eq!(populations.len(), 16);
        assert_eq!(populations.get("Berlin")?, 3_669_491);
        assert_eq!(populations.get("Thüringen")?, 2_133_378);
        assert_eq!(
            populations.get("Wien"),
            Err(CovmobError::UnknownRegion("Wien".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_shares_from_counts() -> Result<(), CovmobError> {
        let shares = InitialShares::from_counts(100, 50, 10, 1_000)?;

        assert!((shares.rel_infected - 0.1).abs() < 1e-12);
        assert!((shares.rel_recovered - 0.06).abs() < 1e-12);
        assert!((shares.rel_susceptible - 0.84).abs() < 1e-12);

        let state = shares.seed(500.0);
        assert!((state.population() - 500.0).abs() < 1e-9);
        assert!((state.infected - 50.0).abs() < 1e-9);

        assert!(InitialShares::from_counts(1, 0, 0, 0).is_err());
        Ok(())
    }

    #[test]
    fn test_init_state_sir() -> Result<(), CovmobError> {
        let date = NaiveDate::from_ymd_opt(2020, 10, 1)
            .ok_or_else(|| CovmobError::InvalidDate("2020-10-01".to_string()))?;
        let distribution =
            init_state_sir(date, default_start(), &FixedCounts, &StatePopulations::germany())?;

        assert_eq!(distribution.len(), 16);
        let bremen = shares_for(&distribution, "Bremen")?;
        // 6812 infected, 3406 recovered, 1703 dead of 681202
        assert!((bremen.rel_infected - 1_703.0 / 681_202.0).abs() < 1e-12);
        assert!((bremen.rel_recovered - 5_109.0 / 681_202.0).abs() < 1e-12);
        let total = bremen.rel_susceptible + bremen.rel_infected + bremen.rel_recovered;
        assert!((total - 1.0).abs() < 1e-12);

        let bayern = shares_for(&distribution, "Bayern")?;
        assert_eq!(bayern.rel_susceptible, 1.0);
        assert!(shares_for(&distribution, "Wien").is_err());
        Ok(())
    }

    #[derive(Default)]
    struct RecordingSource {
        queries: RefCell<Vec<CaseQuery>>,
    }

    impl CaseSource for RecordingSource {
        fn counts(&self, query: &CaseQuery) -> Result<CaseCounts, CovmobError> {
            self.queries.borrow_mut().push(query.clone());
            Ok(CaseCounts::default())
        }
    }

    #[test]
    fn test_init_state_sir_uses_case_window() -> Result<(), CovmobError> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1)
            .ok_or_else(|| CovmobError::InvalidDate("2020-03-01".to_string()))?;
        let date = NaiveDate::from_ymd_opt(2020, 11, 1)
            .ok_or_else(|| CovmobError::InvalidDate("2020-11-01".to_string()))?;
        let source = RecordingSource::default();

        init_state_sir(date, start, &source, &StatePopulations::germany())?;

        let queries = source.queries.borrow();
        assert_eq!(queries.len(), 16);
        assert!(queries.iter().all(|q| q.start == start && q.end == date));
        assert!(queries.iter().any(|q| q.state.as_deref() == Some("Saarland")));
        Ok(())
    }
}
