use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Observation;

/// Temperature band thresholds, in the configured units. Each boundary
/// value belongs to the band above it (`classify(30.0)` with defaults is
/// `Hot`, not `Warm`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandThresholds {
    pub very_hot: f64,
    pub hot: f64,
    pub warm: f64,
    pub moderate: f64,
    pub cool: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            very_hot: 35.0,
            hot: 30.0,
            warm: 25.0,
            moderate: 15.0,
            cool: 10.0,
        }
    }
}

impl BandThresholds {
    /// Assign exactly one band by walking the thresholds hot to cold.
    /// Comparisons are inclusive so a boundary value lands in the upper band.
    pub fn classify(&self, temperature: f64) -> Band {
        if temperature >= self.very_hot {
            Band::VeryHot
        } else if temperature >= self.hot {
            Band::Hot
        } else if temperature >= self.warm {
            Band::Warm
        } else if temperature >= self.moderate {
            Band::Moderate
        } else if temperature >= self.cool {
            Band::Cool
        } else {
            Band::Cold
        }
    }

    /// Human-readable label with the configured range, e.g. "Hot (30-35°C)".
    pub fn label(&self, band: Band) -> String {
        match band {
            Band::VeryHot => format!("Very Hot (>{:.0}°C)", self.very_hot),
            Band::Hot => format!("Hot ({:.0}-{:.0}°C)", self.hot, self.very_hot),
            Band::Warm => format!("Warm ({:.0}-{:.0}°C)", self.warm, self.hot),
            Band::Moderate => format!("Moderate ({:.0}-{:.0}°C)", self.moderate, self.warm),
            Band::Cool => format!("Cool ({:.0}-{:.0}°C)", self.cool, self.moderate),
            Band::Cold => format!("Cold (<{:.0}°C)", self.cool),
        }
    }
}

/// One of six mutually exclusive temperature categories, hot to cold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    VeryHot,
    Hot,
    Warm,
    Moderate,
    Cool,
    Cold,
}

impl Band {
    pub const fn all() -> &'static [Band] {
        &[
            Band::VeryHot,
            Band::Hot,
            Band::Warm,
            Band::Moderate,
            Band::Cool,
            Band::Cold,
        ]
    }
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("no observations to analyze; run the fetch step first")]
    EmptyInput,
}

/// Extremum of one metric with the city it belongs to. Ties keep the city
/// encountered first in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Extreme {
    pub value: f64,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub highest: Extreme,
    pub lowest: Extreme,
    pub mean: f64,
    pub median: f64,
}

/// Read-only aggregate over one snapshot of observations. Recomputed each
/// run, never persisted.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub temperature: MetricSummary,
    pub humidity: MetricSummary,
    pub wind: MetricSummary,

    /// Cities grouped by exact condition label, labels in first-appearance
    /// order, cities in input order.
    pub conditions: Vec<(String, Vec<String>)>,

    /// Description counts, most common first.
    pub condition_distribution: Vec<(String, usize)>,

    /// All six bands in hot-to-cold order; a band's city list may be empty.
    pub bands: Vec<(Band, Vec<String>)>,

    pub thresholds: BandThresholds,
    pub total_cities: usize,
}

pub fn compute(
    observations: &[Observation],
    thresholds: &BandThresholds,
) -> Result<AnalysisResult, AnalyzeError> {
    if observations.is_empty() {
        return Err(AnalyzeError::EmptyInput);
    }

    let temperature = summarize(observations, |o| o.temperature);
    let humidity = summarize(observations, |o| f64::from(o.humidity));
    let wind = summarize(observations, |o| o.wind_speed);

    let mut conditions: Vec<(String, Vec<String>)> = Vec::new();
    for observation in observations {
        match conditions
            .iter_mut()
            .find(|(label, _)| *label == observation.condition)
        {
            Some((_, cities)) => cities.push(observation.city.clone()),
            None => conditions.push((
                observation.condition.clone(),
                vec![observation.city.clone()],
            )),
        }
    }

    let mut condition_distribution: Vec<(String, usize)> = Vec::new();
    for observation in observations {
        match condition_distribution
            .iter_mut()
            .find(|(label, _)| *label == observation.description)
        {
            Some((_, count)) => *count += 1,
            None => condition_distribution.push((observation.description.clone(), 1)),
        }
    }
    // stable sort keeps first-appearance order among equal counts
    condition_distribution.sort_by(|a, b| b.1.cmp(&a.1));

    let bands = Band::all()
        .iter()
        .map(|&band| {
            let cities = observations
                .iter()
                .filter(|o| thresholds.classify(o.temperature) == band)
                .map(|o| o.city.clone())
                .collect();
            (band, cities)
        })
        .collect();

    Ok(AnalysisResult {
        temperature,
        humidity,
        wind,
        conditions,
        condition_distribution,
        bands,
        thresholds: *thresholds,
        total_cities: observations.len(),
    })
}

fn summarize(observations: &[Observation], metric: impl Fn(&Observation) -> f64) -> MetricSummary {
    // stable scan: strict comparison keeps the first city on ties
    let mut highest = Extreme {
        value: metric(&observations[0]),
        city: observations[0].city.clone(),
    };
    let mut lowest = highest.clone();

    for observation in &observations[1..] {
        let value = metric(observation);
        if value > highest.value {
            highest = Extreme {
                value,
                city: observation.city.clone(),
            };
        }
        if value < lowest.value {
            lowest = Extreme {
                value,
                city: observation.city.clone(),
            };
        }
    }

    let values: Vec<f64> = observations.iter().map(&metric).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    MetricSummary {
        highest,
        lowest,
        mean,
        median: median(values),
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn observation(city: &str, temperature: f64) -> Observation {
        Observation {
            city: city.to_string(),
            resolved_name: city.to_string(),
            temperature,
            feels_like: temperature,
            humidity: 50,
            wind_speed: 3.0,
            condition: "Clear".to_string(),
            description: "Clear Sky".to_string(),
            timestamp: Utc::now(),
        }
    }

    fn classify_default(temperature: f64) -> Band {
        BandThresholds::default().classify(temperature)
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = compute(&[], &BandThresholds::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::EmptyInput));
    }

    #[test]
    fn median_of_odd_count_is_middle_element() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![5.0]), 5.0);
    }

    #[test]
    fn median_of_even_count_averages_the_middle_pair() {
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(vec![10.0, 20.0]), 15.0);
    }

    #[test]
    fn extremum_tie_keeps_first_city_in_input_order() {
        let observations = vec![
            observation("First", 30.0),
            observation("Second", 30.0),
            observation("Colder", 10.0),
        ];

        let analysis = compute(&observations, &BandThresholds::default()).expect("compute");
        assert_eq!(analysis.temperature.highest.city, "First");
        assert_eq!(analysis.temperature.highest.value, 30.0);
    }

    #[test]
    fn single_observation_collapses_all_statistics() {
        let observations = vec![observation("Lone", 22.5)];
        let analysis = compute(&observations, &BandThresholds::default()).expect("compute");

        for summary in [&analysis.temperature, &analysis.humidity, &analysis.wind] {
            assert_eq!(summary.mean, summary.median);
            assert_eq!(summary.highest.value, summary.lowest.value);
            assert_eq!(summary.highest.city, "Lone");
            assert_eq!(summary.lowest.city, "Lone");
        }
        assert_eq!(analysis.temperature.mean, 22.5);
        assert_eq!(analysis.total_cities, 1);
    }

    #[test]
    fn boundary_temperature_belongs_to_the_upper_band() {
        assert_eq!(classify_default(30.0), Band::Hot);
        assert_eq!(classify_default(35.0), Band::VeryHot);
        assert_eq!(classify_default(25.0), Band::Warm);
        assert_eq!(classify_default(15.0), Band::Moderate);
        assert_eq!(classify_default(10.0), Band::Cool);
        assert_eq!(classify_default(9.9), Band::Cold);
        assert_eq!(classify_default(29.9), Band::Warm);
    }

    #[test]
    fn band_assignment_is_total_and_monotonic() {
        let temps = [-20.0, 5.0, 10.0, 10.1, 15.0, 20.0, 25.0, 28.0, 30.0, 34.9, 35.1, 45.0];

        let band_rank = |band: Band| {
            Band::all()
                .iter()
                .position(|&b| b == band)
                .expect("every band is listed")
        };

        let mut previous_rank = band_rank(classify_default(temps[0]));
        for &temp in &temps[1..] {
            let rank = band_rank(classify_default(temp));
            // higher temperature never moves to a cooler band
            assert!(rank <= previous_rank, "non-monotonic at {temp}");
            previous_rank = rank;
        }
    }

    #[test]
    fn condition_grouping_is_exact_and_case_sensitive() {
        let mut observations = vec![
            observation("A", 20.0),
            observation("B", 21.0),
            observation("C", 22.0),
        ];
        observations[0].condition = "Rain".to_string();
        observations[1].condition = "rain".to_string();
        observations[2].condition = "Rain".to_string();

        let analysis = compute(&observations, &BandThresholds::default()).expect("compute");

        assert_eq!(analysis.conditions.len(), 2);
        assert_eq!(analysis.conditions[0].0, "Rain");
        assert_eq!(analysis.conditions[0].1, ["A", "C"]);
        assert_eq!(analysis.conditions[1].0, "rain");
        assert_eq!(analysis.conditions[1].1, ["B"]);
    }

    #[test]
    fn distribution_is_ordered_most_common_first() {
        let mut observations = vec![
            observation("A", 20.0),
            observation("B", 21.0),
            observation("C", 22.0),
            observation("D", 23.0),
        ];
        observations[0].description = "Light Rain".to_string();
        observations[1].description = "Clear Sky".to_string();
        observations[2].description = "Clear Sky".to_string();
        observations[3].description = "Mist".to_string();

        let analysis = compute(&observations, &BandThresholds::default()).expect("compute");

        assert_eq!(
            analysis.condition_distribution,
            vec![
                ("Clear Sky".to_string(), 2),
                ("Light Rain".to_string(), 1),
                ("Mist".to_string(), 1),
            ]
        );
    }

    #[test]
    fn bands_cover_all_six_categories_in_order() {
        let observations = vec![
            observation("Scorching", 40.0),
            observation("Freezing", -5.0),
            observation("Mild", 20.0),
        ];

        let analysis = compute(&observations, &BandThresholds::default()).expect("compute");

        let bands: Vec<Band> = analysis.bands.iter().map(|(band, _)| *band).collect();
        assert_eq!(bands, Band::all());

        assert_eq!(analysis.bands[0].1, ["Scorching"]);
        assert_eq!(analysis.bands[3].1, ["Mild"]);
        assert_eq!(analysis.bands[5].1, ["Freezing"]);
        assert!(analysis.bands[1].1.is_empty());
    }

    #[test]
    fn band_labels_follow_configured_thresholds() {
        let thresholds = BandThresholds::default();
        assert_eq!(thresholds.label(Band::VeryHot), "Very Hot (>35°C)");
        assert_eq!(thresholds.label(Band::Hot), "Hot (30-35°C)");
        assert_eq!(thresholds.label(Band::Cold), "Cold (<10°C)");
    }

    #[test]
    fn mean_and_extremes_over_several_cities() {
        let observations = vec![
            observation("A", 10.0),
            observation("B", 20.0),
            observation("C", 30.0),
        ];

        let analysis = compute(&observations, &BandThresholds::default()).expect("compute");

        assert_eq!(analysis.temperature.mean, 20.0);
        assert_eq!(analysis.temperature.median, 20.0);
        assert_eq!(analysis.temperature.highest.city, "C");
        assert_eq!(analysis.temperature.lowest.city, "A");
        assert_eq!(analysis.total_cities, 3);
    }
}
