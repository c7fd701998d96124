use chrono::{DateTime, Utc};

use crate::analyzer::AnalysisResult;
use crate::model::Observation;

const RULE: &str = "============================================================";
const SECTION_RULE: &str = "------------------------------";

/// Rendering knobs. The generation timestamp is injected by the caller so
/// the output is deterministic under test.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub include_table: bool,
    pub generated_at: DateTime<Utc>,
}

/// Render the fixed-layout text report. Section order and literal header
/// text are an external contract; scripts parse this shape.
pub fn render(
    analysis: &AnalysisResult,
    observations: &[Observation],
    options: &ReportOptions,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(RULE.to_string());
    lines.push("WEATHER ANALYSIS REPORT".to_string());
    lines.push(RULE.to_string());
    lines.push(format!(
        "Generated on: {}",
        options.generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("Total cities analyzed: {}", analysis.total_cities));
    lines.push(String::new());

    lines.push("TEMPERATURE ANALYSIS".to_string());
    lines.push(SECTION_RULE.to_string());
    lines.push(format!(
        "Highest Temperature: {:.1}°C - {}",
        analysis.temperature.highest.value, analysis.temperature.highest.city
    ));
    lines.push(format!(
        "Lowest Temperature: {:.1}°C - {}",
        analysis.temperature.lowest.value, analysis.temperature.lowest.city
    ));
    lines.push(format!(
        "Average Temperature: {:.1}°C",
        analysis.temperature.mean
    ));
    lines.push(format!(
        "Median Temperature: {:.1}°C",
        analysis.temperature.median
    ));
    lines.push(String::new());

    lines.push("WEATHER CONDITIONS".to_string());
    lines.push(SECTION_RULE.to_string());
    for (label, cities) in &analysis.conditions {
        lines.push(format!("{label}: {} cities", cities.len()));
        for city in cities {
            lines.push(format!("  • {city}"));
        }
        lines.push(String::new());
    }

    lines.push("TEMPERATURE RANGES".to_string());
    lines.push(SECTION_RULE.to_string());
    for (band, cities) in &analysis.bands {
        if cities.is_empty() {
            continue;
        }
        lines.push(format!(
            "{}: {} cities",
            analysis.thresholds.label(*band),
            cities.len()
        ));
        for city in cities {
            lines.push(format!("  • {city}"));
        }
        lines.push(String::new());
    }

    lines.push("ADDITIONAL METRICS".to_string());
    lines.push(SECTION_RULE.to_string());
    lines.push("Humidity:".to_string());
    lines.push(format!(
        "  Highest: {:.0}% - {}",
        analysis.humidity.highest.value, analysis.humidity.highest.city
    ));
    lines.push(format!(
        "  Lowest: {:.0}% - {}",
        analysis.humidity.lowest.value, analysis.humidity.lowest.city
    ));
    lines.push(format!("  Average: {:.1}%", analysis.humidity.mean));
    lines.push(String::new());
    lines.push("Wind Speed:".to_string());
    lines.push(format!(
        "  Highest: {:.1} m/s - {}",
        analysis.wind.highest.value, analysis.wind.highest.city
    ));
    lines.push(format!(
        "  Lowest: {:.1} m/s - {}",
        analysis.wind.lowest.value, analysis.wind.lowest.city
    ));
    lines.push(format!("  Average: {:.1} m/s", analysis.wind.mean));
    lines.push(String::new());

    if options.include_table {
        lines.push("DETAILED WEATHER DATA".to_string());
        lines.push(SECTION_RULE.to_string());
        lines.extend(data_table(observations));
        lines.push(String::new());
    }

    lines.push(RULE.to_string());
    lines.push("End of Report".to_string());
    lines.push(RULE.to_string());

    lines.join("\n")
}

/// Fixed-width table of the raw observations: City, Temperature, Humidity,
/// Description, Wind Speed.
fn data_table(observations: &[Observation]) -> Vec<String> {
    let headers = ["City", "Temperature", "Humidity", "Description", "Wind Speed"];

    let rows: Vec<[String; 5]> = observations
        .iter()
        .map(|o| {
            [
                o.city.clone(),
                format!("{:.1}°C", o.temperature),
                format!("{}%", o.humidity),
                o.description.clone(),
                format!("{:.1} m/s", o.wind_speed),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut table = vec![render_row(&header_cells), render_row(&separator)];
    table.extend(rows.iter().map(|row| render_row(row)));
    table
}
