use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{RoadNetwork, RouteRequest, SearchStrategy};
use crate::services::session::CoverageSession;

/// Repeated generate-and-mark rounds with one strategy and request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageScenario {
    pub name: String,
    pub strategy: SearchStrategy,
    pub request: RouteRequest,
    /// Number of rounds
    pub routes: usize,
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub strategy: SearchStrategy,
    pub attempts: usize,
    pub successes: usize,
    pub success_rate: f32,
    pub initial_coverage: f64,
    pub final_coverage: f64,
    /// Coverage after each round, failed rounds included
    pub coverage_curve: Vec<f64>,
    /// Route length in meters over successful rounds
    pub distance: StatSummary,
    /// Share of each route on previously unvisited edges
    pub new_fraction: StatSummary,
}

/// Mean and standard deviation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatSummary {
    pub mean: f64,
    pub std_dev: f64,
}

impl CoverageScenario {
    pub fn new(
        name: impl Into<String>,
        strategy: SearchStrategy,
        request: RouteRequest,
        routes: usize,
    ) -> Self {
        CoverageScenario {
            name: name.into(),
            strategy,
            request,
            routes,
        }
    }
}

/// Run `scenario` against `session`, marking every accepted route.
///
/// Route-not-found rounds count as failures; any other error aborts the
/// scenario. A fixed request seed advances by one per round so rounds differ
/// but stay reproducible.
pub fn run_scenario<G: RoadNetwork + Send + Sync + 'static>(
    session: &CoverageSession<G>,
    scenario: &CoverageScenario,
) -> Result<ScenarioResult> {
    let initial_coverage = session.coverage()?;
    let mut coverage_curve = Vec::with_capacity(scenario.routes);
    let mut distances = Vec::new();
    let mut new_fractions = Vec::new();

    for round in 0..scenario.routes {
        let mut request = scenario.request.clone();
        request.seed = request.seed.map(|seed| seed.wrapping_add(round as u64));

        match session.generate_and_mark(scenario.strategy, &request) {
            Ok(route) => {
                distances.push(route.distance());
                new_fractions.push(route.new_fraction());
            }
            Err(e) if e.is_route_not_found() => {
                tracing::debug!(
                    scenario = %scenario.name,
                    round = round + 1,
                    error = %e,
                    "Round produced no route"
                );
            }
            Err(e) => return Err(e),
        }

        coverage_curve.push(session.coverage()?);
    }

    let successes = distances.len();
    let final_coverage = coverage_curve.last().copied().unwrap_or(initial_coverage);

    tracing::info!(
        scenario = %scenario.name,
        strategy = %scenario.strategy,
        successes = successes,
        coverage = %format!("{:.1}%", final_coverage * 100.0),
        "Scenario finished"
    );

    Ok(ScenarioResult {
        name: scenario.name.clone(),
        strategy: scenario.strategy,
        attempts: scenario.routes,
        successes,
        success_rate: if scenario.routes == 0 {
            0.0
        } else {
            successes as f32 / scenario.routes as f32
        },
        initial_coverage,
        final_coverage,
        coverage_curve,
        distance: stat_summary(&distances),
        new_fraction: stat_summary(&new_fractions),
    })
}

pub fn stat_summary(values: &[f64]) -> StatSummary {
    if values.is_empty() {
        return StatSummary {
            mean: 0.0,
            std_dev: 0.0,
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = if values.len() > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
    } else {
        0.0
    };

    StatSummary {
        mean,
        std_dev: variance.sqrt(),
    }
}

/// Format a single scenario result for display
pub fn format_scenario_result(result: &ScenarioResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n{} [{}] ({}/{} routes)\n",
        result.name, result.strategy, result.successes, result.attempts,
    ));

    if result.successes > 0 {
        out.push_str(&format!(
            "  distance:     {:.0}m +/- {:.0}m\n",
            result.distance.mean, result.distance.std_dev,
        ));
        out.push_str(&format!(
            "  new_fraction: {:.0}% +/- {:.0}%\n",
            result.new_fraction.mean * 100.0,
            result.new_fraction.std_dev * 100.0,
        ));
    } else {
        out.push_str("  (no routes generated)\n");
    }

    out.push_str(&format!(
        "  coverage:     {:.1}% -> {:.1}%\n",
        result.initial_coverage * 100.0,
        result.final_coverage * 100.0,
    ));
    out.push_str(&format!("  success_rate: {:.0}%\n", result.success_rate * 100.0));

    out
}

/// Format the full experiment report
pub fn format_report(results: &[ScenarioResult]) -> String {
    let mut report = String::from("=== Road Coverage Report ===\n");

    for result in results {
        report.push_str(&format_scenario_result(result));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteGeneratorConfig;
    use crate::models::{Coordinates, RoadGraph};
    use std::sync::Arc;

    /// Two 4-node loops sharing node 1, every road 100m.
    fn figure_eight() -> Arc<RoadGraph> {
        let mut graph = RoadGraph::new();
        let origin = Coordinates::new(51.0, 19.0).unwrap();
        graph.add_node(1, origin);
        graph.add_node(2, origin.offset_m(0.0, 70.0));
        graph.add_node(3, origin.offset_m(70.0, 70.0));
        graph.add_node(4, origin.offset_m(70.0, 0.0));
        graph.add_node(5, origin.offset_m(0.0, -70.0));
        graph.add_node(6, origin.offset_m(-70.0, -70.0));
        graph.add_node(7, origin.offset_m(-70.0, 0.0));
        let east = [(1, 2), (2, 3), (3, 4), (4, 1)];
        let west = [(1, 5), (5, 6), (6, 7), (7, 1)];
        for (a, b) in east.into_iter().chain(west) {
            graph.add_road(a, b, 100.0).unwrap();
        }
        Arc::new(graph)
    }

    #[test]
    fn test_stat_summary() {
        let empty = stat_summary(&[]);
        assert_eq!(empty.mean, 0.0);
        assert_eq!(empty.std_dev, 0.0);

        let single = stat_summary(&[4.0]);
        assert_eq!(single.mean, 4.0);
        assert_eq!(single.std_dev, 0.0);

        let summary = stat_summary(&[2.0, 4.0, 6.0]);
        assert!((summary.mean - 4.0).abs() < 1e-9);
        assert!((summary.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_prefer_new_covers_both_loops() {
        let session = CoverageSession::new(figure_eight(), RouteGeneratorConfig::default());
        let request = RouteRequest::new(1, 400.0)
            .with_end(1)
            .with_tolerance(0.0)
            .with_prefer_new(true)
            .with_seed(5);
        let scenario = CoverageScenario::new("figure eight", SearchStrategy::Dfs, request, 2);

        let result = run_scenario(&session, &scenario).unwrap();
        assert_eq!(result.successes, 2);
        assert_eq!(result.initial_coverage, 0.0);
        assert!((result.coverage_curve[0] - 0.5).abs() < 1e-9);
        assert!((result.final_coverage - 1.0).abs() < 1e-9);
        assert!((result.new_fraction.mean - 1.0).abs() < 1e-9);
        assert!((result.distance.mean - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_rounds_are_counted() {
        let session = CoverageSession::new(figure_eight(), RouteGeneratorConfig::default());
        let request = RouteRequest::new(1, 10_000.0)
            .with_end(42)
            .with_tolerance(0.1);
        let scenario = CoverageScenario::new("unreachable", SearchStrategy::AStar, request, 3);

        let result = run_scenario(&session, &scenario).unwrap();
        assert_eq!(result.attempts, 3);
        assert_eq!(result.successes, 0);
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.coverage_curve, vec![0.0, 0.0, 0.0]);
        assert!(format_scenario_result(&result).contains("no routes generated"));
    }

    #[test]
    fn test_invalid_request_aborts_scenario() {
        let session = CoverageSession::new(figure_eight(), RouteGeneratorConfig::default());
        let request = RouteRequest::new(1, -5.0);
        let scenario = CoverageScenario::new("broken", SearchStrategy::RandomWalk, request, 3);
        assert!(run_scenario(&session, &scenario).is_err());
    }

    #[test]
    fn test_format_report_lists_scenarios() {
        let result = ScenarioResult {
            name: "grid".to_string(),
            strategy: SearchStrategy::RandomWalk,
            attempts: 4,
            successes: 3,
            success_rate: 0.75,
            initial_coverage: 0.1,
            final_coverage: 0.4,
            coverage_curve: vec![0.2, 0.3, 0.3, 0.4],
            distance: StatSummary {
                mean: 1_000.0,
                std_dev: 50.0,
            },
            new_fraction: StatSummary {
                mean: 0.6,
                std_dev: 0.1,
            },
        };
        let report = format_report(&[result]);
        assert!(report.starts_with("=== Road Coverage Report ==="));
        assert!(report.contains("grid [random] (3/4 routes)"));
        assert!(report.contains("10.0% -> 40.0%"));
        assert!(report.contains("success_rate: 75%"));
    }
}
