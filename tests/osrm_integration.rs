//! Live OSRM integration test.
//!
//! Boots `osrm-routed` in a container against a Monaco extract (small,
//! fast to preprocess) and runs the full optimization pipeline. Requires
//! docker and network access for the first run; artifacts are cached and
//! the container is reused afterwards.

use std::env;
use std::time::{Duration, Instant};

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, ReuseDirective, TestcontainersError};

use route_optimizer::matrix::CostMetric;
use route_optimizer::optimizer::RouteOptimizer;
use route_optimizer::osrm::{OsrmConfig, OsrmProvider};
use route_optimizer::osrm_data::{ExtractConfig, PreparedDataset};
use route_optimizer::settings::{OptimizationSettings, OptimizationType, TravelMode};
use route_optimizer::stop::Stop;
use route_optimizer::traits::{MatrixOptions, RoutingProvider};

/// Monaco locations: casino square, port, Larvotto beach, station.
const MONACO_STOPS: [(&str, f64, f64); 4] = [
    ("casino", 43.7392, 7.4278),
    ("port", 43.7347, 7.4206),
    ("larvotto", 43.7451, 7.4357),
    ("station", 43.7384, 7.4193),
];

fn osrm_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let data_root = env::var("OSRM_DATA_DIR").unwrap_or_else(|_| "osrm-data".to_string());
    let config = ExtractConfig::new("europe/monaco", data_root);
    let dataset = PreparedDataset::ensure(&config)
        .map_err(|err| TestcontainersError::other(format!("OSRM prep failed: {err}")))?;

    let mtime = std::fs::metadata(dataset.graph_base.with_extension("osrm.partition"))
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(|time| time.duration_since(std::time::SystemTime::UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    let container_name = format!("osrm-monaco-mld-{mtime}");

    let image = GenericImage::new("osrm/osrm-backend", "latest")
        .with_exposed_port(5000.tcp())
        .with_mount(Mount::bind_mount(
            dataset.data_dir.to_string_lossy().to_string(),
            "/data",
        ))
        .with_cmd(vec![
            "osrm-routed".to_string(),
            "--algorithm".to_string(),
            "mld".to_string(),
            format!("/data/{}", dataset.graph_file),
        ])
        .with_container_name(container_name)
        .with_startup_timeout(Duration::from_secs(30))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(5000.tcp())?;
    let base_url = format!("http://127.0.0.1:{port}");

    Ok((container, base_url))
}

/// osrm-routed takes a moment to load the graph after the port opens.
fn wait_for_matrix(provider: &OsrmProvider, points: &[(f64, f64)]) -> Option<()> {
    let options = MatrixOptions {
        metric: CostMetric::Duration,
        travel_mode: TravelMode::Driving,
        avoid_tolls: false,
        avoid_highways: false,
        prefer_main_roads: false,
    };
    let deadline = Instant::now() + Duration::from_secs(15);
    while Instant::now() < deadline {
        if provider.travel_matrix(points, &options).is_ok() {
            return Some(());
        }
        std::thread::sleep(Duration::from_millis(500));
    }
    None
}

#[test]
fn osrm_matrix_and_pipeline_produce_a_route() {
    let (_container, base_url) = osrm_container().expect("start OSRM container");

    let provider =
        OsrmProvider::new(OsrmConfig::new(base_url).with_timeout(Duration::from_secs(10)))
            .expect("build OSRM provider");

    let points: Vec<(f64, f64)> = MONACO_STOPS.iter().map(|&(_, lat, lng)| (lat, lng)).collect();
    wait_for_matrix(&provider, &points).expect("OSRM became ready");

    let options = MatrixOptions {
        metric: CostMetric::Duration,
        travel_mode: TravelMode::Driving,
        avoid_tolls: false,
        avoid_highways: false,
        prefer_main_roads: false,
    };
    let matrix = provider
        .travel_matrix(&points, &options)
        .expect("matrix request");
    assert_eq!(matrix.size(), points.len());
    for from in 0..matrix.size() {
        assert_eq!(matrix.get(from, from), 0.0);
        for to in 0..matrix.size() {
            if from != to {
                assert!(
                    matrix.is_reachable(from, to),
                    "Monaco pair {from}->{to} should be routable"
                );
            }
        }
    }

    let stops: Vec<Stop> = MONACO_STOPS
        .iter()
        .map(|&(id, lat, lng)| Stop::new(id, id, "Monaco", lat, lng))
        .collect();
    let start = stops[0].clone();

    let optimizer = RouteOptimizer::new(provider);
    let route = optimizer
        .optimize_route(
            &stops,
            Some(&start),
            None,
            &OptimizationSettings::new(OptimizationType::Time),
        )
        .expect("full pipeline");

    assert_eq!(route.stops.len(), stops.len());
    assert_eq!(route.stops[0].id, "casino");
    assert!(route.total_distance > 0.0);
    // Travel plus four default dwell periods.
    assert!(route.total_duration > 120.0);
    assert!(!route.polyline.is_empty());
    assert!(route.waypoints.len() >= stops.len());
}
