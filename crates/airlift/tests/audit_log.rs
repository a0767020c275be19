//! Integration tests for the audit log written by `GeneralRepository`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::sync::Arc;

use airlift::repository::{GeneralRepository, Reporter};
use airlift::simulation::run_simulation;
use airlift_test_utils::*;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn log_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("airlift-{name}-{}.log", std::process::id()))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_audit_log_records_a_complete_run() {
    let params = test_params(6, 2, 4);
    let config = test_config(params);
    let path = log_path("complete-run");

    let repository = Arc::new(
        GeneralRepository::create(path.to_str().unwrap(), params.passengers, &config.run_id)
            .unwrap(),
    );
    let reporter: Arc<dyn Reporter> = repository.clone();

    let report = timeout(
        SCENARIO_TIMEOUT,
        run_simulation(&config, reporter, CancellationToken::new()),
    )
    .await
    .unwrap()
    .unwrap();
    repository.finish().unwrap();

    let log = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(log.contains("Airlift - Description of the internal state"));
    assert!(log.contains("Run airlift-test started at "));
    assert!(log.contains(" PT   HT   P00  P01  P02  P03  P04  P05 InQ InF PTAL"));

    // Flight events in order for every flight.
    for flight in 1..=report.flights.len() {
        let started = log
            .find(&format!("Flight {flight}: boarding started."))
            .expect("missing boarding event");
        let departed = log
            .find(&format!("Flight {flight}: departed with"))
            .expect("missing departure event");
        let arrived = log
            .find(&format!("Flight {flight}: arrived."))
            .expect("missing arrival event");
        let returning = log
            .find(&format!("Flight {flight}: returning."))
            .expect("missing return event");
        assert!(started < departed && departed < arrived && arrived < returning);
    }
    assert_eq!(log.matches("checked.").count(), 6);

    // The departures the log derived match the flights the pilot flew.
    assert_eq!(repository.departures(), report.flights);

    let summary = log.split("Airlift sum up:").nth(1).expect("missing summary");
    for (index, headcount) in report.flights.iter().enumerate() {
        assert!(summary.contains(&format!(
            "Flight {} transported {headcount} passengers",
            index + 1
        )));
    }

    // Last status line: pilot parked, everyone at the destination.
    let last_status = log
        .lines()
        .filter(|line| line.starts_with("ATRG"))
        .last()
        .unwrap();
    assert_eq!(
        last_status,
        "ATRG WTFL ATDS ATDS ATDS ATDS ATDS ATDS   0   0    6"
    );
}

#[test]
fn test_create_fails_for_missing_directory() {
    let path = std::env::temp_dir()
        .join("airlift-no-such-directory")
        .join("nested")
        .join("logger");

    let result = GeneralRepository::create(path.to_str().unwrap(), 3, "airlift-test");
    assert!(result.is_err());
}
