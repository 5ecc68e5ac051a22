use chrono::{Duration, NaiveDate};
use event_impact::store::overview;
use event_impact::{
    AnalysisSweep, AnalyticsConfig, AnalyticsStore, CorrelationResult, Dataset, EventPolarity, JsonlResultLog,
    LifeEvent, PerformanceRecord, Position, Subject,
};

fn event(id: i64, subject_id: i32, category: &str, date: NaiveDate) -> LifeEvent {
    LifeEvent {
        id,
        subject_id,
        polarity: if category == "injury" { EventPolarity::Negative } else { EventPolarity::Positive },
        category: category.into(),
        date,
        description: String::new(),
    }
}

fn record(subject_id: i32, date: NaiveDate, points: f64) -> PerformanceRecord {
    PerformanceRecord { fantasy_points: points, ..PerformanceRecord::empty(subject_id, date) }
}

/// Subject 1 improves after births, subject 2 drops after injuries, subject 3 has
/// events but no games, subject 4 has games but no events.
fn create_test_dataset() -> Dataset {
    let mut dataset = Dataset {
        subjects: vec![
            Subject { id: 1, name: "Riser".into(), team: "KC".into(), position: Position::Wr },
            Subject { id: 2, name: "Faller".into(), team: "BUF".into(), position: Position::Rb },
            Subject { id: 3, name: "No Games".into(), team: "DEN".into(), position: Position::Te },
            Subject { id: 4, name: "No Events".into(), team: "MIA".into(), position: Position::Wr },
        ],
        ..Default::default()
    };

    let origin = NaiveDate::from_ymd_opt(2021, 9, 10).unwrap();
    for i in 0..4 {
        let center = origin + Duration::days(200 * i);
        dataset.life_events.push(event(10 + i, 1, "birth", center));
        dataset.life_events.push(event(20 + i, 2, "injury", center));
        for offset in [7, 14] {
            dataset.performance_records.push(record(1, center - Duration::days(offset), 9.0 + (i % 2) as f64));
            dataset.performance_records.push(record(1, center + Duration::days(offset), 18.0 + i as f64));
            dataset.performance_records.push(record(2, center - Duration::days(offset), 22.0 + i as f64));
            dataset.performance_records.push(record(2, center + Duration::days(offset), 8.0 + (i % 3) as f64));
        }
        dataset.performance_records.push(record(4, center, 12.0));
    }
    dataset.life_events.push(event(30, 3, "contract", origin));
    dataset
}

#[test]
fn test_sweep_over_dataset_file_appends_to_result_log() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = dir.path().join("dataset.json");
    create_test_dataset().save(&dataset_path).unwrap();
    let dataset = Dataset::load(&dataset_path).unwrap();

    let mut config = AnalyticsConfig::default();
    config.sweep.event_categories = Vec::new();
    let mut log = JsonlResultLog::new(dir.path().join("results").join("correlations.jsonl"));

    let report = AnalysisSweep::from_config(&config).run(&dataset, &mut log).unwrap();

    assert_eq!(report.subjects, 3);
    assert_eq!(report.pairs_analyzed, 2);
    assert_eq!(report.results_written, 2);
    assert_eq!(report.no_result, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].subject_id, 3);

    let results = log.read_all().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!((results[0].subject_id, results[0].event_type.as_str()), (1, "birth"));
    assert_eq!((results[1].subject_id, results[1].event_type.as_str()), (2, "injury"));
    assert!(results[0].mean_after > results[0].mean_before);
    assert!(results[1].mean_after < results[1].mean_before);
    assert!(results.iter().all(|r| r.sample_size == 8));
}

#[test]
fn test_parallel_and_sequential_sweeps_agree() {
    let dataset = create_test_dataset();
    let mut config = AnalyticsConfig::default();

    config.sweep.parallel = false;
    let mut sequential: Vec<CorrelationResult> = Vec::new();
    let seq_report = AnalysisSweep::from_config(&config).run(&dataset, &mut sequential).unwrap();

    config.sweep.parallel = true;
    let mut parallel: Vec<CorrelationResult> = Vec::new();
    let par_report = AnalysisSweep::from_config(&config).run(&dataset, &mut parallel).unwrap();

    assert_eq!(seq_report.pairs_analyzed, par_report.pairs_analyzed);
    assert_eq!(seq_report.no_result, par_report.no_result);
    assert_eq!(sequential.len(), parallel.len());
    for (a, b) in sequential.iter().zip(&parallel) {
        assert_eq!(a.subject_id, b.subject_id);
        assert_eq!(a.event_type, b.event_type);
        assert_eq!(a.correlation_coefficient, b.correlation_coefficient);
        assert_eq!(a.p_value, b.p_value);
    }
}

#[test]
fn test_overview_of_swept_dataset() {
    let dataset = create_test_dataset();
    let summary = overview(&dataset).unwrap();

    assert_eq!(summary.total_subjects, 4);
    assert_eq!(summary.total_events, 9);
    let ids: Vec<i32> = summary.analyzable_subjects.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(dataset.subjects_with_events().unwrap(), vec![1, 2, 3]);
}
