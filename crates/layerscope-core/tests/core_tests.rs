use layerscope_core::{
    AnalyzeConfig, Layer, LayerReport, LayerStack, LayerStats, LayerStatus, Metric, PathKind,
    PathSet, RelativePath, SimilarityResult, StackReport,
};
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn test_relative_path_identity_is_exact() {
    let a = RelativePath::new("/usr/lib");
    let b = RelativePath::from_relative(Path::new("usr/lib"));
    assert_eq!(a, b);

    // No normalization beyond prefix stripping
    assert_ne!(RelativePath::new("/usr/lib/"), a);
    assert_ne!(RelativePath::new("/USR/lib"), a);
}

#[test]
fn test_path_set_kinds_are_disjoint_views() {
    let set = PathSet::from_paths(["/etc/hosts", "/bin/sh"], ["/", "/etc", "/bin"]);

    assert_eq!(set.len(PathKind::File), 2);
    assert_eq!(set.len(PathKind::Directory), 3);
    assert!(set.contains(PathKind::File, "/bin/sh"));
    assert!(!set.contains(PathKind::Directory, "/bin/sh"));
    assert!(!set.contains(PathKind::File, "/bin"));
}

#[test]
fn test_layer_stack_from_graph_driver_dirs() {
    let stack = LayerStack::from_overlay_dirs(
        Some(Path::new("/var/lib/docker/overlay2/top/diff")),
        Some("/var/lib/docker/overlay2/l2/diff:/var/lib/docker/overlay2/l1/diff"),
    );

    assert_eq!(stack.len(), 3);
    assert_eq!(
        stack.top().unwrap().root,
        PathBuf::from("/var/lib/docker/overlay2/top/diff")
    );
    // Lower list is not reversed
    assert_eq!(
        stack.get(1).unwrap().root,
        PathBuf::from("/var/lib/docker/overlay2/l2/diff")
    );
    assert_eq!(stack.lower_indices(1).collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_metric_serializes_as_number_or_null() {
    let json = serde_json::to_string(&Metric::Value(1.5)).unwrap();
    assert_eq!(json, "1.5");

    let json = serde_json::to_string(&Metric::Undefined).unwrap();
    assert_eq!(json, "null");

    let metric: Metric = serde_json::from_str("null").unwrap();
    assert!(metric.is_undefined());
}

#[test]
fn test_report_serializes_undefined_stats_as_null() {
    let layer = LayerReport {
        layer: Layer::new(0, "/upper"),
        status: LayerStatus::Complete,
        stats: LayerStats {
            dir_count: 1,
            ..LayerStats::default()
        },
        files: SimilarityResult::unmatched(PathKind::File, 0),
        directories: SimilarityResult::unmatched(PathKind::Directory, 1),
        warnings: Vec::new(),
    };
    let report = StackReport::new(
        vec![layer],
        Vec::new(),
        Duration::from_millis(3),
        AnalyzeConfig::default(),
    );

    let value = serde_json::to_value(&report).unwrap();
    let record = &value["layers"][0];
    assert!(record["stats"]["avg_file_depth"].is_null());
    assert!(record["files"]["match_percent"].is_null());
    assert_eq!(record["directories"]["match_percent"], 0.0);
    assert_eq!(record["status"], "complete");
    assert!(report.primary_usable());
}

#[test]
fn test_config_round_trips_timeout_as_seconds() {
    let config = AnalyzeConfig::builder()
        .timeout(Duration::from_millis(1500))
        .build()
        .unwrap();

    let value = serde_json::to_value(&config).unwrap();
    assert_eq!(value["timeout"], 1.5);

    let parsed: AnalyzeConfig = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.timeout, Some(Duration::from_millis(1500)));
}

#[test]
fn test_config_missing_fields_use_defaults() {
    let parsed: AnalyzeConfig = serde_json::from_str(r#"{"walk_threads": 2}"#).unwrap();
    assert_eq!(parsed.walk_threads, 2);
    assert!(parsed.parallel_layers);
    assert!(parsed.include_hidden);
    assert!(parsed.timeout.is_none());
}

#[test]
fn test_config_rejects_out_of_range_timeout() {
    for input in [r#"{"timeout": 1e30}"#, r#"{"timeout": -1.0}"#] {
        let result = serde_json::from_str::<AnalyzeConfig>(input);
        assert!(result.is_err(), "accepted {input}");
    }
}

proptest! {
    #[test]
    fn relative_path_depth_counts_components(parts in prop::collection::vec("[a-z0-9_.-]{1,8}", 0..8)) {
        let joined = parts.iter().fold(RelativePath::root(), |p, name| p.join(name));
        prop_assert_eq!(joined.depth(), parts.len());
        prop_assert!(joined.as_str().starts_with('/'));
    }

    #[test]
    fn ratio_is_undefined_only_for_zero_denominator(num in 0u64..10_000, den in 0u64..10_000) {
        let metric = Metric::ratio(num, den);
        prop_assert_eq!(metric.is_undefined(), den == 0);
        if let Some(v) = metric.value() {
            prop_assert!(v.is_finite());
        }
    }
}
