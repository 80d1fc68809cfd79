//! Chart aggregation over a small hand-built arena.

use battlelens_analytics::{build_chart, ChartFilters, TABLE_ROW_LIMIT};
use battlelens_common::{ClusterLevel, Row};

struct Obs<'a> {
    prompt: &'a str,
    model: &'a str,
    pair: (&'a str, &'a str),
    coarse: &'a str,
    fine: &'a str,
    unexpected: bool,
}

fn rows(obs: &[Obs<'_>]) -> Vec<Row> {
    obs.iter()
        .enumerate()
        .map(|(i, o)| Row {
            row_id: i as u64 + 1,
            prompt: o.prompt.to_string(),
            differences: format!("diff for {}", o.prompt),
            model: o.model.to_string(),
            model_1_name: o.pair.0.to_string(),
            model_2_name: o.pair.1.to_string(),
            coarse_cluster_label: o.coarse.to_string(),
            fine_cluster_label: o.fine.to_string(),
            property_description: format!("{} / {}", o.fine, o.model),
            unexpected_behavior: o.unexpected,
            ..Default::default()
        })
        .collect()
}

fn arena() -> Vec<Row> {
    let o = |prompt, model, pair, coarse, fine, unexpected| Obs {
        prompt,
        model,
        pair,
        coarse,
        fine,
        unexpected,
    };
    rows(&[
        o("p1", "A", ("A", "B"), "Reasoning", "Math slips", false),
        o("p1", "B", ("A", "B"), "Reasoning", "Math slips", false),
        o("p2", "A", ("A", "B"), "Reasoning", "Logic gaps", true),
        o("p3", "B", ("A", "B"), "Style", "Verbose", false),
        o("p4", "C", ("A", "C"), "Style", "Verbose", true),
        o("p5", "C", ("B", "C"), "Unknown", "Unknown", false),
    ])
}

fn filters(level: ClusterLevel) -> ChartFilters {
    ChartFilters {
        level,
        min_items: 1,
        ..Default::default()
    }
}

#[test]
fn coarse_chart_uses_battle_denominators() {
    let rows = arena();
    let out = build_chart(&rows, &filters(ClusterLevel::Coarse));

    // battles: A in p1..p4 = 4, B in p1,p2,p3,p5 = 4, C in p4,p5 = 2
    assert_eq!(out.unique_models, vec!["A", "B", "C"]);

    let reasoning = out.chart_data.iter().find(|p| p.cluster == "Reasoning").unwrap();
    // p1 is represented by its first row (model A), p2 also A
    assert_eq!(reasoning.total_items, 2);
    assert_eq!(reasoning.propensities["A"], 50.0);
    assert!(!reasoning.propensities.contains_key("B"));

    let style = out.chart_data.iter().find(|p| p.cluster == "Style").unwrap();
    assert_eq!(style.total_items, 2);
    assert_eq!(style.propensities["B"], 25.0);
    assert_eq!(style.propensities["C"], 50.0);
    assert_eq!(style.discrepancy, 25.0);

    assert!(out.chart_data.iter().all(|p| p.cluster != "Unknown"));
    assert_eq!(out.total_count, rows.len());
    assert_eq!(out.table_data.len(), rows.len());
}

#[test]
fn fine_drilldown_respects_coarse_cluster() {
    let rows = arena();
    let out = build_chart(
        &rows,
        &ChartFilters {
            coarse_cluster: Some("Reasoning".into()),
            ..filters(ClusterLevel::Fine)
        },
    );
    let names: Vec<&str> = out.chart_data.iter().map(|p| p.cluster.as_str()).collect();
    assert_eq!(names, vec!["Logic gaps", "Math slips"]);
    assert_eq!(out.total_count, 3);
}

#[test]
fn property_drilldown_respects_fine_cluster() {
    let rows = arena();
    let out = build_chart(
        &rows,
        &ChartFilters {
            coarse_cluster: Some("Style".into()),
            fine_cluster: Some("Verbose".into()),
            ..filters(ClusterLevel::Property)
        },
    );
    let names: Vec<&str> = out.chart_data.iter().map(|p| p.cluster.as_str()).collect();
    assert_eq!(names, vec!["Verbose / B", "Verbose / C"]);
}

#[test]
fn unexpected_only_keeps_flagged_rows() {
    let rows = arena();
    let out = build_chart(
        &rows,
        &ChartFilters {
            show_unexpected_only: true,
            ..filters(ClusterLevel::Coarse)
        },
    );
    assert_eq!(out.total_count, 2);
    assert!(out.table_data.iter().all(|r| r.unexpected_behavior));
    // denominators still cover every battle
    let style = out.chart_data.iter().find(|p| p.cluster == "Style").unwrap();
    assert_eq!(style.propensities["C"], 50.0);
}

#[test]
fn selected_models_filter_exhibitors_and_optionally_battles() {
    let rows = arena();
    let selected = ChartFilters {
        selected_models: vec!["A".into(), "B".into()],
        ..filters(ClusterLevel::Coarse)
    };
    let out = build_chart(&rows, &selected);
    assert!(out.table_data.iter().all(|r| r.model == "A" || r.model == "B"));
    assert_eq!(out.unique_models, vec!["A", "B", "C"]);

    let out = build_chart(
        &rows,
        &ChartFilters {
            filter_battle_models: true,
            ..selected
        },
    );
    // only p1..p3 are A-vs-B battles
    assert_eq!(out.unique_models, vec!["A", "B"]);
    let style = out.chart_data.iter().find(|p| p.cluster == "Style").unwrap();
    assert_eq!(style.propensities["B"], 100.0 / 3.0);
}

#[test]
fn discrepancy_filter_drops_uniform_clusters() {
    let rows = arena();
    let out = build_chart(
        &rows,
        &ChartFilters {
            show_discrepancy_only: true,
            discrepancy_threshold: 20.0,
            ..filters(ClusterLevel::Coarse)
        },
    );
    let names: Vec<&str> = out.chart_data.iter().map(|p| p.cluster.as_str()).collect();
    assert_eq!(names, vec!["Style"]);
}

#[test]
fn default_threshold_hides_small_clusters() {
    let rows = arena();
    let out = build_chart(&rows, &ChartFilters::default());
    assert!(out.chart_data.is_empty());
    assert_eq!(out.total_count, rows.len());
}

#[test]
fn table_is_capped_but_count_is_not() {
    let many: Vec<Row> = (0..TABLE_ROW_LIMIT + 25)
        .map(|i| Row {
            row_id: i as u64 + 1,
            prompt: format!("p{i}"),
            model: "A".into(),
            model_1_name: "A".into(),
            model_2_name: "B".into(),
            coarse_cluster_label: "Style".into(),
            property_description: "x".into(),
            ..Default::default()
        })
        .collect();
    let out = build_chart(&many, &ChartFilters::default());
    assert_eq!(out.table_data.len(), TABLE_ROW_LIMIT);
    assert_eq!(out.total_count, TABLE_ROW_LIMIT + 25);
    assert_eq!(out.chart_data[0].propensities["A"], 100.0);
}

#[test]
fn identical_input_gives_identical_output() {
    let rows = arena();
    let f = filters(ClusterLevel::Fine);
    assert_eq!(build_chart(&rows, &f), build_chart(&rows, &f));
}
