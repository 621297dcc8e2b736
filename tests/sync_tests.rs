//! Branch synchronization properties: idempotence, isomorphism,
//! non-interference, dry-run purity, fallback, and the reference scenarios.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use sisloc::client::FileStore;
use sisloc::document::Document;
use sisloc::fields::translatable_fields;
use sisloc::graph::{closure, preorder, Graph};
use sisloc::identity::{read_tag, TAG_KEY};
use sisloc::lang::LanguageMap;
use sisloc::limits::RateLimiter;
use sisloc::pipeline::{localize, run, RunOptions};
use sisloc::report::ChangeReport;
use sisloc::schema::SchemaKind;
use sisloc::translate::{MockTranslator, TranslationService};

// ═══════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════

/// English A→B→C (only B has text), Spanish wired to missing "20", French unwired
fn scenario_body() -> Value {
    json!({
        "starting_node_id": "1",
        "nodes": {
            "1": {"id": "1", "type": "page", "template_id": "choice",
                  "configuration": {"data_name": "language", "reasons": [
                      {"id": 1, "title": "English"},
                      {"id": 2, "title": "Spanish"},
                      {"id": 3, "title": "French"}
                  ]},
                  "next": {"conditions": [
                      {"lval": "reason_id", "op": "==", "rval": 1, "result": "2"},
                      {"lval": "reason_id", "op": "==", "rval": 2, "result": "20"},
                      {"lval": "reason_id", "op": "==", "rval": 3, "result": null}
                  ], "default": null}},
            "2": {"id": "2", "type": "page", "template_id": "photo",
                  "configuration": {"camera": "front", "required": true, "retries": 2},
                  "next": {"conditions": [], "default": "3"}},
            "3": {"id": "3", "type": "page", "template_id": "message",
                  "labels": {"title": "Welcome"},
                  "configuration": {"style": "banner"},
                  "next": {"conditions": [], "default": "4"}},
            "4": {"id": "4", "type": "page", "template_id": "thanks",
                  "configuration": {"timeout": 10},
                  "next": null}
        }
    })
}

/// A forks to B (condition) and C (default); both merge into D
fn fork_merge_body() -> Value {
    json!({
        "starting_node_id": "1",
        "nodes": {
            "1": {"id": "1", "type": "page", "template_id": "choice",
                  "configuration": {"data_name": "language", "reasons": [
                      {"id": 1, "title": "English"}, {"id": 2, "title": "Deutsch"}
                  ]},
                  "next": {"conditions": [
                      {"lval": "reason_id", "rval": 1, "result": "10"},
                      {"lval": "reason_id", "rval": 2, "result": "50"}
                  ], "default": null}},
            "10": {"id": "10", "type": "page", "template_id": "question",
                   "labels": {"title": "Do you have an appointment?"},
                   "next": {"conditions": [
                       {"lval": "answer", "op": "==", "rval": "yes", "result": "11"}
                   ], "default": "12"}},
            "11": {"id": "11", "type": "page", "template_id": "host",
                   "labels": {"title": "Who are you visiting?"},
                   "next": {"conditions": [], "default": "13"}},
            "12": {"id": "12", "type": "page", "template_id": "form",
                   "labels": {"title": "Tell us about your visit"},
                   "next": {"conditions": [], "default": "13"}},
            "13": {"id": "13", "type": "page", "template_id": "thanks",
                   "labels": {"title": "Thank you"},
                   "next": null}
        }
    })
}

fn mock_service() -> (Arc<MockTranslator>, TranslationService) {
    let mock = Arc::new(MockTranslator::new());
    let service = TranslationService::new(mock.clone(), Arc::new(RateLimiter::new(1000.0, 1000)));
    (mock, service)
}

async fn localize_kiosk(graph: &mut Graph, service: &TranslationService) -> ChangeReport {
    localize(graph, SchemaKind::Kiosk, "English", &LanguageMap::default(), service)
        .await
        .unwrap()
}

fn language_pages(graph: &Graph) -> std::collections::HashSet<String> {
    graph
        .nodes()
        .filter(|n| SchemaKind::Kiosk.is_language_page(n))
        .map(|n| n.id().to_string())
        .collect()
}

// ═══════════════════════════════════════════
// REFERENCE SCENARIOS
// ═══════════════════════════════════════════

#[tokio::test]
async fn test_scenario_three_node_template_into_missing_branch() {
    let mut graph = Graph::from_value(scenario_body()).unwrap();
    let (mock, service) = mock_service();

    let report = localize_kiosk(&mut graph, &service).await;

    assert_eq!(report.nodes_created, 3);
    assert_eq!(report.nodes_updated, 0);
    assert_eq!(report.strings_translated, 1);
    assert_eq!(report.languages_processed, 1);
    assert!(report.warnings.is_empty());
    assert_eq!(mock.get_requests(), vec![("Welcome".to_string(), "es".to_string())]);

    // The wired id now exists and the mirrors are tagged to A, B, C in order
    let boundary = language_pages(&graph);
    let mirrors = preorder(&graph, "20", &boundary);
    assert_eq!(mirrors.len(), 3);
    let tagged: Vec<String> = mirrors
        .iter()
        .map(|id| read_tag(graph.get(id).unwrap()).unwrap().template_node_id)
        .collect();
    assert_eq!(tagged, vec!["2", "3", "4"]);
    for id in &mirrors {
        assert_eq!(read_tag(graph.get(id).unwrap()).unwrap().language, "es");
    }

    let b = graph.get(&mirrors[1]).unwrap();
    assert_eq!(b.body()["labels"]["title"], "[es] Welcome");
    // The language page itself is never edited
    assert_eq!(graph.get("1").unwrap().body(), &scenario_body()["nodes"]["1"]);
}

#[tokio::test]
async fn test_scenario_rerun_after_template_edit() {
    let mut graph = Graph::from_value(scenario_body()).unwrap();
    let (_, service) = mock_service();
    localize_kiosk(&mut graph, &service).await;

    // Edit the template's B title
    let mut value = graph.to_value();
    value["nodes"]["3"]["labels"]["title"] = json!("Welcome!");
    let mut graph = Graph::from_value(value).unwrap();

    let (mock, service) = mock_service();
    let report = localize_kiosk(&mut graph, &service).await;

    assert_eq!(report.nodes_created, 0);
    assert_eq!(report.nodes_updated, 1);
    assert_eq!(report.strings_translated, 1);
    assert_eq!(mock.request_count(), 1);

    let boundary = language_pages(&graph);
    let mirrors = preorder(&graph, "20", &boundary);
    assert_eq!(graph.get(&mirrors[1]).unwrap().body()["labels"]["title"], "[es] Welcome!");
}

/// Template node id → ids of every node tagged as its mirror for `language`
fn mirrors_by_template(graph: &Graph, language: &str) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in graph.nodes() {
        if let Some(tag) = read_tag(node).filter(|t| t.language == language) {
            out.entry(tag.template_node_id).or_default().push(node.id().to_string());
        }
    }
    out
}

#[tokio::test]
async fn test_rerun_after_node_inserted_into_template() {
    let mut graph = Graph::from_value(scenario_body()).unwrap();
    let (_, service) = mock_service();
    localize_kiosk(&mut graph, &service).await;
    let mirrored = mirrors_by_template(&graph, "es");

    // A→B→C becomes A→X→B→C
    let mut value = graph.to_value();
    value["nodes"]["2"]["next"]["default"] = json!("30");
    value["nodes"]["30"] = json!({
        "id": "30", "type": "page", "template_id": "notice",
        "labels": {"title": "Please wait"},
        "next": {"conditions": [], "default": "3"}
    });
    let mut graph = Graph::from_value(value).unwrap();
    let nodes_before = graph.len();

    let (_, service) = mock_service();
    let first = localize_kiosk(&mut graph, &service).await;
    assert_eq!(first.nodes_created, 0);
    assert_eq!(first.warning_count(), 3);
    let after_first = graph.to_value();

    for _ in 0..2 {
        let (_, service) = mock_service();
        let again = localize_kiosk(&mut graph, &service).await;
        assert_eq!(again.nodes_created, 0);
        assert_eq!(again.nodes_updated, 0);
        assert_eq!(graph.to_value(), after_first);
    }

    assert_eq!(graph.len(), nodes_before);
    assert_eq!(mirrors_by_template(&graph, "es"), mirrored);
    assert!(mirrors_by_template(&graph, "es").values().all(|ids| ids.len() == 1));
}

#[tokio::test]
async fn test_rerun_after_node_removed_from_template() {
    let mut graph = Graph::from_value(scenario_body()).unwrap();
    let (_, service) = mock_service();
    localize_kiosk(&mut graph, &service).await;

    // A→B→C becomes A→C; B stays in the document but is unreachable
    let mut value = graph.to_value();
    value["nodes"]["2"]["next"]["default"] = json!("4");
    let mut graph = Graph::from_value(value).unwrap();
    let nodes_before = graph.len();

    for _ in 0..2 {
        let (_, service) = mock_service();
        let report = localize_kiosk(&mut graph, &service).await;
        assert_eq!(report.nodes_created, 0);
        assert_eq!(report.nodes_updated, 0);
    }

    assert_eq!(graph.len(), nodes_before);
    assert!(mirrors_by_template(&graph, "es").values().all(|ids| ids.len() == 1));
}

#[tokio::test]
async fn test_unwired_language_is_skipped_silently() {
    let mut value = scenario_body();
    // Unwire Spanish too; only English is routed
    value["nodes"]["1"]["next"]["conditions"][1]["result"] = Value::Null;
    let mut graph = Graph::from_value(value.clone()).unwrap();
    let (mock, service) = mock_service();

    let report = localize_kiosk(&mut graph, &service).await;

    assert_eq!(report, ChangeReport::default());
    assert_eq!(mock.request_count(), 0);
    assert_eq!(graph.to_value(), value);
}

// ═══════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════

#[tokio::test]
async fn test_idempotent_rerun_makes_no_changes_or_calls() {
    let mut graph = Graph::from_value(fork_merge_body()).unwrap();
    let (_, service) = mock_service();
    let first = localize_kiosk(&mut graph, &service).await;
    assert_eq!(first.nodes_created, 4);
    let after_first = graph.to_value();

    let (mock, service) = mock_service();
    let second = localize_kiosk(&mut graph, &service).await;

    assert_eq!(second.nodes_created, 0);
    assert_eq!(second.nodes_updated, 0);
    assert_eq!(second.strings_translated, 0);
    assert_eq!(mock.request_count(), 0);
    assert_eq!(graph.to_value(), after_first);
}

#[tokio::test]
async fn test_shared_downstream_node_is_mirrored_once() {
    let mut graph = Graph::from_value(fork_merge_body()).unwrap();
    let (_, service) = mock_service();
    localize_kiosk(&mut graph, &service).await;

    let boundary = language_pages(&graph);
    let template = closure(&graph, "10", &boundary);
    let mirror = closure(&graph, "50", &boundary);
    assert_eq!(template.len(), 4);
    assert_eq!(mirror.len(), 4);
    assert!(template.is_disjoint(&mirror));

    // Both fork mirrors converge on the same mirror of 13
    let start = graph.get("50").unwrap();
    let edges = start.edges();
    let ends: Vec<Vec<String>> = edges.iter().map(|e| graph.get(e).unwrap().edges()).collect();
    assert_eq!(ends[0], ends[1]);
    assert_eq!(read_tag(graph.get(&ends[0][0]).unwrap()).unwrap().template_node_id, "13");
}

#[tokio::test]
async fn test_structural_isomorphism() {
    let mut graph = Graph::from_value(fork_merge_body()).unwrap();
    let (_, service) = mock_service();
    localize_kiosk(&mut graph, &service).await;

    let boundary = language_pages(&graph);
    let template = preorder(&graph, "10", &boundary);
    let mirror = preorder(&graph, "50", &boundary);
    assert_eq!(template.len(), mirror.len());

    let position: HashMap<&str, usize> = template
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .chain(mirror.iter().enumerate().map(|(i, id)| (id.as_str(), i)))
        .collect();
    for (t, m) in template.iter().zip(&mirror) {
        let t_edges: Vec<usize> = graph.get(t).unwrap().edges().iter().map(|e| position[e.as_str()]).collect();
        let m_edges: Vec<usize> = graph.get(m).unwrap().edges().iter().map(|e| position[e.as_str()]).collect();
        assert_eq!(t_edges, m_edges, "edge topology differs at template node {}", t);
    }
}

#[tokio::test]
async fn test_non_translatable_fields_are_byte_identical() {
    let mut graph = Graph::from_value(scenario_body()).unwrap();
    let (_, service) = mock_service();
    localize_kiosk(&mut graph, &service).await;

    let boundary = language_pages(&graph);
    let template = preorder(&graph, "2", &boundary);
    let mirror = preorder(&graph, "20", &boundary);
    let mapping: HashMap<String, String> = template.iter().cloned().zip(mirror.iter().cloned()).collect();

    for (t, m) in template.iter().zip(&mirror) {
        let template_node = graph.get(t).unwrap();
        let mirror_node = graph.get(m).unwrap();

        // Rebuild the mirror from the template using only the allowed edits
        let mut expected = template_node.clone();
        expected.set_id(m.clone());
        expected.rewrite_edges(|e| mapping.get(e).cloned());
        for path in translatable_fields(template_node, SchemaKind::Kiosk) {
            let translated = mirror_node.value_at(&path).unwrap().clone();
            expected.set_value_at(&path, translated);
        }
        let tag = mirror_node.body()["configuration"][TAG_KEY].clone();
        expected.configuration_mut().insert(TAG_KEY.to_string(), tag);

        assert_eq!(expected.body(), mirror_node.body());
    }
}

#[tokio::test]
async fn test_fallback_keeps_source_text_and_warns_per_field() {
    let mut value = scenario_body();
    value["nodes"]["2"]["labels"] = json!({"forward": "Start"});
    let mut graph = Graph::from_value(value).unwrap();
    let service = TranslationService::new(
        Arc::new(MockTranslator::failing()),
        Arc::new(RateLimiter::new(1000.0, 1000)),
    );

    let report = localize_kiosk(&mut graph, &service).await;

    assert_eq!(report.nodes_created, 3);
    assert_eq!(report.strings_translated, 0);
    assert_eq!(report.warning_count(), 2);

    let boundary = language_pages(&graph);
    let mirrors = preorder(&graph, "20", &boundary);
    assert_eq!(graph.get(&mirrors[0]).unwrap().body()["labels"]["forward"], "Start");
    assert_eq!(graph.get(&mirrors[1]).unwrap().body()["labels"]["title"], "Welcome");

    // Failed strings are retried on the next run
    let (mock, service) = mock_service();
    let retry = localize_kiosk(&mut graph, &service).await;
    assert_eq!(retry.strings_translated, 2);
    assert_eq!(retry.nodes_updated, 2);
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn test_untagged_branch_is_never_clobbered() {
    let mut value = scenario_body();
    value["nodes"]["20"] = json!({
        "id": "20", "type": "page", "template_id": "photo",
        "labels": {"title": "Hecho a mano"}, "next": null
    });
    let mut graph = Graph::from_value(value.clone()).unwrap();
    let (_, service) = mock_service();

    let report = localize_kiosk(&mut graph, &service).await;

    assert_eq!(report.nodes_created, 0);
    assert_eq!(report.warning_count(), 1);
    assert_eq!(graph.to_value(), value);
}

// ═══════════════════════════════════════════
// PIPELINE: DRY RUN VS WRITE
// ═══════════════════════════════════════════

fn write_document(dir: &tempfile::TempDir, name: &str, doc: &Document) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(&doc.to_value()).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn test_dry_run_matches_write_counts_and_persists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sample = Document::sample(SchemaKind::Kiosk);
    let dry_path = write_document(&dir, "dry.json", &sample);
    let write_path = write_document(&dir, "write.json", &sample);
    let original = std::fs::read_to_string(&dry_path).unwrap();

    let (_, service) = mock_service();
    let dry = run(&FileStore::new(&dry_path), "", &service, &RunOptions::default())
        .await
        .unwrap();

    let (_, service) = mock_service();
    let options = RunOptions {
        dry_run: false,
        ..RunOptions::default()
    };
    let written = run(&FileStore::new(&write_path), "", &service, &options)
        .await
        .unwrap();

    assert_eq!(dry.report, written.report);
    assert!(!dry.persisted);
    assert!(written.persisted);
    assert_eq!(std::fs::read_to_string(&dry_path).unwrap(), original);
    assert_ne!(std::fs::read_to_string(&write_path).unwrap(), original);
}

#[tokio::test]
async fn test_second_write_run_persists_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_document(&dir, "doc.json", &Document::sample(SchemaKind::Registration));
    let options = RunOptions {
        schema: SchemaKind::Registration,
        dry_run: false,
        ..RunOptions::default()
    };

    let (_, service) = mock_service();
    let first = run(&FileStore::new(&path), "", &service, &options).await.unwrap();
    assert_eq!(first.report.nodes_created, 3);
    let after_first = std::fs::read_to_string(&path).unwrap();

    let (mock, service) = mock_service();
    let second = run(&FileStore::new(&path), "", &service, &options).await.unwrap();
    assert_eq!(second.report.nodes_created, 0);
    assert_eq!(second.report.nodes_updated, 0);
    assert_eq!(mock.request_count(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);

    // Registration bodies stay native objects
    let persisted: Value = serde_json::from_str(&after_first).unwrap();
    assert!(persisted["registration_experience"]["body"].is_object());
}

#[tokio::test]
async fn test_registration_form_fields_are_translated() {
    let body = json!({
        "starting_node_id": "1",
        "nodes": {
            "1": {"id": "1", "type": "flex_field_page", "template_id": "choice",
                  "configuration": {"flex_field": "language", "options": [
                      {"id": 7, "label": "English", "value": "en"},
                      {"id": 8, "label": "Français", "value": "fr"}
                  ]},
                  "next": {"conditions": [
                      {"lval": "option_id", "rval": 7, "result": "2"},
                      {"lval": "option_id", "rval": 8, "result": "30"}
                  ], "default": null}},
            "2": {"id": "2", "type": "flex_field_page", "template_id": "details",
                  "configuration": {
                      "flex_field": "visit_type",
                      "form_fields": [{"key": "size", "label": "Size",
                                       "options": [{"label": "Small", "value": "s"}]}],
                      "buttons": {"submit": {"text": "Continue", "action": "next"}}
                  },
                  "next": null}
        }
    });
    let mut graph = Graph::from_value(body).unwrap();
    let (_, service) = mock_service();

    let report = localize(
        &mut graph,
        SchemaKind::Registration,
        "English",
        &LanguageMap::default(),
        &service,
    )
    .await
    .unwrap();

    assert_eq!(report.nodes_created, 1);
    assert_eq!(report.strings_translated, 3);
    let config = &graph.get("30").unwrap().body()["configuration"];
    assert_eq!(config["form_fields"][0]["label"], "[fr] Size");
    assert_eq!(config["form_fields"][0]["options"][0]["label"], "[fr] Small");
    assert_eq!(config["form_fields"][0]["options"][0]["value"], "s");
    assert_eq!(config["buttons"]["submit"]["text"], "[fr] Continue");
    assert_eq!(config["buttons"]["submit"]["action"], "next");
    assert_eq!(config["flex_field"], "visit_type");
}
