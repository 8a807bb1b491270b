use std::time::{Duration, Instant};

use mockito::{Matcher, Server};
use serde_json::json;

use rca_console::{
    prompts::PromptSet,
    stats::AnalysisHistory,
    CaseForm, ExecutionResult, NoContentReason, Notifier, ReportRenderer, Rendition, ResultCache, ResultEvent,
    SharedStore, MemoryStore, SubmitMethod, Submitter,
};

fn submitter(store: &SharedStore, notifier: &Notifier) -> Submitter {
    Submitter::new(
        reqwest::Client::new(),
        ResultCache::new(store.clone()),
        AnalysisHistory::new(store.clone(), 100),
        notifier.clone(),
    )
}

fn pump_failure() -> CaseForm {
    CaseForm { description: "pump failure".into(), ..CaseForm::default() }
}

#[tokio::test]
async fn successful_call_is_cached_and_rendered() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "payload": {
                "dur_min": 0,
                "reducao_pct": 0.0,
                "custo": 0.0,
                "faturamento_1h": 0.0,
                "descricao": "pump failure",
                "tag": "",
                "patrimonio": ""
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"html":"<p>ok</p>"}"#)
        .create_async()
        .await;

    let store = MemoryStore::shared();
    let notifier = Notifier::default();
    let mut events = notifier.subscribe();
    let url = format!("{}/hook", server.url());

    let result = submitter(&store, &notifier)
        .submit(SubmitMethod::Fetch, &url, &pump_failure(), &PromptSet::default())
        .await
        .unwrap();
    mock.assert_async().await;

    assert!(result.success);
    assert_eq!(result.status, 200);
    assert_eq!(events.recv().await.unwrap(), ResultEvent::Completed { success: true, status: 200 });

    let cached = ResultCache::new(store.clone()).read().unwrap();
    assert_eq!(cached, result);
    assert_eq!(cached.content_type, "application/json");
    assert_eq!(cached.method, SubmitMethod::Fetch);

    let doc = ReportRenderer::default().render(&cached);
    assert!(doc.document().unwrap().contains("<p>ok</p>"));

    let history = AnalysisHistory::new(store, 100).records();
    assert_eq!(history.len(), 1);
    assert!(history[0].success);
}

#[tokio::test]
async fn prompts_are_sent_verbatim() {
    let prompts = PromptSet { a1: "classify".into(), a2: "causes".into(), a3: "plan".into() };
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .match_body(Matcher::PartialJson(json!({
            "prompts": { "a1": "classify", "a2": "causes", "a3": "plan" }
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let store = MemoryStore::shared();
    let url = format!("{}/hook", server.url());
    submitter(&store, &Notifier::default())
        .submit(SubmitMethod::Fetch, &url, &pump_failure(), &prompts)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_destination_records_failure() {
    let store = MemoryStore::shared();
    let notifier = Notifier::default();
    let mut events = notifier.subscribe();

    // nothing listens on port 1
    let result = submitter(&store, &notifier)
        .submit(SubmitMethod::Fetch, "http://127.0.0.1:1/hook", &pump_failure(), &PromptSet::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, 0);
    assert_eq!(events.recv().await.unwrap(), ResultEvent::Completed { success: false, status: 0 });

    let cached = ResultCache::new(store).read().unwrap();
    assert!(!cached.success);
    assert_eq!(cached.status, 0);
    assert_eq!(
        ReportRenderer::default().render(&cached),
        Rendition::NoContent(NoContentReason::CallFailed { status: 0 })
    );
}

#[tokio::test]
async fn error_status_is_cached_as_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/hook")
        .with_status(500)
        .with_body(r#"{"html":"<p>partial</p>"}"#)
        .create_async()
        .await;

    let store = MemoryStore::shared();
    let url = format!("{}/hook", server.url());
    let result = submitter(&store, &Notifier::default())
        .submit(SubmitMethod::Fetch, &url, &pump_failure(), &PromptSet::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.status, 500);
    assert_eq!(
        ReportRenderer::default().render(&result),
        Rendition::NoContent(NoContentReason::CallFailed { status: 500 })
    );
}

#[tokio::test]
async fn plain_text_response_becomes_html_fallback() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/hook")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body><h2>Causas</h2></body></html>")
        .create_async()
        .await;

    let store = MemoryStore::shared();
    let url = format!("{}/hook", server.url());
    let result = submitter(&store, &Notifier::default())
        .submit(SubmitMethod::Fetch, &url, &pump_failure(), &PromptSet::default())
        .await
        .unwrap();

    assert_eq!(result.data["raw"], "<html><body><h2>Causas</h2></body></html>");
    let doc = ReportRenderer::default().render(&result).document().unwrap().to_string();
    assert!(doc.contains("<h2>Causas</h2>"));
    assert_eq!(doc.matches("<body").count(), 1);
}

#[tokio::test]
async fn form_delivery_writes_optimistic_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/hook")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::Regex("^payload=".into()))
        .with_status(500)
        .create_async()
        .await;

    let store = MemoryStore::shared();
    let url = format!("{}/hook", server.url());
    let result = submitter(&store, &Notifier::default())
        .submit(SubmitMethod::Form, &url, &pump_failure(), &PromptSet::default())
        .await
        .unwrap();
    mock.assert_async().await;

    // the destination's 500 is never observed on this path
    let cached: ExecutionResult = ResultCache::new(store).read().unwrap();
    assert_eq!(cached, result);
    assert!(cached.success);
    assert_eq!(cached.method, SubmitMethod::Form);
    assert_eq!(
        ReportRenderer::default().render(&cached),
        Rendition::NoContent(NoContentReason::NoHtml)
    );
}

#[tokio::test]
async fn form_delivery_does_not_wait_for_silent_destination() {
    // accepts connections (via the backlog) but never answers
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());

    let store = MemoryStore::shared();
    let submitter = submitter(&store, &Notifier::default()).with_form_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let result = submitter
        .submit(SubmitMethod::Form, &url, &pump_failure(), &PromptSet::default())
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert!(result.success);
    assert_eq!(ResultCache::new(store).read(), Some(result));
    assert!(!submitter.is_busy());
    drop(listener);
}

#[tokio::test]
async fn validation_failure_touches_nothing() {
    let store = MemoryStore::shared();
    let err = submitter(&store, &Notifier::default())
        .submit(SubmitMethod::Fetch, "https://example.test/hook", &CaseForm::default(), &PromptSet::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("description"));
    assert_eq!(ResultCache::new(store).read(), None);
}
