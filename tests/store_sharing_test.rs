use std::{sync::Arc, time::Duration};

use serde_json::json;

use rca_console::{
    prompts::PromptStore,
    settings::{SettingsStore, Theme},
    ExecutionResult, FileStore, Notifier, ReportRenderer, ReportView, ResultCache, ResultEvent, SharedStore,
    StorageWatcher, RESULT_KEYS,
};

fn open(path: &std::path::Path) -> SharedStore {
    Arc::new(FileStore::open(path))
}

#[test]
fn result_written_by_one_handle_is_read_by_another() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let result = ExecutionResult::fetched(200, json!({"html": "<p>ok</p>"}), "application/json");
    ResultCache::new(open(&path)).write(&result).unwrap();

    let reader = ResultCache::new(open(&path));
    assert_eq!(reader.read(), Some(result));

    reader.clear().unwrap();
    assert_eq!(ResultCache::new(open(&path)).read(), None);
}

#[test]
fn clearing_results_keeps_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir.path().join("store.json"));
    let settings = SettingsStore::new(store.clone(), "https://example.test/default");
    settings.save_preferences(Theme::Light, true, false).unwrap();

    let cache = ResultCache::new(store.clone());
    cache.write(&ExecutionResult::transport_failure("boom")).unwrap();
    cache.clear().unwrap();

    assert_eq!(settings.load().theme, Theme::Light);
    assert!(!settings.load().notifications);
}

#[test]
fn backup_file_restores_into_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let source = open(&dir.path().join("a.json"));
    let source_settings = SettingsStore::new(source.clone(), "https://example.test/default");
    source_settings.save_webhook_url("https://example.test/hook").unwrap();
    source_settings.save_preferences(Theme::System, false, true).unwrap();

    let backup_path = dir.path().join("backup.json");
    let backup = source_settings.export_backup(&PromptStore::new(source));
    std::fs::write(&backup_path, serde_json::to_string_pretty(&backup).unwrap()).unwrap();

    let target = open(&dir.path().join("b.json"));
    let target_settings = SettingsStore::new(target.clone(), "https://example.test/default");
    let text = std::fs::read_to_string(&backup_path).unwrap();
    target_settings.import_backup(&PromptStore::new(target), &text).unwrap();

    assert_eq!(target_settings.load(), source_settings.load());
}

#[tokio::test]
async fn watcher_sees_write_from_another_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let notifier = Notifier::default();
    let events = notifier.subscribe();
    let watched = ResultCache::new(open(&path));
    let watcher = StorageWatcher::new(watched.clone(), Duration::from_millis(20)).spawn(notifier.clone());

    let mut view = ReportView::new(watched, ReportRenderer::default());
    view.refresh();

    let writer = ResultCache::new(open(&path));
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer
            .write(&ExecutionResult::fetched(200, json!({"html": "<p>from elsewhere</p>"}), ""))
            .unwrap();
    });

    let mut seen = Vec::new();
    let follow = view.follow(events, |event, rendition, _| {
        seen.push((event.clone(), rendition.document().map(str::to_string)));
    });
    let _ = tokio::time::timeout(Duration::from_millis(500), follow).await;
    watcher.abort();

    // every alias changes, but the view reports the new document once
    assert_eq!(seen.len(), 1);
    let (event, document) = &seen[0];
    assert!(matches!(event, ResultEvent::StorageChanged { key } if RESULT_KEYS.contains(&key.as_str())));
    assert!(document.as_deref().unwrap().contains("<p>from elsewhere</p>"));
}
