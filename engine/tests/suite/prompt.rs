use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use futures::FutureExt;
use pretty_assertions::assert_eq;
use scout_engine::Finder;
use scout_engine::FinderConfig;
use scout_engine::FinderError;
use scout_engine::FinderEvent;
use scout_engine::FinderOptions;
use scout_engine::FinderSource;
use scout_engine::FilterSource;
use scout_engine::protocol::DisplayEntry;
use scout_engine::protocol::Location;

use super::harness::HostCall;
use super::harness::MockHost;
use super::harness::ORIGIN_PANE;

fn no_preview() -> FinderConfig {
    let mut config = FinderConfig::default();
    config.preview.enabled = Some(false);
    config
}

fn loaded_source(items: &[&str]) -> FilterSource<String> {
    let items: Vec<String> = items.iter().copied().map(str::to_string).collect();
    FilterSource::new(move || {
        let items = items.clone();
        async move { Ok(items) }.boxed()
    })
}

/// A filter finder whose entries carry a `{label}.rs:4` location.
fn located_finder(host: Arc<MockHost>, items: &[&str], config: FinderConfig) -> Finder<String> {
    Finder::new(
        host,
        FinderOptions::new(
            "files",
            "Files",
            FinderSource::Filter(loaded_source(items)),
            |item, _| {
                DisplayEntry::new(item.clone())
                    .with_location(Location::new(format!("{item}.rs"), 4, 1))
            },
        )
        .with_config(config),
    )
}

fn plain_finder(host: Arc<MockHost>, items: &[&str]) -> Finder<String> {
    Finder::new(
        host,
        FinderOptions::new(
            "files",
            "Files",
            FinderSource::Filter(loaded_source(items)),
            |item, _| DisplayEntry::new(item.clone()),
        ),
    )
}

#[tokio::test]
async fn opening_a_filter_prompt_shows_the_unfiltered_set() {
    let host = Arc::new(MockHost::default());
    let finder = plain_finder(host.clone(), &["alpha", "beta", "gamma"]);

    finder.prompt().await.unwrap();

    assert!(finder.is_open());
    assert_eq!(
        host.last_suggestions(),
        Some(vec![
            "alpha".to_string(),
            "beta".to_string(),
            "gamma".to_string(),
        ])
    );
    assert_eq!(
        host.subscriptions(),
        vec![
            "scout.files.input-changed".to_string(),
            "scout.files.selection-changed".to_string(),
            "scout.files.confirmed".to_string(),
            "scout.files.cancelled".to_string(),
        ]
    );
}

#[tokio::test]
async fn typing_reranks_the_loaded_set() {
    let host = Arc::new(MockHost::default());
    let finder = plain_finder(host.clone(), &["alpha", "beta", "gamma"]);
    finder.prompt().await.unwrap();

    finder
        .handle_event(FinderEvent::InputChanged {
            text: "ga".to_string(),
        })
        .await;
    assert_eq!(host.last_suggestions(), Some(vec!["gamma".to_string()]));

    finder
        .handle_event(FinderEvent::InputChanged {
            text: String::new(),
        })
        .await;
    assert_eq!(
        host.last_suggestions(),
        Some(vec![
            "alpha".to_string(),
            "beta".to_string(),
            "gamma".to_string(),
        ])
    );
}

#[tokio::test]
async fn opening_twice_is_an_error() {
    let host = Arc::new(MockHost::default());
    let finder = plain_finder(host, &["alpha"]);
    finder.prompt().await.unwrap();

    let err = finder.prompt().await.unwrap_err();
    assert!(matches!(err, FinderError::AlreadyOpen(id) if id == "files"));
    assert!(finder.is_open());
}

#[tokio::test]
async fn load_failures_degrade_to_an_empty_prompt() {
    let host = Arc::new(MockHost::default());
    let source = FilterSource::new(|| async { Err(anyhow::anyhow!("index unavailable")) }.boxed());
    let finder: Finder<String> = Finder::new(
        host.clone(),
        FinderOptions::new("files", "Files", FinderSource::Filter(source), |item, _| {
            DisplayEntry::new(item.clone())
        }),
    );

    finder.prompt().await.unwrap();

    assert!(finder.is_open());
    assert_eq!(host.last_suggestions(), Some(Vec::new()));
    assert_eq!(
        host.statuses(),
        vec!["load failed: index unavailable".to_string()]
    );
}

#[tokio::test]
async fn confirming_a_selection_opens_its_location_and_closes() {
    let host = Arc::new(MockHost::default());
    let finder = located_finder(host.clone(), &["alpha", "beta"], no_preview());
    finder.prompt().await.unwrap();

    finder
        .handle_event(FinderEvent::SelectionChanged { index: Some(1) })
        .await;
    finder.handle_event(FinderEvent::Confirmed).await;

    assert!(!finder.is_open());
    let calls = host.calls();
    assert!(calls.contains(&HostCall::OpenLocation {
        file: PathBuf::from("beta.rs"),
        line: 4,
    }));
    assert!(calls.contains(&HostCall::FocusPane(ORIGIN_PANE)));
    assert_eq!(host.unsubscriptions().len(), 4);
    assert_eq!(host.last_suggestions(), Some(Vec::new()));
}

#[tokio::test]
async fn confirming_with_no_selection_reports_a_status() {
    let host = Arc::new(MockHost::default());
    let finder = plain_finder(host.clone(), &["alpha"]);
    finder.prompt().await.unwrap();

    finder.handle_event(FinderEvent::Confirmed).await;

    assert!(!finder.is_open());
    assert_eq!(host.statuses(), vec!["no selection".to_string()]);
}

#[tokio::test]
async fn cancelling_restores_focus_and_unregisters() {
    let host = Arc::new(MockHost::default());
    let finder = plain_finder(host.clone(), &["alpha"]);
    finder.prompt().await.unwrap();

    let handled = finder.handle_event(FinderEvent::Cancelled).await;

    assert!(handled);
    assert!(!finder.is_open());
    assert!(host.calls().contains(&HostCall::FocusPane(ORIGIN_PANE)));
    assert_eq!(host.unsubscriptions().len(), 4);

    // Stale events after close are reported as unhandled.
    let handled = finder
        .handle_event(FinderEvent::InputChanged {
            text: "x".to_string(),
        })
        .await;
    assert!(!handled);
}

#[tokio::test]
async fn custom_select_handlers_replace_the_default_open() {
    let host = Arc::new(MockHost::default());
    let received: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let sink = received.clone();
    let finder = Finder::new(
        host.clone(),
        FinderOptions::new(
            "files",
            "Files",
            FinderSource::Filter(loaded_source(&["alpha"])),
            |item: &String, _| {
                DisplayEntry::new(item.clone())
                    .with_location(Location::new(format!("{item}.rs"), 4, 1))
            },
        )
        .with_config(no_preview())
        .with_on_select(move |item, _entry| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(item);
                Ok(())
            }
            .boxed()
        }),
    );
    finder.prompt().await.unwrap();

    finder
        .handle_event(FinderEvent::SelectionChanged { index: Some(0) })
        .await;
    finder.handle_event(FinderEvent::Confirmed).await;

    assert_eq!(received.lock().unwrap().as_deref(), Some("alpha"));
    assert!(
        !host
            .calls()
            .iter()
            .any(|call| matches!(call, HostCall::OpenLocation { .. }))
    );
}

#[tokio::test]
async fn selection_previews_the_entry_without_stealing_focus() {
    let host = Arc::new(MockHost::default());
    host.add_file(
        "alpha.rs",
        (1..=10).map(|n| format!("line {n}\n")).collect::<String>(),
    );
    let finder = located_finder(host.clone(), &["alpha"], FinderConfig::default());
    finder.prompt().await.unwrap();

    finder
        .handle_event(FinderEvent::SelectionChanged { index: Some(0) })
        .await;

    let surfaces = host.created_surfaces();
    assert_eq!(surfaces.len(), 1);
    assert_eq!(surfaces[0].0, "preview");
    // Focus went back to the prompt's origin after the preview opened.
    assert_eq!(
        host.calls().last(),
        Some(&HostCall::FocusPane(ORIGIN_PANE))
    );

    finder.handle_event(FinderEvent::Cancelled).await;
    assert!(
        host.calls()
            .contains(&HostCall::CloseSurface(surfaces[0].1))
    );
}

#[tokio::test]
async fn preview_read_failures_degrade_to_a_status() {
    let host = Arc::new(MockHost::default());
    let finder = located_finder(host.clone(), &["alpha"], FinderConfig::default());
    finder.prompt().await.unwrap();

    finder
        .handle_event(FinderEvent::SelectionChanged { index: Some(0) })
        .await;

    assert!(finder.is_open());
    assert_eq!(host.created_surfaces().len(), 0);
    assert!(host.statuses().iter().any(|s| s.starts_with("preview failed")));
}
