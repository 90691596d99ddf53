use super::*;
use crate::test_support::{FakeTabs, Hosts, InjectionStep, LoadBehavior, WindowCall};
use pipdock_protocols::{WindowGeometry, WindowState};

fn controller(hosts: &Hosts) -> PopupWindowController {
    PopupWindowController::new(hosts.services(), ControllerSettings::default())
}

fn open_request(url: &str) -> OpenRequest {
    OpenRequest {
        url: Some(url.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_open_places_and_tags_window() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);

    let request = OpenRequest {
        width: Some(3000.0),
        height: Some(100.0),
        position: Some("top-left".to_string()),
        ..open_request("https://vimeo.com/42")
    };
    let window = controller.open(request, OpenPath::Generic).await.unwrap();

    let creates = hosts.windowing.creates();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].url, "https://vimeo.com/42?pipdock=1");
    assert!(creates[0].focused);
    assert_eq!(
        creates[0].geometry,
        WindowGeometry {
            width: 2000,
            height: 150,
            left: 16,
            top: 16
        }
    );

    let session = controller.session().await.unwrap();
    assert_eq!(session.window_id, window);
    assert_eq!(session.platform, Platform::Vimeo);
    assert_eq!(session.state(), SessionState::ActivatingPip);
    assert_eq!(controller.session_state(), SessionState::ActivatingPip);
    assert_eq!(hosts.injection.steps().len(), 5);
}

#[tokio::test]
async fn test_open_uses_defaults_and_hint() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);

    let request = OpenRequest {
        platform_hint: Some(Platform::Tiktok),
        position: Some("middle".to_string()),
        volume: Some(40.0),
        ..open_request("https://example.com/clip")
    };
    controller.open(request, OpenPath::Generic).await.unwrap();

    let geometry = hosts.windowing.creates()[0].geometry;
    assert_eq!((geometry.width, geometry.height), (640, 360));
    assert_eq!((geometry.left, geometry.top), (1920 - 640 - 16, 1080 - 360 - 16));

    let session = controller.session().await.unwrap();
    assert_eq!(session.platform, Platform::Tiktok);
    assert_eq!(session.position, PositionPreset::BottomRight);
    assert_eq!(session.volume, 0.4);
}

#[tokio::test]
async fn test_primary_path_is_youtube() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    controller
        .open(open_request("https://www.youtube.com/watch?v=x"), OpenPath::Primary)
        .await
        .unwrap();
    assert_eq!(controller.session().await.unwrap().platform, Platform::Youtube);
}

#[tokio::test]
async fn test_invalid_url_touches_nothing() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);

    let result = controller
        .open(open_request("ftp://files.example.com/a.mp4"), OpenPath::Generic)
        .await;
    assert!(matches!(result, Err(PipdockError::Validation(_))));

    let result = controller.open(OpenRequest::default(), OpenPath::Generic).await;
    assert!(matches!(result, Err(PipdockError::Validation(_))));
    assert!(hosts.windowing.calls().is_empty());
}

#[tokio::test]
async fn test_reopen_keeps_exactly_one_window() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);

    let first = controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();
    controller.minimize().await.unwrap();
    assert_eq!(controller.session_state(), SessionState::Active);

    let second = controller
        .open(open_request("https://vimeo.com/2"), OpenPath::Generic)
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(hosts.windowing.removed(), vec![first]);
    assert_eq!(controller.session().await.unwrap().window_id, second);
}

#[tokio::test]
async fn test_reopen_swallows_missing_window() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();

    hosts
        .windowing
        .fail_remove(HostError::NotFound("No window with id: 1.".to_string()));
    let second = controller
        .open(open_request("https://vimeo.com/2"), OpenPath::Generic)
        .await
        .unwrap();
    assert_eq!(controller.session().await.unwrap().window_id, second);
}

#[tokio::test]
async fn test_close_without_session_makes_no_host_calls() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    controller.close().await;
    assert!(hosts.windowing.calls().is_empty());
    assert_eq!(controller.session_state(), SessionState::Closed);
}

#[tokio::test]
async fn test_close_clears_session_even_on_failure() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    let window = controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();

    hosts
        .windowing
        .fail_remove(HostError::Operation("browser busy".to_string()));
    controller.close().await;

    assert_eq!(hosts.windowing.removed(), vec![window]);
    assert!(controller.session().await.is_none());
    assert_eq!(controller.session_state(), SessionState::Closed);
}

#[tokio::test]
async fn test_minimize_without_session_is_noop() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    controller.minimize().await.unwrap();
    assert!(hosts.windowing.calls().is_empty());
}

#[tokio::test]
async fn test_minimize_sets_window_state() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    let window = controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();

    controller.minimize().await.unwrap();
    assert!(
        hosts
            .windowing
            .calls()
            .contains(&WindowCall::SetState(window, WindowState::Minimized))
    );
}

#[tokio::test]
async fn test_minimize_error_policy() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();

    assert_eq!(controller.session_state(), SessionState::ActivatingPip);

    // a reported failure leaves the session where it was
    hosts
        .windowing
        .fail_set_state(HostError::Operation("fullscreen".to_string()));
    assert!(matches!(
        controller.minimize().await,
        Err(PipdockError::Host(HostError::Operation(_)))
    ));
    assert_eq!(controller.session_state(), SessionState::ActivatingPip);
    assert_eq!(
        controller.session().await.map(|s| s.state()),
        Some(SessionState::ActivatingPip)
    );

    hosts
        .windowing
        .fail_set_state(HostError::NotFound("No window with id: 1.".to_string()));
    assert!(controller.minimize().await.is_ok());
    assert_eq!(controller.session_state(), SessionState::Active);
}

#[tokio::test]
async fn test_window_removed_only_clears_tracked_window() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    let window = controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();

    controller.on_window_removed(WindowId(window.0 + 100)).await;
    assert!(controller.session().await.is_some());

    controller.on_window_removed(window).await;
    assert!(controller.session().await.is_none());
    assert_eq!(controller.session_state(), SessionState::Closed);

    // nothing left to remove
    controller.close().await;
    assert!(hosts.windowing.removed().is_empty());
}

#[tokio::test]
async fn test_generic_metadata_failure_reports_but_keeps_window() {
    let hosts = Hosts::new();
    hosts.injection.fail(
        InjectionStep::Metadata,
        HostError::Operation("context destroyed".to_string()),
    );
    let controller = controller(&hosts);

    let result = controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await;
    assert!(result.is_err());
    assert!(!hosts.injection.steps().contains(&InjectionStep::MainScript));

    let session = controller.session().await.unwrap();
    assert_eq!(session.state(), SessionState::Injecting);

    controller.close().await;
    assert_eq!(hosts.windowing.removed(), vec![session.window_id]);
}

#[tokio::test]
async fn test_primary_metadata_failure_does_not_abort() {
    let hosts = Hosts::new();
    hosts.injection.fail(
        InjectionStep::Metadata,
        HostError::Operation("context destroyed".to_string()),
    );
    let controller = controller(&hosts);

    controller
        .open(open_request("https://www.youtube.com/watch?v=x"), OpenPath::Primary)
        .await
        .unwrap();
    assert!(hosts.injection.steps().contains(&InjectionStep::MainScript));
}

#[tokio::test]
async fn test_window_without_tab_is_an_error() {
    let hosts = Hosts::new();
    hosts.windowing.without_tab();
    let controller = controller(&hosts);

    let result = controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await;
    assert!(matches!(result, Err(PipdockError::Host(HostError::Operation(_)))));
    assert!(hosts.injection.steps().is_empty());
    assert!(controller.session().await.is_some());
}

#[tokio::test]
async fn test_complete_tab_skips_waiting() {
    let hosts = Hosts::new();
    let controller = controller(&hosts);
    controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();
    assert_eq!(hosts.tabs.waits(), 0);
}

#[tokio::test]
async fn test_missing_tab_counts_as_loaded() {
    let hosts = Hosts::with_tabs(FakeTabs::new(None, LoadBehavior::Hangs));
    let controller = controller(&hosts);
    controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();
    assert_eq!(hosts.tabs.waits(), 0);
    assert_eq!(hosts.injection.steps().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_load_timeout_injects_anyway() {
    let hosts = Hosts::with_tabs(FakeTabs::new(Some(TabStatus::Loading), LoadBehavior::Hangs));
    let controller = controller(&hosts);

    let started = tokio::time::Instant::now();
    controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(15));
    assert_eq!(hosts.tabs.waits(), 1);
    assert_eq!(hosts.injection.steps().len(), 5);
}

#[tokio::test]
async fn test_loading_tab_waits_for_complete() {
    let hosts = Hosts::with_tabs(FakeTabs::new(
        Some(TabStatus::Loading),
        LoadBehavior::Completes,
    ));
    let controller = controller(&hosts);
    controller
        .open(open_request("https://vimeo.com/1"), OpenPath::Generic)
        .await
        .unwrap();
    assert_eq!(hosts.tabs.waits(), 1);
}

#[tokio::test]
async fn test_settings_from_config() {
    let mut config = Config::default();
    config.popup.width = 800;
    config.popup.position = "top-right".to_string();
    config.popup.load_timeout_ms = 500;

    let settings = ControllerSettings::from_config(&config);
    assert_eq!(settings.defaults.width, 800);
    assert_eq!(settings.defaults.height, 360);
    assert_eq!(settings.defaults.position, PositionPreset::TopRight);
    assert_eq!(settings.load_timeout, Duration::from_millis(500));
}
