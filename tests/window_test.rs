mod common;

use std::sync::{Arc, Mutex};

use ability_host::{
    lifecycle::LaunchParams,
    sim::HeadlessWindowStage,
    window::{ContentLoadCallback, MockWindow, Window, WindowResult, WindowStage},
};
use common::{harness, release_bridge, PAGE_PATH};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_window_is_made_full_screen_and_page_loaded() {
    let h = harness(release_bridge());
    h.ability.on_create(LaunchParams::default()).await.unwrap();
    let stage = HeadlessWindowStage::new();

    h.ability.on_window_stage_create(&stage).await;

    assert!(stage.headless_window().unwrap().is_full_screen());
    assert_eq!(stage.loaded_paths(), vec![PAGE_PATH.to_string()]);
    assert!(h.ability.window().await.is_some());
    assert_eq!(h.ability.logger().open_trace_count(), 0);
}

#[tokio::test]
async fn test_missing_main_window_is_not_fatal() {
    let h = harness(release_bridge());
    let stage = HeadlessWindowStage::without_window();

    h.ability.on_window_stage_create(&stage).await;

    assert!(stage.loaded_paths().is_empty());
    assert!(h.ability.window().await.is_none());
    assert_eq!(h.ability.logger().open_trace_count(), 0);
}

#[tokio::test]
async fn test_setup_failure_skips_content_loading() {
    let h = harness(release_bridge());
    let stage = HeadlessWindowStage::with_failing_setup();

    h.ability.on_window_stage_create(&stage).await;

    assert!(stage.loaded_paths().is_empty());
    assert_eq!(h.ability.logger().open_trace_count(), 0);
}

#[tokio::test]
async fn test_content_error_is_not_fatal() {
    let h = harness(release_bridge());
    let stage = HeadlessWindowStage::with_content_error(16_000_001, "page not found");

    h.ability.on_window_stage_create(&stage).await;

    assert_eq!(stage.loaded_paths(), vec![PAGE_PATH.to_string()]);
    assert_eq!(h.ability.logger().open_trace_count(), 0);
}

/// Stage that keeps the completion callback until the test releases it.
struct DeferredStage {
    window: Arc<dyn Window>,
    pending: Mutex<Option<ContentLoadCallback>>,
}

impl WindowStage for DeferredStage {
    fn main_window(&self) -> WindowResult<Arc<dyn Window>> {
        Ok(self.window.clone())
    }

    fn load_content(&self, _path: &str, callback: ContentLoadCallback) {
        *self.pending.lock().unwrap() = Some(callback);
    }
}

#[tokio::test]
async fn test_trace_stays_open_until_content_completes() {
    let h = harness(release_bridge());
    let mut window = MockWindow::new();
    window
        .expect_set_layout_full_screen()
        .withf(|enabled| *enabled)
        .times(1)
        .returning(|_| Ok(()));
    let stage = DeferredStage {
        window: Arc::new(window),
        pending: Mutex::new(None),
    };

    h.ability.on_window_stage_create(&stage).await;
    assert_eq!(h.ability.logger().open_trace_count(), 1);

    let callback = stage.pending.lock().unwrap().take().unwrap();
    callback(Ok(serde_json::json!({})));
    assert_eq!(h.ability.logger().open_trace_count(), 0);
}

#[tokio::test]
async fn test_dropped_content_callback_closes_trace() {
    let h = harness(release_bridge());
    let mut window = MockWindow::new();
    window
        .expect_set_layout_full_screen()
        .returning(|_| Ok(()));
    let stage = DeferredStage {
        window: Arc::new(window),
        pending: Mutex::new(None),
    };

    h.ability.on_window_stage_create(&stage).await;
    drop(stage.pending.lock().unwrap().take());

    assert_eq!(h.ability.logger().open_trace_count(), 0);
}
