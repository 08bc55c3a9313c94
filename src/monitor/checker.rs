//! One check cycle for a single website.

use chrono::Utc;
use tracing::{debug, warn};

use crate::alerting::dispatcher::AlertDispatcher;
use crate::db::enums::{AlertKind, CheckStatus};
use crate::db::store::{MonitorStore, StoreError};
use crate::monitor::prober::Probe;

/// Runs the full cycle: re-read the website, probe it, commit the result and
/// dispatch an alert when the persisted status flipped.
///
/// The website is re-read here rather than cached across ticks so that edits
/// made while the previous probe was in flight are honored, and the
/// transition itself is decided against the status re-read inside the commit
/// transaction. A store failure aborts the cycle before any alert.
pub async fn run_check(
    store: &dyn MonitorStore,
    prober: &dyn Probe,
    dispatcher: &AlertDispatcher,
    website_id: i32,
) -> Result<(), StoreError> {
    let Some(site) = store.website(website_id).await? else {
        debug!(website_id, "Website vanished before its check; skipping.");
        return Ok(());
    };

    let outcome = prober.probe(&site.url, site.timeout.max(1) as u64).await;
    let checked_at = Utc::now();

    let Some(transition) = store.commit_check(website_id, &outcome, checked_at).await? else {
        debug!(website_id, "Website deleted while its check was in flight.");
        return Ok(());
    };

    // A website that has never been checked gets no alert, whatever the
    // first result is. `unknown -> up` is also silent: only a recovery from
    // a recorded outage is worth a notification.
    let Some(old_status) = transition.old_status else {
        return Ok(());
    };
    if old_status == transition.new_status {
        return Ok(());
    }

    let alert = match transition.new_status {
        CheckStatus::Down => Some((AlertKind::Down, outcome.error.as_deref())),
        CheckStatus::Up if old_status == CheckStatus::Down => Some((AlertKind::Up, None)),
        _ => None,
    };

    if let Some((kind, detail)) = alert {
        if let Err(e) = dispatcher.dispatch(website_id, kind, detail).await {
            warn!(website_id, error = %e, "Failed to record alert dispatch.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::enums::DeliveryOutcome;
    use crate::db::store::memory::MemoryStore;
    use crate::alerting::dispatcher::{GLOBAL_ALERT_ENABLED_KEY, GLOBAL_WEBHOOK_KEY};
    use crate::monitor::prober::ProbeOutcome;
    use crate::monitor::test_probe::StubProber;

    struct Harness {
        store: Arc<MemoryStore>,
        dispatcher: AlertDispatcher,
        _hook: mockito::ServerGuard,
    }

    /// Store with website 1 and a live mockito webhook, alerting enabled.
    async fn harness(initial_status: Option<&str>) -> Harness {
        let mut hook = mockito::Server::new_async().await;
        hook.mock("POST", "/hook")
            .with_status(200)
            .with_body(r#"{"errcode":0}"#)
            .create_async()
            .await;

        let store = Arc::new(MemoryStore::new());
        store
            .add_website(1, "站点", "https://example.com", initial_status)
            .await;
        store
            .set_global(GLOBAL_WEBHOOK_KEY, &format!("{}/hook", hook.url()))
            .await;
        store.set_global(GLOBAL_ALERT_ENABLED_KEY, "true").await;

        let dispatcher = AlertDispatcher::new(store.clone());
        Harness {
            store,
            dispatcher,
            _hook: hook,
        }
    }

    #[tokio::test]
    async fn first_check_never_alerts() {
        let h = harness(None).await;
        let prober = StubProber::new(ProbeOutcome::down(None, "HTTP 500".to_owned()));

        run_check(h.store.as_ref(), &prober, &h.dispatcher, 1)
            .await
            .unwrap();

        assert_eq!(h.store.status_of(1).await.as_deref(), Some("down"));
        assert_eq!(h.store.monitor_logs().await.len(), 1);
        assert!(h.store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_to_up_stays_silent() {
        let h = harness(Some("unknown")).await;
        let prober = StubProber::new(ProbeOutcome::up(0.1));

        run_check(h.store.as_ref(), &prober, &h.dispatcher, 1)
            .await
            .unwrap();

        assert_eq!(h.store.status_of(1).await.as_deref(), Some("up"));
        assert!(h.store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_to_down_alerts() {
        let h = harness(Some("unknown")).await;
        let prober = StubProber::new(ProbeOutcome::down(None, "connect error".to_owned()));

        run_check(h.store.as_ref(), &prober, &h.dispatcher, 1)
            .await
            .unwrap();

        let alerts = h.store.alert_logs().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Down);
        assert!(alerts[0].message.contains("connect error"));
    }

    #[tokio::test]
    async fn up_to_down_alerts() {
        let h = harness(Some("up")).await;
        let prober = StubProber::new(ProbeOutcome::down(Some(0.2), "HTTP 502".to_owned()));

        run_check(h.store.as_ref(), &prober, &h.dispatcher, 1)
            .await
            .unwrap();

        let alerts = h.store.alert_logs().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Down);
        assert_eq!(alerts[0].outcome, DeliveryOutcome::Success);
    }

    #[tokio::test]
    async fn down_to_up_sends_recovery() {
        let h = harness(Some("down")).await;
        let prober = StubProber::new(ProbeOutcome::up(0.05));

        run_check(h.store.as_ref(), &prober, &h.dispatcher, 1)
            .await
            .unwrap();

        let alerts = h.store.alert_logs().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Up);
        assert!(alerts[0].message.contains("恢复"));
    }

    #[tokio::test]
    async fn steady_state_does_not_alert() {
        let h = harness(Some("down")).await;
        let prober = StubProber::new(ProbeOutcome::down(None, "still down".to_owned()));

        run_check(h.store.as_ref(), &prober, &h.dispatcher, 1)
            .await
            .unwrap();

        assert_eq!(h.store.monitor_logs().await.len(), 1);
        assert!(h.store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn vanished_website_is_skipped() {
        let h = harness(Some("up")).await;
        h.store.remove_website(1).await;
        let prober = StubProber::new(ProbeOutcome::up(0.1));

        run_check(h.store.as_ref(), &prober, &h.dispatcher, 1)
            .await
            .unwrap();

        assert!(h.store.monitor_logs().await.is_empty());
        assert!(h.store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn commit_failure_aborts_without_alerting() {
        let h = harness(Some("up")).await;
        let prober = StubProber::new(ProbeOutcome::down(None, "HTTP 500".to_owned()));
        h.store.fail_next_commit();

        let result = run_check(h.store.as_ref(), &prober, &h.dispatcher, 1).await;

        assert!(result.is_err());
        // Status stays what it was; nothing was logged and nothing alerted.
        assert_eq!(h.store.status_of(1).await.as_deref(), Some("up"));
        assert!(h.store.monitor_logs().await.is_empty());
        assert!(h.store.alert_logs().await.is_empty());
    }
}
