//! Webhook alert dispatch.
//!
//! Builds the notification for a status transition, delivers it to the
//! globally configured DingTalk-style webhook and appends the attempt to the
//! alert history. Dispatch is best effort: delivery failures are recorded,
//! never retried and never escalated to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use crate::alerting::signer;
use crate::db::entities::website;
use crate::db::enums::{AlertKind, DeliveryOutcome};
use crate::db::store::{MonitorStore, NewAlertLog, StoreError};
use crate::security::secrets;

pub const GLOBAL_WEBHOOK_KEY: &str = "global_dingtalk_webhook";
pub const GLOBAL_ALERT_ENABLED_KEY: &str = "global_alert_enabled";
pub const GLOBAL_SECRET_KEY: &str = "global_dingtalk_secret";

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AlertDispatcher {
    store: Arc<dyn MonitorStore>,
    client: Client,
}

impl AlertDispatcher {
    pub fn new(store: Arc<dyn MonitorStore>) -> Self {
        Self {
            store,
            client: Client::new(),
        }
    }

    /// Sends one transition alert for a website.
    ///
    /// Suppression is checked before any network attempt, in order: missing
    /// global webhook, global alerting disabled, per-website alerting
    /// disabled. A suppressed dispatch leaves no alert-history row; an
    /// attempted one always does, whatever the delivery outcome. The only
    /// error surfaced to the caller is a store failure.
    pub async fn dispatch(
        &self,
        website_id: i32,
        kind: AlertKind,
        error_detail: Option<&str>,
    ) -> Result<(), StoreError> {
        let Some(site) = self.store.website(website_id).await? else {
            return Ok(());
        };

        let webhook = self
            .store
            .global_value(GLOBAL_WEBHOOK_KEY)
            .await?
            .filter(|v| !v.is_empty());
        let Some(webhook) = webhook else {
            debug!(website_id, "Alert suppressed: no global webhook configured.");
            return Ok(());
        };

        // The flag must exist and not be "false"; a missing row means the
        // operator never enabled alerting at all.
        match self.store.global_value(GLOBAL_ALERT_ENABLED_KEY).await? {
            None => {
                debug!(website_id, "Alert suppressed: global alerting not enabled.");
                return Ok(());
            }
            Some(v) if v == "false" => {
                debug!(website_id, "Alert suppressed: global alerting disabled.");
                return Ok(());
            }
            Some(_) => {}
        }

        // Absence of a per-website row means alerting is enabled
        if self.store.alert_enabled_for(website_id).await? == Some(false) {
            debug!(website_id, "Alert suppressed: website alerting disabled.");
            return Ok(());
        }

        let message = render_message(&site, kind, error_detail);
        let url = self.delivery_url(&webhook).await?;
        let (outcome, delivery_error) = self.deliver(&url, &message).await;

        if outcome == DeliveryOutcome::Failed {
            warn!(
                website_id,
                kind = %kind,
                error = delivery_error.as_deref().unwrap_or(""),
                "Alert delivery failed."
            );
        }

        self.store
            .record_alert(NewAlertLog {
                website_id,
                kind,
                message,
                outcome,
                error: delivery_error,
                sent_at: Utc::now(),
            })
            .await
    }

    /// Appends the freshly signed `timestamp`/`sign` parameters when a shared
    /// secret is configured; otherwise the webhook URL is used as-is.
    async fn delivery_url(&self, webhook: &str) -> Result<String, StoreError> {
        let secret = self
            .store
            .global_value(GLOBAL_SECRET_KEY)
            .await?
            .map(|stored| secrets::decode(&stored))
            .unwrap_or_default();

        if secret.is_empty() {
            return Ok(webhook.to_owned());
        }
        let (timestamp, sign) = signer::sign_now(&secret);
        Ok(format!("{webhook}&timestamp={timestamp}&sign={sign}"))
    }

    async fn deliver(&self, url: &str, content: &str) -> (DeliveryOutcome, Option<String>) {
        let payload = serde_json::json!({
            "msgtype": "text",
            "text": { "content": content }
        });

        let request = self
            .client
            .post(url)
            .timeout(DELIVERY_TIMEOUT)
            .json(&payload);
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return (DeliveryOutcome::Failed, Some(e.to_string())),
        };

        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if code != 200 {
            return (
                DeliveryOutcome::Failed,
                Some(format!("HTTP {code}: {body}")),
            );
        }

        // DingTalk replies 200 even for rejected messages; the real verdict
        // is the errcode in the body. Plain receivers without the envelope
        // count as delivered.
        match serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("errcode").and_then(|c| c.as_i64()))
        {
            Some(0) | None => (DeliveryOutcome::Success, None),
            Some(errcode) => (
                DeliveryOutcome::Failed,
                Some(format!("errcode {errcode}: {body}")),
            ),
        }
    }
}

fn render_message(site: &website::Model, kind: AlertKind, error_detail: Option<&str>) -> String {
    let status_text = match kind {
        AlertKind::Down => "故障",
        AlertKind::Up => "恢复",
    };
    format!(
        "网站监控告警\n\n网站名称: {}\nURL: {}\n状态: {}\n时间: {}\n错误信息: {}",
        site.name,
        site.url,
        status_text,
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        error_detail.unwrap_or("无")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::memory::MemoryStore;
    use crate::security::secrets;
    use mockito::Matcher;

    async fn store_with_site() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .add_website(1, "示例站点", "https://example.com", Some("down"))
            .await;
        store
    }

    #[tokio::test]
    async fn missing_webhook_suppresses_without_alert_log() {
        let store = store_with_site().await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher
            .dispatch(1, AlertKind::Down, Some("HTTP 500"))
            .await
            .unwrap();
        assert!(store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_global_flag_suppresses() {
        let store = store_with_site().await;
        store.set_global(GLOBAL_WEBHOOK_KEY, "https://example.com/hook").await;
        store.set_global(GLOBAL_ALERT_ENABLED_KEY, "false").await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher.dispatch(1, AlertKind::Down, None).await.unwrap();
        assert!(store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn absent_global_flag_suppresses() {
        let store = store_with_site().await;
        store.set_global(GLOBAL_WEBHOOK_KEY, "https://example.com/hook").await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher.dispatch(1, AlertKind::Down, None).await.unwrap();
        assert!(store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn per_website_opt_out_suppresses() {
        let store = store_with_site().await;
        store.set_global(GLOBAL_WEBHOOK_KEY, "https://example.com/hook").await;
        store.set_global(GLOBAL_ALERT_ENABLED_KEY, "true").await;
        store.set_alert_enabled(1, false).await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher.dispatch(1, AlertKind::Down, None).await.unwrap();
        assert!(store.alert_logs().await.is_empty());
    }

    #[tokio::test]
    async fn no_per_website_row_means_enabled() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(200)
            .with_body(r#"{"errcode":0,"errmsg":"ok"}"#)
            .create_async()
            .await;

        let store = store_with_site().await;
        store
            .set_global(GLOBAL_WEBHOOK_KEY, &format!("{}/hook", server.url()))
            .await;
        store.set_global(GLOBAL_ALERT_ENABLED_KEY, "true").await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher
            .dispatch(1, AlertKind::Down, Some("HTTP 500"))
            .await
            .unwrap();

        mock.assert_async().await;
        let logs = store.alert_logs().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].kind, AlertKind::Down);
        assert_eq!(logs[0].outcome, DeliveryOutcome::Success);
        assert!(logs[0].message.contains("HTTP 500"));
        assert!(logs[0].message.contains("故障"));
    }

    #[tokio::test]
    async fn non_200_reply_records_failed_attempt() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let store = store_with_site().await;
        store
            .set_global(GLOBAL_WEBHOOK_KEY, &format!("{}/hook", server.url()))
            .await;
        store.set_global(GLOBAL_ALERT_ENABLED_KEY, "true").await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher.dispatch(1, AlertKind::Up, None).await.unwrap();

        let logs = store.alert_logs().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, DeliveryOutcome::Failed);
        assert!(logs[0].error.as_deref().unwrap().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn nonzero_errcode_is_a_delivery_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(200)
            .with_body(r#"{"errcode":310000,"errmsg":"sign not match"}"#)
            .create_async()
            .await;

        let store = store_with_site().await;
        store
            .set_global(GLOBAL_WEBHOOK_KEY, &format!("{}/hook", server.url()))
            .await;
        store.set_global(GLOBAL_ALERT_ENABLED_KEY, "true").await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher.dispatch(1, AlertKind::Down, None).await.unwrap();

        let logs = store.alert_logs().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, DeliveryOutcome::Failed);
        assert!(logs[0].error.as_deref().unwrap().contains("errcode 310000"));
    }

    #[tokio::test]
    async fn configured_secret_appends_signature_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("access_token".into(), "t0k3n".into()),
                Matcher::Regex("timestamp=\\d{13}".into()),
                Matcher::Regex("sign=".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"errcode":0}"#)
            .create_async()
            .await;

        let store = store_with_site().await;
        store
            .set_global(
                GLOBAL_WEBHOOK_KEY,
                &format!("{}/hook?access_token=t0k3n", server.url()),
            )
            .await;
        store.set_global(GLOBAL_ALERT_ENABLED_KEY, "true").await;
        store
            .set_global(GLOBAL_SECRET_KEY, &secrets::encode("SEC4f2b1c9d"))
            .await;
        let dispatcher = AlertDispatcher::new(store.clone());

        dispatcher.dispatch(1, AlertKind::Up, None).await.unwrap();

        mock.assert_async().await;
        let logs = store.alert_logs().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, DeliveryOutcome::Success);
        assert!(logs[0].message.contains("恢复"));
    }
}
