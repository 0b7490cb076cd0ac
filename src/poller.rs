use crate::error::LogwatchError;
use crate::log_view::LogView;
use crate::render::RenderSink;
use crate::session::SessionClient;
use crate::types::{LogRecord, ServerInfo};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

const LOGS_PATH: &str = "logs";
const SERVERS_PATH: &str = "servers";

/// One fetch → parse → classify → suppress → render pass.
pub async fn poll_once<S: RenderSink>(
    client: &SessionClient,
    view: &Arc<Mutex<LogView<S>>>,
) -> Result<bool, LogwatchError> {
    let cycle = view.lock().await.begin_cycle();

    let records: Vec<LogRecord> = client.get_json(LOGS_PATH).await?;
    debug!("Poll #{} fetched {} log records", cycle, records.len());

    let rendered = view.lock().await.complete_cycle(cycle, records);
    Ok(rendered)
}

/// Same as `poll_once`, but contains every failure. The next tick is the retry.
pub async fn run_cycle<S: RenderSink>(client: SessionClient, view: Arc<Mutex<LogView<S>>>) {
    match poll_once(&client, &view).await {
        Ok(true) => {}
        Ok(false) => debug!("Poll response superseded by a newer one"),
        Err(e) if e.is_session_loss() => {
            warn!("Log poll skipped: session invalidated");
        }
        Err(e) => {
            error!("Log poll failed: {}", e);
        }
    }
}

/// Loads the dashboard's server list into the view's scope options.
pub async fn refresh_servers<S: RenderSink>(
    client: &SessionClient,
    view: &Arc<Mutex<LogView<S>>>,
) -> Result<usize, LogwatchError> {
    let servers: Vec<ServerInfo> = client.get_json(SERVERS_PATH).await?;
    let count = servers.len();

    view.lock()
        .await
        .set_configured_servers(servers.into_iter().map(|server| server.name));

    info!("Loaded {} configured servers", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Category, FilterCriteria, ServerScope};
    use crate::log_view::test_sink::RecordingSink;
    use crate::session::test_server::{serve_held, serve_once};
    use crate::session::SessionStore;

    fn shared_view(category: Category) -> Arc<Mutex<LogView<RecordingSink>>> {
        Arc::new(Mutex::new(LogView::new(
            FilterCriteria::new(category, ServerScope::All),
            RecordingSink::default(),
        )))
    }

    #[tokio::test]
    async fn poll_renders_filtered_rows() {
        let (base, _request) = serve_once(
            "200 OK",
            r#"[
                {"CreatedAt":"1970-01-01T00:00:00.200Z","Level":"ERROR","Message":"[Srv2] boom"},
                {"CreatedAt":"1970-01-01T00:00:00.100Z","Level":"INFO","Message":"[Srv1] started"}
            ]"#,
        )
        .await;
        let client = SessionClient::new(base, Arc::new(SessionStore::new("t")));
        let view = shared_view(Category::Error);

        assert!(poll_once(&client, &view).await.unwrap());

        let view = view.lock().await;
        assert_eq!(view.sink().last(), ["Srv2|boom"]);
        assert_eq!(view.watermark().high_water_ms(), Some(200));
    }

    #[tokio::test]
    async fn superseded_poll_updates_watermark_without_rendering() {
        let (base, received, release) = serve_held(
            "200 OK",
            r#"[{"CreatedAt":"1970-01-01T00:00:00.900Z","Level":"INFO","Message":"[Old] slow"}]"#,
        )
        .await;
        let client = SessionClient::new(base, Arc::new(SessionStore::new("t")));
        let view = shared_view(Category::All);

        let slow = tokio::spawn({
            let view = Arc::clone(&view);
            async move { poll_once(&client, &view).await }
        });
        received.await.unwrap();

        {
            let mut view = view.lock().await;
            let newer = view.begin_cycle();
            assert!(view.complete_cycle(newer, vec![LogRecord::new("1970-01-01T00:00:00.100Z", "INFO", "[New] fast")]));
        }

        release.send(()).unwrap();
        assert!(!slow.await.unwrap().unwrap());

        let view = view.lock().await;
        assert_eq!(view.sink().tables.len(), 1);
        assert_eq!(view.sink().last(), ["New|fast"]);
        assert_eq!(view.watermark().high_water_ms(), Some(900));
    }

    #[tokio::test]
    async fn failed_poll_leaves_view_untouched() {
        let (base, _request) = serve_once("502 Bad Gateway", "{}").await;
        let store = Arc::new(SessionStore::new("t"));
        let client = SessionClient::new(base, Arc::clone(&store));
        let view = shared_view(Category::All);

        run_cycle(client, Arc::clone(&view)).await;

        let view = view.lock().await;
        assert!(view.sink().tables.is_empty());
        assert_eq!(view.watermark().high_water_ms(), None);
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn rejected_poll_invalidates_session() {
        let (base, _request) = serve_once("401 Unauthorized", "{}").await;
        let store = Arc::new(SessionStore::new("expired"));
        let client = SessionClient::new(base, Arc::clone(&store));

        run_cycle(client, shared_view(Category::All)).await;
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn loads_server_directory() {
        let (base, _request) = serve_once("200 OK", r#"[{"Name":"Home"},{"Name":"Away","HTTPPort":8096}]"#).await;
        let client = SessionClient::new(base, Arc::new(SessionStore::new("t")));
        let view = shared_view(Category::All);

        assert_eq!(refresh_servers(&client, &view).await.unwrap(), 2);
        let options: Vec<String> = view
            .lock()
            .await
            .server_scope_options()
            .iter()
            .map(|scope| scope.to_string())
            .collect();
        assert_eq!(options, ["all", "Away", "Home"]);
    }
}
