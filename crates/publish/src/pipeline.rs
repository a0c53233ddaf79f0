//! Publish orchestration: archive, upload, poll, open.

use std::sync::Arc;

use sitedrop_archive::ArchiveError;
use sitedrop_netlify::{Client, NetlifyError, PollPolicy, poll_until_ready};
use sitedrop_report::{ReportEvent, send_event};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::settings::PublishSettings;

/// Callback invoked with the published page URL.
pub type OpenUrl = Arc<dyn Fn(&str) + Send + Sync>;

/// Errors that end a publish task.
///
/// Upload transport failures are not represented here: they are logged and
/// reported on the sink, and the task ends without a published site, the
/// same as an upload response that never started a deploy.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Netlify error: {0}")]
    Netlify(#[from] NetlifyError),
}

/// Orchestrates one-shot site publishing.
pub struct Publisher {
    events_tx: mpsc::Sender<ReportEvent>,
    events_rx: Option<mpsc::Receiver<ReportEvent>>,
    cancel: CancellationToken,
    poll_policy: PollPolicy,
    api_base: Option<String>,
    open_url: OpenUrl,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher {
    /// Creates a publisher that opens URLs in the system browser.
    pub fn new() -> Self {
        let (events_tx, events_rx) = sitedrop_report::channel();
        Self {
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
            poll_policy: PollPolicy::default(),
            api_base: None,
            open_url: Arc::new(|url: &str| {
                if let Err(e) = open::that(url) {
                    warn!(%url, error = %e, "could not open URL");
                }
            }),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<ReportEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for the publish task.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Overrides the readiness poll policy.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    /// Points the pipeline at a different API host (local mock servers).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Replaces the open-URL action.
    pub fn with_opener(mut self, opener: OpenUrl) -> Self {
        self.open_url = opener;
        self
    }

    /// Publishes the configured source directory and, once the deploy is
    /// live, opens `file_to_open` under the deployed site's base URL.
    ///
    /// Returns a task handle the caller may await, cancel through
    /// [`cancel_token`](Self::cancel_token), or drop to detach. Outcome is
    /// also observable on the event sink; an upload response that carries
    /// no deploy handle ends the task successfully without polling or
    /// opening anything.
    pub fn publish(
        &self,
        settings: PublishSettings,
        file_to_open: impl Into<String>,
    ) -> JoinHandle<Result<(), PublishError>> {
        let events_tx = self.events_tx.clone();
        let cancel = self.cancel.clone();
        let policy = self.poll_policy.clone();
        let api_base = self.api_base.clone();
        let opener = Arc::clone(&self.open_url);
        let file_to_open = file_to_open.into();

        tokio::spawn(async move {
            let result = run_publish(
                settings,
                &file_to_open,
                &events_tx,
                &cancel,
                &policy,
                api_base,
                opener,
            )
            .await;

            if let Err(e) = &result {
                error!(error = %e, "publish failed");
                send_event(
                    &events_tx,
                    ReportEvent::error("Publish failed", e.to_string()),
                )
                .await;
            }
            result
        })
    }
}

async fn run_publish(
    settings: PublishSettings,
    file_to_open: &str,
    events_tx: &mpsc::Sender<ReportEvent>,
    cancel: &CancellationToken,
    policy: &PollPolicy,
    api_base: Option<String>,
    opener: OpenUrl,
) -> Result<(), PublishError> {
    // Source errors abort before any network call.
    let archive = sitedrop_archive::archive_dir(&settings.source_dir)?;

    let mut client = Client::new(&settings.site_id, &settings.api_token)?;
    if let Some(base) = api_base {
        client = client.with_base_url(base);
    }

    let handle = match client.create_deploy(archive).await {
        Ok(Some(handle)) => handle,
        Ok(None) => {
            info!("deploy not started: response carried no url");
            return Ok(());
        }
        // Transport failures on upload are logged, never retried here and
        // never surfaced past this task.
        Err(e) => {
            warn!(error = %e, "deploy upload failed");
            send_event(
                events_tx,
                ReportEvent::error("Deploy upload failed", e.to_string()),
            )
            .await;
            return Ok(());
        }
    };

    info!(deploy_id = %handle.id, url = %handle.url, "deploy created; waiting for ready");
    poll_until_ready(&client, &handle, policy, cancel, events_tx).await?;

    if !file_to_open.is_empty() {
        opener(&format!("{}/{}", handle.url, file_to_open));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Mock Netlify API: one response for the deploy-creation POST, then a
    /// sequence of status responses for GETs (repeating the last).
    struct MockNetlify {
        url: String,
        posts: Arc<AtomicUsize>,
        gets: Arc<AtomicUsize>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Drop for MockNetlify {
        fn drop(&mut self) {
            self.handle.abort();
        }
    }

    async fn mock_netlify(post_body: &str, get_bodies: Vec<String>) -> MockNetlify {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let post_body = post_body.to_string();

        let posts = Arc::new(AtomicUsize::new(0));
        let gets = Arc::new(AtomicUsize::new(0));

        let posts_srv = Arc::clone(&posts);
        let gets_srv = Arc::clone(&gets);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let request = read_request(&mut stream).await;

                let body = if request.starts_with("POST") {
                    posts_srv.fetch_add(1, Ordering::SeqCst);
                    post_body.clone()
                } else {
                    let i = gets_srv.fetch_add(1, Ordering::SeqCst);
                    get_bodies[i.min(get_bodies.len() - 1)].clone()
                };

                let resp = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        MockNetlify {
            url,
            posts,
            gets,
            handle,
        }
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return String::from_utf8_lossy(&buf).into_owned();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    fn recording_opener() -> (OpenUrl, Arc<Mutex<Vec<String>>>) {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&opened);
        let opener: OpenUrl = Arc::new(move |url: &str| {
            sink.lock().unwrap().push(url.to_string());
        });
        (opener, opened)
    }

    fn settings_for(source: &Path) -> PublishSettings {
        PublishSettings {
            site_id: "site-123".into(),
            api_token: "tkn".into(),
            source_dir: source.to_path_buf(),
            last_export_path: None,
        }
    }

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(10),
            max_attempts: None,
        }
    }

    #[tokio::test]
    async fn publish_opens_page_once_ready() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("index.html"), b"<h1>x</h1>").unwrap();

        let api = mock_netlify(
            r#"{"id":"d1","url":"https://site.netlify.app"}"#,
            vec![
                r#"{"state":"pending"}"#.into(),
                r#"{"state":"ready"}"#.into(),
            ],
        )
        .await;

        let (opener, opened) = recording_opener();
        let publisher = Publisher::new()
            .with_api_base(api.url.clone())
            .with_poll_policy(fast_policy())
            .with_opener(opener);

        publisher
            .publish(settings_for(src.path()), "index.html")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(api.posts.load(Ordering::SeqCst), 1);
        assert_eq!(api.gets.load(Ordering::SeqCst), 2);
        assert_eq!(
            *opened.lock().unwrap(),
            vec!["https://site.netlify.app/index.html".to_string()]
        );
    }

    #[tokio::test]
    async fn publish_without_file_to_open_opens_nothing() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("index.html"), b"x").unwrap();

        let api = mock_netlify(
            r#"{"id":"d1","url":"https://site.netlify.app"}"#,
            vec![r#"{"state":"ready"}"#.into()],
        )
        .await;

        let (opener, opened) = recording_opener();
        let publisher = Publisher::new()
            .with_api_base(api.url.clone())
            .with_poll_policy(fast_policy())
            .with_opener(opener);

        publisher
            .publish(settings_for(src.path()), "")
            .await
            .unwrap()
            .unwrap();

        assert!(opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_url_in_upload_response_is_a_noop() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("index.html"), b"x").unwrap();

        let api = mock_netlify(r#"{"state":"uploading"}"#, vec!["{}".into()]).await;

        let (opener, opened) = recording_opener();
        let publisher = Publisher::new()
            .with_api_base(api.url.clone())
            .with_poll_policy(fast_policy())
            .with_opener(opener);

        publisher
            .publish(settings_for(src.path()), "index.html")
            .await
            .unwrap()
            .unwrap();

        // No handle: no poll request, no open.
        assert_eq!(api.gets.load(Ordering::SeqCst), 0);
        assert!(opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_source_fails_before_any_network_call() {
        let src = tempfile::tempdir().unwrap();
        let missing = src.path().join("gone");

        let api = mock_netlify("{}", vec!["{}".into()]).await;
        let publisher = Publisher::new()
            .with_api_base(api.url.clone())
            .with_poll_policy(fast_policy());

        let err = publisher
            .publish(settings_for(&missing), "index.html")
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::Archive(ArchiveError::SourceUnavailable(_))
        ));
        assert_eq!(api.posts.load(Ordering::SeqCst), 0);
        assert_eq!(api.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upload_transport_error_ends_task_quietly() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("index.html"), b"x").unwrap();

        // A port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
        drop(listener);

        let (opener, opened) = recording_opener();
        let mut publisher = Publisher::new()
            .with_api_base(dead)
            .with_poll_policy(fast_policy())
            .with_opener(opener);
        let mut events = publisher.take_events().unwrap();

        publisher
            .publish(settings_for(src.path()), "index.html")
            .await
            .unwrap()
            .unwrap();

        // Logged and reported, not returned; nothing was opened.
        assert!(opened.lock().unwrap().is_empty());
        let ev = events.recv().await.unwrap();
        assert!(matches!(
            ev,
            ReportEvent::Error { message, .. } if message.contains("upload failed")
        ));
    }

    #[tokio::test]
    async fn cancel_token_stops_the_poll_loop() {
        let src = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("index.html"), b"x").unwrap();

        let api = mock_netlify(
            r#"{"id":"d1","url":"https://site.netlify.app"}"#,
            vec![r#"{"state":"pending"}"#.into()],
        )
        .await;

        let (opener, opened) = recording_opener();
        let publisher = Publisher::new()
            .with_api_base(api.url.clone())
            .with_poll_policy(fast_policy())
            .with_opener(opener);

        let cancel = publisher.cancel_token();
        let task = publisher.publish(settings_for(src.path()), "index.html");

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let err = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("publish must end on cancel")
            .unwrap()
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::Netlify(NetlifyError::Cancelled)
        ));
        assert!(opened.lock().unwrap().is_empty());
    }

    #[test]
    fn take_events_once() {
        let mut publisher = Publisher::new();
        assert!(publisher.take_events().is_some());
        assert!(publisher.take_events().is_none());
    }
}
