use crate::api::AskClient;
use crate::attachments::ingest::ingest_all;
use crate::event::AppEvent;
use crate::session::{AskDispatch, IngestDispatch};
use std::sync::{mpsc, Arc, Mutex};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs round-trips and image conversion on the tokio runtime and posts the
/// outcomes back to the UI thread.
#[derive(Clone)]
pub struct AskWorker {
    client: AskClient,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
    cancel: Arc<Mutex<CancellationToken>>,
    repaint: Arc<dyn Fn() + Send + Sync>,
}

impl AskWorker {
    pub fn new(client: AskClient, tx: mpsc::Sender<AppEvent>, runtime_handle: Handle) -> Self {
        Self {
            client,
            tx,
            runtime_handle,
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            repaint: Arc::new(|| {}),
        }
    }

    /// Called after every posted event so the UI wakes up to drain it.
    pub fn set_repaint(&mut self, repaint: impl Fn() + Send + Sync + 'static) {
        self.repaint = Arc::new(repaint);
    }

    fn current_token(&self) -> CancellationToken {
        match self.cancel.lock() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Cancels everything in flight. Work started afterwards gets a fresh token.
    pub fn cancel_all(&self) {
        let mut guard = match self.cancel.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.cancel();
        *guard = CancellationToken::new();
        info!("cancelled in-flight work");
    }

    /// Cancels and does not re-arm. Used on teardown.
    pub fn shutdown(&self) {
        match self.cancel.lock() {
            Ok(token) => token.cancel(),
            Err(poisoned) => poisoned.into_inner().cancel(),
        }
    }

    pub fn ask(&self, dispatch: AskDispatch) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let repaint = Arc::clone(&self.repaint);
        let token = self.current_token();

        info!(
            ticket = dispatch.ticket,
            phase = dispatch.phase.as_str(),
            images = dispatch.request.image_count(),
            url = client.url(),
            "sending ask"
        );

        self.runtime_handle.spawn(async move {
            let AskDispatch {
                ticket,
                phase,
                request,
            } = dispatch;

            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!(ticket, "ask cancelled");
                    return;
                }
                result = client.ask(&request) => result,
            };

            if tx
                .send(AppEvent::AskCompleted {
                    ticket,
                    phase,
                    result,
                })
                .is_err()
            {
                warn!(ticket, "ui is gone, dropping ask result");
                return;
            }
            repaint();
        });
    }

    pub fn ingest(&self, dispatch: IngestDispatch) {
        let tx = self.tx.clone();
        let repaint = Arc::clone(&self.repaint);
        let token = self.current_token();
        info!(ticket = dispatch.ticket, files = dispatch.files.len(), "ingesting images");

        self.runtime_handle.spawn(async move {
            let IngestDispatch { ticket, files } = dispatch;
            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!(ticket, "ingestion cancelled");
                    return;
                }
                result = ingest_all(files) => result,
            };

            if tx
                .send(AppEvent::AttachmentsIngested { ticket, result })
                .is_err()
            {
                warn!(ticket, "ui is gone, dropping ingestion result");
                return;
            }
            repaint();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{serve_once, silent_listener};
    use crate::api::{AskClient, AskRequest};
    use crate::config::Config;
    use crate::session::AskPhase;
    use std::time::Duration;

    fn worker_for(base: String) -> (AskWorker, mpsc::Receiver<AppEvent>) {
        let config = Config {
            api_base: base,
            request_timeout: Duration::from_secs(5),
        };
        let client = AskClient::new(&config).expect("client builds");
        let (tx, rx) = mpsc::channel();
        (AskWorker::new(client, tx, Handle::current()), rx)
    }

    async fn recv(rx: &mpsc::Receiver<AppEvent>) -> Option<AppEvent> {
        for _ in 0..100 {
            if let Ok(event) = rx.try_recv() {
                return Some(event);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        None
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn completed_ask_is_posted_with_its_ticket() {
        let (base, _server) = serve_once(
            "200 OK",
            r#"{"need_clarification":true,"clarification_questions":["Which cloud?"]}"#,
        )
        .await;
        let (worker, rx) = worker_for(base);

        worker.ask(AskDispatch {
            ticket: 7,
            phase: AskPhase::Initial,
            request: AskRequest::initial("deploy it", Vec::new()),
        });

        match recv(&rx).await {
            Some(AppEvent::AskCompleted {
                ticket,
                phase,
                result,
            }) => {
                assert_eq!(ticket, 7);
                assert_eq!(phase, AskPhase::Initial);
                let response = result.expect("request succeeds");
                assert!(response.need_clarification);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_ask_posts_nothing() {
        let (worker, rx) = worker_for(silent_listener().await);
        worker.ask(AskDispatch {
            ticket: 1,
            phase: AskPhase::Initial,
            request: AskRequest::initial("q", Vec::new()),
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        worker.cancel_all();

        assert!(recv(&rx).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_ingestion_stops_its_conversions() {
        let fifo = std::env::temp_dir().join(format!(
            "ask_then_answer_worker_stalled_{}.png",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&fifo);
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .expect("mkfifo should run");
        assert!(status.success());

        let metrics = Handle::current().metrics();
        let before = metrics.num_alive_tasks();
        let (worker, rx) = worker_for("http://127.0.0.1:9".to_string());
        worker.ingest(IngestDispatch {
            ticket: 4,
            files: (0..2)
                .map(|_| crate::attachments::SelectedFile {
                    path: fifo.clone(),
                    size_bytes: 0,
                })
                .collect(),
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(metrics.num_alive_tasks() > before);
        worker.cancel_all();

        let mut alive = metrics.num_alive_tasks();
        for _ in 0..50 {
            if alive <= before {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            alive = metrics.num_alive_tasks();
        }

        let release = fifo.clone();
        std::thread::spawn(move || {
            let _ = std::fs::OpenOptions::new().write(true).open(&release);
            let _ = std::fs::remove_file(release);
        });

        assert_eq!(alive, before);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn ingestion_failure_is_posted() {
        let (worker, rx) = worker_for("http://127.0.0.1:9".to_string());
        let missing = std::env::temp_dir().join(format!(
            "ask_then_answer_worker_missing_{}.png",
            std::process::id()
        ));

        worker.ingest(IngestDispatch {
            ticket: 3,
            files: vec![crate::attachments::SelectedFile {
                path: missing,
                size_bytes: 1,
            }],
        });

        match recv(&rx).await {
            Some(AppEvent::AttachmentsIngested { ticket, result }) => {
                assert_eq!(ticket, 3);
                assert!(result.is_err());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
