use anyhow::Context as _;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// An axum router served on an ephemeral localhost port, standing in for an upstream.
///
/// The server shuts down when this value is dropped.
pub struct MockUpstream {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockUpstream {
    /// Bind `127.0.0.1:0` and serve `app` in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the ephemeral port fails or its address cannot be read.
    pub async fn spawn(app: axum::Router) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind ephemeral port")?;
        let addr = listener.local_addr().context("read local addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// A list envelope shaped the way the parliamentary records API shapes them.
///
/// The item field is omitted for zero items, a bare object for one, and an array otherwise.
/// `@antal` is the item count of this page, `@hits` the total across pages.
#[must_use]
pub fn list_envelope(
    container: &str,
    item_key: &str,
    items: Vec<Value>,
    hits: u64,
    page: u32,
    next_page: Option<&str>,
) -> Value {
    let mut list = Map::new();
    list.insert("@antal".to_string(), json!(items.len().to_string()));
    list.insert("@hits".to_string(), json!(hits.to_string()));
    list.insert("@sida".to_string(), json!(page.to_string()));
    if let Some(next) = next_page {
        list.insert("@nasta_sida".to_string(), json!(next));
    }
    match items.len() {
        0 => {}
        1 => {
            let item = items.into_iter().next().unwrap_or(Value::Null);
            list.insert(item_key.to_string(), item);
        }
        _ => {
            list.insert(item_key.to_string(), Value::Array(items));
        }
    }

    let mut envelope = Map::new();
    envelope.insert(container.to_string(), Value::Object(list));
    Value::Object(envelope)
}
