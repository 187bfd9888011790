use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, UnixListener};
use tracespec_core::query::TraceListItem;
use tracespec_store::Store;

use crate::protocol::{ApiRequest, ApiResponse};

pub async fn run_query_server(
    store: Store,
    uds_path: PathBuf,
    tcp_addr: SocketAddr,
) -> anyhow::Result<()> {
    if let Some(parent) = uds_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("create uds parent dir")?;
    }

    if tokio::fs::metadata(&uds_path).await.is_ok() {
        let _ = tokio::fs::remove_file(&uds_path).await;
    }

    let uds_listener = UnixListener::bind(&uds_path).context("bind UDS query listener")?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = tokio::fs::metadata(&uds_path).await?.permissions();
        perms.set_mode(0o600);
        tokio::fs::set_permissions(&uds_path, perms).await?;
    }
    let tcp_listener = TcpListener::bind(tcp_addr)
        .await
        .context("bind TCP query listener")?;
    tracing::info!(uds = %uds_path.display(), tcp = %tcp_addr, "query server listening");

    let uds_task = tokio::spawn(run_uds_loop(uds_listener, store.clone()));
    let tcp_task = tokio::spawn(run_tcp_loop(tcp_listener, store));

    tokio::select! {
        res = uds_task => {
            res??;
        }
        res = tcp_task => {
            res??;
        }
    }

    Ok(())
}

async fn run_uds_loop(listener: UnixListener, store: Store) -> anyhow::Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let store = store.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_stream(BufReader::new(stream), store).await {
                tracing::warn!(error = ?err, "uds client request failed");
            }
        });
    }
}

async fn run_tcp_loop(listener: TcpListener, store: Store) -> anyhow::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let store = store.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_stream(BufReader::new(stream), store).await {
                tracing::warn!(error = ?err, %peer, "tcp client request failed");
            }
        });
    }
}

/// Serves newline-delimited requests until the peer closes the connection.
async fn handle_stream<T>(mut stream: BufReader<T>, store: Store) -> anyhow::Result<()>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        let n = stream.read_line(&mut line).await?;
        if n == 0 {
            return Ok(());
        }

        let response = match serde_json::from_str::<ApiRequest>(&line) {
            Ok(req) => handle_request(req, &store),
            Err(e) => ApiResponse::Error(format!("invalid request: {e}")),
        };
        let payload = serde_json::to_vec(&response)?;
        stream.get_mut().write_all(&payload).await?;
        stream.get_mut().write_all(b"\n").await?;
        stream.get_mut().flush().await?;
    }
}

pub fn handle_request(req: ApiRequest, store: &Store) -> ApiResponse {
    tracing::debug!(?req, "handling request");
    let resp = match req {
        ApiRequest::Traces(r) => store.list_traces(&r).map(ApiResponse::Traces),
        ApiRequest::Trace(r) => store.get_trace(&r).map(ApiResponse::Trace),
        ApiRequest::Analyze(r) => store.analyze_trace(&r).map(ApiResponse::Analysis),
        ApiRequest::Specs => Ok(ApiResponse::Specs(store.list_specs())),
        ApiRequest::DefineSpec(spec) => store.define_spec(spec).map(ApiResponse::SpecDefined),
        ApiRequest::IngestTrace(trace) => {
            let item = TraceListItem::from(&trace);
            store
                .insert_trace(trace)
                .map(|()| ApiResponse::TraceIngested(item))
        }
        ApiRequest::Compare(r) => store.compare(&r).map(ApiResponse::Comparison),
        ApiRequest::Status => Ok(ApiResponse::Status(store.status())),
    };

    resp.unwrap_or_else(|e| ApiResponse::Error(e.to_string()))
}
