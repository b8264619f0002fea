//! request/response daemon for the sync protocol
//!
//! a single-threaded accept loop speaking just enough HTTP/1.1 for the two
//! operations: GET with a `branch` query parameter answers a pull, POST
//! with a `PushRequest` body imports a push. one request is handled to
//! completion before the next is accepted. handler failures answer 500 and
//! the daemon keeps serving.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::repo::Repository;
use crate::transport::protocol::{decode, encode, raw_import, PullResponse, PushRequest};

/// the sync daemon
pub struct Daemon {
    listener: TcpListener,
    addr: SocketAddr,
    work_dir: PathBuf,
    shutdown: Arc<AtomicBool>,
}

impl Daemon {
    /// bind to localhost on the given port (0 picks a free one)
    pub fn bind(work_dir: &Path, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port))
            .map_err(|e| Error::Network(format!("bind failed: {}", e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            listener,
            addr,
            work_dir: work_dir.to_path_buf(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// address the daemon is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// handle for aborting the daemon from another thread
    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            addr: self.addr,
            shutdown: self.shutdown.clone(),
        }
    }

    /// accept and handle requests until aborted
    ///
    /// state is loaded fresh for every request and stored on completion of
    /// a push, the same load-operate-store lifecycle commands follow.
    pub fn serve(&self) -> Result<()> {
        tracing::info!(addr = %self.addr, "daemon listening");

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let stream = match stream {
                Ok(stream) => stream,
                Err(_) => continue,
            };
            if let Err(e) = handle_connection(&self.work_dir, stream) {
                tracing::warn!(error = %e, "request failed");
            }
        }

        tracing::info!("daemon stopped");
        Ok(())
    }
}

/// handle for stopping a running daemon
pub struct DaemonHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
}

impl DaemonHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// url clients reach the daemon under
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// stop the daemon; the accept loop is woken with a throwaway connection
    pub fn abort(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = TcpStream::connect(self.addr);
    }
}

fn handle_connection(work_dir: &Path, mut stream: TcpStream) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone().map_err(net_err)?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).map_err(net_err)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();

    // headers; only content-length matters
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).map_err(net_err)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    tracing::debug!(method = %method, target = %target, "request");

    match method.as_str() {
        "GET" => match handle_pull(work_dir, &target) {
            Ok(Some(body)) => respond(&mut stream, 200, "OK", &body),
            Ok(None) => respond(&mut stream, 404, "Not Found", &[]),
            Err(e) => {
                let _ = respond(&mut stream, 500, "Internal Server Error", &[]);
                Err(e)
            }
        },
        "POST" => {
            let mut body = vec![0u8; content_length];
            if let Err(e) = reader.read_exact(&mut body) {
                let _ = respond(&mut stream, 500, "Internal Server Error", &[]);
                return Err(net_err(e));
            }
            match handle_push(work_dir, &body) {
                Ok(()) => respond(&mut stream, 200, "OK", &[]),
                Err(e) => {
                    let _ = respond(&mut stream, 500, "Internal Server Error", &[]);
                    Err(e)
                }
            }
        }
        _ => {
            let _ = respond(&mut stream, 500, "Internal Server Error", &[]);
            Err(Error::Protocol(format!("unsupported method: {}", method)))
        }
    }
}

/// answer a pull: the named branch's descriptor plus the reachable commit
/// set from its tip. None means the branch is absent (404).
fn handle_pull(work_dir: &Path, target: &str) -> Result<Option<Vec<u8>>> {
    let branch = query_param(target, "branch")
        .ok_or_else(|| Error::Protocol("missing branch parameter".to_string()))?;

    let repo = Repository::open(work_dir)?;
    let Some(info) = repo.storage.branches.get(&branch) else {
        return Ok(None);
    };

    let commits = match info.tip {
        Some(tip) => repo.reachable(&tip, None)?,
        None => vec![],
    };
    let response = PullResponse {
        branch_info: info.clone(),
        commits,
    };
    Ok(Some(encode(&response)?))
}

/// apply a push: import the shipped set and persist
fn handle_push(work_dir: &Path, body: &[u8]) -> Result<()> {
    let request: PushRequest = decode(body)?;

    let mut repo = Repository::open(work_dir)?;
    raw_import(
        &mut repo.storage,
        request.commits,
        &request.branch,
        request.branch_info,
    );
    repo.save()
}

fn query_param(target: &str, name: &str) -> Option<String> {
    let query = target.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn respond(stream: &mut TcpStream, status: u16, reason: &str, body: &[u8]) -> Result<()> {
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    stream.write_all(header.as_bytes()).map_err(net_err)?;
    stream.write_all(body).map_err(net_err)?;
    stream.flush().map_err(net_err)?;
    Ok(())
}

fn net_err(e: std::io::Error) -> Error {
    Error::Network(e.to_string())
}
