use super::request::{parse_request, RawRequest};
use super::response::encode_response;
use super::service::App;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default cap on request body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Serves an [`App`] over HTTP/1.1 with a fixed pool of worker threads.
pub struct HttpServer {
    app: Arc<App>,
    workers: usize,
    max_body_bytes: usize,
}

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it
/// gracefully, or joining the worker threads.
pub struct ServerHandle {
    addr: SocketAddr,
    server: Arc<tiny_http::Server>,
    stopping: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address actually bound (useful when started on port 0).
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Poll the listener until it accepts connections.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server is not reachable within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting requests and wait for the workers to finish.
    pub fn stop(self) {
        self.stopping.store(true, Ordering::SeqCst);
        for _ in &self.workers {
            self.server.unblock();
        }
        for worker in self.workers {
            if worker.join().is_err() {
                error!("HTTP worker panicked during shutdown");
            }
        }
        info!(addr = %self.addr, "HTTP server stopped");
    }

    /// Block until every worker exits.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread panicked.
    pub fn join(self) -> thread::Result<()> {
        for worker in self.workers {
            worker.join()?;
        }
        Ok(())
    }
}

impl HttpServer {
    #[must_use]
    pub fn new(app: App) -> Self {
        let workers = thread::available_parallelism().map_or(4, usize::from);
        Self {
            app: Arc::new(app),
            workers,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Bind `addr` and start the worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let requested = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let server = Arc::new(tiny_http::Server::http(requested).map_err(io::Error::other)?);
        let addr = server.server_addr().to_ip().unwrap_or(requested);
        let stopping = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(self.workers);
        for index in 0..self.workers {
            let server = Arc::clone(&server);
            let app = Arc::clone(&self.app);
            let stopping = Arc::clone(&stopping);
            let max_body_bytes = self.max_body_bytes;
            let worker = thread::Builder::new()
                .name(format!("http-worker-{index}"))
                .spawn(move || worker_loop(&server, &app, &stopping, max_body_bytes))?;
            workers.push(worker);
        }

        info!(addr = %addr, workers = self.workers, "HTTP server listening");
        Ok(ServerHandle {
            addr,
            server,
            stopping,
            workers,
        })
    }
}

fn worker_loop(server: &tiny_http::Server, app: &App, stopping: &AtomicBool, max_body_bytes: usize) {
    loop {
        match server.recv() {
            Ok(request) => serve_one(app, request, max_body_bytes),
            Err(e) => {
                if stopping.load(Ordering::SeqCst) {
                    break;
                }
                warn!(error = %e, "Failed to receive HTTP request");
            }
        }
        if stopping.load(Ordering::SeqCst) {
            break;
        }
    }
    debug!("HTTP worker exiting");
}

fn serve_one(app: &App, mut request: tiny_http::Request, max_body_bytes: usize) {
    let mut body = Vec::new();
    let limit = u64::try_from(max_body_bytes).unwrap_or(u64::MAX).saturating_add(1);
    if let Err(e) = request.as_reader().take(limit).read_to_end(&mut body) {
        warn!(error = %e, "Failed to read request body");
    }

    let raw = RawRequest {
        method: request.method().as_str().to_string(),
        url: request.url().to_string(),
        headers: request
            .headers()
            .iter()
            .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
            .collect(),
        body,
        remote_addr: request.remote_addr().copied(),
    };

    let parsed = parse_request(raw, max_body_bytes);
    let response = app.handle(parsed.request, parsed.error);
    let encoded = encode_response(&response);

    let mut out = tiny_http::Response::from_data(encoded.body).with_status_code(encoded.status);
    for (name, value) in &encoded.headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => warn!(header = %name, "Dropping invalid response header"),
        }
    }
    if let Err(e) = request.respond(out) {
        debug!(error = %e, "Client went away before the response was written");
    }
}
