// Connection handling module
// Serves a single accepted TCP connection over HTTP/1.1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use super::head::{self, FirstHead, Replay};
use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection: log it and hand it to its own task.
pub fn accept_connection(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Reads and screens the first request head (see [`head`])
/// 2. Wraps the stream, replaying what was read, in `TokioIo`
/// 3. Configures HTTP/1.1 connection settings (keep-alive, header read timeout)
/// 4. Serves the connection with the request handler
///
/// Requests on one connection are handled in order; the connection closes
/// when the client hangs up or keep-alive is disabled.
fn handle_connection(mut stream: TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let read_timeout = Duration::from_secs(state.config.performance.read_timeout);

        let prefix = match head::read_first_head(&mut stream, read_timeout).await {
            Ok(FirstHead::Serve(prefix)) => prefix,
            Ok(FirstHead::Reject(req)) => {
                if let Err(err) = head::respond_and_close(&mut stream, req, peer_addr, state).await {
                    logger::log_connection_error(&err);
                }
                return;
            }
            Ok(FirstHead::Closed) => return,
            Err(err) => {
                logger::log_connection_error(&err);
                return;
            }
        };

        let io = TokioIo::new(Replay::new(prefix, stream));

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(state.config.performance.keep_alive)
            .timer(TokioTimer::new())
            .header_read_timeout(read_timeout);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer_addr)),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
