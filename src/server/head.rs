// Request head screening
// hyper answers an unparseable Content-Length with its own bare 400 before
// any service runs. The first head on each connection is read here first, so
// such a request still goes through the router and gets its normal headers.

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{CONNECTION, CONTENT_LENGTH};
use hyper::{Request, Response, Version};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

use crate::config::AppState;
use crate::handler::{self, save};

/// Largest head buffered ahead of hyper
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Same header count limit hyper applies
const MAX_HEADERS: usize = 100;

const READ_CHUNK: usize = 4096;

/// Verdict on the bytes buffered so far
#[derive(Debug)]
pub enum Screen {
    /// Head not complete yet
    Incomplete,
    /// Leave it to hyper, including heads hyper rejects for other reasons
    Pass,
    /// Complete head whose `Content-Length` hyper would refuse
    BadContentLength(Request<Empty<Bytes>>),
}

/// What to do with a freshly accepted connection
#[derive(Debug)]
pub enum FirstHead {
    /// Serve with hyper, replaying the bytes already read
    Serve(Bytes),
    /// Answer this request directly, then close
    Reject(Request<Empty<Bytes>>),
    /// Peer closed without sending anything
    Closed,
}

pub fn screen(buf: &[u8]) -> Screen {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut head = httparse::Request::new(&mut headers);
    match head.parse(buf) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) if buf.len() < MAX_HEAD_BYTES => return Screen::Incomplete,
        _ => return Screen::Pass,
    }

    let lengths: Vec<_> = head
        .headers
        .iter()
        .filter(|h| h.name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()))
        .map(|h| String::from_utf8_lossy(h.value))
        .collect();
    if lengths.is_empty() || save::parse_length_value(&lengths.join(",")).is_some() {
        return Screen::Pass;
    }

    match to_request(&head) {
        Some(req) => Screen::BadContentLength(req),
        None => Screen::Pass,
    }
}

/// Rebuild a bodiless request from a parsed head
fn to_request(head: &httparse::Request<'_, '_>) -> Option<Request<Empty<Bytes>>> {
    let version = match head.version {
        Some(0) => Version::HTTP_10,
        _ => Version::HTTP_11,
    };
    let mut builder = Request::builder()
        .method(head.method?)
        .uri(head.path?)
        .version(version);
    for header in head.headers.iter() {
        builder = builder.header(header.name, header.value);
    }
    builder.body(Empty::new()).ok()
}

/// Read until the first request head is complete and screen it.
///
/// On timeout the buffered bytes go to hyper, whose own header timeout
/// then applies.
pub async fn read_first_head<S>(stream: &mut S, read_timeout: Duration) -> io::Result<FirstHead>
where
    S: AsyncRead + Unpin,
{
    let deadline = tokio::time::Instant::now() + read_timeout;
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let Ok(read) = tokio::time::timeout_at(deadline, stream.read(&mut chunk)).await else {
            return Ok(FirstHead::Serve(Bytes::from(buf)));
        };
        let n = read?;
        if n == 0 {
            return Ok(if buf.is_empty() {
                FirstHead::Closed
            } else {
                FirstHead::Serve(Bytes::from(buf))
            });
        }

        buf.extend_from_slice(&chunk[..n]);
        match screen(&buf) {
            Screen::Incomplete => {}
            Screen::Pass => return Ok(FirstHead::Serve(Bytes::from(buf))),
            Screen::BadContentLength(req) => return Ok(FirstHead::Reject(req)),
        }
    }
}

/// Route `req` through the handler, write the response and close.
///
/// The body cannot be framed without a usable length, so the connection
/// is not kept alive.
pub async fn respond_and_close<S>(
    stream: &mut S,
    req: Request<Empty<Bytes>>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let response = match handler::handle_request(req, state, peer_addr).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    stream.write_all(&encode_response(response).await).await?;
    stream.shutdown().await
}

/// Serialize a response as HTTP/1.1 with `connection: close`
pub async fn encode_response(response: Response<Full<Bytes>>) -> Vec<u8> {
    let (parts, body) = response.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };

    let mut out = Vec::with_capacity(256 + body.len());
    out.extend_from_slice(
        format!(
            "HTTP/1.1 {} {}\r\n",
            parts.status.as_u16(),
            parts.status.canonical_reason().unwrap_or("")
        )
        .as_bytes(),
    );
    for (name, value) in parts.headers.iter().filter(|(name, _)| **name != CONNECTION) {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    if !parts.headers.contains_key(CONTENT_LENGTH) {
        out.extend_from_slice(format!("content-length: {}\r\n", body.len()).as_bytes());
    }
    out.extend_from_slice(b"connection: close\r\n\r\n");
    out.extend_from_slice(&body);
    out
}

/// Stream that yields `prefix` before reading from `inner`
#[derive(Debug)]
pub struct Replay<S> {
    prefix: Bytes,
    inner: S,
}

impl<S> Replay<S> {
    pub const fn new(prefix: Bytes, inner: S) -> Self {
        Self { prefix, inner }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for Replay<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.prefix.is_empty() {
            return Pin::new(&mut self.inner).poll_read(cx, buf);
        }
        let n = self.prefix.len().min(buf.remaining());
        let head = self.prefix.split_to(n);
        buf.put_slice(&head);
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Replay<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
