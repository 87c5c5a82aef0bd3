use coracle_http::{Body, Conn, Error, ServerConfig, Status};
use futures_lite::{future::block_on, io::Cursor, AsyncRead, AsyncWrite};
use pretty_assertions::assert_eq;
use std::{
    io,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

/// A transport with a fixed inbound script and a shared capture of
/// everything written to it. Reads can be capped to exercise incremental
/// parsing. Once the script runs out, reads report a clean end of
/// stream, as a disconnecting peer would.
#[derive(Clone, Debug)]
struct ScriptedTransport {
    input: Arc<Mutex<(Vec<u8>, usize)>>,
    output: Arc<Mutex<Vec<u8>>>,
    max_read: usize,
}

impl ScriptedTransport {
    fn new(input: impl AsRef<[u8]>) -> Self {
        Self::with_max_read(input, usize::MAX)
    }

    fn with_max_read(input: impl AsRef<[u8]>, max_read: usize) -> Self {
        Self {
            input: Arc::new(Mutex::new((input.as_ref().to_vec(), 0))),
            output: Arc::new(Mutex::new(Vec::new())),
            max_read,
        }
    }

    fn written(&self) -> String {
        String::from_utf8(self.output.lock().unwrap().clone()).unwrap()
    }
}

impl AsyncRead for ScriptedTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let mut input = self.input.lock().unwrap();
        let (data, pos) = &mut *input;
        let available = data.len() - *pos;
        let bytes = available.min(buf.len()).min(self.max_read);
        buf[..bytes].copy_from_slice(&data[*pos..*pos + bytes]);
        *pos += bytes;
        Poll::Ready(Ok(bytes))
    }
}

impl AsyncWrite for ScriptedTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.output.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

async fn handler(mut conn: Conn<ScriptedTransport>) -> Conn<ScriptedTransport> {
    match conn.path() {
        "/" => {
            conn.set_status(Status::Ok);
            conn.set_response_body("hello world.\n");
        }

        "/echo" => {
            let request_body = conn.request_body();
            let known_length = request_body.content_length().is_some();
            match request_body.read_bytes().await {
                Ok(content) if known_length => {
                    conn.set_status(Status::Ok);
                    conn.set_response_body(content);
                }
                Ok(content) => {
                    conn.set_status(Status::Ok);
                    conn.set_response_body(Body::new_streaming(Cursor::new(content), None));
                }
                Err(_) => conn.set_status(Status::BadRequest),
            }
        }

        "/ignore-body" => {
            conn.set_status(Status::Ok);
            conn.set_response_body("ignored");
        }

        _ => {
            conn.set_status(Status::NotFound);
            conn.set_response_body("404 Not Found\n");
        }
    }
    conn
}

fn serve(input: impl AsRef<[u8]>) -> (coracle_http::Result<()>, String) {
    serve_transport(ScriptedTransport::new(input))
}

fn serve_transport(transport: ScriptedTransport) -> (coracle_http::Result<()>, String) {
    let result = block_on(ServerConfig::new().run(transport.clone(), handler));
    (result, transport.written())
}

fn split_one_response(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n")
        .expect("response should contain a blank line")
}

#[test]
fn get_serves_a_fixed_body() {
    let (result, response) = serve(b"GET / HTTP/1.1\r\nHost: example\r\n\r\n");
    result.unwrap();

    let (head, body) = split_one_response(&response);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "head: {head:?}");
    assert!(head.contains("\r\nContent-Length: 13"), "head: {head:?}");
    assert!(head.contains("\r\nServer: coracle/"), "head: {head:?}");
    assert!(head.contains("\r\nDate: "), "head: {head:?}");
    assert_eq!(body, "hello world.\n");
}

#[test]
fn post_echo_with_content_length() {
    let (result, response) =
        serve(b"POST /echo HTTP/1.1\r\nHost: example\r\nContent-Length: 5\r\n\r\nhello");
    result.unwrap();

    let (head, body) = split_one_response(&response);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("\r\nContent-Length: 5"));
    assert_eq!(body, "hello");
}

#[test]
fn post_echo_with_chunked_body() {
    let (result, response) = serve(
        b"POST /echo HTTP/1.1\r\nHost: example\r\nTransfer-Encoding: chunked\r\n\r\n\
          5\r\nHello\r\n6\r\nWorld!\r\n0\r\n\r\n",
    );
    result.unwrap();

    let (head, body) = split_one_response(&response);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "head: {head:?}");
    assert!(
        head.contains("\r\nTransfer-Encoding: chunked"),
        "head: {head:?}"
    );
    assert!(!head.contains("\r\nContent-Length:"), "head: {head:?}");
    assert_eq!(body, "B\r\nHelloWorld!\r\n0\r\n\r\n");
}

#[test]
fn chunked_request_delivered_in_tiny_reads() {
    let transport = ScriptedTransport::with_max_read(
        b"POST /echo HTTP/1.1\r\nHost: example\r\nTransfer-Encoding: chunked\r\n\r\n\
          5\r\nHello\r\n6\r\nWorld!\r\n0\r\n\r\n",
        3,
    );
    let (result, response) = serve_transport(transport);
    result.unwrap();

    let (_, body) = split_one_response(&response);
    assert_eq!(body, "B\r\nHelloWorld!\r\n0\r\n\r\n");
}

#[test]
fn two_pipelined_requests_share_a_connection() {
    let (result, response) = serve(
        b"GET / HTTP/1.1\r\nHost: example\r\n\r\nGET / HTTP/1.1\r\nHost: example\r\n\r\n",
    );
    result.unwrap();

    assert_eq!(response.matches("HTTP/1.1 200 OK\r\n").count(), 2);
    assert_eq!(response.matches("hello world.\n").count(), 2);
}

#[test]
fn keep_alive_drains_an_unread_request_body() {
    let (result, response) = serve(
        b"POST /ignore-body HTTP/1.1\r\nHost: example\r\nContent-Length: 5\r\n\r\nhello\
          GET / HTTP/1.1\r\nHost: example\r\n\r\n",
    );
    result.unwrap();

    assert_eq!(response.matches("HTTP/1.1 200 OK\r\n").count(), 2);
    assert!(response.contains("ignored"));
    assert!(response.ends_with("hello world.\n"), "response: {response:?}");
}

#[test]
fn oversized_head_is_answered_with_413() {
    let mut request = b"GET / HTTP/1.1\r\nX-Big: ".to_vec();
    request.extend_from_slice(&vec![b'a'; 9000]);

    let (result, response) = serve(request);
    assert!(matches!(result, Err(Error::HeadersTooLong)));
    assert!(
        response.starts_with("HTTP/1.1 413 Payload Too Large\r\n"),
        "response: {response:?}"
    );
    assert!(response.contains("\r\nConnection: close\r\n"));
}

#[test]
fn get_with_a_body_is_answered_with_400() {
    let (result, response) =
        serve(b"GET / HTTP/1.1\r\nHost: example\r\nContent-Length: 5\r\n\r\nhello");
    assert!(matches!(result, Err(Error::UnexpectedBody(_))));
    assert!(
        response.starts_with("HTTP/1.1 400 Bad Request\r\n"),
        "response: {response:?}"
    );
}

#[test]
fn head_omits_the_body_but_keeps_framing_headers() {
    let (result, response) = serve(b"HEAD / HTTP/1.1\r\nHost: example\r\n\r\n");
    result.unwrap();

    let (head, body) = split_one_response(&response);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("\r\nContent-Length: 13"));
    assert_eq!(body, "");
}

#[test]
fn http_1_0_closes_after_one_exchange() {
    let (result, response) = serve(
        b"GET / HTTP/1.0\r\nHost: example\r\n\r\nGET / HTTP/1.1\r\nHost: example\r\n\r\n",
    );
    result.unwrap();

    assert_eq!(response.matches("HTTP/1.1 200 OK\r\n").count(), 1);
}

#[test]
fn connection_close_header_is_honored() {
    let (result, response) = serve(
        b"GET / HTTP/1.1\r\nHost: example\r\nConnection: close\r\n\r\n\
          GET / HTTP/1.1\r\nHost: example\r\n\r\n",
    );
    result.unwrap();

    assert_eq!(response.matches("HTTP/1.1 200 OK\r\n").count(), 1);
}

#[test]
fn malformed_content_length_is_answered_with_400() {
    let (result, response) =
        serve(b"POST /echo HTTP/1.1\r\nHost: example\r\nContent-Length: five\r\n\r\n");
    assert!(matches!(result, Err(Error::InvalidContentLength)));
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn malformed_header_name_is_answered_with_400() {
    let (result, response) = serve(b"GET / HTTP/1.1\r\nbad header: x\r\n\r\n");
    assert!(matches!(result, Err(Error::InvalidHeaderName)));
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn content_length_with_chunked_is_answered_with_400() {
    let (result, response) = serve(
        b"POST /echo HTTP/1.1\r\nHost: example\r\nContent-Length: 5\r\n\
          Transfer-Encoding: chunked\r\n\r\nhello",
    );
    assert!(matches!(result, Err(Error::UnexpectedHeader(_))));
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn eof_mid_head_is_an_unexpected_eof() {
    let (result, response) = serve(b"GET / HTTP/1.1\r\nHost: exa");
    assert!(matches!(result, Err(Error::UnexpectedEof)));
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn immediate_disconnect_is_clean() {
    let (result, response) = serve(b"");
    result.unwrap();
    assert_eq!(response, "");
}

#[test]
fn requests_delivered_in_tiny_reads_parse_the_same() {
    let transport = ScriptedTransport::with_max_read(
        b"GET / HTTP/1.1\r\nHost: example\r\n\r\nGET / HTTP/1.1\r\nHost: example\r\n\r\n",
        7,
    );
    let (result, response) = serve_transport(transport);
    result.unwrap();
    assert_eq!(response.matches("HTTP/1.1 200 OK\r\n").count(), 2);
}

#[test]
fn unknown_paths_get_a_404() {
    let (result, response) = serve(b"GET /missing HTTP/1.1\r\nHost: example\r\n\r\n");
    result.unwrap();

    let (head, body) = split_one_response(&response);
    assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert_eq!(body, "404 Not Found\n");
}
