use coracle_http::{Conn, KnownHeaderName, Method, Status, Synthetic};
use coracle_static::FileHandler;
use futures_lite::future::block_on;
use std::fs;
use tempfile::TempDir;

fn fixture() -> (TempDir, FileHandler) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.bin"),
        (0u8..10).collect::<Vec<u8>>(),
    )
    .unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("index.html"), "<h1>hello</h1>").unwrap();
    let handler = FileHandler::new(dir.path());
    (dir, handler)
}

fn get(path: &str) -> Conn<Synthetic> {
    Conn::new_synthetic(Method::Get, path, ())
}

fn get_with_range(path: &str, range: &'static str) -> Conn<Synthetic> {
    let mut conn = get(path);
    conn.request_headers_mut()
        .insert(KnownHeaderName::Range, range);
    conn
}

async fn response_body(conn: &mut Conn<Synthetic>) -> Vec<u8> {
    conn.take_response_body()
        .expect("response should have a body")
        .into_bytes()
        .await
        .unwrap()
        .to_vec()
}

#[test]
fn serves_a_whole_file() {
    block_on(async {
        let (_dir, handler) = fixture();
        let mut conn = handler.respond(get("/a.bin")).await;

        assert_eq!(conn.status(), Some(Status::Ok));
        assert_eq!(
            conn.response_headers().get_str(KnownHeaderName::ContentType),
            Some("application/octet-stream")
        );
        assert_eq!(
            conn.response_headers()
                .get_str(KnownHeaderName::AcceptRanges),
            Some("bytes")
        );
        assert_eq!(conn.response_body().and_then(|body| body.len()), Some(10));
        assert_eq!(
            response_body(&mut conn).await,
            (0u8..10).collect::<Vec<u8>>()
        );
    });
}

#[test]
fn guesses_a_content_type_from_the_extension() {
    block_on(async {
        let (_dir, handler) = fixture();
        let conn = handler.respond(get("/sub/index.html")).await;

        assert_eq!(conn.status(), Some(Status::Ok));
        assert_eq!(
            conn.response_headers().get_str(KnownHeaderName::ContentType),
            Some("text/html")
        );
    });
}

#[test]
fn serves_a_byte_range() {
    block_on(async {
        let (_dir, handler) = fixture();
        let mut conn = handler.respond(get_with_range("/a.bin", "bytes=0-3")).await;

        assert_eq!(conn.status(), Some(Status::PartialContent));
        assert_eq!(
            conn.response_headers()
                .get_str(KnownHeaderName::ContentRange),
            Some("bytes 0-3/10")
        );
        assert_eq!(response_body(&mut conn).await, vec![0, 1, 2, 3]);
    });
}

#[test]
fn serves_an_open_ended_byte_range() {
    block_on(async {
        let (_dir, handler) = fixture();
        let mut conn = handler.respond(get_with_range("/a.bin", "bytes=4-")).await;

        assert_eq!(conn.status(), Some(Status::PartialContent));
        assert_eq!(
            conn.response_headers()
                .get_str(KnownHeaderName::ContentRange),
            Some("bytes 4-9/10")
        );
        assert_eq!(response_body(&mut conn).await, vec![4, 5, 6, 7, 8, 9]);
    });
}

#[test]
fn out_of_bounds_range_is_unsatisfiable() {
    block_on(async {
        let (_dir, handler) = fixture();
        let conn = handler
            .respond(get_with_range("/a.bin", "bytes=100-"))
            .await;

        assert_eq!(conn.status(), Some(Status::RequestedRangeNotSatisfiable));
        assert_eq!(
            conn.response_headers()
                .get_str(KnownHeaderName::ContentRange),
            Some("bytes */10")
        );
        assert!(conn.response_body().is_none());
    });
}

#[test]
fn malformed_range_is_unsatisfiable() {
    block_on(async {
        let (_dir, handler) = fixture();
        let conn = handler
            .respond(get_with_range("/a.bin", "bytes=backwards"))
            .await;

        assert_eq!(conn.status(), Some(Status::RequestedRangeNotSatisfiable));
    });
}

#[test]
fn missing_files_are_404() {
    block_on(async {
        let (_dir, handler) = fixture();
        let mut conn = handler.respond(get("/missing.bin")).await;

        assert_eq!(conn.status(), Some(Status::NotFound));
        assert_eq!(response_body(&mut conn).await, b"404 Not Found\n".to_vec());
    });
}

#[test]
fn directories_are_404() {
    block_on(async {
        let (_dir, handler) = fixture();
        let conn = handler.respond(get("/sub")).await;
        assert_eq!(conn.status(), Some(Status::NotFound));
    });
}

#[test]
fn traversal_cannot_escape_the_root() {
    block_on(async {
        let outer = tempfile::tempdir().unwrap();
        fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        fs::create_dir(outer.path().join("public")).unwrap();
        fs::write(outer.path().join("public").join("ok.txt"), "ok").unwrap();

        let handler = FileHandler::new(outer.path().join("public"));

        let conn = handler.respond(get("/../secret.txt")).await;
        assert_eq!(conn.status(), Some(Status::NotFound));

        let conn = handler.respond(get("/ok.txt")).await;
        assert_eq!(conn.status(), Some(Status::Ok));
    });
}
