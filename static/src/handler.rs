use crate::range::byte_range;
use async_fs::File;
use coracle_http::{
    Body, Conn,
    KnownHeaderName::{AcceptRanges, ContentRange, ContentType, Range},
    Status,
};
use futures_lite::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite};
use std::{
    io::{self, ErrorKind, SeekFrom},
    path::{Path, PathBuf},
};

/// Serves files from a directory tree.
///
/// Request paths are resolved beneath the root; `..` segments cannot
/// escape it. A resolved path that is missing, not a regular file, or
/// unreadable is answered with a 404 whose cause is logged but never sent
/// to the peer. Regular files are answered with a 200 and a streaming
/// body, or, when the request carries a single satisfiable `Range`
/// header, a 206 for just those bytes. Range bounds are inclusive, on the
/// wire and internally.
#[derive(Debug)]
pub struct FileHandler {
    fs_root: PathBuf,
}

impl FileHandler {
    /// builds a new `FileHandler` serving the tree under `fs_root`
    pub fn new(fs_root: impl Into<PathBuf>) -> Self {
        Self {
            fs_root: fs_root.into(),
        }
    }

    /// Answer `conn` from the filesystem.
    pub async fn respond<Transport>(&self, mut conn: Conn<Transport>) -> Conn<Transport>
    where
        Transport: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static,
    {
        match self.serve(&mut conn).await {
            Ok(()) => conn,
            Err(error) => {
                log::debug!("answering {} with a 404: {error}", conn.path());
                not_found(conn)
            }
        }
    }

    async fn serve<Transport>(&self, conn: &mut Conn<Transport>) -> io::Result<()>
    where
        Transport: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static,
    {
        let path = self
            .resolve_fs_path(conn.path())
            .await
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "path resolves outside the root"))?;

        let metadata = async_fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(ErrorKind::NotFound, "not a regular file"));
        }
        let size = metadata.len();

        let range_header = conn
            .request_headers()
            .get_str(Range)
            .map(str::to_string);

        match range_header {
            None => {
                let file = File::open(&path).await?;
                conn.response_headers_mut()
                    .try_insert(ContentType, content_type(&path));
                conn.response_headers_mut().insert(AcceptRanges, "bytes");
                conn.set_status(Status::Ok);
                conn.set_response_body(Body::new_streaming(file, Some(size)));
            }

            Some(range) => match byte_range(&range, size) {
                Some((start, end)) => {
                    let mut file = File::open(&path).await?;
                    file.seek(SeekFrom::Start(start)).await?;
                    let len = end - start + 1;

                    conn.response_headers_mut()
                        .insert(ContentRange, format!("bytes {start}-{end}/{size}"));
                    conn.response_headers_mut()
                        .try_insert(ContentType, content_type(&path));
                    conn.set_status(Status::PartialContent);
                    conn.set_response_body(Body::new_streaming(file.take(len), Some(len)));
                }

                None => {
                    conn.response_headers_mut()
                        .insert(ContentRange, format!("bytes */{size}"));
                    conn.set_status(Status::RequestedRangeNotSatisfiable);
                }
            },
        }

        Ok(())
    }

    /// Map a url path onto the filesystem, refusing anything that lands
    /// outside the root once symlinks and `..` segments are resolved.
    async fn resolve_fs_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut file_path = self.fs_root.clone();
        for segment in Path::new(url_path) {
            match segment.to_str() {
                Some("/") | Some(".") => {}
                Some("..") => {
                    file_path.pop();
                }
                _ => {
                    file_path.push(segment);
                }
            }
        }

        let file_path = async_fs::canonicalize(file_path).await.ok()?;
        let fs_root = async_fs::canonicalize(&self.fs_root).await.ok()?;

        file_path.starts_with(&fs_root).then_some(file_path)
    }
}

fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

fn not_found<Transport>(mut conn: Conn<Transport>) -> Conn<Transport>
where
    Transport: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static,
{
    conn.set_status(Status::NotFound);
    conn.response_headers_mut()
        .insert(ContentType, "text/plain; charset=utf-8");
    conn.set_response_body("404 Not Found\n");
    conn
}
