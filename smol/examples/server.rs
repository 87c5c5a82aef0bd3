use coracle_http::Status;
use coracle_smol::Server;
use coracle_static::FileHandler;
use std::sync::Arc;

fn main() -> std::io::Result<()> {
    env_logger::init();

    // `/files/...` paths resolve beneath the current directory.
    let files = Arc::new(FileHandler::new("."));

    Server::new(move |mut conn| {
        let files = Arc::clone(&files);
        async move {
            match conn.path() {
                "/" => {
                    conn.set_status(Status::Ok);
                    conn.set_response_body("hello world.\n");
                    conn
                }

                "/echo" => {
                    match conn.request_body().read_bytes().await {
                        Ok(content) => {
                            conn.set_status(Status::Ok);
                            conn.set_response_body(content);
                        }
                        Err(error) => {
                            log::warn!("unreadable request body: {error}");
                            conn.set_status(Status::BadRequest);
                        }
                    }
                    conn
                }

                path if path.starts_with("/files/") => files.respond(conn).await,

                _ => {
                    conn.set_status(Status::NotFound);
                    conn.set_response_body("404 Not Found\n");
                    conn
                }
            }
        }
    })
    .run()
}
