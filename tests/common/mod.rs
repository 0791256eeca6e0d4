//! Shared utilities for integration tests.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use aggregated_apiserver::net::TcpListener;
use aggregated_apiserver::options::StorageType;
use aggregated_apiserver::Options;
use tempfile::NamedTempFile;

/// Write a static token file with one `token,user,uid` entry.
pub fn token_file(token: &str, user: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{},{},1000", token, user).unwrap();
    file
}

/// Dev mode options serving on an already bound loopback socket, with file
/// storage and the given token file.
pub async fn dev_mode_options(tokens: &NamedTempFile) -> (Options, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = aggregated_apiserver::net::Listener::addr(&listener);

    let mut options = Options::new();
    options.extra.dev_mode = true;
    options.storage.storage_type = StorageType::File;
    options.storage.data_path = Some(std::env::temp_dir());
    options.recommended.secure_serving.bind_address = addr.ip();
    options.recommended.secure_serving.bind_port = addr.port();
    options.recommended.secure_serving.listener = Some(Arc::new(listener));
    options.recommended.authentication.token_auth_file = Some(tokens.path().to_path_buf());

    (options, addr)
}

/// GET `path` from the server at `addr` and return the status code.
#[allow(dead_code)]
pub async fn http_get(addr: SocketAddr, path: &str, token: Option<&str>) -> u16 {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let mut request = client.get(format!("http://{}{}", addr, path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    request
        .send()
        .await
        .expect("server unreachable")
        .status()
        .as_u16()
}
