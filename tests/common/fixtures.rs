//! Archive builders and vendor API mocks

use folio_dl::config::{Config, LoginPollConfig, RetryConfig};
use serde_json::{Value, json};
use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a ZIP archive from `(member name, content)` pairs
pub fn zip_archive(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, data) in members {
        zip.start_file(*name, options).expect("start zip member");
        zip.write_all(data).expect("write zip member");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Successful API envelope around `data`
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"data": data, "errors": []}))
}

/// Failed API envelope carrying one error entry
pub fn api_error(code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"data": null, "errors": {code: message}}))
}

/// Mount a response for POSTs to `/<endpoint>/` whose form contains `needle`
pub async fn mount_endpoint(
    server: &MockServer,
    endpoint: &str,
    needle: Option<&str>,
    response: ResponseTemplate,
) {
    let mock = Mock::given(method("POST")).and(path(format!("/{endpoint}/")));
    match needle {
        Some(needle) => mock.and(body_string_contains(needle)),
        None => mock,
    }
    .respond_with(response)
    .mount(server)
    .await;
}

/// Config with millisecond delays, pointed at `base_url`, writing into `output`
pub fn fast_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.bootstrap = RetryConfig {
        max_attempts: 5,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config.login = LoginPollConfig {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(5),
        backoff_multiplier: 1.5,
        timeout: Duration::from_secs(5),
    };
    config.output.dir = output.to_path_buf();
    config.output.passphrase = "secret".to_string();
    config
}
