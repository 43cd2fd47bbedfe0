#![allow(dead_code)]

use std::path::PathBuf;

use csrkit::key::KeySource;
use csrkit::request::RequestParams;

pub const PASSWORD: &str = "SuperSecurePassword";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).expect("Failed to read test fixture")
}

/// The Bristol subject shared by these tests, with the given SANs and key.
pub fn bristol_params(san_list: Vec<String>, key_source: KeySource) -> RequestParams {
    RequestParams::builder()
        .domain("example.com".to_string())
        .country("GB".to_string())
        .state("England".to_string())
        .locality("Bristol".to_string())
        .organization("My Organisation Name".to_string())
        .san_list(san_list)
        .key_source(key_source)
        .build()
}

pub fn fixture_key() -> KeySource {
    KeySource::Load {
        pem: fixture("rsa2048.pem"),
        password: None,
    }
}
