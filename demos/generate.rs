use std::path::{Path, PathBuf};

use csrkit::key::KeySource;
use csrkit::request::{Request, RequestParams};

const PASSWORD: &str = "SuperSecurePassword";

fn params(domain: &str, san_list: Vec<String>, key_source: KeySource) -> RequestParams {
    RequestParams::builder()
        .domain(domain.to_string())
        .country("GB".to_string())
        .state("England".to_string())
        .locality("Bristol".to_string())
        .organization("My Organisation Name".to_string())
        .san_list(san_list)
        .key_source(key_source)
        .build()
}

/// Writes `<domain>.key` and `<domain>.csr` into `dir`.
fn save(dir: &Path, request: &Request) -> anyhow::Result<PathBuf> {
    let key_path = dir.join(format!("{}.key", request.domain()));
    std::fs::write(&key_path, &*request.key().export_pem()?)?;
    std::fs::write(
        dir.join(format!("{}.csr", request.domain())),
        request.csr().export_pem()?,
    )?;
    Ok(key_path)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    // A fresh 2048-bit key and a CSR for example.com
    let request = Request::new(params("example.com", vec![], KeySource::default()))?;
    let key_path = save(&out_dir, &request)?;
    println!("{}", request.csr());

    // A 4096-bit key
    let request = Request::new(params(
        "big.example.com",
        vec![],
        KeySource::Generate { bits: 4096 },
    ))?;
    save(&out_dir, &request)?;
    println!("{} uses a {}-bit key", request.domain(), request.key().key_size());

    // Reuse the key written above
    let request = Request::new(params(
        "example.com",
        vec![],
        KeySource::from_file(&key_path, None)?,
    ))?;
    println!("{}", request.csr());

    // Reuse a password protected copy of that key
    let encrypted_path = out_dir.join("example.com.encrypted.key");
    std::fs::write(
        &encrypted_path,
        &*request.key().export_encrypted_pem(PASSWORD)?,
    )?;
    let request = Request::new(params(
        "example.com",
        vec![],
        KeySource::from_file(&encrypted_path, Some(PASSWORD.to_string()))?,
    ))?;
    println!("{}", request.csr());

    // Subject Alternative Names
    let request = Request::new(params(
        "example.com",
        vec!["example2.com".to_string(), "example3.com".to_string()],
        KeySource::from_file(&key_path, None)?,
    ))?;
    save(&out_dir, &request)?;
    println!("{}", request.csr());
    println!("SANs: {:?}", request.csr().subject_alt_names()?);

    Ok(())
}
