use std::io::Read;

use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("jitsi-release-sync/", env!("CARGO_PKG_VERSION"));

/// Source of `Packages` index documents.
pub trait IndexSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpIndexSource {
    client: Client,
}

impl HttpIndexSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to initialize HTTP client")?;
        Ok(Self { client })
    }
}

impl IndexSource for HttpIndexSource {
    fn fetch(&self, url: &str) -> Result<String> {
        let url = Url::parse(url).with_context(|| format!("Invalid index URL {url}"))?;
        info!("reading packages index from {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("Failed to request {}", url.as_str()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(anyhow!("Packages index not found: {} returned 404", url.as_str()));
        }
        if !status.is_success() {
            return Err(anyhow!(
                "Failed to fetch packages index from {}: HTTP {}",
                url.as_str(),
                status.as_u16()
            ));
        }

        let body = response
            .bytes()
            .with_context(|| format!("Failed to read response body from {}", url.as_str()))?;
        debug!(bytes = body.len(), "received packages index");

        decode_index(&body, url.path().ends_with(".gz"))
            .with_context(|| format!("Failed to decode packages index from {}", url.as_str()))
    }
}

fn decode_index(body: &[u8], gzipped: bool) -> Result<String> {
    if gzipped {
        let mut text = String::new();
        GzDecoder::new(body)
            .read_to_string(&mut text)
            .context("Invalid gzip stream or non UTF-8 content")?;
        return Ok(text);
    }

    String::from_utf8(body.to_vec()).context("Index is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use mockito::Server;

    use super::{HttpIndexSource, IndexSource, decode_index};

    const INDEX: &str = "Package: jitsi-meet\nVersion: 2.0.7001-1\n\n";

    #[test]
    fn fetches_plain_index() -> Result<()> {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/stable/Packages")
            .with_status(200)
            .with_body(INDEX)
            .create();

        let source = HttpIndexSource::new()?;
        let text = source.fetch(&format!("{}/stable/Packages", server.url()))?;

        mock.assert();
        assert_eq!(text, INDEX);
        Ok(())
    }

    #[test]
    fn fetches_gzipped_index() -> Result<()> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(INDEX.as_bytes())?;
        let compressed = encoder.finish()?;

        let mut server = Server::new();
        let mock = server
            .mock("GET", "/unstable/Packages.gz")
            .with_status(200)
            .with_body(compressed)
            .create();

        let source = HttpIndexSource::new()?;
        let text = source.fetch(&format!("{}/unstable/Packages.gz", server.url()))?;

        mock.assert();
        assert_eq!(text, INDEX);
        Ok(())
    }

    #[test]
    fn reports_http_errors() -> Result<()> {
        let mut server = Server::new();
        let _missing = server.mock("GET", "/missing/Packages").with_status(404).create();
        let _broken = server.mock("GET", "/broken/Packages").with_status(500).create();

        let source = HttpIndexSource::new()?;

        let missing = source
            .fetch(&format!("{}/missing/Packages", server.url()))
            .expect_err("404 must fail");
        assert!(missing.to_string().contains("returned 404"));

        let broken = source
            .fetch(&format!("{}/broken/Packages", server.url()))
            .expect_err("500 must fail");
        assert!(broken.to_string().contains("HTTP 500"));
        Ok(())
    }

    #[test]
    fn rejects_non_utf8_body() {
        assert!(decode_index(&[0xff, 0xfe, 0x00], false).is_err());
        assert!(decode_index(b"not gzip", true).is_err());
    }
}
