use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use netlog_model::RequestRecord;

use crate::error::RunnerError;

/// Component G: emit the request array as JSON, gzip-compressing when
/// `path` ends in `.gz` (spec §4.G).
pub fn write_netlog_requests(path: &Path, requests: &[RequestRecord]) -> Result<(), RunnerError> {
    let json = serde_json::to_vec(requests).map_err(RunnerError::Encode)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        let file = File::create(path).map_err(RunnerError::Write)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&json).map_err(RunnerError::Write)?;
        encoder.finish().map_err(RunnerError::Write)?;
    } else {
        std::fs::write(path, json).map_err(RunnerError::Write)?;
    }
    Ok(())
}

/// Compresses the verbatim pipe copy at level 7 and removes the
/// uncompressed original (SPEC_FULL §4 item 5), mirroring the original
/// harness's shutdown behavior for its `_netlog.txt` tee.
pub(crate) fn compress_verbatim_copy(path: &Path) -> Result<(), RunnerError> {
    let data = std::fs::read(path).map_err(RunnerError::Write)?;
    let gz_path = append_extension(path, "gz");
    let file = File::create(&gz_path).map_err(RunnerError::Write)?;
    let mut encoder = GzEncoder::new(file, Compression::new(7));
    encoder.write_all(&data).map_err(RunnerError::Write)?;
    encoder.finish().map_err(RunnerError::Write)?;
    std::fs::remove_file(path).map_err(RunnerError::Write)?;
    Ok(())
}

fn append_extension(path: &Path, ext: &str) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    name.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use netlog_model::RequestRecord;

    fn sample() -> Vec<RequestRecord> {
        vec![RequestRecord {
            id: 1,
            url: "https://example.com/".into(),
            method: Some("GET".into()),
            protocol: None,
            priority: None,
            start: 0,
            end: 10,
            first_byte: None,
            connect_start: None,
            connect_end: None,
            ssl_start: None,
            ssl_end: None,
            dns_start: None,
            dns_end: None,
            request_headers: vec![],
            response_headers: vec![],
            bytes_in: 0,
            uncompressed_bytes_in: None,
            chunks: vec![],
            server_address: None,
            client_address: None,
            certificates: None,
            tls_version: None,
            tls_next_proto: None,
            tls_cipher_suite: None,
            tls_resumed: None,
            http2_server_settings: None,
            stream_id: None,
            pushed: None,
            status: None,
        }]
    }

    #[test]
    fn plain_output_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_netlog_requests(&path, &sample()).unwrap();
        let raw = std::fs::read(&path).unwrap();
        let decoded: Vec<RequestRecord> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn gz_suffix_compresses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json.gz");
        write_netlog_requests(&path, &sample()).unwrap();
        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[0..2], &[0x1f, 0x8b]);
    }
}
