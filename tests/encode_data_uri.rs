use base64::prelude::*;
use promptmesh::{encode_as_data_uri, PipelineError};

#[tokio::test]
async fn test_jpeg_extensions_use_jpeg_mime() {
    let dir = tempfile::tempdir().unwrap();

    for name in ["car.jpg", "car.jpeg", "CAR.JPG"] {
        let path = dir.path().join(name);
        std::fs::write(&path, b"jpeg data").unwrap();

        let uri = encode_as_data_uri(&path).await.unwrap();

        assert!(uri.starts_with("data:image/jpeg;base64,"), "{name}: {uri}");
    }
}

#[tokio::test]
async fn test_other_extensions_fall_back_to_png() {
    let dir = tempfile::tempdir().unwrap();

    for name in ["car.png", "car.webp", "car.gif", "car"] {
        let path = dir.path().join(name);
        std::fs::write(&path, b"whatever").unwrap();

        let uri = encode_as_data_uri(&path).await.unwrap();

        assert!(uri.starts_with("data:image/png;base64,"), "{name}: {uri}");
    }
}

#[tokio::test]
async fn test_payload_is_standard_base64_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("generated_1.jpeg");
    let content: Vec<u8> = (0u8..=255).collect();
    std::fs::write(&path, &content).unwrap();

    let uri = encode_as_data_uri(&path).await.unwrap();
    let payload = uri.strip_prefix("data:image/jpeg;base64,").unwrap();

    assert_eq!(BASE64_STANDARD.decode(payload).unwrap(), content);
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.png");

    let err = encode_as_data_uri(&path).await.unwrap_err();

    match err {
        PipelineError::Encode { path: failed, source } => {
            assert_eq!(failed, path);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
