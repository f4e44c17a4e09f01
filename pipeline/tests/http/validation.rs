//! Admissibility probe against live HTTP responses

use image_pipeline::config::ValidationConfig;
use image_pipeline::{ImageValidator, Rejection};

use crate::support::{closed_port_url, spawn};

fn validator() -> ImageValidator {
    ImageValidator::new(&ValidationConfig::default(), "image-pipeline-tests").unwrap()
}

#[tokio::test]
async fn minimum_size_jpeg_is_admitted() {
    let server = spawn().await;
    let info = validator().inspect(&server.url("/photo.jpg")).await.unwrap();

    assert_eq!(info.format, "JPEG");
    assert_eq!((info.width, info.height), (100, 100));
    assert_eq!(info.content_type, "image/jpeg");
    assert!(validator().validate(&server.url("/photo.jpg")).await);
}

#[tokio::test]
async fn non_200_is_rejected() {
    let server = spawn().await;
    let v = validator();

    assert_eq!(
        v.inspect(&server.url("/missing.jpg")).await,
        Err(Rejection::Status(404))
    );
    assert_eq!(
        v.inspect(&server.url("/unavailable.jpg")).await,
        Err(Rejection::Status(503))
    );
    assert!(!v.validate(&server.url("/missing.jpg")).await);
}

#[tokio::test]
async fn wrong_content_type_is_rejected_despite_image_body() {
    let server = spawn().await;
    let result = validator().inspect(&server.url("/mislabeled.jpg")).await;
    assert_eq!(result, Err(Rejection::ContentType("text/html".into())));
}

#[tokio::test]
async fn undecodable_body_is_rejected() {
    let server = spawn().await;
    let result = validator().inspect(&server.url("/garbage.jpg")).await;
    assert!(matches!(result, Err(Rejection::Undecodable(_))));
}

#[tokio::test]
async fn gif_is_rejected_by_format() {
    let server = spawn().await;
    let result = validator().inspect(&server.url("/anim.gif")).await;
    assert_eq!(result, Err(Rejection::Format("GIF".into())));
}

#[tokio::test]
async fn undersized_png_is_rejected() {
    let server = spawn().await;
    let result = validator().inspect(&server.url("/small.png")).await;
    assert_eq!(
        result,
        Err(Rejection::TooSmall {
            width: 99,
            height: 120
        })
    );
}

#[tokio::test]
async fn unreachable_host_is_rejected_not_raised() {
    let url = closed_port_url().await;
    let result = validator().inspect(&url).await;
    assert!(matches!(result, Err(Rejection::Network(_))));
    assert!(!validator().validate(&url).await);
}

#[tokio::test]
async fn validation_is_repeatable() {
    let server = spawn().await;
    let v = validator();

    for path in ["/photo.jpg", "/large.png", "/small.png", "/missing.jpg"] {
        let url = server.url(path);
        let first = v.validate(&url).await;
        let second = v.validate(&url).await;
        assert_eq!(first, second, "{path} changed between probes");
    }
}

#[tokio::test]
async fn admit_hands_out_validated_url() {
    let server = spawn().await;
    let v = validator();

    let url = server.url("/large.png");
    let validated = v.admit(&url).await.expect("large.png is admissible");
    assert_eq!(validated.as_str(), url);
    assert!(v.admit(&server.url("/small.png")).await.is_none());
}
