//! Draft PDF assembly from scanned page images.
//!
//! Each page image is decoded, normalized to 8-bit RGB, re-encoded as JPEG
//! and embedded as a DCTDecode image XObject, one PDF page per source image
//! in exact append order. Mixed color depths are normalized, never a
//! failure. Decoding and PDF construction are CPU-bound, so the whole pass
//! runs on the blocking pool.

use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use scandock_core::document::Page;
use scandock_core::{Error, Result};

/// Tracing target for assembly operations.
const TRACING_TARGET: &str = "scandock_server::service::assembler";

/// JPEG quality for re-encoded pages.
const JPEG_QUALITY: u8 = 85;

/// Merges the page images into a single PDF written to `output`.
///
/// Pages are embedded in slice order. Fails with `missing_page` when a page
/// file cannot be read and `decode_failed` when its bytes do not decode as
/// an image.
#[tracing::instrument(skip_all, fields(pages = pages.len(), dpi = resolution))]
pub async fn assemble(pages: Vec<Page>, resolution: u32, output: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || assemble_blocking(&pages, resolution, &output))
        .await
        .map_err(|e| {
            Error::internal()
                .with_message("assembly task did not complete")
                .with_source(e)
        })?
}

fn assemble_blocking(pages: &[Page], resolution: u32, output: &Path) -> Result<()> {
    let dpi = resolution.max(1);
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let bytes = std::fs::read(&page.path).map_err(|e| {
            Error::missing_page()
                .with_message(format!("page {} is gone from scratch", page.number))
                .with_source(e)
        })?;

        let rgb = image::load_from_memory(&bytes)
            .map_err(|e| {
                Error::decode_failed()
                    .with_message(format!("page {} does not decode as an image", page.number))
                    .with_source(e)
            })?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut jpeg = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY))
            .map_err(|e| {
                Error::internal()
                    .with_message(format!("page {} could not be re-encoded", page.number))
                    .with_source(e)
            })?;

        // Pixel geometry mapped to PDF points at the scan resolution.
        let width_pt = ((f64::from(width) * 72.0 / f64::from(dpi)).round() as i64).max(1);
        let height_pt = ((f64::from(height) * 72.0 / f64::from(dpi)).round() as i64).max(1);

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|e| {
            Error::internal()
                .with_message("page content stream could not be encoded")
                .with_source(e)
        })?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(output).map_err(|e| {
        Error::io()
            .with_message("draft PDF could not be written")
            .with_source(e)
    })?;

    tracing::debug!(
        target: TRACING_TARGET,
        pages = pages.len(),
        output = %output.display(),
        "draft assembled"
    );
    Ok(())
}
