use crate::DocType;
use crate::metadata::storage_key;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEMO_BATCHES: [&str; 3] = ["B001", "B002", "B003"];
pub const DEMO_STATUSES: [&str; 4] = ["Pending", "Accepted", "Rejected", "In Review"];
pub const DEMO_VERSIONS: u32 = 2;

// A4 at 72 DPI
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("failed to write pdf: {0}")]
    Write(#[from] std::io::Error),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DemoError>;

/// Build a one-page sample PDF describing a document version.
pub fn sample_pdf(doc_type: DocType, batch: &str, version: u32, status: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = vec![
        // Border
        Operation::new("w", vec![2.into()]),
        Operation::new(
            "re",
            vec![
                20.into(),
                20.into(),
                (PAGE_WIDTH - 40).into(),
                (PAGE_HEIGHT - 40).into(),
            ],
        ),
        Operation::new("S", vec![]),
    ];

    let mut y = PAGE_HEIGHT - 70;
    text_line(&mut operations, 24, 200, y, &format!("{} Document", doc_type));
    y -= 50;
    text_line(&mut operations, 18, 200, y, &format!("Batch: {}", batch));
    y -= 50;
    text_line(&mut operations, 18, 200, y, &format!("Version: {}", version));
    y -= 40;
    text_line(&mut operations, 18, 200, y, &format!("Status: {}", status));
    y -= 40;
    for i in 1..=10 {
        y -= 30;
        text_line(
            &mut operations,
            12,
            40,
            y,
            &format!("Sample content line {} for demonstration purposes", i),
        );
    }
    text_line(
        &mut operations,
        10,
        150,
        50,
        "This is a sample document for demo purposes",
    );

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(format!("{} {} v{}", doc_type, batch, version)),
        "Producer" => Object::string_literal("doc-review demo"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn text_line(operations: &mut Vec<Operation>, size: i64, x: i64, y: i64, text: &str) {
    operations.extend([
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]);
}

/// Write the demo document set under `out_dir` using the bucket key layout.
///
/// Returns the written file paths.
pub fn generate(out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for (batch_idx, batch) in DEMO_BATCHES.iter().enumerate() {
        for doc_type in DocType::ALL {
            for version in 1..=DEMO_VERSIONS {
                let status = DEMO_STATUSES[(batch_idx + version as usize) % DEMO_STATUSES.len()];
                let path = out_dir.join(storage_key(doc_type, batch, version));
                tracing::info!(path = %path.display(), "creating sample PDF");

                let bytes = sample_pdf(doc_type, batch, version, status)?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|source| DemoError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                std::fs::write(&path, bytes).map_err(|source| DemoError::Io {
                    path: path.clone(),
                    source,
                })?;
                written.push(path);
            }
        }
    }

    Ok(written)
}
