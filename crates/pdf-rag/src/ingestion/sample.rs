//! Minimal PDF writer for demo and test documents

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::{Error, Result};

const PAGE_TOP: i64 = 790;
const LINE_HEIGHT: i64 = 14;
const FONT_SIZE: i64 = 10;

/// Build an A4 PDF with one line of Courier text per entry
///
/// Text must be representable in WinAnsi encoding.
pub fn build_pdf(pages: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in pages {
        let mut operations = Vec::with_capacity(lines.len() * 5);
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
            operations.push(Operation::new(
                "Td",
                vec![50i64.into(), (PAGE_TOP - LINE_HEIGHT * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| Error::internal(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| Error::internal(format!("Failed to write PDF: {}", e)))?;
    Ok(buffer)
}

/// A small health insurance policy used by the demo binary
pub fn sample_policy_pages() -> Vec<Vec<String>> {
    let pages: [&[&str]; 3] = [
        &[
            "COMPREHENSIVE HEALTH INSURANCE POLICY",
            "Policy Number: CHP-2024-12345. Sum Insured: Rs. 5,00,000.",
            "This policy covers hospitalization expenses, surgical procedures,",
            "pre and post hospitalization, day care treatments and emergency ambulance services.",
            "WAITING PERIODS. General treatments have no waiting period.",
            "Specific diseases have a 30 days waiting period.",
            "Surgical procedures have a 90 days waiting period from policy inception.",
            "Pre-existing conditions have a 24 months waiting period.",
            "GEOGRAPHIC COVERAGE. All treatments within India are covered.",
            "Pune, Mumbai, Delhi and Bangalore have extensive network hospitals.",
        ],
        &[
            "SURGICAL PROCEDURES COVERAGE",
            "Knee replacement surgery is covered up to Rs. 2,50,000.",
            "Arthroscopic knee surgery is covered up to Rs. 75,000.",
            "Meniscus repair is covered up to Rs. 50,000.",
            "Pre-authorization is required for all knee surgeries.",
            "Hip replacement is covered up to Rs. 3,00,000.",
            "Cataract surgery is covered up to Rs. 40,000 per eye.",
        ],
        &[
            "EXCLUSIONS",
            "Cosmetic surgery is excluded unless required after an accident.",
            "Dental treatment is not covered except when arising from an injury.",
            "Self-inflicted injuries are excluded.",
            "Experimental treatments are not covered.",
            "CLAIM PROCESS. Claims must be filed within 30 days of discharge.",
        ],
    ];

    pages
        .iter()
        .map(|lines| lines.iter().map(|l| l.to_string()).collect())
        .collect()
}
