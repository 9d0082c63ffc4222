//! Writes a sample insurance policy PDF into the PDFs folder

use anyhow::Context;
use clap::Parser;
use pdf_rag::ingestion::sample::{build_pdf, sample_policy_pages};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pdf-rag-sample", version, about = "Create a sample policy PDF for testing")]
struct Args {
    /// Target folder
    #[arg(long, env = "PDFS_FOLDER", default_value = "pdfs")]
    pdfs_dir: PathBuf,

    /// File name of the generated PDF
    #[arg(long, default_value = "sample_health_insurance_policy.pdf")]
    name: String,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    std::fs::create_dir_all(&args.pdfs_dir)
        .with_context(|| format!("creating {}", args.pdfs_dir.display()))?;

    let pages = sample_policy_pages();
    let pdf = build_pdf(&pages)?;
    let path = args.pdfs_dir.join(&args.name);
    std::fs::write(&path, &pdf).with_context(|| format!("writing {}", path.display()))?;

    println!("Created {} ({} pages, {} bytes)", path.display(), pages.len(), pdf.len());
    Ok(())
}
