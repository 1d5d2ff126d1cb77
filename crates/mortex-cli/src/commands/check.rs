//! Check command - report whether the external OCR tools are installed.

use console::style;

use mortex_core::TesseractCli;

use super::load_config;

pub async fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let backend = TesseractCli::from_config(&config.ocr);

    let mut missing = Vec::new();
    for (tool, location) in backend.tool_paths() {
        match location {
            Some(path) => println!("{} {}: {}", style("✓").green(), tool, path.display()),
            None => {
                println!("{} {}: not found", style("✗").red(), tool);
                missing.push(tool);
            }
        }
    }

    if !missing.is_empty() {
        println!();
        println!(
            "Without these tools scanned PDFs and images yield empty results. \
             Install tesseract-ocr and ocrmypdf, or set ocr.tesseract_path / ocr.ocrmypdf_path."
        );
        anyhow::bail!("Missing OCR tools: {}", missing.join(", "));
    }

    Ok(())
}
