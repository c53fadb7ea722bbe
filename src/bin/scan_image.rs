// Decode QR codes from image files through the scan session machinery.
//
// Usage: scan_image <image> [image...]
// Logging honors RUST_LOG, configuration honors the QRSCAN_* overrides.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use qrscan::{ScanConfig, scan_still};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: scan_image <image> [image...]");
        std::process::exit(2);
    }

    let config = ScanConfig::from_env();
    let timeout = Duration::from_secs(2);

    let mut decoded = 0;
    let mut load_errors = false;
    for path in &paths {
        match scan_still(path, config.clone(), timeout) {
            Ok(Some(result)) => {
                decoded += 1;
                println!("OK: {} -> {}", path, result.payload);
            }
            Ok(None) => {
                println!("FAIL: {} -> no QR code", path);
            }
            Err(err) => {
                load_errors = true;
                eprintln!("ERROR: {} -> {}", path, err);
            }
        }
    }

    if paths.len() > 1 {
        println!("\nResult: {}/{}", decoded, paths.len());
    }

    if load_errors {
        std::process::exit(2);
    }
    if decoded < paths.len() {
        std::process::exit(1);
    }
}
