use anyhow::Result;

use crate::config::Config;

/// `relayctx sources`: show which corpus sources are configured and
/// whether they can be read.
pub fn list_sources(config: &Config) -> Result<()> {
    let zip_status = match &config.corpus.zip_path {
        Some(path) if path.is_file() => (format!("OK ({})", path.display()), true),
        Some(path) => (format!("MISSING ({})", path.display()), false),
        None => ("NOT CONFIGURED".to_string(), false),
    };
    let dir_status = match &config.corpus.dir {
        Some(path) if path.is_dir() => (format!("OK ({})", path.display()), true),
        Some(path) => (format!("MISSING ({})", path.display()), false),
        None => ("NOT CONFIGURED".to_string(), false),
    };

    println!("{:<12} {:<8} STATUS", "SOURCE", "HEALTHY");
    println!("{:<12} {:<8} {}", "zip", zip_status.1, zip_status.0);
    println!("{:<12} {:<8} {}", "directory", dir_status.1, dir_status.0);

    if config.corpus.zip_path.is_some() && config.corpus.dir.is_some() {
        println!();
        println!("note: zip takes precedence over directory");
    }
    Ok(())
}
