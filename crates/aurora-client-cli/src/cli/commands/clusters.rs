//! `aurora-client clusters` – list configured clusters.

use anyhow::Result;
use aurora_client_core::config::ClientConfig;

pub fn run_clusters(cfg: &ClientConfig) -> Result<()> {
    if cfg.clusters.is_empty() {
        println!("No clusters configured.");
        return Ok(());
    }
    println!("{:<16} {:<10} {}", "NAME", "MODE", "TARGET");
    for c in &cfg.clusters {
        let (mode, target) = match (&c.zk, &c.scheduler_uri) {
            (Some(zk), _) => ("zk", format!("{}:{}{}", zk, c.zk_port, c.scheduler_zk_path)),
            (None, Some(uri)) => ("direct", uri.clone()),
            (None, None) => ("-", "-".to_string()),
        };
        println!("{:<16} {:<10} {}", c.name, mode, target);
    }
    Ok(())
}
