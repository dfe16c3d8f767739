//! `aurora-client url` – show where a cluster's scheduler lives.

use anyhow::Result;
use aurora_client_core::config::ClientConfig;

pub fn run_url(cfg: &ClientConfig, cluster: &str, raw: bool) -> Result<()> {
    let mut proxy = cfg.proxy(cluster)?;
    let url = if raw {
        proxy.scheduler_client()?.raw_url()?
    } else {
        proxy.url()?
    };
    println!("{}", url);
    Ok(())
}
