//! `aurora-client call` – issue one RPC.

use anyhow::{bail, Context, Result};
use aurora_client_core::config::ClientConfig;
use aurora_client_core::{CallOptions, Method, Response, ResponseCode};
use serde_json::{json, Value};

/// Parse each argument as JSON.
pub fn parse_args(args: &[String]) -> Result<Vec<Value>> {
    args.iter()
        .enumerate()
        .map(|(i, raw)| {
            serde_json::from_str(raw)
                .with_context(|| format!("argument {} is not valid JSON: {}", i + 1, raw))
        })
        .collect()
}

fn render(resp: &Response) -> Value {
    json!({
        "responseCode": format!("{:?}", resp.response_code),
        "details": resp.detail_messages(),
        "result": resp.result,
        "serverInfo": resp.server_info,
    })
}

pub fn run_call(
    cfg: &ClientConfig,
    cluster: &str,
    method: &str,
    args: &[String],
    retry: bool,
) -> Result<()> {
    let Some(method) = Method::from_name(method) else {
        bail!("unknown RPC {:?} (see `aurora-client methods`)", method);
    };
    let args = parse_args(args)?;
    let mut proxy = cfg.proxy(cluster)?;
    let resp = proxy.invoke_with(method, args, CallOptions { retry })?;
    println!("{}", serde_json::to_string_pretty(&render(&resp))?);

    if !matches!(resp.response_code, ResponseCode::Ok | ResponseCode::Warning) {
        bail!("{} returned {:?}", method, resp.response_code);
    }
    Ok(())
}
