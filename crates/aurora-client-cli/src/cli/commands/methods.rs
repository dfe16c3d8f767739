//! `aurora-client methods` – list callable RPCs with their arity.

use anyhow::Result;
use aurora_client_core::Method;

pub fn run_methods() -> Result<()> {
    for m in Method::ALL {
        let spec = m.spec();
        let optional = if spec.optional > 0 { " [+optional]" } else { "" };
        println!("{:<36} {}{}", spec.name, spec.required, optional);
    }
    Ok(())
}
