//! `hostgate check` — dry-run the decision engine.
//!
//! Loads the policy from a config file, builds a simulated request
//! context from the CLI flags, and prints the decision the gate would
//! make. Useful for debugging bounce loops without deploying.

use crate::cli::CheckArgs;
use crate::config::sources::parse_config_str;
use crate::config::validation;
use crate::error::HostgateError;
use crate::gate::context::RequestContext;
use crate::gate::engine;
use crate::gate::policy::RedirectPolicy;

pub fn execute(args: &CheckArgs) -> Result<(), HostgateError> {
    let path = &args.config;

    if !path.exists() {
        return Err(HostgateError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let store = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validation::validate(&store) {
        return Err(HostgateError::ConfigValidation { errors });
    }

    let policy = RedirectPolicy::from_config(store.policy(&args.policy_key)?);

    let ctx = RequestContext::new(
        args.host.clone(),
        args.path.clone(),
        args.via.clone(),
        !args.insecure,
    );

    let decision = engine::evaluate(&policy, &ctx)?;

    if args.json {
        let payload = decision.as_ref().map_or_else(
            || serde_json::json!({ "redirect": false }),
            |d| {
                serde_json::json!({
                    "redirect": true,
                    "target": d.target,
                    "permanent": d.permanent,
                    "cause": d.cause.as_str(),
                })
            },
        );
        println!("{payload}");
        return Ok(());
    }

    match decision {
        Some(d) => {
            let status = if d.permanent { 301 } else { 302 };
            println!(
                "\u{2192} {} {} ({})",
                status,
                d.target,
                d.cause.as_str()
            );
        }
        None => println!("\u{2713} no redirect \u{2014} the request would proceed"),
    }

    Ok(())
}
