//! Validate-webhook command

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use sheetwatch_core::{OperationLog, Sensitive};
use sheetwatch_delivery::{DeliveryService, ReqwestTransport, WebhookValidationResult};
use sheetwatch_engine::config::expand_placeholders;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Webhook URL; `${VAR}` placeholders are expanded from the environment
    pub url: String,

    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = expand_placeholders(&args.url, |name| std::env::var(name).ok());
    let service = DeliveryService::new(
        Sensitive::new(url),
        Arc::new(ReqwestTransport::new()),
        Arc::new(OperationLog::new()),
    )
    .with_request_timeout(Duration::from_secs(args.timeout_secs.max(1)));

    let result = super::runtime()?.block_on(service.validate_endpoint());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&service.masked_url(), &result);
    }

    if result.is_valid {
        Ok(())
    } else {
        Err(format!(
            "webhook validation failed ({})",
            result.error_kind.unwrap_or("UNKNOWN_ERROR")
        )
        .into())
    }
}

fn print_result(masked_url: &str, result: &WebhookValidationResult) {
    println!("Endpoint: {}", masked_url);
    if result.is_valid {
        match &result.endpoint_info {
            Some(info) => {
                println!("✓ Valid webhook {}", info.id);
                if let Some(name) = &info.name {
                    println!("  name:    {}", name);
                }
                if let Some(channel) = &info.channel_id {
                    println!("  channel: {}", channel);
                }
            }
            None => println!("✓ Placeholder URL accepted (not probed)"),
        }
        return;
    }

    println!(
        "✗ {}: {}",
        result.error_kind.unwrap_or("UNKNOWN_ERROR"),
        result.error_message.as_deref().unwrap_or("validation failed")
    );
    if let Some(ms) = result.retry_after_ms {
        println!("  retry after {} ms", ms);
    }
    if !result.remediation_steps.is_empty() {
        println!("Remediation:");
        for step in &result.remediation_steps {
            println!("  - {}", step);
        }
    }
}
