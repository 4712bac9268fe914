//! Install command - precaches the current generation into the configured store
//!
//! Useful with the Redis backend to warm a shared store before rolling out.

use clap::Args;

use crate::domain::LifecycleStatus;

#[derive(Args, Clone, Debug)]
pub struct InstallArgs {
    /// Stop at `installed` instead of activating (and purging, when enabled)
    #[arg(long)]
    pub no_activate: bool,
}

pub async fn run(args: InstallArgs) -> anyhow::Result<()> {
    let mut config = super::load_config()?;
    super::init_logging(&config);

    if args.no_activate {
        config.cache.skip_waiting = false;
    }

    let state = crate::create_app_state_with_config(&config).await?;

    let status = state
        .lifecycle
        .install()
        .await
        .map_err(|e| anyhow::anyhow!("Install failed: {}", e))?;

    println!("{}", render(&status)?);
    Ok(())
}

fn render(status: &LifecycleStatus) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(status)?)
}
