//! Classify command - shows how a path would be routed, without any network access

use clap::Args;

use crate::domain::cache::PartitionNames;
use crate::domain::StrategySelector;

#[derive(Args, Clone, Debug)]
pub struct ClassifyArgs {
    /// Request path, optionally with a query string
    pub path: String,
}

pub fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    let names = config.partition_names()?;
    let selector = StrategySelector::new(config.routing.clone());

    println!("{}", describe(&selector, &names, &args.path));
    Ok(())
}

fn describe(selector: &StrategySelector, names: &PartitionNames, path: &str) -> String {
    let route = selector.classify(path);
    format!("{} -> {} ({})", path, route.strategy, names.name(route.partition))
}
