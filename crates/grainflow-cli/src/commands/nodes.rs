//! Node kind listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings

use super::builtin_registry;
use clap::Args;
use grainflow_core::{NodeCategory, PortDescriptor};

#[derive(Args)]
pub struct NodesArgs {
    /// Show ports for a specific node kind
    #[arg(value_name = "NODE")]
    node: Option<String>,
}

const CATEGORIES: [NodeCategory; 4] = [
    NodeCategory::Source,
    NodeCategory::Control,
    NodeCategory::Math,
    NodeCategory::Utility,
];

pub fn run(args: NodesArgs) -> anyhow::Result<()> {
    let registry = builtin_registry();

    if let Some(name) = &args.node {
        let info = registry
            .find_by_name(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown node kind: {}", name))?;

        println!("{}", info.name);
        println!("{}", "=".repeat(info.name.len()));
        println!();
        println!("{}", info.description);
        println!("Category: {}", info.category.name());
        println!("State size: {} bytes", info.state_size);
        println!();
        print_ports("Inputs", &info.inputs);
        println!();
        print_ports("Outputs", &info.outputs);
        return Ok(());
    }

    println!("Available Nodes");
    println!("===============");
    for category in CATEGORIES {
        let mut kinds = registry.in_category(category).peekable();
        if kinds.peek().is_none() {
            continue;
        }
        println!();
        println!("{}:", category.name());
        for info in kinds {
            println!("  {:12}  {}", info.name, info.description);
        }
    }
    println!();
    println!("Use 'grainflow nodes <NODE>' for port details.");
    Ok(())
}

fn print_ports(title: &str, ports: &[PortDescriptor]) {
    println!("{title}:");
    if ports.is_empty() {
        println!("  (none)");
        return;
    }
    println!("  {:4}  {:12}  {}", "Port", "Name", "Type");
    println!("  {:4}  {:12}  {}", "----", "----", "----");
    for (i, port) in ports.iter().enumerate() {
        println!("  {:4}  {:12}  {}", i, port.name, port.type_name);
    }
}
