//! Group and preset listings

use clap::Args;
use sheetwatch_core::groups::presets;
use sheetwatch_core::GroupCatalog;

#[derive(Debug, Args)]
pub struct GroupsArgs {
    /// Resolve these group names to field patterns instead of listing
    #[arg(long, value_delimiter = ',')]
    pub resolve: Vec<String>,
}

pub fn execute(args: GroupsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = GroupCatalog::builtin();

    if !args.resolve.is_empty() {
        let resolved = catalog.resolve(&args.resolve);
        for pattern in &resolved.patterns {
            println!("{}", pattern);
        }
        for name in &resolved.unknown {
            eprintln!("warning: unknown group `{}`", name);
        }
        return Ok(());
    }

    println!("Core groups:");
    for group in catalog.core_groups() {
        println!(
            "  {:<14} [{}] {}",
            group.name,
            group.priority.as_str(),
            group.description
        );
        for sub in &group.subgroup_names {
            println!("    {}", sub);
        }
    }

    println!("\nComposite groups:");
    for (name, members) in catalog.composite_groups() {
        println!("  {:<18} = {}", name, members.join(" + "));
    }
    Ok(())
}

pub fn execute_presets() -> Result<(), Box<dyn std::error::Error>> {
    for preset in presets() {
        println!("{:<18} {}", preset.name, preset.description);
        println!("    include: {}", preset.include.join(", "));
        if !preset.exclude.is_empty() {
            println!("    exclude: {}", preset.exclude.join(", "));
        }
    }
    Ok(())
}
