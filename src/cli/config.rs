//! Config command implementation

use crate::cli::ConfigInitArgs;

const EXAMPLE_CONFIG: &str = include_str!("../../rudder.example.toml");

/// Write an annotated example configuration file.
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }

    std::fs::write(&args.output, EXAMPLE_CONFIG)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
