//! Config command handler

use crate::commands::ConfigArgs;
use crate::error::CliResult;
use shutterbox::config::BoothConfig;

/// Execute the config command
pub fn execute_config(booth: &BoothConfig, args: &ConfigArgs) -> CliResult<()> {
    if args.check {
        booth.validate()?;
        println!("configuration OK");
        return Ok(());
    }
    print!("{}", render_config(booth, args.defaults)?);
    Ok(())
}

/// YAML for the effective configuration, or for the defaults
pub fn render_config(booth: &BoothConfig, defaults: bool) -> CliResult<String> {
    let yaml = if defaults {
        BoothConfig::default().to_yaml()?
    } else {
        booth.to_yaml()?
    };
    Ok(yaml)
}
