use anyhow::{Context, Result};
use clap::Parser;
use preprocessing_linreg_with_ti::cli_utils::GramShareArgs;
use preprocessing_linreg_with_ti::gram_sharing::run;

fn main() -> Result<()> {
    let args = GramShareArgs::parse();

    println!("{:?}", args);

    run(args).with_context(|| "Failed to run the sharing round.")?;

    Ok(())
}
