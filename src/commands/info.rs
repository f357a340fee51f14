//! Scheme information

use anyhow::Result;
use bdfext_core::solvers::{coefficients, MAX_ORDER};
use bdfext_core::Stabilization;
use bdfext_types::RunSettings;
use clap::Args;

/// Info arguments
#[derive(Args)]
pub struct InfoArgs {
    /// Print the default run settings as JSON
    #[arg(long)]
    pub defaults: bool,
}

pub fn execute(args: InfoArgs) -> Result<()> {
    println!("BDF/EXT coefficient tables");
    println!("{:>6} {:>10}  {:<28} {}", "order", "alpha", "beta_BDF", "beta_EXT");
    for order in 1..=MAX_ORDER {
        let c = coefficients(order)?;
        println!(
            "{:>6} {:>10.6}  {:<28} {}",
            order,
            c.alpha,
            format_row(c.beta_bdf),
            format_row(c.beta_ext)
        );
    }

    println!();
    println!("Stabilization schemes: {}", Stabilization::NAMES.join(", "));

    if args.defaults {
        println!();
        println!("{}", serde_json::to_string_pretty(&RunSettings::default())?);
    }
    Ok(())
}

fn format_row(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", items.join(", "))
}
