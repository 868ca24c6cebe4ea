use clap::Parser;

use swarajya_eval::Args;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	swarajya_eval::run(args)
}
