use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = swarajya_api::Args::parse();

	swarajya_api::run(args).await
}
