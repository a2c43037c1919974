use clap::Parser;
use vodplay_player::commandline::Commandline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let commandline = Commandline::try_parse().unwrap_or_else(|error| error.exit());
	commandline.run().await?;
	Ok(())
}
