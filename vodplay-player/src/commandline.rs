use crate::configuration::Configuration;
use crate::context::PlayerContext;
use crate::error::VodplayError;
use crate::playback::headless::HeadlessMedia;
use crate::resume::coordinator::ResumeDecision;
use crate::session::{SessionNotification, SessionParameters, open_session};
use crate::types::{ContentId, UserId};
use crate::utils::time_source::TimeSource;
use chrono::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// How often the simulated media reports its position.
const HEADLESS_TICK: std::time::Duration = std::time::Duration::from_millis(250);

#[derive(clap::Parser)]
#[clap(name = "vodplay", version, about)]
pub struct Commandline {
	#[clap(short = 'c', long = "config-file", default_value = "configuration.toml")]
	pub configuration_file_path: String,
	#[clap(subcommand)]
	pub command: BaseCommand,
}

#[derive(clap::Subcommand)]
pub enum BaseCommand {
	/// Play simulated media, resuming from and reporting to the configured watch history
	Play(PlayCommand),
	/// Print the configuration
	Configuration,
}

#[derive(clap::Args)]
pub struct PlayCommand {
	#[clap(long)]
	pub user: i64,
	#[clap(long)]
	pub content: i64,
	/// Media source, only logged since the media is simulated
	#[clap(long)]
	pub source: Url,
	/// Length of the simulated media in seconds
	#[clap(long)]
	pub duration: u32,
	/// Continue from the saved position when asked (default)
	#[clap(long, conflicts_with = "restart")]
	pub resume: bool,
	/// Start from the beginning when asked
	#[clap(long)]
	pub restart: bool,
	/// Start playing right after the starting position is known
	#[clap(long)]
	pub autoplay: bool,
}

impl Commandline {
	pub async fn run(self) -> Result<(), VodplayError> {
		let configuration = Configuration::from_file(&self.configuration_file_path)?;

		tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::new(&configuration.log_filters))
			.init();

		match self.command {
			BaseCommand::Play(play) => play.run(configuration).await?,
			BaseCommand::Configuration => println!("{configuration:#?}"),
		}
		Ok(())
	}
}

impl PlayCommand {
	async fn run(self, configuration: Configuration) -> Result<(), VodplayError> {
		let time_source = TimeSource::default();
		let context = PlayerContext::new(configuration, time_source.clone())?;
		let media = HeadlessMedia::new(Duration::seconds(i64::from(self.duration)), HEADLESS_TICK, time_source);
		let parameters = SessionParameters::builder()
			.user(UserId::from(self.user))
			.content(ContentId::from(self.content))
			.media_source(self.source)
			.autoplay(self.autoplay)
			.build();

		let (mut handle, runner) = open_session(&context, parameters, media.surface, media.environment, media.events);
		let runner = tokio::spawn(runner.run());
		let driver = tokio::spawn(media.driver.run());

		let decision = if self.restart {
			ResumeDecision::Restart
		} else {
			ResumeDecision::Resume
		};
		let mut failure = None;
		while let Some(notification) = handle.next_notification().await {
			match notification {
				SessionNotification::ResumePrompt { saved_position } => {
					info!(
						saved_seconds = saved_position.num_seconds(),
						?decision,
						"Answering resume prompt."
					);
					handle.resolve_resume(decision).await?;
				}
				SessionNotification::Reconciled { start_position } => {
					info!(start_seconds = start_position.num_seconds(), "Ready to play.");
					if !self.autoplay {
						handle.play().await?;
					}
				}
				SessionNotification::Ended => {
					info!("Reached the end of the media.");
					handle.close();
				}
				SessionNotification::PlaybackFailed(error) => {
					error!(%error, "Giving up on playback.");
					failure = Some(error);
					handle.close();
				}
			}
		}

		let _released = runner.await?;
		driver.await?;
		match failure {
			Some(error) => Err(error.into()),
			None => Ok(()),
		}
	}
}
