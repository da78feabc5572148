use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use interview_client::session::ProgressCallback;
use interview_client::{
    AnalysisRepository, CredentialStore, FileBackend, ProfileUpdate, RegisterRequest,
    SessionEvent, UploadProgress, VideoUpload,
};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::cli::{Commands, OutputFormat};
use crate::config::AppConfig;
use crate::error::CliError;
use crate::output::OutputManager;

pub struct CommandExecutor {
    repo: AnalysisRepository,
    output: OutputManager,
    events: broadcast::Receiver<SessionEvent>,
}

impl CommandExecutor {
    pub async fn new(
        config: &AppConfig,
        base_url: Option<&str>,
        output: OutputManager,
    ) -> Result<Self, CliError> {
        let client = config.client_config(base_url)?;
        let credentials = config.credentials_file()?;
        debug!(base_url = %client.base_url, credentials = %credentials.display(), "Client configured");

        let store = CredentialStore::open(FileBackend::new(credentials)).await;
        let repo = AnalysisRepository::connect(client, Arc::new(store))?;
        let events = repo.gateway().subscribe();
        Ok(Self {
            repo,
            output,
            events,
        })
    }

    /// Log the session changes that happened behind the last command, e.g. a
    /// failed refresh. Call after [`execute`](Self::execute), whatever its result.
    pub fn log_session_events(&mut self) -> usize {
        log_session_events(&mut self.events)
    }

    pub async fn execute(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Register {
                username,
                email,
                password,
                first_name,
                last_name,
            } => {
                let password = read_password(password, true)?;
                let request = RegisterRequest::new(username, email, password).with_name(
                    first_name.unwrap_or_default(),
                    last_name.unwrap_or_default(),
                );
                let account = self
                    .repo
                    .register(&request)
                    .await
                    .context("Registration failed")?;
                println!("{}", self.output.account(&account)?);
            }

            Commands::Login { email, password } => {
                let password = read_password(password, false)?;
                let response = self
                    .repo
                    .sign_in(&email, &password)
                    .await
                    .context("Login failed")?;
                let name = response
                    .user
                    .as_ref()
                    .map_or_else(|| email.clone(), |user| user.display_name());
                info!(%email, "Signed in");
                println!("{}", self.output.message(&format!("Signed in as {name}"))?);
            }

            Commands::Logout => {
                self.repo.logout().await?;
                println!("{}", self.output.message("Signed out")?);
            }

            Commands::Upload { file, candidate } => {
                self.require_session()?;
                self.upload(&file, candidate).await?;
            }

            Commands::List => {
                self.require_session()?;
                let records = self
                    .repo
                    .list_analyses()
                    .await
                    .context("Failed to list analyses")?;
                println!("{}", self.output.analyses(&records)?);
            }

            Commands::Show { id } => {
                self.require_session()?;
                let record = self
                    .repo
                    .get_analysis(id)
                    .await
                    .with_context(|| format!("Failed to load analysis {id}"))?;
                println!("{}", self.output.analysis(&record)?);
            }

            Commands::Summary => {
                self.require_session()?;
                let records = self
                    .repo
                    .list_analyses()
                    .await
                    .context("Failed to list analyses")?;
                println!("{}", self.output.summary(&records)?);
            }

            Commands::Profile => {
                self.require_session()?;
                let profile = self
                    .repo
                    .get_profile()
                    .await
                    .context("Failed to load profile")?;
                println!("{}", self.output.profile(&profile)?);
            }

            Commands::ProfileUpdate {
                first_name,
                last_name,
                email,
            } => {
                self.require_session()?;
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    email,
                    username: None,
                };
                if update.is_empty() {
                    return Err(CliError::InvalidInput(
                        "nothing to update, pass --first-name, --last-name or --email".into(),
                    )
                    .into());
                }
                let profile = self
                    .repo
                    .update_profile(&update)
                    .await
                    .context("Failed to update profile")?;
                println!("{}", self.output.profile(&profile)?);
            }

            Commands::Questions { query } => {
                self.require_session()?;
                let questions = self
                    .repo
                    .search_questions(&query)
                    .await
                    .context("Question search failed")?;
                println!("{}", self.output.questions(&questions)?);
            }
        }
        Ok(())
    }

    fn require_session(&self) -> Result<(), CliError> {
        if self.repo.gateway().store().is_signed_in() {
            Ok(())
        } else {
            Err(CliError::NotSignedIn)
        }
    }

    async fn upload(&self, file: &Path, candidate: String) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        if bytes.is_empty() {
            return Err(CliError::InvalidInput(format!("{} is empty", file.display())).into());
        }

        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("interview.mp4")
            .to_string();

        let pb = self.upload_bar(bytes.len() as u64);
        let progress: ProgressCallback = {
            let pb = pb.clone();
            Arc::new(move |update: UploadProgress| {
                pb.set_position(update.sent);
                if update.sent >= update.total {
                    pb.set_message("analyzing");
                }
            })
        };

        let upload = VideoUpload::new(file_name, bytes, candidate).with_progress(progress);
        let result = self.repo.submit_analysis(upload).await;
        pb.finish_and_clear();

        let record = result.context("Upload failed")?;
        println!("{}", self.output.analysis(&record)?);
        Ok(())
    }

    fn upload_bar(&self, total: u64) -> ProgressBar {
        if self.output.format() == OutputFormat::Json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        pb.set_style(style);
        pb.set_message("uploading");
        pb
    }
}

fn read_password(given: Option<String>, confirm: bool) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }

    let prompt = inquire::Password::new("Password:");
    let prompt = if confirm {
        prompt
    } else {
        prompt.without_confirmation()
    };
    prompt.prompt().context("Failed to read password")
}

/// Log every queued session event without waiting for more.
fn log_session_events(events: &mut broadcast::Receiver<SessionEvent>) -> usize {
    let mut logged = 0;
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Expired { reason }) => {
                warn!(%reason, "Session expired, stored credential removed");
            }
            Ok(event) => debug!(event = event.event_name(), "Session event"),
            Err(TryRecvError::Lagged(skipped)) => {
                debug!(skipped, "Session events dropped");
                continue;
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return logged,
        }
        logged += 1;
    }
}
