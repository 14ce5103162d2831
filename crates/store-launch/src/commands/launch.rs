use crate::context::AppContext;
use anyhow::{Result, bail};
use futures::StreamExt;
use launch_config::Config;
use launch_orchestration::{LaunchEvent, LaunchOptions, Platform, VersionDescriptor};
use tracing::info;

/// What the user asked to launch
pub struct Request {
    pub platform: Platform,
    pub version: String,
    pub native: bool,
    pub platform_build: bool,
    pub flags: Vec<String>,
}

pub async fn run(config: &Config, request: Request) -> Result<()> {
    let app = AppContext::from_config(config)?;

    let version = if request.native {
        VersionDescriptor::native(request.version)
    } else {
        VersionDescriptor::managed(request.version)
    };
    let mut options = LaunchOptions::new(request.platform, version)
        .with_platform_build(request.platform_build);
    options.launch_flags = app.setup.launch_flags.clone();
    options.launch_flags.extend(request.flags);

    info!("Requested {:?}", options);
    let mut events = app.orchestrator.launch(options);

    while let Some(event) = events.next().await {
        match event {
            LaunchEvent::Downgrading => println!("Switching install to version..."),
            LaunchEvent::Launching => println!("Launching {}...", request.platform),
            LaunchEvent::Exited { code: Some(code) } => println!("✓ Game exited with code {}", code),
            LaunchEvent::Exited { code: None } => println!("✓ Game terminated by a signal"),
            LaunchEvent::Failed(failure) => bail!("Launch failed ({}): {}", failure.kind, failure.message),
        }
    }

    Ok(())
}
