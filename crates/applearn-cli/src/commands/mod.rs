pub mod account;
pub mod config;
pub mod game;
pub mod watch;

use applearn_core::{Clock, Config, Event, HttpPortalApi, Page, SystemClock};
use clap::Args;

/// Connection overrides shared by every portal command.
#[derive(Args, Debug, Clone, Default)]
pub struct PortalArgs {
    /// Portal base URL (overrides portal.base_url)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Cookie header carrying the portal login (overrides portal.session_cookie)
    #[arg(long, global = true)]
    pub cookie: Option<String>,
}

impl PortalArgs {
    /// Loads the config and applies command-line overrides.
    pub fn config(&self) -> applearn_core::error::Result<Config> {
        let mut config = Config::load()?;
        if let Some(base_url) = &self.base_url {
            config.set("portal.base_url", base_url)?;
        }
        if let Some(cookie) = &self.cookie {
            config.portal.session_cookie = Some(cookie.clone());
        }
        Ok(config)
    }

    pub fn page(&self) -> applearn_core::error::Result<(Page<HttpPortalApi, SystemClock>, Config)> {
        let config = self.config()?;
        let page = Page::connect(&config)?;
        Ok((page, config))
    }
}

pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// Prints drained events as JSON lines on stdout.
pub fn print_events<C: Clock>(
    page: &mut Page<HttpPortalApi, C>,
) -> Result<(), Box<dyn std::error::Error>> {
    for event in page.drain_events() {
        print_event(&event)?;
    }
    Ok(())
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
