use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::FormRules;

/// Realiza Alumínio site backend: catalog, configurator and forms.
#[derive(Parser, Debug, Clone)]
#[command(name = "realiza-site")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "REALIZA_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory served under /images (swatches and preview photos)
    #[arg(long, env = "REALIZA_ASSETS_DIR", default_value = "public/images")]
    pub assets_dir: PathBuf,

    /// Catalog manifest (YAML). The built-in catalog is used when omitted
    #[arg(long, env = "REALIZA_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Photo the visualizer recolors, relative to the assets directory
    #[arg(long, env = "REALIZA_PREVIEW_IMAGE", default_value = "hero_home_luxury.jpg")]
    pub preview_image: String,

    /// Base URL of the postal-code service
    #[arg(long, env = "REALIZA_POSTAL_BASE_URL", default_value = "https://viacep.com.br")]
    pub postal_base_url: String,

    #[arg(long, env = "REALIZA_POSTAL_TIMEOUT_MS", default_value_t = 5000)]
    pub postal_timeout_ms: u64,

    /// Simulated network delay before a submission is accepted
    #[arg(long, env = "REALIZA_SUBMIT_DELAY_MS", default_value_t = 1500)]
    pub submit_delay_ms: u64,

    /// Floating WhatsApp contact link
    #[arg(long, env = "REALIZA_WHATSAPP_URL", default_value = "https://wa.me/message/X4KQ726JGQX5B1")]
    pub whatsapp_url: String,

    /// Phone for quote deep links. Without it no deep link is offered
    #[arg(long, env = "REALIZA_WHATSAPP_PHONE")]
    pub whatsapp_phone: Option<String>,

    #[arg(long, env = "REALIZA_MAX_ATTACHMENT_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_attachment_bytes: u64,

    /// Page sessions idle for this long are dropped
    #[arg(long, env = "REALIZA_SESSION_TTL_SECS", default_value_t = 1800)]
    pub session_ttl_secs: u64,

    /// Upper bound on open page sessions; the least recently seen go first
    #[arg(long, env = "REALIZA_MAX_SESSIONS", default_value_t = 10_000)]
    pub max_sessions: usize,
}

impl Config {
    pub fn postal_timeout(&self) -> Duration {
        Duration::from_millis(self.postal_timeout_ms)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn form_rules(&self) -> FormRules {
        FormRules {
            max_attachment_bytes: self.max_attachment_bytes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            assets_dir: PathBuf::from("public/images"),
            catalog: None,
            preview_image: "hero_home_luxury.jpg".into(),
            postal_base_url: "https://viacep.com.br".into(),
            postal_timeout_ms: 5000,
            submit_delay_ms: 1500,
            whatsapp_url: "https://wa.me/message/X4KQ726JGQX5B1".into(),
            whatsapp_phone: None,
            max_attachment_bytes: FormRules::default().max_attachment_bytes,
            session_ttl_secs: 1800,
            max_sessions: 10_000,
        }
    }
}
