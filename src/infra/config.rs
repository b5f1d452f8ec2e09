/// Process configuration, read from the environment at boot. No CLI flags;
/// the original deployment surface is env-only.
pub struct Config {
    pub mode: String, // "stdio" or "server"
    pub port: u16,
    pub wikipedia_base_url: String,
}

const DEFAULT_LANG: &str = "en";

impl Config {
    pub fn from_env() -> Self {
        let mode = std::env::var("MODE").unwrap_or_else(|_| "stdio".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        let wikipedia_base_url = wikipedia_base_url_from_env();

        Self {
            mode,
            port,
            wikipedia_base_url,
        }
    }
}

/// `WIKIPEDIA_BASE_URL` wins outright; otherwise the language edition is
/// selected by `WIKIPEDIA_LANG` (default "en").
pub fn wikipedia_base_url_from_env() -> String {
    if let Ok(base) = std::env::var("WIKIPEDIA_BASE_URL") {
        if !base.trim().is_empty() {
            return base.trim_end_matches('/').to_string();
        }
    }
    let lang = std::env::var("WIKIPEDIA_LANG").unwrap_or_else(|_| DEFAULT_LANG.into());
    format!("https://{lang}.wikipedia.org")
}
