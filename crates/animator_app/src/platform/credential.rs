use std::io::{self, BufRead, Write};

use animator_engine::{AuthorizationProvider, SharedCredential};
use animator_logging::{animator_info, animator_warn};

/// Environment variable that seeds the API key at start-up.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Credential slot that asks for a key on the terminal when the monitor
/// requests a selection.
pub struct TerminalCredential {
    shared: SharedCredential,
}

impl TerminalCredential {
    pub fn from_env() -> Self {
        let seeded = std::env::var(API_KEY_ENV).ok();
        if seeded.is_some() {
            animator_info!("credential seeded from {}", API_KEY_ENV);
        }
        Self {
            shared: SharedCredential::new(seeded),
        }
    }
}

#[async_trait::async_trait]
impl AuthorizationProvider for TerminalCredential {
    async fn has_credential(&self) -> bool {
        self.shared.has_credential().await
    }

    async fn prompt_for_credential(&self) {
        match tokio::task::spawn_blocking(|| read_key(&mut io::stdin().lock())).await {
            Ok(Ok(Some(key))) => {
                self.shared.set(key);
            }
            Ok(Ok(None)) => animator_warn!("no API key entered"),
            Ok(Err(err)) => animator_warn!("reading API key failed: {}", err),
            Err(err) => animator_warn!("credential prompt aborted: {}", err),
        }
    }

    async fn credential(&self) -> Option<String> {
        self.shared.credential().await
    }
}

fn read_key(input: &mut impl BufRead) -> io::Result<Option<String>> {
    eprint!("API key (input is not hidden): ");
    io::stderr().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let key = line.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_trimmed() {
        let mut input = io::Cursor::new("  AIza-entered-key \n");
        assert_eq!(read_key(&mut input).unwrap().as_deref(), Some("AIza-entered-key"));
    }

    #[test]
    fn blank_line_selects_nothing() {
        let mut input = io::Cursor::new("\n");
        assert_eq!(read_key(&mut input).unwrap(), None);
    }
}
