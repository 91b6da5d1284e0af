use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Password};
use once_cell::sync::Lazy;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::error::Result;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

pub fn format_price(amount: f64) -> String {
    format!("₱{amount:.2}")
}

/// Line-oriented stdin shared by every screen.
pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next line without its newline, or `None` at end of input.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }

    pub async fn prompt(&mut self, label: &str) -> std::io::Result<Option<String>> {
        let mut out = tokio::io::stdout();
        out.write_all(label.as_bytes()).await?;
        out.flush().await?;
        self.next_line().await
    }

    /// Masked input; nothing typed is echoed to the terminal.
    pub async fn password(&mut self, label: &str) -> Result<String> {
        let label = label.to_string();
        let input = tokio::task::spawn_blocking(move || {
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .allow_empty_password(true)
                .interact()
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(input)
    }

    pub async fn confirm(&mut self, label: &str, default: bool) -> Result<bool> {
        let label = label.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .default(default)
                .interact()
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(answer)
    }
}
