use promptmesh::{Config, Pipeline};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file if it exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .init();

    let config = Config::from_env()?;
    let pipeline = Pipeline::new(config)?;

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(b"Enter your prompt for image generation: ")
        .await?;
    stdout.flush().await?;

    let mut user_prompt = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut user_prompt)
        .await?;
    let user_prompt = prompt_from_line(&user_prompt);

    if user_prompt.trim().is_empty() {
        println!("Prompt is required!");
        return Ok(());
    }

    // The first Ctrl-C aborts the current stage, a second one exits at once.
    let cancel = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nCancelling... press Ctrl-C again to exit immediately.");
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    match pipeline.run(user_prompt).await {
        Ok(output) => {
            println!(
                "Image generated and saved at: {}",
                output.image.path.display()
            );
            for asset in &output.downloads.assets {
                println!("Downloaded: {}", asset.path.display());
            }
            if let Some(thumbnail) = &output.downloads.thumbnail {
                println!("Downloaded: {}", thumbnail.path.display());
            }
            println!(
                "3D model created and saved at: {}",
                output.downloads.primary.display()
            );
        }
        Err(e) => {
            match e.stage() {
                Some(stage) => eprintln!("\n{}", stage.abort_message()),
                None => eprintln!("\nRun aborted."),
            }
            eprintln!("{}", e);
        }
    }

    Ok(())
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Strips the line terminator only; spaces the user typed are kept.
fn prompt_from_line(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_keeps_user_whitespace() {
        assert_eq!(prompt_from_line("  a red car  \n"), "  a red car  ");
        assert_eq!(prompt_from_line("a red car\r\n"), "a red car");
        assert_eq!(prompt_from_line("a red car"), "a red car");
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        let filter = log_filter(Some("debug".to_string()));
        assert_eq!(filter.to_string().to_lowercase(), "debug");

        let filter = log_filter(None);
        assert_eq!(filter.to_string().to_lowercase(), "info");
    }
}
