use tokio::process::Command;

fn opener() -> (&'static str, &'static [&'static str]) {
    if cfg!(target_os = "macos") {
        ("open", &[])
    } else if cfg!(target_os = "windows") {
        ("explorer", &[])
    } else {
        ("xdg-open", &[])
    }
}

/// Open `url` with the platform's default handler. Failures are logged
/// and otherwise ignored since the link is always printed too.
pub async fn open_in_browser(url: &str) {
    let (program, args) = opener();
    let status = Command::new(program).args(args).arg(url).status().await;

    match status {
        Ok(status) if status.success() => tracing::debug!("Opened {} with {}", url, program),
        Ok(status) => tracing::warn!("{} exited with {} while opening link", program, status),
        Err(e) => tracing::warn!("Failed to run {}: {}", program, e),
    }
}
