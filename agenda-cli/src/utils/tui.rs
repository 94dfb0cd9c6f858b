use std::future::Future;

use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/"])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Run `future` behind a spinner, clearing it whatever the outcome.
pub async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    let spinner = create_spinner(message);
    let output = future.await;
    spinner.finish_and_clear();
    output
}
