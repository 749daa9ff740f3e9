//! Progress bars for the long-running stages

use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {msg:<10} [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Bar for one pipeline stage; hidden unless `visible`
///
/// Stages set the length themselves once the work size is known.
pub fn stage_bar(visible: bool, message: &'static str) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    bar.set_style(STAGE_STYLE.clone());
    bar.set_message(message);
    bar
}
