// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External browser launcher.

use tracing::debug;

/// Open `url` in the user's browser.
///
/// `$BROWSER` wins when set and is passed through uninterpreted; otherwise
/// the platform opener is used (`open` on macOS, `start` on Windows,
/// `xdg-open` elsewhere).
pub fn open_url(url: &str) -> std::io::Result<()> {
    let command = match std::env::var("BROWSER") {
        Ok(custom) if !custom.is_empty() => custom,
        _ => {
            if cfg!(target_os = "macos") {
                "open".to_owned()
            } else if cfg!(target_os = "windows") {
                "start".to_owned()
            } else {
                "xdg-open".to_owned()
            }
        }
    };

    debug!(%command, %url, "launching browser");
    std::process::Command::new(command).arg(url).spawn().map(|_| ())
}
