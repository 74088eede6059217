//! # Reveal Animation
//!
//! Progressive rendering of a reply, one word or one character per tick.
//! The animation runs as its own task and stops as soon as its
//! [`CancellationToken`] is cancelled.

use crate::config::RevealMode;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Successive prefixes of `text` to display; the last one is `text` itself.
pub fn reveal_frames(text: &str, mode: RevealMode) -> Vec<String> {
    let mut ends: Vec<usize> = match mode {
        RevealMode::Char => text.char_indices().map(|(i, c)| i + c.len_utf8()).collect(),
        RevealMode::Word => {
            let mut ends = Vec::new();
            let mut in_word = false;
            for (i, c) in text.char_indices() {
                if c.is_whitespace() {
                    if in_word {
                        ends.push(i);
                    }
                    in_word = false;
                } else {
                    in_word = true;
                }
            }
            ends
        }
    };

    if ends.last() != Some(&text.len()) {
        ends.push(text.len());
    }

    ends.into_iter().map(|end| text[..end].to_string()).collect()
}

/// Spawn the reveal task. `on_frame` receives each prefix in order; the task
/// returns `true` when every frame was shown, `false` when cancelled.
pub fn spawn_reveal<F>(
    text: String,
    mode: RevealMode,
    interval: Duration,
    token: CancellationToken,
    on_frame: F,
) -> JoinHandle<bool>
where
    F: Fn(&str) + Send + 'static,
{
    tokio::spawn(async move {
        for frame in reveal_frames(&text, mode) {
            tokio::select! {
                biased;
                () = token.cancelled() => return false,
                () = tokio::time::sleep(interval) => on_frame(&frame),
            }
        }
        true
    })
}
