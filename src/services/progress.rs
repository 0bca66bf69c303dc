use indicatif::{ProgressBar, ProgressStyle};

use crate::error::TransformError;
use crate::services::transform::ScalarTransform;

/// Receives progress updates. `Sync` so the batch collector can share it.
pub trait Progress: Send + Sync {
    fn set_total(&self, total: u64);
    fn advance(&self);
    fn finish(&self);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_total(&self, _total: u64) {}
    fn advance(&self) {}
    fn finish(&self) {}
}

impl Progress for ProgressBar {
    fn set_total(&self, total: u64) {
        self.set_length(total);
        self.set_position(0);
    }

    fn advance(&self) {
        self.inc(1);
    }

    fn finish(&self) {
        self.finish_and_clear();
    }
}

/// Terminal progress bar drawn on stderr.
pub fn terminal_bar(message: &str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({elapsed_precise}, eta {eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(message.to_string());
    bar
}

/// Advances `progress` once per call, before delegating.
pub struct Tracked<'a> {
    pub inner: &'a mut dyn ScalarTransform,
    pub progress: &'a dyn Progress,
}

impl ScalarTransform for Tracked<'_> {
    fn transform(&mut self, text: &str) -> Result<String, TransformError> {
        self.progress.advance();
        self.inner.transform(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct Counting {
        total: AtomicU64,
        done: AtomicU64,
    }

    impl Progress for Counting {
        fn set_total(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }
        fn advance(&self) {
            self.done.fetch_add(1, Ordering::SeqCst);
        }
        fn finish(&self) {}
    }

    #[test]
    fn tracked_advances_per_call() {
        let progress = Counting::default();
        let mut upper = |s: &str| Ok::<_, TransformError>(s.to_uppercase());
        let mut tracked = Tracked {
            inner: &mut upper,
            progress: &progress,
        };

        assert_eq!(tracked.transform("a").unwrap(), "A");
        assert_eq!(tracked.transform("b").unwrap(), "B");
        assert_eq!(progress.done.load(Ordering::SeqCst), 2);
    }
}
