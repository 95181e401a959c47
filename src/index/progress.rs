// file: src/index/progress.rs
// description: progress tracking and statistics for index builds
// reference: uses indicatif for progress bars and tracks build metrics

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    pub documents: usize,
    pub chunks_embedded: usize,
    pub tokens_embedded: u64,
    pub duration: Duration,
}

impl BuildStats {
    pub fn chunks_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.chunks_embedded as f64 / secs
    }

    pub fn avg_tokens_per_chunk(&self) -> f64 {
        if self.chunks_embedded == 0 {
            return 0.0;
        }
        self.tokens_embedded as f64 / self.chunks_embedded as f64
    }
}

pub struct ProgressTracker {
    bar: ProgressBar,
    documents: usize,
    chunks_embedded: AtomicUsize,
    tokens_embedded: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(documents: usize, total_chunks: usize, visible: bool, colored: bool) -> Self {
        let bar = if visible {
            create_progress_bar(total_chunks as u64, colored)
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            documents,
            chunks_embedded: AtomicUsize::new(0),
            tokens_embedded: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn hidden(documents: usize, total_chunks: usize) -> Self {
        Self::new(documents, total_chunks, false, false)
    }

    pub fn add_embedded(&self, chunks: usize, tokens: u64) {
        self.chunks_embedded.fetch_add(chunks, Ordering::SeqCst);
        self.tokens_embedded.fetch_add(tokens, Ordering::SeqCst);
        self.bar.inc(chunks as u64);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> BuildStats {
        BuildStats {
            documents: self.documents,
            chunks_embedded: self.chunks_embedded.load(Ordering::SeqCst),
            tokens_embedded: self.tokens_embedded.load(Ordering::SeqCst),
            duration: self.start_time.elapsed(),
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(total: u64, colored: bool) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let template = if colored {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})"
    } else {
        "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} chunks ({eta})"
    };

    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(if colored { "█▓▒░" } else { "=>-" });
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_stats_calculations() {
        let stats = BuildStats {
            documents: 2,
            chunks_embedded: 100,
            tokens_embedded: 5000,
            duration: Duration::from_secs(10),
        };

        assert_eq!(stats.chunks_per_second(), 10.0);
        assert_eq!(stats.avg_tokens_per_chunk(), 50.0);
    }

    #[test]
    fn test_build_stats_zero() {
        let stats = BuildStats::default();
        assert_eq!(stats.chunks_per_second(), 0.0);
        assert_eq!(stats.avg_tokens_per_chunk(), 0.0);
    }

    #[test]
    fn test_tracker_accumulates() {
        let tracker = ProgressTracker::hidden(1, 10);
        tracker.add_embedded(4, 100);
        tracker.add_embedded(6, 150);

        let stats = tracker.get_stats();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.chunks_embedded, 10);
        assert_eq!(stats.tokens_embedded, 250);
    }
}
