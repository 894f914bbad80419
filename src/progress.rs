//! Progress-callback trait for per-category analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the nine categories.
//!
//! # Example
//!
//! ```rust
//! use raincheck::{AnalysisConfig, AnalysisProgressCallback, Category};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for CountingCallback {
//!     fn on_category_complete(&self, category: Category, index: usize, total: usize, len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{category} ({index}/{total}) done, {len} chars");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::prompts::Category;
use std::sync::Arc;

/// Called by the orchestrator as it processes each category.
///
/// All methods have no-op defaults. With `concurrency > 1` the per-category
/// methods may be called from several tasks at once, so implementations
/// must guard shared state (`Mutex`, atomics).
///
/// `index` is the 1-based position of the category in the report.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once before the first remote call.
    fn on_analysis_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before the remote call for a category is sent.
    fn on_category_start(&self, category: Category, index: usize, total: usize) {
        let _ = (category, index, total);
    }

    /// Called when a category's response arrives.
    ///
    /// `response_len` is the byte length of the raw response.
    fn on_category_complete(&self, category: Category, index: usize, total: usize, response_len: usize) {
        let _ = (category, index, total, response_len);
    }

    /// Called when a category's call fails. The batch aborts afterwards.
    fn on_category_error(&self, category: Category, index: usize, total: usize, error: &str) {
        let _ = (category, index, total, error);
    }

    /// Called once after the batch ends, successfully or not.
    ///
    /// `success_count` is the number of categories that returned a response.
    fn on_analysis_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
