//! Output writers for processed articles.
//!
//! - [`json`]: the whole run as one JSON document, grouped by date
//! - [`csv`]: one flat row per article
//! - [`bigquery`]: optional append to a warehouse table, enabled from the
//!   environment
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06/
//! │   └── news_scraper_results_20250506_081500.json
//! └── news_scraper_results_20250506_081500.csv
//! ```

pub mod bigquery;
pub mod csv;
pub mod json;
