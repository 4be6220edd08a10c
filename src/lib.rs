//! # sqljoins
//!
//! A library for extracting the tables and columns that take part in JOINs from
//! free-form, multi-statement T-SQL scripts.
//!
//! # Features
//!
//! - Strip dialect-only noise (variable sigils, `WITH (NOLOCK)` hints) with configurable patterns.
//! - Erase calls to functions the grammar does not know (`IIF`), also when they span several lines.
//! - Cut scripts into the minimal SELECT statements that contain joins, without relying on `;`.
//! - Recover from statements that swallowed the closing bracket of an enclosing query.
//! - Collect table names from FROM clauses and joins, and column names from join conditions.
//!
//! # Example
//!
//! ```rust,no_run
//! use sqljoins::{config::Config, scan::JoinScanner};
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!
//!     let sql = r#"
//! SELECT o.id, IIF(o.total > 100, 'big', 'small')
//! FROM dbo.orders o WITH (NOLOCK)
//! JOIN dbo.customers c ON c.id = o.customer_id
//! WHERE o.status = @status
//!
//! SELECT * FROM dbo.items i CROSS APPLY (SELECT TOP 1 * FROM dbo.prices p) x
//! "#;
//!     let scanner = JoinScanner::from_config(&Config::default())?;
//!     let report = scanner.scan_script(sql);
//!
//!     println!("Tables: {:?}", report.joins.table_names);
//!     println!("Columns: {:?}", report.joins.column_names);
//!     for diagnostic in &report.diagnostics {
//!         println!("{}", diagnostic);
//!     }
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod eraser;
pub mod extractor;
pub mod normalizer;
pub mod parser;
pub mod preprocessing;
pub mod scan;
pub mod segmenter;
pub mod test_utils;
