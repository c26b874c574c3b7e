//! Summary statistics for repeated training runs.
//!
//! Fitness values coming out of the optimizer and the validation runs are noisy,
//! so every report condenses them through [`descriptive::DescriptiveStats`].
//!
//! # Examples
//!
//! ```
//! use oxo_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.max, 5.0);
//! ```

pub mod descriptive;
