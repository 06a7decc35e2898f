//! Statistical building blocks for the statlab teaching experiments.
//!
//! This crate provides the small shared toolkit every experiment relies on:
//!
//! - **Histograms**: fixed-width binning with errors, moments and text rendering
//! - **Descriptive statistics**: mean, median, variance and the classic variance formulas
//! - **Special functions**: ln Γ, χ² tail probability, numerical integration and root finding
//! - **Distributions**: closed-form PDFs/PMFs and their recursive tables
//! - **Fits**: straight line, weighted polynomial, Levenberg–Marquardt χ² and binned likelihood
//! - **Covariance**: sample covariance matrices of multivariate samples
//!
//! # Modules
//!
//! - [`histogram`]: Fixed-width 1-D histogram
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`special`]: Special functions, integration and root finding
//! - [`distributions`]: Probability density and mass functions
//! - [`fit`]: Least-squares and maximum-likelihood fits
//! - [`covariance`]: Covariance and correlation of samples
//!
//! # Examples
//!
//! ## Filling a histogram
//!
//! ```
//! use statlab_stats::histogram::Histogram;
//!
//! let mut histogram = Histogram::new(10, 0.0, 10.0).unwrap();
//! for x in [1.2, 3.4, 3.6, 7.1] {
//!     histogram.fill(x);
//! }
//! assert_eq!(histogram.content(3), 2.0);
//! ```
//!
//! ## Evaluating a distribution
//!
//! ```
//! use statlab_stats::distributions;
//!
//! let p = distributions::binomial(3, 3, 0.9).unwrap();
//! assert!((p - 0.729).abs() < 1e-12);
//! ```
//!
//! ## Fitting a straight line
//!
//! ```
//! use statlab_stats::fit::LineFit;
//!
//! let fit = LineFit::from_points(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
//! assert!((fit.slope - 2.0).abs() < 1e-12);
//! assert!((fit.intercept - 1.0).abs() < 1e-12);
//! ```

pub mod covariance;
pub mod descriptive;
pub mod distributions;
pub mod fit;
pub mod histogram;
pub mod special;
