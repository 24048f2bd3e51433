//! Execution engines and the router that fronts them.
//!
//! One engine per access tier — open-data API, plain HTTP, stealth browser
//! — behind [`RegistryRouter`], which owns the resilience layer (cache,
//! circuit breakers, rate limits) and folds every outcome into a
//! [`SearchReport`].

pub mod api;
pub mod browser;
pub mod captcha;
pub mod error;
pub mod extract;
pub mod http;
pub mod report;
pub mod router;
pub mod selector;

pub use captcha::{CaptchaChallenge, CaptchaSolver, SolveError, UnavailableSolver};
pub use error::ScrapeError;
pub use report::{RowRecord, SearchOptions, SearchOutcome, SearchReport, StatusFilter};
pub use router::RegistryRouter;
