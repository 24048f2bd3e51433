//! CAPTCHA-solving collaborator seam.
//!
//! Solving is out of this engine's scope (it is a vision-model call in
//! production) and may be slow or unavailable, so it sits behind a trait
//! and can be swapped or stubbed freely. When no real solver is wired in,
//! tier-4 sessions fail closed with `ChallengeUnresolved`.

use async_trait::async_trait;
use thiserror::Error;

/// Challenge artifact handed to the solver: a screenshot of the challenge
/// element.
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    pub jurisdiction: String,
    pub image_png: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("captcha solver unavailable")]
    Unavailable,

    #[error("captcha solving failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Returns the solution token for a challenge.
    ///
    /// # Errors
    ///
    /// [`SolveError::Unavailable`] when no solving capability is wired in;
    /// [`SolveError::Failed`] when the solver ran but could not produce a
    /// token.
    async fn solve(&self, challenge: CaptchaChallenge) -> Result<String, SolveError>;
}

/// Default solver: always unavailable, so tier-4 sessions fail closed
/// rather than silently returning partial results.
pub struct UnavailableSolver;

#[async_trait]
impl CaptchaSolver for UnavailableSolver {
    async fn solve(&self, challenge: CaptchaChallenge) -> Result<String, SolveError> {
        tracing::warn!(
            jurisdiction = %challenge.jurisdiction,
            "captcha challenge received but no solver is configured"
        );
        Err(SolveError::Unavailable)
    }
}
