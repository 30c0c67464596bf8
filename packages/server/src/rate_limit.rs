//! Global fixed-window request limiting.

use std::time::{Duration, Instant};

use actix_web::{
    Error, HttpResponse,
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web,
};
use tokio::sync::Mutex;

use crate::{ErrorBody, HEALTH_PATH, state::AppState};

struct Window {
    started: Instant,
    count: u32,
}

/// Counts every request against one shared window. Once `max_requests`
/// have been seen, further requests are refused until the window elapses.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    current: Mutex<Window>,
}

impl RateLimiter {
    /// `max_requests == 0` disables limiting.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// # Errors
    ///
    /// * The time left until the window resets, if the request is refused
    pub async fn check(&self) -> Result<(), Duration> {
        self.check_at(Instant::now()).await
    }

    async fn check_at(&self, now: Instant) -> Result<(), Duration> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut current = self.current.lock().await;
        let elapsed = now.saturating_duration_since(current.started);
        if elapsed >= self.window {
            current.started = now;
            current.count = 0;
        }

        if current.count >= self.max_requests {
            let elapsed = now.saturating_duration_since(current.started);
            return Err(self.window.saturating_sub(elapsed));
        }

        current.count += 1;
        Ok(())
    }
}

/// Refuses requests over the global limit with 429 and `Retry-After`.
/// The health probe is never counted.
///
/// # Errors
///
/// * Any error produced by the inner service
pub async fn enforce_rate_limit<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    if req.path() == HEALTH_PATH {
        return next.call(req).await.map(ServiceResponse::map_into_left_body);
    }

    let state = req.app_data::<web::Data<AppState>>().cloned();
    if let Some(state) = state
        && let Err(remaining) = state.rate_limiter.check().await
    {
        let retry_after = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        log::warn!(
            "Rate limit exceeded for {} {}, retry after {retry_after}s",
            req.method(),
            req.path()
        );
        let response = HttpResponse::TooManyRequests()
            .insert_header((header::RETRY_AFTER, retry_after.to_string()))
            .json(ErrorBody::new(
                "Too many requests, please try again later.".to_string(),
            ));
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
