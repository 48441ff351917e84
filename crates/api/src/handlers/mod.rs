pub mod auth;
pub mod health;
pub mod metrics;
pub mod users;

use users_domain::DomainResult;
use users_observability::EventStatus;

use crate::error::ApiResult;
use crate::routes::AppState;

/// Counts a domain operation in `app_events_total` and lifts its error.
pub(crate) fn record_outcome<T>(state: &AppState, event: &str, result: DomainResult<T>) -> ApiResult<T> {
    let status = if result.is_ok() {
        EventStatus::Success
    } else {
        EventStatus::Failure
    };
    state.pipeline.metrics.record_event(event, status);
    result.map_err(Into::into)
}
