//! Error reporting with Sentry integration.
//!
//! Tracking failures never propagate to callers, so this module is where they
//! become visible: logged through `tracing` and captured to Sentry. All
//! helpers are no-ops for Sentry when no client has been initialized.

/// Log an error and capture it to Sentry.
///
/// `context` is a short description of the operation that failed.
pub fn report_error<E>(error: &E, context: &str)
where
    E: std::error::Error + ?Sized,
{
    let event_id = sentry::capture_error(error);
    tracing::error!(
        error = %error,
        sentry_event_id = %event_id,
        "{context}"
    );
}

/// Set the Sentry user context.
///
/// Call this after login so captured tracking failures carry the shopper.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a tracked action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of events
/// leading up to a failure.
///
/// ```rust,ignore
/// add_breadcrumb("tracking", "add_to_cart", Some(&[("page_url", "/products")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("collector unreachable")]
    struct Unreachable;

    #[test]
    fn test_helpers_without_sentry_client() {
        // No client bound: every helper must be a silent no-op.
        report_error(&Unreachable, "Tracking error");
        set_sentry_user(&"user_abc123xyz", Some("jane@example.com"));
        add_breadcrumb("tracking", "page_view", Some(&[("page_url", "/cart")]));
        clear_sentry_user();
    }
}
