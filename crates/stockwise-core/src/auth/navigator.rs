use tracing::warn;

/// Hand-off point for "go to this route", e.g. the login screen after a 401.
///
/// A browser host would change `location`; a terminal host tells the user
/// what to do next.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that only records the hand-off in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        warn!(route = route, "Navigation requested");
    }
}
