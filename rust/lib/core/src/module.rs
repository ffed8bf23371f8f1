use axum::Router;

/// A service module that contributes HTTP routes.
///
/// Each business module (policy, auth, ...) implements this trait to
/// register its endpoints. The binary collects the modules it serves and
/// merges their routes into a single Router.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes, relative to the API version prefix.
    fn routes(&self) -> Router;
}
