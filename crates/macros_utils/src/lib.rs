//! Small declarative helpers shared by the HTTP apps

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix_web;

/// Generate `pub fn routes(cfg: &mut ServiceConfig)` registering each handler.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     route monitor_status,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $handler:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix_web::web::ServiceConfig) {
            $( cfg.service($handler); )*
        }
    };
}
