//! A built-in logger, enabled by the default Cargo feature "builtin_env_logger".
//!
//! This uses the `env_logger` crate so that `RUST_LOG` controls verbosity out
//! of the box. Bindings that want to integrate with their own logging
//! framework can disable the feature and register their own `log`
//! implementation before calling [`crate::heap::Gc::init`].

/// Attempt to init a global logger for tinygc. Does nothing if the
/// "builtin_env_logger" feature is disabled, or if a logger is already
/// registered.
pub(crate) fn try_init() {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            let result = env_logger::try_init_from_env(
                env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
            );

            match result {
                Ok(()) => log::debug!("tinygc initialized the logger."),
                Err(e) => log::debug!("tinygc failed to initialize the built-in env_logger: {e}"),
            }
        } else {
            log::debug!("tinygc didn't initialize the built-in env_logger; the feature is disabled.");
        }
    }
}
