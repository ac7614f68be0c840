//! Which backends this build can use.
//!
//! Each transport module submits a [`BackendRegistration`] when its cargo
//! feature is on. Backend selection never looks at the environment: a
//! transport is usable exactly when it registered here.

use dockercp_shared::errors::{DockercpError, DockercpResult};

use crate::backend::{BackendKind, EngineBackend};
use crate::options::DockercpOptions;

/// Builds an unconnected backend from the client options.
pub type BackendFactoryFn = fn(DockercpOptions) -> DockercpResult<Box<dyn EngineBackend>>;

pub struct BackendRegistration {
    pub kind: BackendKind,
    pub factory: BackendFactoryFn,
}

inventory::collect!(BackendRegistration);

/// Build the `kind` backend. Nothing touches the engine until `connect`.
///
/// Asking for a transport this build left out is a `Config` error that
/// lists the ones it does have.
pub fn create_backend(
    kind: BackendKind,
    options: DockercpOptions,
) -> DockercpResult<Box<dyn EngineBackend>> {
    let Some(registration) = inventory::iter::<BackendRegistration>().find(|r| r.kind == kind)
    else {
        let compiled: Vec<&str> = available_backends().iter().map(|k| k.as_str()).collect();
        return Err(DockercpError::Config(format!(
            "backend {} is not installed in this build (installed: {})",
            kind,
            if compiled.is_empty() { "none".to_string() } else { compiled.join(", ") }
        )));
    };

    tracing::debug!(backend = %kind, "Building backend");
    (registration.factory)(options)
}

/// The default capability probe handed to [`select_backend`].
///
/// [`select_backend`]: crate::backend::select_backend
pub fn is_registered(kind: BackendKind) -> bool {
    inventory::iter::<BackendRegistration>().any(|r| r.kind == kind)
}

/// Installed transports, in no particular order.
pub fn available_backends() -> Vec<BackendKind> {
    inventory::iter::<BackendRegistration>()
        .map(|r| r.kind)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "local-socket")]
    #[test]
    fn test_local_socket_registered() {
        assert!(is_registered(BackendKind::LocalSocket));
        assert!(available_backends().contains(&BackendKind::LocalSocket));

        let backend = create_backend(BackendKind::LocalSocket, DockercpOptions::default()).unwrap();
        assert_eq!(backend.kind(), BackendKind::LocalSocket);
    }

    #[cfg(feature = "engine-client")]
    #[test]
    fn test_engine_client_registered() {
        assert!(is_registered(BackendKind::EngineClient));

        let backend =
            create_backend(BackendKind::EngineClient, DockercpOptions::default()).unwrap();
        assert_eq!(backend.kind(), BackendKind::EngineClient);
    }

    #[cfg(not(feature = "engine-client"))]
    #[test]
    fn test_unregistered_backend() {
        let result = create_backend(BackendKind::EngineClient, DockercpOptions::default());
        match result {
            Err(DockercpError::Config(message)) => {
                assert!(message.contains("engine-client is not installed"))
            }
            _ => panic!("engine-client should not be installed"),
        }
    }

    #[test]
    fn test_probe_agrees_with_available() {
        for kind in BackendKind::PRIORITY {
            assert_eq!(is_registered(kind), available_backends().contains(&kind));
        }
    }
}
