//! `org.bluez.MediaTransport` Interface
//!
//! Method and signal table of the transport object, plus the dispatcher that
//! turns an incoming method call into a broker operation and answers it.
//!
//! | Method        | In   | Out     | Reply      |
//! |---------------|------|---------|------------|
//! | GetProperties |      | `a{sv}` | immediate  |
//! | Acquire       | `s`  | `h`     | deferred   |
//! | Release       | `s`  |         | immediate  |
//! | SetProperty   | `sv` |         | immediate  |
//!
//! The only signal is `PropertyChanged(sv)`.

use heapless::String;

use crate::backend::AudioStack;
use crate::broker::MediaBroker;
use crate::bus::{MessageBus, PendingCall, Reply};
use crate::constants::{MAX_ACCESS_TYPE_LENGTH, MAX_PROPERTY_NAME_LENGTH};
use crate::properties::PropertyValue;
use crate::{Rejected, TransportError};

/// Description of one interface method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInfo {
    /// Member name
    pub name: &'static str,
    /// Input signature
    pub input: &'static str,
    /// Output signature
    pub output: &'static str,
    /// Whether the reply is sent after the call returns
    pub asynchronous: bool,
}

/// Description of one interface signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalInfo {
    /// Member name
    pub name: &'static str,
    /// Argument signature
    pub signature: &'static str,
}

/// Methods of the transport interface
pub const METHODS: [MethodInfo; 4] = [
    MethodInfo {
        name: "GetProperties",
        input: "",
        output: "a{sv}",
        asynchronous: false,
    },
    MethodInfo {
        name: "Acquire",
        input: "s",
        output: "h",
        asynchronous: true,
    },
    MethodInfo {
        name: "Release",
        input: "s",
        output: "",
        asynchronous: false,
    },
    MethodInfo {
        name: "SetProperty",
        input: "sv",
        output: "",
        asynchronous: false,
    },
];

/// Signals of the transport interface
pub const SIGNALS: [SignalInfo; 1] = [SignalInfo {
    name: "PropertyChanged",
    signature: "sv",
}];

/// Decoded method call on a transport object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// `GetProperties()`
    GetProperties,
    /// `Acquire(accesstype)`
    Acquire {
        /// Requested access, `"r"`, `"w"` or `"rw"`
        accesstype: String<MAX_ACCESS_TYPE_LENGTH>,
    },
    /// `Release(accesstype)`
    Release {
        /// Access to give back
        accesstype: String<MAX_ACCESS_TYPE_LENGTH>,
    },
    /// `SetProperty(name, value)`
    SetProperty {
        /// Property name
        name: String<MAX_PROPERTY_NAME_LENGTH>,
        /// New value
        value: PropertyValue<'static>,
    },
}

impl Method {
    /// Member name of the method
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetProperties => "GetProperties",
            Self::Acquire { .. } => "Acquire",
            Self::Release { .. } => "Release",
            Self::SetProperty { .. } => "SetProperty",
        }
    }

    /// Table entry of the method
    #[must_use]
    pub fn info(&self) -> Option<&'static MethodInfo> {
        let name = self.name();
        METHODS.iter().find(|method| method.name == name)
    }
}

impl<S: AudioStack, B: MessageBus> MediaBroker<S, B> {
    /// Serve a method call received on the transport at `path`
    ///
    /// Every outcome is answered through the bus except an admitted
    /// `Acquire`, whose reply waits for the backend.
    pub fn dispatch(&mut self, path: &str, sender: &str, call: PendingCall, method: Method) {
        debug!("{} from {} on {}", method.name(), sender, path);

        let (call, result) = match method {
            Method::GetProperties => (call, self.get_properties(path).map(Reply::Properties)),
            Method::Acquire { accesstype } => {
                match self.acquire(path, sender, accesstype.as_str(), call) {
                    Ok(()) => return,
                    Err(Rejected { error, call }) => (call, Err(error)),
                }
            }
            Method::Release { accesstype } => (
                call,
                self.release(path, sender, accesstype.as_str())
                    .map(|()| Reply::Empty),
            ),
            Method::SetProperty { name, value } => (
                call,
                self.set_property(path, name.as_str(), value)
                    .map(|()| Reply::Empty),
            ),
        };

        if let Err(ref e) = result {
            debug!("{} failed: {}", path, e.name());
        }
        if let Err(e) = self.bus_mut().send_reply(call, result) {
            warn!("Reply to {} could not be delivered: {}", sender, e);
        }
    }
}

/// Error name on the bus, e.g. `org.bluez.Error.NotSupported`
///
/// Returns `None` if the name does not fit.
#[must_use]
pub fn error_name(error: TransportError) -> Option<String<48>> {
    let mut name = String::new();
    name.push_str(crate::constants::ERROR_INTERFACE).ok()?;
    name.push('.').ok()?;
    name.push_str(error.name()).ok()?;
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table() {
        let acquire = Method::Acquire {
            accesstype: String::try_from("rw").unwrap(),
        };
        let info = acquire.info().unwrap();
        assert_eq!(info.input, "s");
        assert_eq!(info.output, "h");
        assert!(info.asynchronous);

        let info = Method::GetProperties.info().unwrap();
        assert_eq!(info.output, "a{sv}");
        assert!(!info.asynchronous);

        assert!(METHODS.iter().filter(|method| method.asynchronous).count() == 1);
        assert_eq!(SIGNALS[0].name, "PropertyChanged");
    }

    #[test]
    fn test_error_name() {
        assert_eq!(
            error_name(TransportError::NotSupported).unwrap().as_str(),
            "org.bluez.Error.NotSupported"
        );
        assert_eq!(
            error_name(TransportError::PermissionDenied).unwrap().as_str(),
            "org.bluez.Error.Failed"
        );
    }
}
