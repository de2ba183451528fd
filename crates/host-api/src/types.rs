use core::fmt;
use serde::{Deserialize, Serialize};

/// One entry of the `filters` list of a device request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
}

impl DeviceFilter {
    pub fn name_prefix(prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    /// Name-based matching; service filters are left to the host.
    pub fn matches_name(&self, name: Option<&str>) -> bool {
        if let Some(want) = &self.name {
            if name != Some(want.as_str()) {
                return false;
            }
        }
        if let Some(prefix) = &self.name_prefix {
            match name {
                Some(n) if n.starts_with(prefix.as_str()) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Options argument of a device request.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDeviceOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<DeviceFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_services: Vec<String>,
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub accept_all_devices: bool,
}

impl RequestDeviceOptions {
    pub fn accept_all() -> Self {
        Self {
            accept_all_devices: true,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: DeviceFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_optional_service(mut self, service: impl Into<String>) -> Self {
        self.optional_services.push(service.into());
        self
    }

    /// True if a device advertising `name` would be offered to the user.
    pub fn accepts(&self, name: Option<&str>) -> bool {
        self.accept_all_devices || self.filters.iter().any(|f| f.matches_name(name))
    }
}

/// Handle to a peripheral returned by a successful request.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BluetoothDevice {
    pub id: String,
    pub name: Option<String>,
}

impl BluetoothDevice {
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
        }
    }

    /// Advertised name, or `"unnamed"` when the device did not report one.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

impl fmt::Display for BluetoothDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id)
    }
}
