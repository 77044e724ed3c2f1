use crate::domain::{Configuration, DeviceIdentity, DeviceRecord, DeviceSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Process-wide store of device records keyed by device ID.
///
/// The map lock only guards membership. Each record sits behind its own
/// mutex, so work on one device never waits for another device. Record
/// access goes through [`DeviceHandle`] closures, which cannot `.await`, so
/// a record lock is never held across a network call.
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, DeviceHandle>>,
    default_configuration: Configuration,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::with_default_configuration(Configuration::default())
    }

    /// Registry whose lazily created records start from `configuration`.
    pub fn with_default_configuration(configuration: Configuration) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            default_configuration: configuration,
        }
    }

    /// Return the record for `identity.device_id`, creating it if unknown.
    ///
    /// The identity of an existing record is never rewritten, even when the
    /// event carries different registry/location/project attributes.
    pub async fn get_or_create(&self, identity: &DeviceIdentity) -> DeviceHandle {
        if let Some(handle) = self.devices.read().await.get(&identity.device_id) {
            return handle.clone();
        }

        let mut devices = self.devices.write().await;
        devices
            .entry(identity.device_id.clone())
            .or_insert_with(|| {
                info!(
                    device_id = %identity.device_id,
                    registry_id = %identity.registry_id,
                    location = %identity.location,
                    project_id = %identity.project_id,
                    "registering new device"
                );
                DeviceHandle::new(DeviceRecord::new(
                    identity.clone(),
                    self.default_configuration,
                ))
            })
            .clone()
    }

    /// Look up a device without creating it.
    pub async fn get(&self, device_id: &str) -> Option<DeviceHandle> {
        self.devices.read().await.get(device_id).cloned()
    }

    pub async fn snapshot(&self, device_id: &str) -> Option<DeviceSnapshot> {
        let handle = self.get(device_id).await?;
        Some(handle.snapshot().await)
    }

    pub async fn len(&self) -> usize {
        self.devices.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }
}

/// Shared handle to one registry entry.
#[derive(Clone)]
pub struct DeviceHandle {
    record: Arc<Mutex<DeviceRecord>>,
}

impl DeviceHandle {
    fn new(record: DeviceRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
        }
    }

    /// Run a read-modify-write on the record under its exclusive lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut DeviceRecord) -> R) -> R {
        let mut record = self.record.lock().await;
        f(&mut record)
    }

    /// Read from the record under its lock.
    pub async fn read<R>(&self, f: impl FnOnce(&DeviceRecord) -> R) -> R {
        let record = self.record.lock().await;
        f(&record)
    }

    pub async fn snapshot(&self) -> DeviceSnapshot {
        self.read(DeviceRecord::snapshot).await
    }

    /// True if both handles point at the same record.
    pub fn same_record(&self, other: &DeviceHandle) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(device_id: &str) -> DeviceIdentity {
        DeviceIdentity::new(device_id, "greenhouse", "europe-west1", "acme")
    }

    #[tokio::test]
    async fn test_get_unknown_device_returns_none() {
        let registry = DeviceRegistry::new();
        assert!(registry.get("missing").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_or_create_uses_default_configuration() {
        let registry = DeviceRegistry::new();
        let handle = registry.get_or_create(&identity("thermo-1")).await;

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.configuration, Configuration::default());
        assert!(snapshot.samples.is_empty());
        assert!(!snapshot.is_actuator_on);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_custom_default_configuration() {
        let defaults = Configuration {
            min_temperature: 15,
            max_temperature: 25,
            ping_period_seconds: 30,
        };
        let registry = DeviceRegistry::with_default_configuration(defaults);
        let handle = registry.get_or_create(&identity("thermo-1")).await;
        assert_eq!(handle.snapshot().await.configuration, defaults);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_record() {
        let registry = DeviceRegistry::new();
        let first = registry.get_or_create(&identity("thermo-1")).await;
        let second = registry.get_or_create(&identity("thermo-1")).await;
        let looked_up = registry.get("thermo-1").await.unwrap();

        assert!(first.same_record(&second));
        assert!(first.same_record(&looked_up));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_existing_identity_is_not_rewritten() {
        let registry = DeviceRegistry::new();
        registry.get_or_create(&identity("thermo-1")).await;

        let other = DeviceIdentity::new("thermo-1", "other-registry", "us-central1", "other");
        let handle = registry.get_or_create(&other).await;

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.identity, identity("thermo-1"));
    }

    #[tokio::test]
    async fn test_concurrent_get_or_create_yields_single_record() {
        let registry = Arc::new(DeviceRegistry::new());

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let handle = registry.get_or_create(&identity("thermo-1")).await;
                handle.update(|record| record.record_sample(21)).await;
                handle
            }));
        }

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert_eq!(registry.len().await, 1);
        assert!(handles.windows(2).all(|pair| pair[0].same_record(&pair[1])));
        let snapshot = registry.snapshot("thermo-1").await.unwrap();
        assert_eq!(snapshot.samples.len(), 10);
    }

    #[tokio::test]
    async fn test_update_returns_closure_result() {
        let registry = DeviceRegistry::new();
        let handle = registry.get_or_create(&identity("thermo-1")).await;

        let average = handle
            .update(|record| {
                record.record_sample(20);
                record.record_sample(30);
                record.average_temperature()
            })
            .await;
        assert_eq!(average, Some(25.0));
    }
}
