//! Persisted panel settings
//!
//! A single record under [`StorageKey::PanelSettings`]. The postcard
//! encoding of [`Settings`] is one byte; an erased (`0xFF`) or missing
//! record yields the defaults.

use jog2k_hal::{FlashError, FlashStorage, StorageKey};
use serde::{Deserialize, Serialize};

/// Upper bound on the encoded settings record
pub const MAX_SETTINGS_SIZE: usize = 8;

/// Settings persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Flash operation failed
    Flash(FlashError),
    /// Serialization failed
    Encode,
}

impl From<FlashError> for SettingsError {
    fn from(e: FlashError) -> Self {
        SettingsError::Flash(e)
    }
}

/// User settings that survive a reboot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Display mounted upside down
    pub screen_flip: bool,
}

impl Settings {
    /// Decode a stored record, falling back to defaults on anything
    /// unreadable (including erased flash)
    pub fn decode(bytes: &[u8]) -> Self {
        postcard::from_bytes(bytes).unwrap_or_default()
    }

    /// Encode into `buf`, returning the used prefix
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], SettingsError> {
        postcard::to_slice(self, buf).map_err(|_| SettingsError::Encode)
    }

    /// Settings with the screen orientation flipped
    pub fn with_flipped_screen(self) -> Self {
        Self {
            screen_flip: !self.screen_flip,
        }
    }
}

/// Loads and stores [`Settings`] through a [`FlashStorage`]
pub struct SettingsStore<F> {
    storage: F,
}

impl<F: FlashStorage> SettingsStore<F> {
    pub fn new(storage: F) -> Self {
        Self { storage }
    }

    /// Consume the store and return the underlying storage
    pub fn into_storage(self) -> F {
        self.storage
    }

    /// Load settings; a missing record is not an error
    pub async fn load(&mut self) -> Result<Settings, SettingsError> {
        let mut buffer = [0u8; MAX_SETTINGS_SIZE];
        match self.storage.read(StorageKey::PanelSettings, &mut buffer).await {
            Ok(len) => Ok(Settings::decode(&buffer[..len])),
            Err(FlashError::NotFound) => Ok(Settings::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Store settings
    pub async fn save(&mut self, settings: Settings) -> Result<(), SettingsError> {
        let mut buffer = [0u8; MAX_SETTINGS_SIZE];
        let encoded = settings.encode(&mut buffer)?;
        self.storage
            .write(StorageKey::PanelSettings, encoded)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use std::vec::Vec;

    /// In-memory storage holding one record per key
    #[derive(Default)]
    struct MemoryStorage {
        records: Vec<(StorageKey, Vec<u8>)>,
        fail_writes: bool,
    }

    impl FlashStorage for MemoryStorage {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            let (_, data) = self
                .records
                .iter()
                .find(|(k, _)| *k == key)
                .ok_or(FlashError::NotFound)?;
            if buffer.len() < data.len() {
                return Err(FlashError::BufferTooSmall);
            }
            buffer[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            if self.fail_writes {
                return Err(FlashError::Storage);
            }
            self.records.retain(|(k, _)| *k != key);
            self.records.push((key, data.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_missing_record_gives_defaults() {
        let mut store = SettingsStore::new(MemoryStorage::default());
        assert_eq!(block_on(store.load()), Ok(Settings::default()));
    }

    #[test]
    fn test_erased_byte_gives_defaults() {
        assert_eq!(Settings::decode(&[0xFF]), Settings::default());
        assert_eq!(Settings::decode(&[]), Settings::default());
    }

    #[test]
    fn test_encoding_is_one_byte() {
        let mut buf = [0u8; MAX_SETTINGS_SIZE];
        let flipped = Settings { screen_flip: true };
        assert_eq!(flipped.encode(&mut buf).unwrap(), &[0x01]);
        assert_eq!(Settings::decode(&[0x01]), flipped);
        assert_eq!(Settings::decode(&[0x00]), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = SettingsStore::new(MemoryStorage::default());
        let settings = Settings::default().with_flipped_screen();

        block_on(store.save(settings)).unwrap();
        assert_eq!(block_on(store.load()), Ok(settings));

        let storage = store.into_storage();
        assert_eq!(storage.records.len(), 1);
        assert_eq!(storage.records[0].0, StorageKey::PanelSettings);
    }

    #[test]
    fn test_write_failure_reported() {
        let mut store = SettingsStore::new(MemoryStorage {
            fail_writes: true,
            ..MemoryStorage::default()
        });
        assert_eq!(
            block_on(store.save(Settings::default())),
            Err(SettingsError::Flash(FlashError::Storage))
        );
    }
}
