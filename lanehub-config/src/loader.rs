//! Configuration persistence
//!
//! Loads unit configuration from flash storage and saves the binary copy.

use core::str;

use lanehub_core::config::{LaneConfigError, UnitConfig, CONFIG_VERSION};
use lanehub_hal::flash::{FlashError, FlashStorage, StorageKey};

use crate::toml::parse_config;

/// Maximum serialized config size (binary)
pub const MAX_CONFIG_SIZE: usize = 1024;

/// Maximum TOML config size
pub const MAX_TOML_SIZE: usize = 4096;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// TOML parsing failed
    TomlParse,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Config version mismatch
    VersionMismatch,
    /// Configuration failed validation
    Invalid(LaneConfigError),
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<LaneConfigError> for ConfigError {
    fn from(e: LaneConfigError) -> Self {
        ConfigError::Invalid(e)
    }
}

/// Configuration persistence manager
pub struct ConfigPersistence<S> {
    storage: S,
}

impl<S: FlashStorage> ConfigPersistence<S> {
    /// Create a new config persistence manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Consume this persistence manager and return the underlying storage
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Load configuration from flash
    ///
    /// Tries the TOML copy first and falls back to the binary postcard copy.
    pub async fn load(&mut self) -> Result<UnitConfig, ConfigError> {
        info!("Loading configuration from flash...");

        match self.load_toml().await {
            Ok(config) => {
                info!("Loaded configuration from TOML");
                return Ok(config);
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                debug!("No TOML config found, trying binary format");
            }
            Err(e) => {
                warn!("Failed to load TOML config: {:?}, trying binary", e);
            }
        }

        self.load_binary().await
    }

    /// Load configuration from TOML format
    async fn load_toml(&mut self) -> Result<UnitConfig, ConfigError> {
        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self
            .storage
            .read(StorageKey::UnitConfigToml, &mut buffer)
            .await?;

        debug!("Read {} bytes of TOML from flash", len);

        let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;

        let config = parse_config(toml_str).map_err(|e| {
            warn!("TOML parse error: {:?}", e);
            ConfigError::TomlParse
        })?;

        check_version(&config)?;
        log_config_summary(&config);
        Ok(config)
    }

    /// Load configuration from binary postcard format
    async fn load_binary(&mut self) -> Result<UnitConfig, ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self
            .storage
            .read(StorageKey::UnitConfig, &mut buffer)
            .await?;

        debug!("Read {} bytes of binary config from flash", len);

        let config: UnitConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;

        check_version(&config)?;
        config.validate()?;
        log_config_summary(&config);
        Ok(config)
    }

    /// Validate and save configuration in binary postcard format
    pub async fn save(&mut self, config: &UnitConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let bytes =
            postcard::to_slice(config, &mut buffer).map_err(|_| ConfigError::Serialize)?;

        self.storage.write(StorageKey::UnitConfig, bytes).await?;
        info!("Saved configuration ({} bytes)", bytes.len());
        Ok(())
    }
}

fn check_version(config: &UnitConfig) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        warn!(
            "Config version mismatch: found {}, expected {}",
            config.version, CONFIG_VERSION
        );
        return Err(ConfigError::VersionMismatch);
    }
    Ok(())
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &UnitConfig) {
    info!("Configuration loaded successfully");
    debug!("  {} lanes", config.lanes.len());
    for lane in config.lanes.iter() {
        debug!(
            "  lane {}: bowden {} mm, long {} mm, short {} mm",
            lane.name.as_str(),
            lane.max_retract_mm,
            lane.long_move_mm,
            lane.short_move_mm
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use lanehub_core::config::LaneConfig;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MockStorage {
        values: BTreeMap<StorageKey, Vec<u8>>,
        fail_reads: bool,
    }

    impl FlashStorage for MockStorage {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            if self.fail_reads {
                return Err(FlashError::Flash);
            }
            let value = self.values.get(&key).ok_or(FlashError::NotFound)?;
            if value.len() > buffer.len() {
                return Err(FlashError::BufferTooSmall);
            }
            buffer[..value.len()].copy_from_slice(value);
            Ok(value.len())
        }

        async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            self.values.insert(key, data.to_vec());
            Ok(())
        }

        async fn exists(&mut self, key: StorageKey) -> bool {
            self.values.contains_key(&key)
        }
    }

    fn unit(lanes: &[&str]) -> UnitConfig {
        let mut config = UnitConfig::new();
        for name in lanes {
            config.lanes.push(LaneConfig::named(name)).unwrap();
        }
        config
    }

    fn storage_with(key: StorageKey, data: &[u8]) -> MockStorage {
        let mut storage = MockStorage::default();
        storage.values.insert(key, data.to_vec());
        storage
    }

    #[test]
    fn test_empty_flash_not_found() {
        let mut persistence = ConfigPersistence::new(MockStorage::default());
        assert_eq!(
            block_on(persistence.load()),
            Err(ConfigError::Flash(FlashError::NotFound))
        );
    }

    #[test]
    fn test_save_then_load_binary() {
        let config = unit(&["lane0", "lane1"]);
        let mut persistence = ConfigPersistence::new(MockStorage::default());

        block_on(persistence.save(&config)).unwrap();
        assert_eq!(block_on(persistence.load()), Ok(config));

        let mut storage = persistence.into_storage();
        assert!(block_on(storage.exists(StorageKey::UnitConfig)));
        assert!(!block_on(storage.exists(StorageKey::UnitConfigToml)));
    }

    #[test]
    fn test_toml_preferred_over_binary() {
        let mut storage = storage_with(StorageKey::UnitConfigToml, b"[lane.front]\n");
        let binary = postcard::to_allocvec(&unit(&["back"])).unwrap();
        storage.values.insert(StorageKey::UnitConfig, binary);

        let mut persistence = ConfigPersistence::new(storage);
        let config = block_on(persistence.load()).unwrap();
        assert!(config.lane("front").is_some());
        assert!(config.lane("back").is_none());
    }

    #[test]
    fn test_bad_toml_falls_back_to_binary() {
        let mut storage = storage_with(StorageKey::UnitConfigToml, b"[lane.front");
        let binary = postcard::to_allocvec(&unit(&["back"])).unwrap();
        storage.values.insert(StorageKey::UnitConfig, binary);

        let mut persistence = ConfigPersistence::new(storage);
        let config = block_on(persistence.load()).unwrap();
        assert!(config.lane("back").is_some());
    }

    #[test]
    fn test_invalid_utf8_falls_back() {
        let storage = storage_with(StorageKey::UnitConfigToml, &[0xff, 0xfe]);
        let mut persistence = ConfigPersistence::new(storage);

        assert_eq!(
            block_on(persistence.load_toml()),
            Err(ConfigError::InvalidUtf8)
        );
        assert_eq!(
            block_on(persistence.load()),
            Err(ConfigError::Flash(FlashError::NotFound))
        );
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut config = unit(&["lane0"]);
        config.version = CONFIG_VERSION + 1;
        let binary = postcard::to_allocvec(&config).unwrap();
        let mut persistence = ConfigPersistence::new(storage_with(StorageKey::UnitConfig, &binary));

        assert_eq!(
            block_on(persistence.load()),
            Err(ConfigError::VersionMismatch)
        );

        let storage = storage_with(StorageKey::UnitConfigToml, b"version = 2\n");
        let mut persistence = ConfigPersistence::new(storage);
        assert_eq!(
            block_on(persistence.load_toml()),
            Err(ConfigError::VersionMismatch)
        );
    }

    #[test]
    fn test_corrupt_binary() {
        let storage = storage_with(StorageKey::UnitConfig, &[0x01, 0xff, 0xff]);
        let mut persistence = ConfigPersistence::new(storage);
        assert_eq!(block_on(persistence.load()), Err(ConfigError::Deserialize));
    }

    #[test]
    fn test_save_rejects_invalid_config() {
        let config = unit(&["lane0", "lane0"]);
        let mut persistence = ConfigPersistence::new(MockStorage::default());

        assert_eq!(
            block_on(persistence.save(&config)),
            Err(ConfigError::Invalid(LaneConfigError::DuplicateName))
        );
        assert!(persistence.into_storage().values.is_empty());
    }

    #[test]
    fn test_flash_error_propagates() {
        let storage = MockStorage {
            fail_reads: true,
            ..Default::default()
        };
        let mut persistence = ConfigPersistence::new(storage);
        assert_eq!(
            block_on(persistence.load()),
            Err(ConfigError::Flash(FlashError::Flash))
        );
    }
}
