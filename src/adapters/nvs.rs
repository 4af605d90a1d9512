//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`], [`CheckpointPort`] and [`StoragePort`] for
//! the brew controller.
//!
//! - Config is range-checked before it is persisted.
//! - Both records live in the `brew` namespace (`cfg`, `ckpt`) as postcard
//!   blobs. ESP-IDF NVS commits are atomic per `nvs_commit()`, so a power
//!   cut leaves either the old or the new record.
//! - A checkpoint that is missing or fails to decode reads as the sentinel.

use crate::app::ports::{CheckpointPort, ConfigError, ConfigPort, StorageError, StoragePort};
use crate::checkpoint::Checkpoint;
use crate::config::SessionConfig;
use log::{debug, info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "brew";
const CONFIG_KEY: &str = "cfg";
const CHECKPOINT_KEY: &str = "ckpt";

/// Largest blob read back from flash.
const MAX_BLOB_SIZE: usize = 256;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised, which also drops any stored session.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NVS names are at most 15 bytes plus the terminating NUL.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, run `f` with the handle, then close it.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SessionConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = match self.read(NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                return Ok(SessionConfig::default());
            }
            Err(_) => return Err(ConfigError::IoError),
        };
        let cfg: SessionConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NvsAdapter: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&mut self, config: &SessionConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write(NAMESPACE, CONFIG_KEY, &bytes).map_err(|e| match e {
            StorageError::Full => ConfigError::StorageFull,
            _ => ConfigError::IoError,
        })?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

impl CheckpointPort for NvsAdapter {
    fn load_checkpoint(&self) -> Checkpoint {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        match self.read(NAMESPACE, CHECKPOINT_KEY, &mut buf) {
            Ok(len) => postcard::from_bytes(&buf[..len]).unwrap_or_else(|_| {
                warn!("NvsAdapter: checkpoint undecodable, treating as empty");
                Checkpoint::EMPTY
            }),
            Err(StorageError::NotFound) => Checkpoint::EMPTY,
            Err(e) => {
                warn!("NvsAdapter: checkpoint read failed ({}), treating as empty", e);
                Checkpoint::EMPTY
            }
        }
    }

    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(checkpoint).map_err(|_| StorageError::Encode)?;
        self.write(NAMESPACE, CHECKPOINT_KEY, &bytes)?;
        debug!("NvsAdapter: checkpoint saved ({} bytes)", bytes.len());
        Ok(())
    }

    fn clear_checkpoint(&mut self) -> Result<(), StorageError> {
        self.delete(NAMESPACE, CHECKPOINT_KEY)?;
        debug!("NvsAdapter: checkpoint cleared");
        Ok(())
    }
}

/// Backend primitives. The config and checkpoint ports go through these.
impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key = Self::c_name(key);
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(e) => {
                    warn!("NvsAdapter: read {}::{} failed ({})", namespace, key, e);
                    Err(StorageError::IoError)
                }
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let key = Self::c_name(key);
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                warn!("NvsAdapter: write {}::{} failed ({})", namespace, key, e);
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let key = Self::c_name(key);
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key = Self::c_name(key);
                let ret =
                    unsafe { nvs_find_key(handle, key.as_ptr() as *const _, core::ptr::null_mut()) };
                Ok(ret == ESP_OK)
            });
            result.unwrap_or(false)
        }
    }
}
