use serde::Deserialize;

use crate::net::port_t;
use crate::prelude::*;

/// Boot-time kernel parameters.
///
/// The defaults match the classic teaching configuration. A config can also
/// be loaded from a JSON document with [`KernelConfig::from_json`]; unknown
/// keys are rejected and missing ones fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// Capacity of the process table, idle and init included.
    pub max_proc: usize,
    /// Length of each per-process file descriptor table.
    pub max_fileid: usize,
    /// Highest usable socket port. Port 0 is the "no port" sentinel.
    pub max_port: port_t,
    /// Size in bytes of each pipe ring buffer (one slot stays empty, so the
    /// usable capacity is one less).
    pub pipe_buffer_size: usize,
    /// How many argument bytes a procinfo record carries at most.
    pub procinfo_max_args_size: usize,
}

impl Default for KernelConfig {
    fn default() -> KernelConfig {
        KernelConfig {
            max_proc: 512,
            max_fileid: 16,
            max_port: 1023,
            pipe_buffer_size: 8192,
            procinfo_max_args_size: 128,
        }
    }
}

impl KernelConfig {
    pub fn from_json(json: &str) -> Result<KernelConfig> {
        let config: KernelConfig =
            serde_json::from_str(json).map_err(|_| errno!(EINVAL, "malformed kernel config"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_proc < 2 {
            return_errno!(EINVAL, "max_proc must admit the idle and init processes");
        }
        if self.max_fileid == 0 {
            return_errno!(EINVAL, "max_fileid must not be zero");
        }
        if self.max_port == 0 {
            return_errno!(EINVAL, "max_port must leave room for a usable port");
        }
        if self.pipe_buffer_size < 2 {
            return_errno!(EINVAL, "a pipe buffer needs at least one usable byte");
        }
        Ok(())
    }
}

lazy_static! {
    static ref CONFIG: RwLock<KernelConfig> = RwLock::new(KernelConfig::default());
}

pub(crate) fn set(config: &KernelConfig) {
    *CONFIG.write().unwrap() = config.clone();
}

/// The configuration the kernel was last booted with.
pub fn get() -> KernelConfig {
    CONFIG.read().unwrap().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        KernelConfig::default().validate().unwrap();
    }

    #[test]
    fn from_json_overrides_selected_fields() {
        let config = KernelConfig::from_json(r#"{ "pipe_buffer_size": 8, "max_proc": 4 }"#).unwrap();
        assert_eq!(config.pipe_buffer_size, 8);
        assert_eq!(config.max_proc, 4);
        assert_eq!(config.max_fileid, KernelConfig::default().max_fileid);
    }

    #[test]
    fn bad_json_is_rejected() {
        let err = KernelConfig::from_json("{ not json").unwrap_err();
        assert_eq!(err.errno(), EINVAL);
        let err = KernelConfig::from_json(r#"{ "no_such_knob": 1 }"#).unwrap_err();
        assert_eq!(err.errno(), EINVAL);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = KernelConfig::from_json(r#"{ "max_proc": 1 }"#).unwrap_err();
        assert_eq!(err.errno(), EINVAL);
        let err = KernelConfig::from_json(r#"{ "pipe_buffer_size": 1 }"#).unwrap_err();
        assert_eq!(err.errno(), EINVAL);
    }
}
