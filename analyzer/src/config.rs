use anyhow::{Result, bail};
use derive_deref::Deref;
use pdcp::{Algorithms, ConfiguredKeys, Plane, SessionKeys, SnLength, UeId};
use security::keygen::KeyHierarchy;
use security::{CipheringAlgorithm, IntegrityAlgorithm, KEY_LEN};
use serde::{Deserialize, Deserializer};
use slog::{Logger, error, info};
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Clone, Default)]
pub struct Config {
    // Algorithms for UEs whose security configuration was never signalled.
    pub defaults: Algorithms,

    pub sn_lengths: SnLengthDefaults,

    pub ue_keys: UeKeyTable,
}

/// SN length assumed for PDUs whose channel configuration is not known.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnLengthDefaults {
    #[serde(default = "default_sn_bits")]
    pub signalling: u8,
    #[serde(default = "default_sn_bits")]
    pub user: u8,
}

fn default_sn_bits() -> u8 {
    12
}

impl Default for SnLengthDefaults {
    fn default() -> Self {
        SnLengthDefaults {
            signalling: default_sn_bits(),
            user: default_sn_bits(),
        }
    }
}

impl SnLengthDefaults {
    pub fn for_plane(&self, plane: Plane) -> Result<SnLength> {
        SnLength::from_bits(match plane {
            Plane::Signalling => self.signalling,
            Plane::User => self.user,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct UeKeys {
    #[serde(default, deserialize_with = "optional_hex")]
    pub rrc_cipher_key: Option<[u8; KEY_LEN]>,
    #[serde(default, deserialize_with = "optional_hex")]
    pub rrc_integrity_key: Option<[u8; KEY_LEN]>,
    #[serde(default, deserialize_with = "optional_hex")]
    pub up_cipher_key: Option<[u8; KEY_LEN]>,
    #[serde(default, deserialize_with = "optional_hex")]
    pub kenb: Option<[u8; 32]>,
    #[serde(default, deserialize_with = "optional_hex")]
    pub kgnb: Option<[u8; 32]>,
}

impl UeKeys {
    fn into_configured(self) -> Result<ConfiguredKeys> {
        let base_key = match (self.kenb, self.kgnb) {
            (Some(_), Some(_)) => bail!("Only one of kenb and kgnb may be given"),
            (Some(k), None) => Some((k, KeyHierarchy::Eps)),
            (None, Some(k)) => Some((k, KeyHierarchy::FiveG)),
            (None, None) => None,
        };
        Ok(ConfiguredKeys {
            explicit: SessionKeys {
                signalling_cipher: self.rrc_cipher_key,
                signalling_integrity: self.rrc_integrity_key,
                user_cipher: self.up_cipher_key,
            },
            base_key,
        })
    }
}

fn optional_hex<'de, D, const N: usize>(deserializer: D) -> Result<Option<[u8; N]>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(s) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let mut key = [0u8; N];
    hex::decode_to_slice(s.replace(' ', ""), &mut key).map_err(serde::de::Error::custom)?;
    Ok(Some(key))
}

#[derive(Deref, Debug, Clone, Default)]
pub struct UeKeyTable(HashMap<UeId, ConfiguredKeys>);

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    default_ciphering: CipheringAlgorithm,
    #[serde(default)]
    default_integrity: IntegrityAlgorithm,
    #[serde(default)]
    sn_lengths: SnLengthDefaults,
    #[serde(flatten)]
    ues: HashMap<String, UeKeys>,
}

/// Load the analyzer configuration from file.
pub fn load_config_file(filename: &str, logger: &Logger) -> Result<Config> {
    let path = std::env::current_dir()?;
    let contents = fs::read_to_string(filename).inspect_err(|e| {
        error!(
            logger,
            "Failed to load config file {filename} (current directory {}) with error code {e}",
            path.display()
        )
    })?;
    parse_config(&contents, filename, logger)
}

pub fn parse_config(contents: &str, source: &str, logger: &Logger) -> Result<Config> {
    let file: ConfigFile = toml::from_str(contents)?;
    file.sn_lengths.for_plane(Plane::Signalling)?;
    file.sn_lengths.for_plane(Plane::User)?;

    let mut ue_keys = HashMap::new();
    for (key, value) in file.ues.into_iter() {
        let Some(ue_id) = key.strip_prefix("ue-") else {
            bail!("Key {} in {source} does not start with 'ue-'", key)
        };
        let Ok(ue_id) = ue_id.parse::<UeId>() else {
            bail!("Key {} in {source} does not end in a UE ID", key)
        };
        info!(logger, "Loaded keys for UE {ue_id} from {source}");
        ue_keys.insert(ue_id, value.into_configured()?);
    }

    Ok(Config {
        defaults: Algorithms {
            ciphering: file.default_ciphering,
            integrity: file.default_integrity,
        },
        sn_lengths: file.sn_lengths,
        ue_keys: UeKeyTable(ue_keys),
    })
}
