use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Keypair;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration for the solana CLI.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// URL of the solana JSON RPC.
    json_rpc_url: String,

    /// Path to the keypair file.
    keypair_path: PathBuf,

    /// Mapping of address to label.
    #[serde(default)]
    address_labels: HashMap<String, String>,

    /// Commitment level.
    /// Options: "processed", "confirmed", "finalized"
    commitment: String,
}

impl Config {
    /// Load the configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let yaml = fs::read_to_string(path)?;
        let config = serde_yaml::from_str::<Config>(&yaml)?;

        Ok(config)
    }

    /// Load the configuration from `path`, or from the solana CLI default location.
    pub fn load_or_default(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = path
            .or_else(|| solana_cli_config::CONFIG_FILE.as_ref().map(PathBuf::from))
            .ok_or_else(|| anyhow::anyhow!("no config file given and no home directory found"))?;

        Self::load(path)
    }

    /// Get the JSON RPC URL.
    pub fn json_rpc_url(&self) -> &str {
        &self.json_rpc_url
    }

    /// Get the commitment level.
    pub fn commitment(&self) -> anyhow::Result<CommitmentConfig> {
        Ok(CommitmentConfig::from_str(&self.commitment)?)
    }

    /// Address followed by its label, if one is configured.
    pub fn display_address(&self, address: &str) -> String {
        match self.address_labels.get(address) {
            Some(label) => format!("{} ({})", address, label),
            None => address.to_string(),
        }
    }

    /// Load the keypair from the keypair path.
    pub fn load_keypair(&self) -> anyhow::Result<Keypair> {
        let json = fs::read_to_string(&self.keypair_path)?;
        let bytes = serde_json::from_str::<Vec<u8>>(&json)?;
        let key_pair = Keypair::from_bytes(&bytes)?;

        Ok(key_pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;
    use std::env;
    use uuid::Uuid;

    #[test]
    fn test_load_solana_cli_config() -> anyhow::Result<()> {
        let dir = env::temp_dir().join(Uuid::new_v4().to_string());
        fs::create_dir(&dir)?;

        let keypair = Keypair::new();
        let keypair_path = dir.join("id.json");
        fs::write(
            &keypair_path,
            serde_json::to_string(&keypair.to_bytes().to_vec())?,
        )?;

        let config_path = dir.join("config.yml");
        fs::write(
            &config_path,
            format!(
                "---\njson_rpc_url: \"http://127.0.0.1:8899\"\nwebsocket_url: \"\"\nkeypair_path: {}\naddress_labels:\n  \"11111111111111111111111111111111\": System Program\ncommitment: confirmed\n",
                keypair_path.display()
            ),
        )?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.json_rpc_url(), "http://127.0.0.1:8899");
        assert_eq!(config.commitment()?, CommitmentConfig::confirmed());
        assert_eq!(config.load_keypair()?.pubkey(), keypair.pubkey());
        assert_eq!(
            config.display_address("11111111111111111111111111111111"),
            "11111111111111111111111111111111 (System Program)"
        );

        fs::remove_dir_all(dir)?;
        Ok(())
    }
}
