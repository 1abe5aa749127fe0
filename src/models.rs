use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MIN_RAM_MB: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModLoader {
    #[default]
    Vanilla,
    Fabric,
    Forge,
    Quilt,
}

impl ModLoader {
    pub fn as_str(self) -> &'static str {
        match self {
            ModLoader::Vanilla => "vanilla",
            ModLoader::Fabric => "fabric",
            ModLoader::Forge => "forge",
            ModLoader::Quilt => "quilt",
        }
    }

    pub fn is_vanilla(self) -> bool {
        self == ModLoader::Vanilla
    }
}

impl fmt::Display for ModLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModLoader {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "vanilla" => Ok(ModLoader::Vanilla),
            "fabric" => Ok(ModLoader::Fabric),
            "forge" => Ok(ModLoader::Forge),
            "quilt" => Ok(ModLoader::Quilt),
            other => Err(format!("Unknown mod loader: {}", other)),
        }
    }
}

// Persisted launch configuration, keyed by profile name in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub version: String,
    #[serde(default, deserialize_with = "lenient_modloader")]
    pub modloader: ModLoader,
    #[serde(default = "default_ram")]
    pub ram: u32,
    #[serde(default)]
    pub jvm_flags: Vec<String>,
}

fn default_ram() -> u32 {
    MIN_RAM_MB
}

// Older UIs wrote "", null or capitalised names. An unknown loader must not
// make the whole store unreadable, so it degrades to vanilla.
fn lenient_modloader<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ModLoader, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(ModLoader::Vanilla);
    };
    Ok(raw.parse().unwrap_or_else(|e| {
        log::warn!("{}; treating profile as vanilla", e);
        ModLoader::Vanilla
    }))
}

pub type ProfileMap = BTreeMap<String, Profile>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub version: String,
    pub modloader: ModLoader,
}

impl CatalogEntry {
    pub fn new(version: impl Into<String>, modloader: ModLoader) -> Self {
        Self {
            version: version.into(),
            modloader,
        }
    }

    pub fn label(&self) -> String {
        if self.modloader.is_vanilla() {
            self.version.clone()
        } else {
            format!("{} ({})", self.version, self.modloader)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Launch,
    Versions,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Launch => "launch",
            Operation::Versions => "versions",
        }
    }
}

/// One invocation of the backend. Lives only for the duration of a spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub operation: Operation,
    pub version: String,
    pub username: String,
    pub ram: Option<u32>,
    pub modloader: Option<ModLoader>,
    pub jvm_flags: Vec<String>,
    pub optimize: bool,
}

impl LaunchRequest {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            operation: Operation::Launch,
            version: profile.version.clone(),
            username: profile.username.clone(),
            ram: Some(profile.ram).filter(|ram| *ram > 0),
            modloader: Some(profile.modloader).filter(|ml| !ml.is_vanilla()),
            jvm_flags: profile.jvm_flags.clone(),
            optimize: true,
        }
    }

    pub fn versions() -> Self {
        Self {
            operation: Operation::Versions,
            version: String::new(),
            username: String::new(),
            ram: None,
            modloader: None,
            jvm_flags: Vec::new(),
            optimize: false,
        }
    }

    /// Backend argument vector. Flag order follows the profile exactly.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.operation.as_str().to_string()];
        if self.operation == Operation::Versions {
            return args;
        }

        args.push(self.version.clone());
        args.push(self.username.clone());
        if let Some(ram) = self.ram {
            args.push("--ram".to_string());
            args.push(ram.to_string());
        }
        if let Some(modloader) = self.modloader {
            args.push("--modloader".to_string());
            args.push(modloader.to_string());
        }
        for flag in &self.jvm_flags {
            args.push(format!("--jvm-arg={}", flag));
        }
        if self.optimize {
            args.push("--optimize".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> Profile {
        Profile {
            username: "Bob".to_string(),
            version: "1.20.4".to_string(),
            modloader: ModLoader::Fabric,
            ram: 4096,
            jvm_flags: vec!["-Xmx4G".to_string(), "-Xms2G".to_string()],
        }
    }

    #[test]
    fn builds_launch_args_in_contract_order() {
        let args = LaunchRequest::from_profile(&bob()).to_args();
        assert_eq!(
            args,
            vec![
                "launch",
                "1.20.4",
                "Bob",
                "--ram",
                "4096",
                "--modloader",
                "fabric",
                "--jvm-arg=-Xmx4G",
                "--jvm-arg=-Xms2G",
                "--optimize",
            ]
        );
    }

    #[test]
    fn omits_vanilla_loader_and_zero_ram() {
        let profile = Profile {
            modloader: ModLoader::Vanilla,
            ram: 0,
            jvm_flags: Vec::new(),
            ..bob()
        };
        let args = LaunchRequest::from_profile(&profile).to_args();
        assert_eq!(args, vec!["launch", "1.20.4", "Bob", "--optimize"]);
    }

    #[test]
    fn versions_request_takes_no_positionals() {
        assert_eq!(LaunchRequest::versions().to_args(), vec!["versions"]);
    }

    #[test]
    fn profile_json_uses_ui_field_names() {
        let value = serde_json::to_value(bob()).unwrap();
        assert_eq!(value["jvmFlags"][0], "-Xmx4G");
        assert_eq!(value["modloader"], "fabric");
        assert_eq!(value["ram"], 4096);
    }

    #[test]
    fn profile_deserializes_with_missing_optional_fields() {
        let profile: Profile =
            serde_json::from_str(r#"{"username":"Ann","version":"1.8.9"}"#).unwrap();
        assert_eq!(profile.modloader, ModLoader::Vanilla);
        assert_eq!(profile.ram, MIN_RAM_MB);
        assert!(profile.jvm_flags.is_empty());
    }

    #[test]
    fn profile_accepts_loose_modloader_values() {
        let parse = |raw: &str| {
            let json = format!(r#"{{"username":"Ann","version":"1.8.9","modloader":{}}}"#, raw);
            serde_json::from_str::<Profile>(&json).unwrap().modloader
        };
        assert_eq!(parse("\"\""), ModLoader::Vanilla);
        assert_eq!(parse("null"), ModLoader::Vanilla);
        assert_eq!(parse("\"Fabric\""), ModLoader::Fabric);
        assert_eq!(parse("\" QUILT \""), ModLoader::Quilt);
        assert_eq!(parse("\"neoforge\""), ModLoader::Vanilla);
    }

    #[test]
    fn catalog_label_marks_loader() {
        assert_eq!(CatalogEntry::new("1.20.1", ModLoader::Vanilla).label(), "1.20.1");
        assert_eq!(
            CatalogEntry::new("1.20.1", ModLoader::Forge).label(),
            "1.20.1 (forge)"
        );
    }

    #[test]
    fn parses_loader_names_case_insensitively() {
        assert_eq!("Quilt".parse::<ModLoader>(), Ok(ModLoader::Quilt));
        assert_eq!("".parse::<ModLoader>(), Ok(ModLoader::Vanilla));
        assert!("neoforge".parse::<ModLoader>().is_err());
    }
}
