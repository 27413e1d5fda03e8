//! Compiled contract artifacts as written by Hardhat (`artifacts/`) or
//! Foundry (`out/`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use ethers::{abi::Abi, types::Bytes};
use log::debug;
use serde::Deserialize;

use crate::error::{DeployError, Result};

const SKIPPED_DIRS: &[&str] = &["build-info", "cache"];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn into_hex(self) -> String {
        match self {
            RawBytecode::Hex(hex) | RawBytecode::Object { object: hex } => hex,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    source_name: Option<String>,
    abi: Abi,
    bytecode: RawBytecode,
    #[serde(default)]
    deployed_bytecode: Option<RawBytecode>,
}

#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub source_name: Option<String>,
    pub abi: Abi,
    pub bytecode: Bytes,
    deployed_bytecode: Option<String>,
    pub path: Option<PathBuf>,
}

impl ContractArtifact {
    /// Finds `name` under `root` and loads it. `name` may be fully qualified
    /// (`contracts/Utility.sol:UtilityContract`).
    pub fn locate(root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let path = find_artifact(root.as_ref(), name)?;
        Self::load(path, contract_name(name))
    }

    pub fn load(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading artifact {}", path.display());
        let json = fs::read_to_string(path)?;
        let mut artifact = Self::from_json(name, &json)?;
        artifact.path = Some(path.to_path_buf());
        Ok(artifact)
    }

    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json)?;
        let name = raw.contract_name.unwrap_or_else(|| name.to_string());
        let bytecode = decode_code(&name, &raw.bytecode.into_hex())?;

        Ok(Self {
            name,
            source_name: raw.source_name,
            abi: raw.abi,
            bytecode,
            deployed_bytecode: raw.deployed_bytecode.map(RawBytecode::into_hex),
            path: None,
        })
    }

    /// Runtime code as it should appear on chain after deployment.
    pub fn deployed_bytecode(&self) -> Result<Bytes> {
        let hex = self
            .deployed_bytecode
            .as_deref()
            .ok_or_else(|| DeployError::MissingRuntimeCode(self.name.clone()))?;
        decode_code(&self.name, hex)
    }
}

fn contract_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, contract)| contract)
}

fn decode_code(contract: &str, raw: &str) -> Result<Bytes> {
    let hex_part = raw.trim().trim_start_matches("0x");
    if hex_part.is_empty() {
        return Err(DeployError::AbstractContract(contract.to_string()));
    }

    let libraries = unlinked_libraries(hex_part);
    if !libraries.is_empty() {
        return Err(DeployError::UnlinkedLibraries {
            contract: contract.to_string(),
            libraries: libraries.join(", "),
        });
    }

    Ok(hex::decode(hex_part)?.into())
}

/// Link placeholders are 40 characters wide and start with `__`: either
/// `__$<hash>$__` or the older `__<path:Name>___` form.
fn unlinked_libraries(hex: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = hex;
    while let Some(start) = rest.find("__") {
        let end = (start + 40).min(rest.len());
        let placeholder = rest
            .get(start..end)
            .unwrap_or(&rest[start..])
            .trim_matches(|c| c == '_' || c == '$')
            .to_string();
        if !found.contains(&placeholder) {
            found.push(placeholder);
        }
        rest = rest.get(end..).unwrap_or("");
    }
    found
}

pub fn find_artifact(root: &Path, name: &str) -> Result<PathBuf> {
    if let Some((source, contract)) = name.rsplit_once(':') {
        let path = root.join(source).join(format!("{contract}.json"));
        return if path.is_file() {
            Ok(path)
        } else {
            Err(DeployError::ArtifactNotFound {
                name: name.to_string(),
                root: root.to_path_buf(),
            })
        };
    }

    let file_name = format!("{name}.json");
    let mut matches = Vec::new();
    collect_matches(root, &file_name, &mut matches)?;
    matches.sort();

    match matches.len() {
        0 => Err(DeployError::ArtifactNotFound {
            name: name.to_string(),
            root: root.to_path_buf(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(DeployError::AmbiguousArtifact {
            name: name.to_string(),
            paths: matches
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

fn collect_matches(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| SKIPPED_DIRS.contains(&n));
            if !skipped {
                collect_matches(&path, file_name, out)?;
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(file_name) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const CREATION_CODE: &str =
        "0x6080604052348015600f57600080fd5b50600980601d6000396000f3fe6080604052600080fd";
    pub(crate) const RUNTIME_CODE: &str = "0x6080604052600080fd";

    pub(crate) fn hardhat_json(name: &str) -> String {
        format!(
            r#"{{
                "_format": "hh-sol-artifact-1",
                "contractName": "{name}",
                "sourceName": "contracts/{name}.sol",
                "abi": [
                    {{ "inputs": [], "name": "owner", "outputs": [{{ "internalType": "address", "name": "", "type": "address" }}], "stateMutability": "view", "type": "function" }}
                ],
                "bytecode": "{CREATION_CODE}",
                "deployedBytecode": "{RUNTIME_CODE}",
                "linkReferences": {{}},
                "deployedLinkReferences": {{}}
            }}"#
        )
    }

    pub(crate) fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "utility-deployer-{}-{}",
            label,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_artifact(root: &Path, source: &str, name: &str, json: &str) -> PathBuf {
        let dir = root.join(source);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.json"));
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn parses_hardhat_artifact() {
        let artifact =
            ContractArtifact::from_json("ignored", &hardhat_json("UtilityContract")).unwrap();
        assert_eq!(artifact.name, "UtilityContract");
        assert_eq!(
            artifact.source_name.as_deref(),
            Some("contracts/UtilityContract.sol")
        );
        assert!(artifact.abi.function("owner").is_ok());
        assert!(artifact.abi.constructor().is_none());
        assert_eq!(artifact.bytecode.len(), (CREATION_CODE.len() - 2) / 2);
        assert_eq!(
            artifact.deployed_bytecode().unwrap().to_vec(),
            hex::decode(&RUNTIME_CODE[2..]).unwrap()
        );
    }

    #[test]
    fn parses_foundry_artifact() {
        let json = format!(
            r#"{{
                "abi": [],
                "bytecode": {{ "object": "{CREATION_CODE}", "sourceMap": "", "linkReferences": {{}} }},
                "deployedBytecode": {{ "object": "{RUNTIME_CODE}" }}
            }}"#
        );
        let artifact = ContractArtifact::from_json("UtilityContract", &json).unwrap();
        assert_eq!(artifact.name, "UtilityContract");
        assert!(artifact.source_name.is_none());
        assert!(!artifact.bytecode.is_empty());
    }

    #[test]
    fn interfaces_cannot_be_deployed() {
        let json = r#"{ "contractName": "IUtility", "abi": [], "bytecode": "0x", "deployedBytecode": "0x" }"#;
        let err = ContractArtifact::from_json("IUtility", json).unwrap_err();
        assert!(matches!(err, DeployError::AbstractContract(name) if name == "IUtility"));
    }

    #[test]
    fn reports_unlinked_libraries() {
        let json = r#"{
            "contractName": "UsesMath",
            "abi": [],
            "bytecode": "0x6080__$1234567890abcdef1234567890abcdef12$__6000__$1234567890abcdef1234567890abcdef12$__"
        }"#;
        match ContractArtifact::from_json("UsesMath", json).unwrap_err() {
            DeployError::UnlinkedLibraries { contract, libraries } => {
                assert_eq!(contract, "UsesMath");
                assert_eq!(libraries, "1234567890abcdef1234567890abcdef12");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn locates_artifact_and_skips_build_info() {
        let root = scratch_dir("locate");
        write_artifact(
            &root,
            "contracts/UtilityContract.sol",
            "UtilityContract",
            &hardhat_json("UtilityContract"),
        );
        write_artifact(&root, "build-info", "UtilityContract", "{}");

        let artifact = ContractArtifact::locate(&root, "UtilityContract").unwrap();
        assert_eq!(artifact.name, "UtilityContract");
        assert!(artifact
            .path
            .unwrap()
            .ends_with("contracts/UtilityContract.sol/UtilityContract.json"));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn ambiguous_names_need_qualification() {
        let root = scratch_dir("ambiguous");
        let json = hardhat_json("UtilityContract");
        write_artifact(&root, "contracts/A.sol", "UtilityContract", &json);
        write_artifact(&root, "contracts/B.sol", "UtilityContract", &json);

        let err = find_artifact(&root, "UtilityContract").unwrap_err();
        assert!(matches!(err, DeployError::AmbiguousArtifact { .. }));

        let path = find_artifact(&root, "contracts/B.sol:UtilityContract").unwrap();
        assert!(path.ends_with("B.sol/UtilityContract.json"));

        let artifact = ContractArtifact::locate(&root, "contracts/A.sol:UtilityContract").unwrap();
        assert_eq!(artifact.name, "UtilityContract");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_artifact() {
        let root = scratch_dir("missing");
        let err = find_artifact(&root, "UtilityContract").unwrap_err();
        assert!(matches!(err, DeployError::ArtifactNotFound { name, .. } if name == "UtilityContract"));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn runtime_code_absent_from_artifact() {
        let json = format!(
            r#"{{ "contractName": "UtilityContract", "abi": [], "bytecode": "{CREATION_CODE}" }}"#
        );
        let artifact = ContractArtifact::from_json("UtilityContract", &json).unwrap();
        let err = artifact.deployed_bytecode().unwrap_err();
        assert!(matches!(err, DeployError::MissingRuntimeCode(ref name) if name == "UtilityContract"));
        assert!(err.to_string().contains("deployedBytecode"));
    }
}
