use std::{
    fs,
    path::{Path, PathBuf},
};

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;

use crate::errors::ProbeError;

const BUILD_INFO_DIR: &str = "build-info";
const DEBUG_SUFFIX: &str = ".dbg.json";

/// A compiled contract as written by hardhat into its artifacts directory.
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
    pub path: PathBuf,
}

impl ContractArtifact {
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    contract_name: String,
    source_name: String,
    abi: Abi,
    bytecode: Bytes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatDebugFile {
    build_info: PathBuf,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatBuildInfo {
    solc_version: String,
}

/// Lookup of compiled artifacts by contract name. Purely local: nothing in
/// here touches the network.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `name` to a deployable artifact.
    ///
    /// Accepts a bare contract name (`City`) or a fully qualified one
    /// (`contracts_/City.sol:City`). Bare names must be unique across sources.
    pub fn find(&self, name: &str) -> Result<ContractArtifact, ProbeError> {
        let path = match name.rsplit_once(':') {
            Some((source, contract)) => {
                let path = self.root.join(source).join(format!("{contract}.json"));
                if !path.is_file() {
                    return Err(self.not_found(name));
                }
                path
            }
            None => {
                let mut candidates = Vec::new();
                self.collect_candidates(&self.root, name, &mut candidates)?;
                candidates.sort();

                let mut iter = candidates.into_iter();
                match (iter.next(), iter.next()) {
                    (Some(path), None) => path,
                    (None, _) => return Err(self.not_found(name)),
                    (Some(first), Some(second)) => {
                        let candidates = [first, second]
                            .into_iter()
                            .chain(iter)
                            .map(|path| self.qualified_name_of(&path, name))
                            .collect();
                        return Err(ProbeError::AmbiguousArtifact {
                            name: name.to_owned(),
                            candidates,
                        });
                    }
                }
            }
        };

        let artifact = Self::read_artifact(&path)?;
        if artifact.bytecode.is_empty() {
            return Err(ProbeError::NotDeployable(artifact.contract_name));
        }

        log::debug!(
            "resolved {name} to {} ({})",
            artifact.fully_qualified_name(),
            path.display()
        );
        Ok(artifact)
    }

    /// The solc version an artifact was built with, read from its build-info.
    /// `None` when the debug file or build-info is missing or unreadable.
    pub fn compiler_version(&self, artifact: &ContractArtifact) -> Option<String> {
        let dbg_path = artifact
            .path
            .with_file_name(format!("{}{DEBUG_SUFFIX}", artifact.contract_name));

        let dbg: HardhatDebugFile = read_json(&dbg_path).ok()?;
        let build_info_path = dbg_path.parent()?.join(dbg.build_info);

        match read_json::<HardhatBuildInfo>(&build_info_path) {
            Ok(info) => Some(info.solc_version),
            Err(e) => {
                log::debug!("no build info for {}: {e}", artifact.contract_name);
                None
            }
        }
    }

    fn read_artifact(path: &Path) -> Result<ContractArtifact, ProbeError> {
        let raw: HardhatArtifact = read_json(path)?;
        Ok(ContractArtifact {
            contract_name: raw.contract_name,
            source_name: raw.source_name,
            abi: raw.abi,
            bytecode: raw.bytecode,
            path: path.to_path_buf(),
        })
    }

    fn collect_candidates(
        &self,
        dir: &Path,
        name: &str,
        found: &mut Vec<PathBuf>,
    ) -> Result<(), ProbeError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // a project that was never compiled has no artifacts dir at all
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(ProbeError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        let file_name = format!("{name}.json");
        for entry in entries {
            let entry = entry.map_err(|source| ProbeError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();

            if path.is_dir() {
                if entry.file_name() != BUILD_INFO_DIR {
                    self.collect_candidates(&path, name, found)?;
                }
                continue;
            }

            let in_source_dir = dir
                .file_name()
                .and_then(|d| d.to_str())
                .is_some_and(|d| d.ends_with(".sol"));
            if in_source_dir && entry.file_name().to_str() == Some(file_name.as_str()) {
                found.push(path);
            }
        }
        Ok(())
    }

    fn qualified_name_of(&self, path: &Path, name: &str) -> String {
        let source = path
            .parent()
            .and_then(|p| p.strip_prefix(&self.root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        format!("{source}:{name}")
    }

    fn not_found(&self, name: &str) -> ProbeError {
        ProbeError::ArtifactNotFound {
            name: name.to_owned(),
            dir: self.root.clone(),
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ProbeError> {
    let contents = fs::read_to_string(path).map_err(|source| ProbeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ProbeError::MalformedArtifact {
        path: path.to_path_buf(),
        source,
    })
}
