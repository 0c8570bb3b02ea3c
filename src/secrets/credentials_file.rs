use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dns::Credentials;

const PROVIDER_SECTION: &str = "cloudflare";
const TOKEN_FIELD: &str = "token";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Credentials file not found: {}. Use 'cfzones set-token' to store a token.", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read credentials file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse credentials file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write credentials file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    cloudflare: ProviderSection,
}

#[derive(Debug, Deserialize)]
struct ProviderSection {
    token: String,
}

/// Loads the Cloudflare API token from a JSON file of the form
/// `{"cloudflare": {"token": "..."}}`.
///
/// The token itself is not validated; a bad token shows up as an
/// authentication failure on the first API call.
pub fn load_credentials(path: &Path) -> Result<Credentials, CredentialsError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            CredentialsError::Missing(path.to_path_buf())
        } else {
            CredentialsError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let file: CredentialsFile =
        serde_json::from_str(&content).map_err(|source| CredentialsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Credentials {
        api_token: file.cloudflare.token,
    })
}

/// Writes `token` into the credentials file, keeping any other sections and
/// fields already present.
pub fn store_token(path: &Path, token: &str) -> Result<(), CredentialsError> {
    let mut root = load_raw(path)?;

    let section = root
        .entry(PROVIDER_SECTION)
        .or_insert_with(|| Value::Object(Map::new()));
    if !section.is_object() {
        *section = Value::Object(Map::new());
    }
    if let Value::Object(fields) = section {
        fields.insert(TOKEN_FIELD.to_string(), Value::String(token.to_string()));
    }

    save_raw(path, &root)
}

fn load_raw(path: &Path) -> Result<Map<String, Value>, CredentialsError> {
    if !path.exists() {
        return Ok(Map::new());
    }

    let content = fs::read_to_string(path).map_err(|source| CredentialsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| CredentialsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_raw(path: &Path, root: &Map<String, Value>) -> Result<(), CredentialsError> {
    let write_err = |source| CredentialsError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let content = serde_json::to_string_pretty(root).map_err(CredentialsError::Serialize)?;
    fs::write(path, content).map_err(write_err)?;

    // Set restrictive permissions on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms).map_err(write_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, r#"{"cloudflare": {"token": "cf-token-123"}}"#).unwrap();

        let creds = load_credentials(&path).unwrap();
        assert_eq!(creds.api_token, "cf-token-123");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");

        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, CredentialsError::Missing(p) if p == path));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_credentials(&path),
            Err(CredentialsError::Parse { .. })
        ));

        fs::write(&path, r#"{"cloudflare": {}}"#).unwrap();
        assert!(matches!(
            load_credentials(&path),
            Err(CredentialsError::Parse { .. })
        ));
    }

    #[test]
    fn test_store_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        store_token(&path, "fresh").unwrap();
        assert_eq!(load_credentials(&path).unwrap().api_token, "fresh");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_store_keeps_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(
            &path,
            r#"{"cloudflare": {"token": "old", "account": "acc-1"}, "registrar": {"key": "k"}}"#,
        )
        .unwrap();

        store_token(&path, "new").unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["cloudflare"]["token"], "new");
        assert_eq!(raw["cloudflare"]["account"], "acc-1");
        assert_eq!(raw["registrar"]["key"], "k");
    }
}
