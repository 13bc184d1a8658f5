//! PEM key files.
//!
//! Each function opens its file in a local scope so the handle is closed on
//! every exit path. Any failure, whether I/O, PEM, DER, a wrong password or
//! an invalid key, is reported as [`CryptoError::KeyIoFail`]; the cause is
//! logged at debug level.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use gmssl_crypto::sm2::Sm2KeyPair;
use gmssl_types::CryptoError;
use zeroize::Zeroizing;

use crate::pkcs8::encrypted::{
    encrypted_private_key_info_from_pem, encrypted_private_key_info_to_pem, Pbes2Params,
};
use crate::pkcs8::{public_key_info_from_pem, public_key_info_to_pem};

fn key_io_fail(op: &'static str, path: &Path, cause: &dyn Display) -> CryptoError {
    tracing::debug!(op, path = %path.display(), %cause, "key file operation failed");
    CryptoError::KeyIoFail
}

fn write_file(path: &Path, contents: &str, private: bool) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = private;
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()
}

fn read_file(path: &Path) -> std::io::Result<Zeroizing<String>> {
    let mut file = File::open(path)?;
    let mut contents = Zeroizing::new(String::new());
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Write the private key as a password-protected `ENCRYPTED PRIVATE KEY`
/// PEM file using [`Pbes2Params::default`].
pub fn export_encrypted_private_key_info_pem(
    key: &Sm2KeyPair,
    path: impl AsRef<Path>,
    password: &str,
) -> Result<(), CryptoError> {
    export_encrypted_private_key_info_pem_with(key, path, password, &Pbes2Params::default())
}

/// As [`export_encrypted_private_key_info_pem`] with explicit PBES2 settings.
pub fn export_encrypted_private_key_info_pem_with(
    key: &Sm2KeyPair,
    path: impl AsRef<Path>,
    password: &str,
    params: &Pbes2Params,
) -> Result<(), CryptoError> {
    let path = path.as_ref();
    let op = "export private key";
    let pem = encrypted_private_key_info_to_pem(key, password, params)
        .map_err(|e| key_io_fail(op, path, &e))?;
    write_file(path, &pem, true).map_err(|e| key_io_fail(op, path, &e))
}

/// Read a key pair from an `ENCRYPTED PRIVATE KEY` PEM file.
pub fn import_encrypted_private_key_info_pem(
    path: impl AsRef<Path>,
    password: &str,
) -> Result<Sm2KeyPair, CryptoError> {
    let path = path.as_ref();
    let op = "import private key";
    let pem = read_file(path).map_err(|e| key_io_fail(op, path, &e))?;
    encrypted_private_key_info_from_pem(&pem, password).map_err(|e| key_io_fail(op, path, &e))
}

/// Write the public key as a `PUBLIC KEY` PEM file.
pub fn export_public_key_info_pem(
    key: &Sm2KeyPair,
    path: impl AsRef<Path>,
) -> Result<(), CryptoError> {
    let path = path.as_ref();
    write_file(path, &public_key_info_to_pem(key), false)
        .map_err(|e| key_io_fail("export public key", path, &e))
}

/// Read a public-only key from a `PUBLIC KEY` PEM file.
pub fn import_public_key_info_pem(path: impl AsRef<Path>) -> Result<Sm2KeyPair, CryptoError> {
    let path = path.as_ref();
    let op = "import public key";
    let pem = read_file(path).map_err(|e| key_io_fail(op, path, &e))?;
    public_key_info_from_pem(&pem).map_err(|e| key_io_fail(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gmssl-pki-{}-{name}", std::process::id()))
    }

    fn fast_params() -> Pbes2Params {
        Pbes2Params {
            iterations: 64,
            salt_len: 16,
        }
    }

    #[test]
    fn test_private_key_file_round_trip() {
        let path = temp_path("sm2.key.pem");
        let key = Sm2KeyPair::generate().unwrap();
        export_encrypted_private_key_info_pem_with(&key, &path, "1234", &fast_params()).unwrap();

        let back = import_encrypted_private_key_info_pem(&path, "1234").unwrap();
        assert_eq!(back.private_key_bytes(), key.private_key_bytes());

        let err = import_encrypted_private_key_info_pem(&path, "4321").unwrap_err();
        assert!(matches!(err, CryptoError::KeyIoFail));
        assert!(err.is_inner());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o077, 0);
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_public_key_file_round_trip() {
        let path = temp_path("sm2.pub.pem");
        let key = Sm2KeyPair::generate().unwrap();
        export_public_key_info_pem(&key, &path).unwrap();

        let public = import_public_key_info_pem(&path).unwrap();
        assert!(!public.has_private_key());
        assert_eq!(public.public_key_bytes(), key.public_key_bytes());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let path = temp_path("does-not-exist.pem");
        assert!(matches!(
            import_public_key_info_pem(&path),
            Err(CryptoError::KeyIoFail)
        ));
        assert!(matches!(
            import_encrypted_private_key_info_pem(&path, "pw"),
            Err(CryptoError::KeyIoFail)
        ));
    }

    #[test]
    fn test_wrong_label_and_public_only_export() {
        let path = temp_path("label.pem");
        let key = Sm2KeyPair::generate().unwrap();
        export_public_key_info_pem(&key, &path).unwrap();
        assert!(matches!(
            import_encrypted_private_key_info_pem(&path, "pw"),
            Err(CryptoError::KeyIoFail)
        ));
        std::fs::remove_file(&path).unwrap();

        let public = Sm2KeyPair::from_public_key(&key.public_key_bytes()).unwrap();
        assert!(matches!(
            export_encrypted_private_key_info_pem_with(&public, &path, "pw", &fast_params()),
            Err(CryptoError::KeyIoFail)
        ));
        assert!(!path.exists());
    }
}
