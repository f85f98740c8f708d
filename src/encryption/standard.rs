use crate::{Error, Result};
use log::debug;
use std::sync::Arc;
use zeroize::Zeroizing;
use super::algorithms::KeyDerivation;
use super::dictionary::{EncryptionDictionary, SecurityHandlerKind, STANDARD_CRYPT_FILTER};
use super::password::{password_candidates, prepare_password_lossy};
use super::permissions::Permissions;
use super::provider::CryptoProvider;
use super::revision::CipherSettings;
use super::{AccessLevel, FileEncryptionKey};

/// The password based security handler.
///
/// A handler only exists in the unlocked state: [`StandardSecurityHandler::write_setup`] derives
/// a fresh dictionary and key for new passwords, [`StandardSecurityHandler::read_validate`]
/// recovers the key of an existing dictionary or fails with [`Error::BadPassword`].
#[derive(Clone, Debug)]
pub struct StandardSecurityHandler {
    dictionary: EncryptionDictionary,
    file_key: FileEncryptionKey,
    access: AccessLevel,
    permissions: Permissions,
}

impl StandardSecurityHandler {
    pub fn write_setup(
        user_password: &[u8],
        owner_password: &[u8],
        permissions: Permissions,
        settings: &CipherSettings,
        file_id: &[u8],
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        let owner_password = if owner_password.is_empty() {
            debug!("no owner password given; generating a random one");
            random_owner_password(provider.as_ref())
        } else {
            owner_password.to_vec()
        };

        let revision = settings.revision;
        let mut dictionary = EncryptionDictionary::with_settings(SecurityHandlerKind::Standard, settings, STANDARD_CRYPT_FILTER);
        dictionary.permissions = permissions.p_value(revision);

        let mut algorithm = KeyDerivation::new(revision, settings.key_length, provider.clone());
        algorithm.permissions = dictionary.permissions;
        algorithm.encrypt_metadata = settings.encrypt_metadata;
        algorithm.file_id = file_id.to_vec();

        let file_key = if revision.is_aes256() {
            let user_password = Zeroizing::new(prepare_password_lossy(user_password));
            let owner_password = Zeroizing::new(prepare_password_lossy(&owner_password));

            let mut file_key = Zeroizing::new(vec![0u8; 32]);
            provider.fill_random(&mut file_key);

            let (user_value, user_encrypted) = algorithm.compute_hashed_user_password_r6(&file_key, &user_password);
            algorithm.user_value = user_value;
            algorithm.user_encrypted = user_encrypted;

            let (owner_value, owner_encrypted) = algorithm.compute_hashed_owner_password_r6(&file_key, &owner_password);
            algorithm.owner_value = owner_value;
            algorithm.owner_encrypted = owner_encrypted;

            algorithm.permission_encrypted = algorithm.compute_permissions(&file_key);
            file_key
        } else {
            algorithm.owner_value = algorithm.compute_hashed_owner_password_r4(&owner_password, user_password)?;

            let (user_value, file_key) = algorithm.compute_hashed_user_password_r4(user_password)?;
            algorithm.user_value = user_value;
            Zeroizing::new(file_key)
        };

        dictionary.owner_value = algorithm.owner_value;
        dictionary.user_value = algorithm.user_value;
        dictionary.owner_encrypted = algorithm.owner_encrypted;
        dictionary.user_encrypted = algorithm.user_encrypted;
        dictionary.permission_encrypted = algorithm.permission_encrypted;

        Ok(Self {
            dictionary,
            file_key,
            access: AccessLevel::Owner,
            permissions: Permissions::all(),
        })
    }

    /// Unlocks `dictionary` with `password`, trying it as the user password first and as the
    /// owner password second.
    pub fn read_validate(
        dictionary: &EncryptionDictionary,
        file_id: &[u8],
        password: &[u8],
        provider: Arc<dyn CryptoProvider>,
    ) -> Result<Self> {
        if dictionary.filter != SecurityHandlerKind::Standard {
            return Err(Error::UnsupportedSecurityHandler(
                String::from_utf8_lossy(dictionary.filter.name()).into_owned(),
            ));
        }

        let algorithm = KeyDerivation::from_dictionary(dictionary, file_id, provider);

        // Revision 6 passwords are tried in their SASLprep form, then as given.
        let candidates = if dictionary.revision.is_aes256() {
            password_candidates(password)
        } else {
            vec![password.to_vec()]
        };

        let (file_key, access) = match try_candidates(&candidates, |password| algorithm.authenticate_user_password(password)) {
            Ok(file_key) => (file_key, AccessLevel::User),
            Err(Error::BadPassword) => {
                let file_key = try_candidates(&candidates, |password| algorithm.authenticate_owner_password(password))?;
                (file_key, AccessLevel::Owner)
            }
            Err(err) => return Err(err),
        };

        debug!("standard security handler unlocked with the {access:?} password");

        let permissions = match access {
            AccessLevel::User => Permissions::from_p_value(dictionary.permissions as i64, dictionary.revision),
            _ => Permissions::all(),
        };

        Ok(Self {
            dictionary: dictionary.clone(),
            file_key: Zeroizing::new(file_key),
            access,
            permissions,
        })
    }

    pub fn dictionary(&self) -> &EncryptionDictionary {
        &self.dictionary
    }

    pub fn file_key(&self) -> &[u8] {
        &self.file_key
    }

    pub fn access(&self) -> AccessLevel {
        self.access
    }

    /// Permissions in effect: all of them after an owner unlock, the stored `/P` otherwise.
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn into_parts(self) -> (EncryptionDictionary, FileEncryptionKey, AccessLevel, Permissions) {
        (self.dictionary, self.file_key, self.access, self.permissions)
    }
}

/// Runs `authenticate` on each candidate until one is accepted. Only [`Error::BadPassword`]
/// moves on to the next candidate.
fn try_candidates<F>(candidates: &[Vec<u8>], authenticate: F) -> Result<Vec<u8>>
where
    F: Fn(&[u8]) -> Result<Vec<u8>>,
{
    for candidate in candidates {
        match authenticate(candidate) {
            Err(Error::BadPassword) => continue,
            result => return result,
        }
    }

    Err(Error::BadPassword)
}

/// 16 random bytes, hex encoded so the password survives SASLprep.
fn random_owner_password(provider: &dyn CryptoProvider) -> Vec<u8> {
    let mut bytes = [0u8; 16];
    provider.fill_random(&mut bytes);

    bytes.iter().flat_map(|byte| format!("{byte:02x}").into_bytes()).collect()
}

impl KeyDerivation {
    pub fn from_dictionary(dictionary: &EncryptionDictionary, file_id: &[u8], provider: Arc<dyn CryptoProvider>) -> Self {
        let mut algorithm = KeyDerivation::new(dictionary.revision, dictionary.key_length, provider);
        algorithm.encrypt_metadata = dictionary.encrypt_metadata;
        algorithm.permissions = dictionary.permissions;
        algorithm.file_id = file_id.to_vec();
        algorithm.owner_value = dictionary.owner_value.clone();
        algorithm.owner_encrypted = dictionary.owner_encrypted.clone();
        algorithm.user_value = dictionary.user_value.clone();
        algorithm.user_encrypted = dictionary.user_encrypted.clone();
        algorithm.permission_encrypted = dictionary.permission_encrypted.clone();
        algorithm
    }
}
