//! Password-to-open encryption for OOXML packages (ECMA-376 Agile Encryption).
//!
//! Office applications expect an encrypted workbook to be an OLE compound file holding:
//!
//! - `EncryptionInfo`: version 4.4 header followed by an XML descriptor of the key material
//! - `EncryptedPackage`: the original zip package, AES-256-CBC encrypted in 4096 byte segments
//! - `\x06DataSpaces/*`: the data space map declaring `EncryptedPackage` as strongly encrypted
//!
//! Key derivation follows the password key encryptor: SHA-512 over salt and UTF-16LE password,
//! re-hashed `spinCount` times, then combined with fixed block keys to derive the verifier and
//! key-wrapping keys. Package integrity is an HMAC-SHA512 over the encrypted stream.

use std::io::{Cursor, Write};

use aes::Aes256;
use aes::cipher::{BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::prelude::RngExt;
use rand::rng;
use sha2::{Digest, Sha512};

use crate::errors::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type HmacSha512 = Hmac<Sha512>;

/// Magic bytes every compound file starts with
pub const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const SPIN_COUNT: u32 = 100_000;
const KEY_BYTES: usize = 32;
const BLOCK_BYTES: usize = 16;
const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 64;
const SEGMENT_BYTES: usize = 4096;

const BLOCK_KEY_VERIFIER_INPUT: [u8; 8] = [0xfe, 0xa7, 0xd2, 0x76, 0x3b, 0x4b, 0x9e, 0x79];
const BLOCK_KEY_VERIFIER_VALUE: [u8; 8] = [0xd7, 0xaa, 0x0f, 0x6d, 0x30, 0x61, 0x34, 0x4e];
const BLOCK_KEY_ENCRYPTED_KEY: [u8; 8] = [0x14, 0x6e, 0x0b, 0xe7, 0xab, 0xac, 0xd0, 0xd6];
const BLOCK_KEY_INTEGRITY_KEY: [u8; 8] = [0x5f, 0xb2, 0xad, 0x01, 0x0c, 0xb9, 0xe1, 0xf6];
const BLOCK_KEY_INTEGRITY_VALUE: [u8; 8] = [0xa0, 0x67, 0x7f, 0x02, 0xb2, 0x2c, 0x84, 0x33];

const DATA_SPACES: &str = "\u{6}DataSpaces";
const ENCRYPTION_TRANSFORM_ID: &str = "{FF9A3F03-56EF-4613-BDD5-5A41C1D07246}";

/// Random material for a single encryption
struct Secrets {
    key_data_salt: [u8; SALT_BYTES],
    password_salt: [u8; SALT_BYTES],
    verifier: [u8; SALT_BYTES],
    package_key: [u8; KEY_BYTES],
    hmac_key: [u8; HASH_BYTES],
}

impl Secrets {
    fn generate() -> Self {
        let mut rng = rng();
        Self {
            key_data_salt: rng.random(),
            password_salt: rng.random(),
            verifier: rng.random(),
            package_key: rng.random(),
            hmac_key: rng.random(),
        }
    }
}

/// Everything that ends up in the compound file
struct AgileDocument {
    spin_count: u32,
    key_data_salt: Vec<u8>,
    password_salt: Vec<u8>,
    encrypted_verifier_input: Vec<u8>,
    encrypted_verifier_value: Vec<u8>,
    encrypted_key: Vec<u8>,
    encrypted_hmac_key: Vec<u8>,
    encrypted_hmac_value: Vec<u8>,
    package: Vec<u8>,
}

/// Encrypt an `.xlsx` package so it can only be opened with `password`.
pub fn encrypt_package(package: &[u8], password: &str) -> Result<Vec<u8>> {
    let document = encrypt_with(package, password, &Secrets::generate(), SPIN_COUNT)?;
    tracing::debug!(
        plain_bytes = package.len(),
        encrypted_bytes = document.package.len(),
        "encrypted workbook package"
    );
    document.into_compound_file()
}

fn encrypt_with(package: &[u8], password: &str, secrets: &Secrets, spin_count: u32) -> Result<AgileDocument> {
    let hash = password_hash(password, &secrets.password_salt, spin_count);
    let iv = &secrets.password_salt;

    let encrypted_verifier_input = aes_cbc(&derive_key(&hash, &BLOCK_KEY_VERIFIER_INPUT), iv, &secrets.verifier)?;
    let encrypted_verifier_value = aes_cbc(
        &derive_key(&hash, &BLOCK_KEY_VERIFIER_VALUE),
        iv,
        &sha512(&[&secrets.verifier]),
    )?;
    let encrypted_key = aes_cbc(&derive_key(&hash, &BLOCK_KEY_ENCRYPTED_KEY), iv, &secrets.package_key)?;

    let encrypted_package = encrypt_segments(package, &secrets.package_key, &secrets.key_data_salt)?;

    let mut mac = <HmacSha512 as Mac>::new_from_slice(&secrets.hmac_key).map_err(|e| Error::Encryption {
        message: format!("initialise package HMAC: {e}"),
    })?;
    mac.update(&encrypted_package);
    let hmac_value = mac.finalize().into_bytes();

    let encrypted_hmac_key = aes_cbc(
        &secrets.package_key,
        &block_iv(&secrets.key_data_salt, &BLOCK_KEY_INTEGRITY_KEY),
        &secrets.hmac_key,
    )?;
    let encrypted_hmac_value = aes_cbc(
        &secrets.package_key,
        &block_iv(&secrets.key_data_salt, &BLOCK_KEY_INTEGRITY_VALUE),
        &hmac_value,
    )?;

    Ok(AgileDocument {
        spin_count,
        key_data_salt: secrets.key_data_salt.to_vec(),
        password_salt: secrets.password_salt.to_vec(),
        encrypted_verifier_input,
        encrypted_verifier_value,
        encrypted_key,
        encrypted_hmac_key,
        encrypted_hmac_value,
        package: encrypted_package,
    })
}

fn sha512(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

/// H0 = SHA512(salt + password), Hn = SHA512(LE32(n - 1) + Hn-1)
fn password_hash(password: &str, salt: &[u8], spin_count: u32) -> Vec<u8> {
    let utf16: Vec<u8> = password.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let mut hash = sha512(&[salt, &utf16]);
    for iteration in 0..spin_count {
        hash = sha512(&[&iteration.to_le_bytes(), &hash]);
    }
    hash
}

/// Key for one block key, truncated or 0x36-padded to the AES key size
fn derive_key(hash: &[u8], block_key: &[u8]) -> Vec<u8> {
    let mut key = sha512(&[hash, block_key]);
    key.resize(KEY_BYTES, 0x36);
    key
}

fn block_iv(salt: &[u8], block_key: &[u8]) -> Vec<u8> {
    let mut iv = sha512(&[salt, block_key]);
    iv.resize(BLOCK_BYTES, 0x36);
    iv
}

/// AES-256-CBC, zero-padding the input up to the block size
fn aes_cbc(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut padded = data.to_vec();
    let rem = padded.len() % BLOCK_BYTES;
    if rem != 0 {
        padded.resize(padded.len() + BLOCK_BYTES - rem, 0);
    }
    let cipher = Aes256CbcEnc::new_from_slices(key, iv).map_err(|e| Error::Encryption {
        message: format!("initialise AES-256-CBC: {e}"),
    })?;
    Ok(cipher.encrypt_padded_vec_mut::<NoPadding>(&padded))
}

/// LE64 plaintext length followed by independently encrypted 4096 byte segments
fn encrypt_segments(package: &[u8], key: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + package.len() + BLOCK_BYTES);
    out.extend_from_slice(&(package.len() as u64).to_le_bytes());
    for (index, segment) in package.chunks(SEGMENT_BYTES).enumerate() {
        let iv = block_iv(salt, &(index as u32).to_le_bytes());
        out.extend(aes_cbc(key, &iv, segment)?);
    }
    Ok(out)
}

impl AgileDocument {
    fn encryption_info(&self) -> Vec<u8> {
        let b64 = |bytes: &[u8]| general_purpose::STANDARD.encode(bytes);
        let cipher_params = format!(
            r#"saltSize="{SALT_BYTES}" blockSize="{BLOCK_BYTES}" keyBits="{}" hashSize="{HASH_BYTES}" cipherAlgorithm="AES" cipherChaining="ChainingModeCBC" hashAlgorithm="SHA512""#,
            KEY_BYTES * 8
        );
        let xml = format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
                "<encryption xmlns=\"http://schemas.microsoft.com/office/2006/encryption\" ",
                "xmlns:p=\"http://schemas.microsoft.com/office/2006/keyEncryptor/password\" ",
                "xmlns:c=\"http://schemas.microsoft.com/office/2006/keyEncryptor/certificate\">",
                "<keyData {params} saltValue=\"{key_salt}\"/>",
                "<dataIntegrity encryptedHmacKey=\"{hmac_key}\" encryptedHmacValue=\"{hmac_value}\"/>",
                "<keyEncryptors><keyEncryptor uri=\"http://schemas.microsoft.com/office/2006/keyEncryptor/password\">",
                "<p:encryptedKey spinCount=\"{spin}\" {params} saltValue=\"{password_salt}\" ",
                "encryptedVerifierHashInput=\"{verifier_input}\" encryptedVerifierHashValue=\"{verifier_value}\" ",
                "encryptedKeyValue=\"{key_value}\"/>",
                "</keyEncryptor></keyEncryptors></encryption>"
            ),
            params = cipher_params,
            key_salt = b64(&self.key_data_salt),
            hmac_key = b64(&self.encrypted_hmac_key),
            hmac_value = b64(&self.encrypted_hmac_value),
            spin = self.spin_count,
            password_salt = b64(&self.password_salt),
            verifier_input = b64(&self.encrypted_verifier_input),
            verifier_value = b64(&self.encrypted_verifier_value),
            key_value = b64(&self.encrypted_key),
        );

        let mut info = Vec::with_capacity(8 + xml.len());
        info.extend_from_slice(&4u16.to_le_bytes());
        info.extend_from_slice(&4u16.to_le_bytes());
        info.extend_from_slice(&0x40u32.to_le_bytes()); // fAgile
        info.extend_from_slice(xml.as_bytes());
        info
    }

    fn into_compound_file(self) -> Result<Vec<u8>> {
        let streams = [
            (format!("/{DATA_SPACES}/Version"), data_space_version()),
            (format!("/{DATA_SPACES}/DataSpaceMap"), data_space_map()),
            (
                format!("/{DATA_SPACES}/DataSpaceInfo/StrongEncryptionDataSpace"),
                data_space_definition(),
            ),
            (
                format!("/{DATA_SPACES}/TransformInfo/StrongEncryptionTransform/\u{6}Primary"),
                transform_info(),
            ),
            ("/EncryptionInfo".to_string(), self.encryption_info()),
            ("/EncryptedPackage".to_string(), self.package),
        ];
        write_compound_file(&streams).map_err(|e| Error::Encryption {
            message: format!("write compound file: {e}"),
        })
    }
}

fn write_compound_file(streams: &[(String, Vec<u8>)]) -> std::io::Result<Vec<u8>> {
    let mut file = cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))?;
    file.create_storage_all(format!("/{DATA_SPACES}/DataSpaceInfo"))?;
    file.create_storage_all(format!("/{DATA_SPACES}/TransformInfo/StrongEncryptionTransform"))?;
    for (path, bytes) in streams {
        let mut stream = file.create_stream(path)?;
        stream.write_all(bytes)?;
        stream.flush()?;
    }
    file.flush()?;
    Ok(file.into_inner().into_inner())
}

/// UNICODE-LP-P4: byte length, UTF-16LE code units, zero padding to a 4 byte boundary
fn push_unicode(out: &mut Vec<u8>, value: &str) {
    let units: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
    out.extend_from_slice(&(units.len() as u32).to_le_bytes());
    out.extend_from_slice(&units);
    out.resize(out.len() + (4 - units.len() % 4) % 4, 0);
}

/// Reader, updater and writer versions, all 1.0
fn push_versions(out: &mut Vec<u8>) {
    for _ in 0..3 {
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
    }
}

fn data_space_version() -> Vec<u8> {
    let mut out = Vec::new();
    push_unicode(&mut out, "Microsoft.Container.DataSpaces");
    push_versions(&mut out);
    out
}

fn data_space_map() -> Vec<u8> {
    let mut entry = Vec::new();
    entry.extend_from_slice(&1u32.to_le_bytes()); // reference component count
    entry.extend_from_slice(&0u32.to_le_bytes()); // component type: stream
    push_unicode(&mut entry, "EncryptedPackage");
    push_unicode(&mut entry, "StrongEncryptionDataSpace");

    let mut out = Vec::new();
    out.extend_from_slice(&8u32.to_le_bytes()); // header length
    out.extend_from_slice(&1u32.to_le_bytes()); // entry count
    out.extend_from_slice(&(entry.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(&entry);
    out
}

fn data_space_definition() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&8u32.to_le_bytes()); // header length
    out.extend_from_slice(&1u32.to_le_bytes()); // transform reference count
    push_unicode(&mut out, "StrongEncryptionTransform");
    out
}

fn transform_info() -> Vec<u8> {
    let mut id = Vec::new();
    push_unicode(&mut id, ENCRYPTION_TRANSFORM_ID);

    let mut out = Vec::new();
    // length of the header up to and including the transform id
    out.extend_from_slice(&(8 + id.len() as u32).to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // transform type
    out.extend_from_slice(&id);
    push_unicode(&mut out, "Microsoft.Container.EncryptionTransform");
    push_versions(&mut out);
    out.extend_from_slice(&0u32.to_le_bytes()); // empty encryption name
    out.extend_from_slice(&0u32.to_le_bytes()); // block size
    out.extend_from_slice(&0u32.to_le_bytes()); // cipher mode
    out.extend_from_slice(&4u32.to_le_bytes()); // reserved
    out
}
