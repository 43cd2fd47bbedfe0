use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use md5::{Digest, Md5};
use zeroize::Zeroizing;

use crate::error::KeyError;

pub(crate) const PROC_TYPE_HEADER: &str = "Proc-Type";
pub(crate) const DEK_INFO_HEADER: &str = "DEK-Info";

/// Ciphers OpenSSL uses for traditional (`Proc-Type: 4,ENCRYPTED`) PEM keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DekCipher {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
    DesEde3Cbc,
}

impl DekCipher {
    fn from_name(name: &str) -> Result<Self, KeyError> {
        match name.to_ascii_uppercase().as_str() {
            "AES-128-CBC" => Ok(DekCipher::Aes128Cbc),
            "AES-192-CBC" => Ok(DekCipher::Aes192Cbc),
            "AES-256-CBC" => Ok(DekCipher::Aes256Cbc),
            "DES-EDE3-CBC" => Ok(DekCipher::DesEde3Cbc),
            other => Err(KeyError::UnsupportedEncryption(format!(
                "PEM encryption cipher `{other}`"
            ))),
        }
    }

    fn key_len(self) -> usize {
        match self {
            DekCipher::Aes128Cbc => 16,
            DekCipher::Aes192Cbc | DekCipher::DesEde3Cbc => 24,
            DekCipher::Aes256Cbc => 32,
        }
    }

    /// Block size, which is also the IV length.
    fn block_len(self) -> usize {
        match self {
            DekCipher::DesEde3Cbc => 8,
            _ => 16,
        }
    }
}

/// Whether a PEM block carries OpenSSL's traditional encryption headers.
pub(crate) fn is_encrypted(block: &pem::Pem) -> bool {
    block
        .headers()
        .get(PROC_TYPE_HEADER)
        .is_some_and(|proc_type| proc_type.contains("ENCRYPTED"))
}

/// Decrypts the contents of a traditional encrypted PEM block.
///
/// The key is derived with OpenSSL's `EVP_BytesToKey` (MD5, one round, the
/// first 8 bytes of the IV as salt). A bad padding block means the password
/// was wrong.
pub(crate) fn decrypt(block: &pem::Pem, password: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let dek_info = block.headers().get(DEK_INFO_HEADER).ok_or_else(|| {
        KeyError::InvalidFormat("encrypted PEM block without a DEK-Info header".to_string())
    })?;
    let (name, iv_hex) = dek_info
        .split_once(',')
        .ok_or_else(|| KeyError::InvalidFormat(format!("malformed DEK-Info `{dek_info}`")))?;

    let cipher = DekCipher::from_name(name.trim())?;
    let iv = hex::decode(iv_hex.trim())
        .map_err(|e| KeyError::InvalidFormat(format!("DEK-Info IV: {e}")))?;
    if iv.len() != cipher.block_len() {
        return Err(KeyError::InvalidFormat(format!(
            "DEK-Info IV is {} bytes, expected {}",
            iv.len(),
            cipher.block_len()
        )));
    }
    if block.contents().is_empty() || block.contents().len() % cipher.block_len() != 0 {
        return Err(KeyError::InvalidFormat(
            "encrypted PEM body is not a whole number of cipher blocks".to_string(),
        ));
    }

    let key = bytes_to_key(password.as_bytes(), &iv[..8], cipher.key_len());
    let mut buf = Zeroizing::new(block.contents().to_vec());
    let len = match cipher {
        DekCipher::Aes128Cbc => cbc_decrypt::<cbc::Decryptor<aes::Aes128>>(&key, &iv, &mut buf)?,
        DekCipher::Aes192Cbc => cbc_decrypt::<cbc::Decryptor<aes::Aes192>>(&key, &iv, &mut buf)?,
        DekCipher::Aes256Cbc => cbc_decrypt::<cbc::Decryptor<aes::Aes256>>(&key, &iv, &mut buf)?,
        DekCipher::DesEde3Cbc => {
            cbc_decrypt::<cbc::Decryptor<des::TdesEde3>>(&key, &iv, &mut buf)?
        }
    };
    buf.truncate(len);
    Ok(buf)
}

fn cbc_decrypt<D>(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<usize, KeyError>
where
    D: KeyIvInit + BlockDecryptMut,
{
    let decryptor = D::new_from_slices(key, iv)
        .map_err(|e| KeyError::InvalidFormat(format!("PEM cipher setup: {e}")))?;
    decryptor
        .decrypt_padded_mut::<Pkcs7>(buf)
        .map(|plain| plain.len())
        .map_err(|_| KeyError::WrongPassword)
}

/// `EVP_BytesToKey` with MD5 and a single iteration.
fn bytes_to_key(password: &[u8], salt: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(len + 16));
    while key.len() < len {
        let mut md5 = Md5::new();
        // D_i = MD5(D_{i-1} || password || salt)
        md5.update(&key[key.len().saturating_sub(16)..]);
        md5.update(password);
        md5.update(salt);
        key.extend_from_slice(&md5.finalize());
    }
    key.truncate(len);
    key
}
