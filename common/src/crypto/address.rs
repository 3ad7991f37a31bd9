use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    convert::TryInto,
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

use super::hash::{hash, Hash, HASH_SIZE};

pub const ADDRESS_SIZE: usize = HASH_SIZE;

/// Authenticated principal: an externally owned account or a deployed contract.
///
/// The host is responsible for proving that the caller controls the address;
/// the ledger and the engine only compare addresses.
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    pub const fn zero() -> Self {
        Address::new([0; ADDRESS_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    // Short form used in log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<Hash> for Address {
    fn from(value: Hash) -> Self {
        Address(value.to_bytes())
    }
}

/// Compute a deterministic contract address
///
/// Formula: address = blake3(0xff || deployer || label)
///
/// The ledger and the engine are both derived from the deployer so that the
/// engine can be wired into the ledger before any purchase is accepted.
pub fn contract_address(deployer: &Address, label: &[u8]) -> Address {
    let mut data = Vec::with_capacity(1 + ADDRESS_SIZE + label.len());
    data.push(0xff);
    data.extend_from_slice(deployer.as_bytes());
    data.extend_from_slice(label);
    hash(&data).into()
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| "Invalid address")?;
        Ok(Address::new(bytes))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        Address::from_str(&hex).map_err(SerdeError::custom)
    }
}
