//! Built-in network profiles and their deployed contract addresses.

use serde::Serialize;
use soulreg_types::Address;

use crate::{CliError, CliResult};

/// Addresses of the deployed registry contracts on one network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContractAddresses {
    pub sbt: Address,
    pub verifier: Address,
    pub auth: Address,
    pub reports: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NetworkProfile {
    pub key: &'static str,
    pub name: &'static str,
    pub chain_id: u64,
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
    pub contracts: ContractAddresses,
}

struct NetworkEntry {
    key: &'static str,
    name: &'static str,
    chain_id: u64,
    rpc_url: &'static str,
    explorer_url: &'static str,
    // sbt, verifier, auth, reports
    contracts: [&'static str; 4],
}

const NETWORKS: &[NetworkEntry] = &[
    NetworkEntry {
        key: "etherlink",
        name: "Etherlink Testnet",
        chain_id: 128123,
        rpc_url: "https://node.ghostnet.etherlink.com",
        explorer_url: "https://testnet.explorer.etherlink.com",
        contracts: [
            "0x1234567890123456789012345678901234567890",
            "0x1234567890123456789012345678901234567890",
            "0x1234567890123456789012345678901234567890",
            "0x1234567890123456789012345678901234567890",
        ],
    },
    NetworkEntry {
        key: "local",
        name: "Local Development",
        chain_id: 31337,
        rpc_url: "http://localhost:8545",
        explorer_url: "http://localhost:4000",
        contracts: [
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
            "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
            "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9",
        ],
    },
];

impl NetworkProfile {
    /// Look up a built-in profile by key, case-insensitively.
    pub fn lookup(key: &str) -> CliResult<Self> {
        let entry = NETWORKS
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| CliError::UnknownNetwork(key.to_string()))?;

        let [sbt, verifier, auth, reports] = entry.contracts;
        Ok(Self {
            key: entry.key,
            name: entry.name,
            chain_id: entry.chain_id,
            rpc_url: entry.rpc_url,
            explorer_url: entry.explorer_url,
            contracts: ContractAddresses {
                sbt: Address::parse(sbt)?,
                verifier: Address::parse(verifier)?,
                auth: Address::parse(auth)?,
                reports: Address::parse(reports)?,
            },
        })
    }

    pub fn keys() -> impl Iterator<Item = &'static str> {
        NETWORKS.iter().map(|entry| entry.key)
    }
}
