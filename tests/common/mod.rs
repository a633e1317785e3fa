//! Shared JSON-RPC node double for the workflow tests.
//!
//! [`MockNode`] mounts a stateful responder on a wiremock server and
//! answers the `eth_*` methods the library touches: chain id, block and
//! balance reads, fee queries, raw broadcast, receipts, and `eth_call`
//! against a single counter contract slot. Broadcasts advance the
//! account nonce, and increment transactions bump the stored counter,
//! so tests can assert on state transitions instead of canned replies.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use ethers::utils::{hex, id, keccak256};
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Chain id the node reports, matching the usual dev-chain default.
pub const DEV_CHAIN_ID: u64 = 31_337;
/// Height of the head block.
pub const HEAD_BLOCK: u64 = 18;
/// Base fee carried by every block.
pub const BASE_FEE_WEI: u64 = 1_000_000_000;
/// Priority reward reported for every fee-history percentile.
pub const PRIORITY_REWARD_WEI: u64 = 2_000_000_000;
/// Gas price suggested by `eth_gasPrice`.
pub const GAS_PRICE_WEI: u64 = 1_000_000_000;
/// Gas returned by `eth_estimateGas`.
pub const GAS_ESTIMATE: u64 = 30_000;
/// Address assigned to contract deployments.
pub const COUNTER_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
/// One ether in wei.
pub const ONE_ETH_WEI: u128 = 1_000_000_000_000_000_000;

const ZERO_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
const SENDER_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const RECIPIENT_ADDRESS: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
/// Start of the bundled Counter creation code, used to spot deployments
/// inside signed payloads.
const CREATION_MARKER: &str = "603f80600b6000396000f3";

/// Mutable node state plus the knobs a test can turn.
pub struct RpcState {
    chain_id: u64,
    balance_wei: u128,
    mine_status: u64,
    withhold_receipts: bool,
    nonce: AtomicU64,
    stored_count: AtomicU64,
    deploys: Mutex<Vec<String>>,
}

impl RpcState {
    /// A funded account on a healthy dev chain.
    pub fn new() -> Self {
        Self {
            chain_id: DEV_CHAIN_ID,
            balance_wei: 10 * ONE_ETH_WEI,
            mine_status: 1,
            withhold_receipts: false,
            nonce: AtomicU64::new(0),
            stored_count: AtomicU64::new(0),
            deploys: Mutex::new(Vec::new()),
        }
    }

    /// Sets the balance every `eth_getBalance` reports.
    pub fn with_balance_wei(mut self, balance_wei: u128) -> Self {
        self.balance_wei = balance_wei;
        self
    }

    /// Sets the status flag receipts are mined with (0 reverts).
    pub fn with_mine_status(mut self, status: u64) -> Self {
        self.mine_status = status;
        self
    }

    /// Makes `eth_getTransactionReceipt` always answer null.
    pub fn withholding_receipts(mut self) -> Self {
        self.withhold_receipts = true;
        self
    }

    fn accept_raw_transaction(&self, params: &Value) -> Value {
        let raw = params.get(0).and_then(Value::as_str).unwrap_or("0x");
        let bytes = hex::decode(raw.trim_start_matches("0x")).unwrap_or_default();
        let tx_hash = format!("0x{}", hex::encode(keccak256(&bytes)));

        // The creation code embeds the increment selector in its runtime
        // half, so classify deployments before looking for calls.
        let payload = hex::encode(&bytes);
        if payload.contains(CREATION_MARKER) {
            self.deploys.lock().unwrap().push(tx_hash.clone());
        } else if self.mine_status == 1 && payload.contains(&hex::encode(id("increment()"))) {
            self.stored_count.fetch_add(1, Ordering::SeqCst);
        }

        self.nonce.fetch_add(1, Ordering::SeqCst);
        json!(tx_hash)
    }

    fn transaction_response(&self, params: &Value) -> Value {
        let tx_hash = params.get(0).and_then(Value::as_str).unwrap_or(ZERO_HASH);
        json!({
            "hash": tx_hash,
            "nonce": "0x0",
            "blockHash": block_hash(HEAD_BLOCK),
            "blockNumber": hex_u64(HEAD_BLOCK),
            "transactionIndex": "0x0",
            "from": SENDER_ADDRESS,
            "to": Value::Null,
            "value": "0x0",
            "gas": hex_u64(GAS_ESTIMATE),
            "gasPrice": hex_u64(GAS_PRICE_WEI),
            "input": "0x",
            "v": "0x1",
            "r": "0x1",
            "s": "0x1",
            "type": "0x2",
            "chainId": hex_u64(self.chain_id),
            "maxFeePerGas": hex_u64(2 * BASE_FEE_WEI + PRIORITY_REWARD_WEI),
            "maxPriorityFeePerGas": hex_u64(PRIORITY_REWARD_WEI),
            "accessList": []
        })
    }

    fn receipt_response(&self, params: &Value) -> Value {
        if self.withhold_receipts {
            return Value::Null;
        }

        let tx_hash = params.get(0).and_then(Value::as_str).unwrap_or(ZERO_HASH);
        let is_deploy = self.deploys.lock().unwrap().iter().any(|h| h == tx_hash);
        json!({
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": block_hash(HEAD_BLOCK),
            "blockNumber": hex_u64(HEAD_BLOCK),
            "from": SENDER_ADDRESS,
            "to": if is_deploy { Value::Null } else { json!(RECIPIENT_ADDRESS) },
            "cumulativeGasUsed": hex_u64(21_000),
            "gasUsed": hex_u64(21_000),
            "contractAddress": if is_deploy { json!(COUNTER_ADDRESS) } else { Value::Null },
            "logs": [],
            "status": hex_u64(self.mine_status),
            "logsBloom": zero_bloom(),
            "type": "0x2",
            "effectiveGasPrice": hex_u64(BASE_FEE_WEI + PRIORITY_REWARD_WEI)
        })
    }

    fn call_response(&self, params: &Value) -> Value {
        let data = params
            .get(0)
            .and_then(|tx| tx.get("data"))
            .and_then(Value::as_str)
            .unwrap_or("0x");

        if data
            .trim_start_matches("0x")
            .starts_with(&hex::encode(id("getCount()")))
        {
            json!(format!("0x{:064x}", self.stored_count.load(Ordering::SeqCst)))
        } else {
            json!("0x")
        }
    }
}

impl Default for RpcState {
    fn default() -> Self {
        Self::new()
    }
}

impl Respond for RpcState {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let request_id = body.get("id").cloned().unwrap_or_else(|| json!(1));
        let rpc_method = body.get("method").and_then(Value::as_str).unwrap_or_default();
        let params = body.get("params").cloned().unwrap_or_else(|| json!([]));

        let result = match rpc_method {
            "eth_chainId" => json!(hex_u64(self.chain_id)),
            "eth_blockNumber" => json!(hex_u64(HEAD_BLOCK)),
            "eth_getBlockByNumber" => block_response(&params),
            "eth_getBalance" => json!(format!("{:#x}", self.balance_wei)),
            "eth_getTransactionCount" => json!(hex_u64(self.nonce.load(Ordering::SeqCst))),
            "eth_gasPrice" => json!(hex_u64(GAS_PRICE_WEI)),
            "eth_feeHistory" => fee_history_response(),
            "eth_estimateGas" => json!(hex_u64(GAS_ESTIMATE)),
            "eth_sendRawTransaction" => self.accept_raw_transaction(&params),
            "eth_getTransactionByHash" => self.transaction_response(&params),
            "eth_getTransactionReceipt" => self.receipt_response(&params),
            "eth_call" => self.call_response(&params),
            other => {
                let error = json!({
                    "jsonrpc": "2.0",
                    "id": request_id,
                    "error": { "code": -32601, "message": format!("method {other} not found") }
                });
                return ResponseTemplate::new(200).set_body_json(error);
            }
        };

        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "result": result
        }))
    }
}

/// A wiremock server answering JSON-RPC with [`RpcState`].
pub struct MockNode {
    server: MockServer,
}

impl MockNode {
    /// Starts a node with default state.
    pub async fn start() -> Self {
        Self::with_state(RpcState::new()).await
    }

    /// Starts a node with the given state.
    pub async fn with_state(state: RpcState) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(state)
            .mount(&server)
            .await;
        Self { server }
    }

    /// HTTP endpoint URL of the node.
    pub fn url(&self) -> String {
        self.server.uri()
    }
}

/// Timestamp carried by the block at the given height.
pub fn block_timestamp(number: u64) -> u64 {
    1_700_000_000 + number * 12
}

fn hex_u64(value: u64) -> String {
    format!("{value:#x}")
}

fn block_hash(number: u64) -> String {
    format!("0x{:064x}", 0xb10c_0000_u64 + number)
}

fn zero_bloom() -> String {
    format!("0x{}", "0".repeat(512))
}

fn block_response(params: &Value) -> Value {
    let number = params.get(0).and_then(Value::as_str).map_or(HEAD_BLOCK, |tag| {
        u64::from_str_radix(tag.trim_start_matches("0x"), 16).unwrap_or(HEAD_BLOCK)
    });

    json!({
        "number": hex_u64(number),
        "hash": block_hash(number),
        "parentHash": block_hash(number.saturating_sub(1)),
        "sha3Uncles": ZERO_HASH,
        "miner": ZERO_ADDRESS,
        "stateRoot": ZERO_HASH,
        "transactionsRoot": ZERO_HASH,
        "receiptsRoot": ZERO_HASH,
        "logsBloom": zero_bloom(),
        "difficulty": "0x0",
        "totalDifficulty": "0x0",
        "extraData": "0x",
        "size": "0x220",
        "gasLimit": hex_u64(30_000_000),
        "gasUsed": hex_u64(12_500_000),
        "timestamp": hex_u64(block_timestamp(number)),
        "baseFeePerGas": hex_u64(BASE_FEE_WEI),
        "mixHash": ZERO_HASH,
        "nonce": "0x0000000000000000",
        "uncles": [],
        "transactions": [block_hash(0xaa), block_hash(0xbb)]
    })
}

fn fee_history_response() -> Value {
    let base_fee = hex_u64(BASE_FEE_WEI);
    let reward = hex_u64(PRIORITY_REWARD_WEI);
    json!({
        "oldestBlock": hex_u64(HEAD_BLOCK - 3),
        "baseFeePerGas": [base_fee, base_fee, base_fee, base_fee],
        "gasUsedRatio": [0.42, 0.51, 0.39],
        "reward": [[reward], [reward], [reward]]
    })
}
