//! Shared harness: a deployed family of facets over a toy ledger
//!
//! Every transaction is built with `construct`, re-checked with `verify` and
//! then applied, so each test exercises both directions.

#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use facet_codec::{Commitment, CommitmentKind, Facet};
use facet_config::{FacetConfig, MergePolicy, YieldConfig};
use facet_covenant::{
    classify, key_hash, sign_admin, AdminAction, AdminAuthorization, Deployment, Operation,
    TokenClass, TransitionValidator, TxContext,
};
use facet_types::{
    CategoryId, CodeHash, CovenantResult, Destination, Outpoint, Output, TokenData, Transaction,
    TxId, Utxo,
};

pub const START: u32 = 400_000;
pub const EXPIRY: u32 = 500_000;
pub const TERM: u32 = 86_400;
pub const RATE_BPS: u32 = 100;
pub const FEE: u64 = 300;
pub const COLLATERAL: u64 = 100_000;

pub fn holder(tag: u8) -> Destination {
    Destination::Holder(vec![0x76, 0xa9, tag])
}

pub fn writer() -> Destination {
    Destination::Holder(vec![0x76, 0xa9, 0xee])
}

pub fn change() -> Destination {
    holder(0xcc)
}

pub fn category(facet: Facet) -> CategoryId {
    CategoryId::new([0x10 + facet.id(); 32])
}

pub fn quote() -> CategoryId {
    CategoryId::new([0x70; 32])
}

pub fn oracle_asset() -> CategoryId {
    CategoryId::new([0x80; 32])
}

pub fn config(dust: u64, policy: MergePolicy) -> FacetConfig {
    let admin = admin_key();
    let mut config = FacetConfig::default();
    config.ledger.token_dust = dust;
    config.admin.key_hash = key_hash(&admin.verifying_key().to_bytes()).to_hex();
    config.categories.staking = category(Facet::Staking).to_hex();
    config.categories.principal = category(Facet::Principal).to_hex();
    config.categories.yield_token = category(Facet::Yield).to_hex();
    config.categories.pool = category(Facet::Pool).to_hex();
    config.categories.options = category(Facet::Options).to_hex();
    config.categories.oracle = category(Facet::Oracle).to_hex();
    config.categories.quote = quote().to_hex();
    config.categories.oracle_asset = oracle_asset().to_hex();
    config.staking.min_stake = 1_000;
    config.accrual = YieldConfig {
        rate_bps: RATE_BPS,
        term_secs: TERM,
        merge_policy: policy,
    };
    config.amm.fee_bps = 30;
    config.options.collateral_per_contract = COLLATERAL;
    config.options.writer = "76a9ee".to_string();
    config.oracle.max_price_age_secs = 600;
    config
}

pub fn admin_key() -> SigningKey {
    SigningKey::from_bytes(&[0x5a; 32])
}

pub struct Harness {
    pub validator: TransitionValidator,
    pub admin: SigningKey,
    pub utxos: Vec<Utxo>,
    pub now: u32,
    pub history: Vec<Transaction>,
    counter: u32,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(0, MergePolicy::Payout)
    }

    pub fn with(dust: u64, policy: MergePolicy) -> Self {
        let deployment = Deployment::from_config(&config(dust, policy)).unwrap();
        Self::from_deployment(deployment)
    }

    pub fn from_deployment(deployment: Deployment) -> Self {
        let mut harness = Self {
            validator: TransitionValidator::new(deployment),
            admin: admin_key(),
            utxos: Vec::new(),
            now: START,
            history: Vec::new(),
            counter: 0,
        };
        for facet in Facet::ALL {
            harness.deploy(facet);
        }
        harness
    }

    pub fn deployment(&self) -> &Deployment {
        self.validator.deployment()
    }

    pub fn dust(&self) -> u64 {
        self.deployment().params.token_dust
    }

    fn next_txid(&mut self) -> TxId {
        self.counter += 1;
        let mut bytes = [0xe0; 32];
        bytes[28..].copy_from_slice(&self.counter.to_be_bytes());
        TxId::new(bytes)
    }

    /// Plain coin outside the tracked ledger
    pub fn coin(&mut self, value: u64) -> Utxo {
        let txid = self.next_txid();
        Utxo::new(Outpoint::new(txid, 0), Output::payment(holder(0xf0), value))
    }

    /// Quote-token coin outside the tracked ledger
    pub fn quote_coin(&mut self, amount: u64) -> Utxo {
        let txid = self.next_txid();
        Utxo::new(
            Outpoint::new(txid, 0),
            Output::with_token(holder(0xf0), 0, TokenData::fungible(quote(), amount)),
        )
    }

    pub fn sign(&self, bound: &Outpoint, action: &AdminAction) -> AdminAuthorization {
        sign_admin(&self.admin, bound, action)
    }

    fn deploy(&mut self, facet: Facet) {
        let code_hash = CodeHash::new([facet.id(); 32]);
        let genesis = Utxo::new(
            Outpoint::new(TxId::new(category(facet).into_inner()), 0),
            Output::payment(holder(0xf0), 1_000_000),
        );
        let auth = self.sign(&genesis.outpoint, &AdminAction::Deploy { facet, code_hash });
        let op = Operation::Deploy {
            facet,
            code_hash,
            auth,
        };
        self.submit_funded(&op, vec![], vec![genesis]).unwrap();
    }

    pub fn context(&self, funding: Vec<Utxo>) -> TxContext {
        TxContext {
            now: self.now,
            fee: FEE,
            funding,
            change: change(),
        }
    }

    /// Construct, verify and apply with an explicit funding set
    pub fn submit_funded(
        &mut self,
        op: &Operation,
        state_inputs: Vec<Utxo>,
        funding: Vec<Utxo>,
    ) -> CovenantResult<Transaction> {
        let tx = self
            .validator
            .construct(op, &state_inputs, &self.context(funding))?;
        self.validator.verify(op, &tx, self.now)?;
        self.apply(&tx);
        Ok(tx)
    }

    /// Construct, verify and apply, funded by a fresh large coin
    pub fn submit(&mut self, op: &Operation, state_inputs: Vec<Utxo>) -> CovenantResult<Transaction> {
        let coin = self.coin(10_000_000);
        self.submit_funded(op, state_inputs, vec![coin])
    }

    pub fn apply(&mut self, tx: &Transaction) {
        self.utxos
            .retain(|utxo| !tx.inputs.iter().any(|input| input.outpoint == utxo.outpoint));
        let txid = self.next_txid();
        for (vout, output) in tx.outputs.iter().enumerate() {
            self.utxos
                .push(Utxo::new(Outpoint::new(txid, vout as u32), output.clone()));
        }
        self.history.push(tx.clone());
    }

    pub fn registry(&self, facet: Facet) -> Utxo {
        self.utxos
            .iter()
            .find(|utxo| {
                matches!(
                    classify(self.deployment(), &utxo.output),
                    Ok(TokenClass::Registry { facet: f, .. }) if f == facet
                )
            })
            .cloned()
            .expect("registry deployed")
    }

    pub fn reserve(&self, facet: Facet) -> u64 {
        self.registry(facet).output.value - self.dust()
    }

    pub fn tokens(&self, kind: CommitmentKind) -> Vec<(Utxo, Commitment)> {
        self.utxos
            .iter()
            .filter_map(|utxo| match classify(self.deployment(), &utxo.output) {
                Ok(TokenClass::State { commitment, .. }) if commitment.kind() == kind => {
                    Some((utxo.clone(), commitment))
                }
                _ => None,
            })
            .collect()
    }

    pub fn token(&self, kind: CommitmentKind) -> (Utxo, Commitment) {
        let mut found = self.tokens(kind);
        assert_eq!(found.len(), 1, "expected exactly one {} token", kind);
        found.remove(0)
    }

    pub fn vault(&self) -> Option<Utxo> {
        self.utxos
            .iter()
            .find(|utxo| {
                matches!(
                    classify(self.deployment(), &utxo.output),
                    Ok(TokenClass::QuoteVault { .. })
                )
            })
            .cloned()
    }

    /// Native value paid to `destination` by the most recent transaction, state tokens excluded
    pub fn paid_to(&self, destination: &Destination) -> u64 {
        self.history
            .last()
            .map(|tx| {
                tx.outputs
                    .iter()
                    .filter(|output| output.destination == *destination && output.nft().is_none())
                    .map(|output| output.value)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Quote tokens paid to `destination` by the most recent transaction
    pub fn quote_paid_to(&self, destination: &Destination) -> u64 {
        self.history
            .last()
            .map(|tx| {
                tx.outputs
                    .iter()
                    .filter(|output| output.destination == *destination)
                    .map(|output| output.fungible_amount(&quote()))
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn stake(&mut self, amount: u64, who: Destination) -> Utxo {
        let op = Operation::Stake {
            amount,
            holder: who,
        };
        let registry = self.registry(Facet::Staking);
        self.submit(&op, vec![registry]).unwrap();
        self.tokens(CommitmentKind::StakeReceipt)
            .into_iter()
            .last()
            .map(|(utxo, _)| utxo)
            .unwrap()
    }

    pub fn fund(&mut self, facet: Facet, amount: u64) {
        let registry = self.registry(facet);
        self.submit(&Operation::FundReserve { facet, amount }, vec![registry])
            .unwrap();
    }

    pub fn pool_inputs(&self) -> Vec<Utxo> {
        let mut inputs = vec![
            self.registry(Facet::Pool),
            self.token(CommitmentKind::PoolState).0,
        ];
        inputs.extend(self.vault());
        inputs
    }

    pub fn split_inputs(&self, receipt: Utxo) -> Vec<Utxo> {
        vec![
            receipt,
            self.registry(Facet::Staking),
            self.registry(Facet::Principal),
            self.registry(Facet::Yield),
        ]
    }
}
