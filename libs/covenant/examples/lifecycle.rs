//! Walk a stake through split, accrual and redemption against a toy ledger
//!
//! ```bash
//! RUST_LOG=facet_covenant=debug cargo run -p facet-covenant --example lifecycle
//! ```

use anyhow::{Context as _, Result};
use ed25519_dalek::SigningKey;
use facet_codec::{Commitment, Facet};
use facet_config::FacetConfig;
use facet_covenant::{
    classify, key_hash, sign_admin, AdminAction, Deployment, Operation, TokenClass,
    TransitionValidator, TxContext,
};
use facet_types::{CategoryId, CodeHash, Destination, Outpoint, Output, TxId, Utxo};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Ledger {
    validator: TransitionValidator,
    utxos: Vec<Utxo>,
    sequence: u32,
    now: u32,
}

impl Ledger {
    fn txid(&mut self) -> TxId {
        self.sequence += 1;
        let mut bytes = [0u8; 32];
        bytes[..4].copy_from_slice(&self.sequence.to_be_bytes());
        TxId::new(bytes)
    }

    fn coin(&mut self, value: u64) -> Utxo {
        let txid = self.txid();
        Utxo::new(Outpoint::new(txid, 0), Output::payment(wallet(), value))
    }

    fn submit(&mut self, op: &Operation, state: Vec<Utxo>, funding: Vec<Utxo>) -> Result<()> {
        let ctx = TxContext {
            now: self.now,
            fee: 500,
            funding,
            change: wallet(),
        };
        let tx = self
            .validator
            .construct(op, &state, &ctx)
            .with_context(|| format!("constructing {}", op.name()))?;
        self.validator.verify(op, &tx, self.now)?;

        self.utxos
            .retain(|utxo| !tx.inputs.iter().any(|input| input.outpoint == utxo.outpoint));
        let txid = self.txid();
        for (vout, output) in tx.outputs.into_iter().enumerate() {
            self.utxos.push(Utxo::new(Outpoint::new(txid, vout as u32), output));
        }
        info!(operation = op.name(), now = self.now, "Applied");
        Ok(())
    }

    fn find(&self, want: impl Fn(&TokenClass) -> bool) -> Result<Utxo> {
        self.utxos
            .iter()
            .find(|utxo| {
                classify(self.validator.deployment(), &utxo.output)
                    .map(|class| want(&class))
                    .unwrap_or(false)
            })
            .cloned()
            .context("token not found")
    }

    fn registry(&self, facet: Facet) -> Result<Utxo> {
        self.find(|class| matches!(class, TokenClass::Registry { facet: f, .. } if *f == facet))
    }

    fn state(&self, pick: fn(&Commitment) -> bool) -> Result<Utxo> {
        self.find(|class| matches!(class, TokenClass::State { commitment, .. } if pick(commitment)))
    }
}

fn wallet() -> Destination {
    Destination::holder(vec![0x76, 0xa9, 0x14])
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let admin = SigningKey::from_bytes(&[9; 32]);
    let mut config = FacetConfig::default();
    config.admin.key_hash = key_hash(&admin.verifying_key().to_bytes()).to_hex();
    let genesis: Vec<CategoryId> = (1..=6u8).map(|i| CategoryId::new([0xa0 + i; 32])).collect();
    config.categories.staking = genesis[0].to_hex();
    config.categories.principal = genesis[1].to_hex();
    config.categories.yield_token = genesis[2].to_hex();
    config.categories.pool = genesis[3].to_hex();
    config.categories.options = genesis[4].to_hex();
    config.categories.oracle = genesis[5].to_hex();
    config.categories.quote = CategoryId::new([0xb0; 32]).to_hex();
    config.categories.oracle_asset = CategoryId::new([0xb1; 32]).to_hex();
    config.options.writer = "76a914".to_string();

    let deployment = Deployment::from_config(&config)?;
    let schedule = deployment.params.schedule;
    let mut ledger = Ledger {
        validator: TransitionValidator::new(deployment),
        utxos: Vec::new(),
        sequence: 0,
        now: 1_700_000_000,
    };

    for (facet, category) in Facet::ALL.into_iter().zip(&genesis) {
        let funding = Utxo::new(
            Outpoint::new(TxId::new(category.into_inner()), 0),
            Output::payment(wallet(), 100_000),
        );
        let code_hash = CodeHash::new([facet.id(); 32]);
        let auth = sign_admin(&admin, &funding.outpoint, &AdminAction::Deploy { facet, code_hash });
        ledger.submit(
            &Operation::Deploy {
                facet,
                code_hash,
                auth,
            },
            vec![],
            vec![funding],
        )?;
    }

    let coin = ledger.coin(1_000_000);
    ledger.submit(
        &Operation::FundReserve {
            facet: Facet::Yield,
            amount: 500_000,
        },
        vec![ledger.registry(Facet::Yield)?],
        vec![coin],
    )?;

    let coin = ledger.coin(1_000_000);
    ledger.submit(
        &Operation::Stake {
            amount: 250_000,
            holder: wallet(),
        },
        vec![ledger.registry(Facet::Staking)?],
        vec![coin],
    )?;

    let expiry = ledger.now + schedule.term;
    let receipt = ledger.state(|c| matches!(c, Commitment::StakeReceipt(_)))?;
    let coin = ledger.coin(10_000);
    ledger.submit(
        &Operation::Split {
            expiry,
            holder: wallet(),
        },
        vec![
            receipt,
            ledger.registry(Facet::Staking)?,
            ledger.registry(Facet::Principal)?,
            ledger.registry(Facet::Yield)?,
        ],
        vec![coin],
    )?;

    ledger.now = expiry - schedule.term / 2;
    let yt = ledger.state(|c| matches!(c, Commitment::Yield(_)))?;
    let coin = ledger.coin(10_000);
    ledger.submit(
        &Operation::ClaimYield { holder: wallet() },
        vec![yt, ledger.registry(Facet::Yield)?],
        vec![coin],
    )?;
    let yt = ledger.state(|c| matches!(c, Commitment::Yield(_)))?;
    if let Ok(TokenClass::State {
        commitment: Commitment::Yield(token),
        ..
    }) = classify(ledger.validator.deployment(), &yt.output)
    {
        info!(accrued = token.accrued, expiry = token.expiry, "Yield recorded at half term");
    }

    ledger.now = expiry;
    let pt = ledger.state(|c| matches!(c, Commitment::Principal(_)))?;
    let coin = ledger.coin(10_000);
    ledger.submit(
        &Operation::RedeemPrincipal { payout: wallet() },
        vec![pt, ledger.registry(Facet::Principal)?],
        vec![coin],
    )?;
    let coin = ledger.coin(10_000);
    ledger.submit(
        &Operation::ClaimYield { holder: wallet() },
        vec![yt, ledger.registry(Facet::Yield)?],
        vec![coin],
    )?;

    let remaining = ledger.validator.deployment().params.token_dust;
    info!(
        yield_reserve = ledger.registry(Facet::Yield)?.output.value - remaining,
        full_term = schedule.full_term_yield()?,
        "Lifecycle complete"
    );
    Ok(())
}
