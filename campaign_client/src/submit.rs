//! Create-campaign submission: fund if low, build, send, confirm.

use std::{fmt, future::Future, sync::Arc};

use campaign_core::{
    create_campaign_instruction, CampaignFields, CampaignRecord, DerivedAddress, WireLayout,
};
use solana_sdk::{
    instruction::Instruction, packet::PACKET_DATA_SIZE, pubkey::Pubkey, signature::Signature,
    signer::Signer, transaction::Transaction,
};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    transport::{ConfirmationStatus, LedgerTransport},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Init,
    CheckFunds,
    FundIfLow,
    Submit,
    AwaitConfirm,
    Done,
    Failed,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::CheckFunds => "check-funds",
            Self::FundIfLow => "fund-if-low",
            Self::Submit => "submit",
            Self::AwaitConfirm => "await-confirm",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of a confirmed create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub signature: Signature,
    pub address: Pubkey,
    pub bump: u8,
    /// Whether the signer had to be topped up first.
    pub funded: bool,
}

/// Races `fut` against the caller's token.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    stage: SubmissionStage,
    fut: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log::warn!("submission cancelled during {}", stage);
            Err(ClientError::Cancelled { stage })
        }
        out = fut => Ok(out),
    }
}

/// Drives one create request at a time through the submission stages.
///
/// Holds no state between calls: a failed or cancelled attempt is retried by
/// calling again, which starts over from `Init`.
pub struct Submitter<T, S> {
    transport: Arc<T>,
    signer: S,
    config: ClientConfig,
}

impl<T, S> Submitter<T, S>
where
    T: LedgerTransport,
    S: Signer,
{
    pub fn new(transport: Arc<T>, signer: S, config: ClientConfig) -> Self {
        Self {
            transport,
            signer,
            config,
        }
    }

    pub fn payer(&self) -> Pubkey {
        self.signer.pubkey()
    }

    pub fn program_id(&self) -> Pubkey {
        self.config.program_id
    }

    /// Builds the create instruction without touching the network.
    pub fn prepare(&self, fields: &CampaignFields) -> Result<(Instruction, DerivedAddress)> {
        Ok(create_campaign_instruction(
            fields,
            &self.payer(),
            &self.config.program_id,
        )?)
    }

    /// Runs one create request to `Done`, including the `consistency_wait`
    /// pause after confirmation.
    pub async fn submit_create(
        &self,
        fields: &CampaignFields,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt> {
        let result = self.run(fields, cancel).await;
        if let Err(e) = &result {
            log::debug!("campaign `{}` -> {}: {}", fields.title, SubmissionStage::Failed, e);
        }
        result
    }

    async fn run(
        &self,
        fields: &CampaignFields,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt> {
        let payer = self.payer();
        log::debug!("campaign `{}` -> {}", fields.title, SubmissionStage::Init);

        // codec and address errors surface before any network traffic
        let (ix, derived) = self.prepare(fields)?;
        log::info!(
            "creating campaign `{}` at {} (bump {})",
            fields.title,
            derived.address,
            derived.bump
        );

        let funded = self.ensure_funded(&payer, cancel).await?;

        log::debug!("campaign `{}` -> {}", fields.title, SubmissionStage::Submit);
        let blockhash =
            cancellable(cancel, SubmissionStage::Submit, self.transport.latest_blockhash()).await??;
        let transaction =
            Transaction::new_signed_with_payer(&[ix], Some(&payer), &[&self.signer], blockhash);
        check_size(&transaction)?;

        let expected = transaction.signatures[0];
        let signature = match cancellable(
            cancel,
            SubmissionStage::Submit,
            self.transport.send_transaction(&transaction),
        )
        .await?
        {
            Ok(signature) => signature,
            Err(e) => {
                return Err(ClientError::SubmissionFailed {
                    signature: expected,
                    reason: format!("{e:#}"),
                })
            }
        };
        log::info!("sent transaction {}", signature);

        log::debug!("campaign `{}` -> {}", fields.title, SubmissionStage::AwaitConfirm);
        self.await_confirmation(&signature, SubmissionStage::AwaitConfirm, cancel)
            .await?;

        log::debug!("campaign `{}` -> {}", fields.title, SubmissionStage::Done);
        log::info!("campaign `{}` confirmed in {}", fields.title, signature);

        // best effort: reads right after this may still miss the account
        let wait = self.config.consistency_wait();
        if !wait.is_zero() {
            log::debug!("waiting {:?} before reading {}", wait, derived.address);
            cancellable(cancel, SubmissionStage::Done, sleep(wait)).await?;
        }

        Ok(SubmissionReceipt {
            signature,
            address: derived.address,
            bump: derived.bump,
            funded,
        })
    }

    /// Submits, then reads the account back once the consistency window in
    /// [`Self::submit_create`] has passed.
    ///
    /// `None` means the account was not visible yet, not that the write failed.
    pub async fn create_and_fetch(
        &self,
        fields: &CampaignFields,
        cancel: &CancellationToken,
    ) -> Result<(SubmissionReceipt, Option<CampaignRecord>)> {
        let receipt = self.submit_create(fields, cancel).await?;

        let data = cancellable(
            cancel,
            SubmissionStage::Done,
            self.transport.get_account_data(&receipt.address),
        )
        .await??;

        let record = match data {
            Some(data) => Some(CampaignRecord::decode(&data)?.0),
            None => {
                log::warn!(
                    "{} not visible after {:?}",
                    receipt.address,
                    self.config.consistency_wait()
                );
                None
            }
        };
        Ok((receipt, record))
    }

    /// Tops the payer up once when under `min_balance`. Returns whether it did.
    async fn ensure_funded(&self, payer: &Pubkey, cancel: &CancellationToken) -> Result<bool> {
        log::debug!("payer {} -> {}", payer, SubmissionStage::CheckFunds);
        let balance =
            cancellable(cancel, SubmissionStage::CheckFunds, self.transport.get_balance(payer))
                .await??;
        if balance >= self.config.min_balance {
            return Ok(false);
        }

        log::debug!("payer {} -> {}", payer, SubmissionStage::FundIfLow);
        log::info!(
            "balance {} below {}, requesting {} lamports",
            balance,
            self.config.min_balance,
            self.config.funding_amount
        );

        let failed = |balance: u64, reason: String| ClientError::FundingFailed {
            address: *payer,
            balance,
            reason,
        };

        let funding_sig = cancellable(
            cancel,
            SubmissionStage::FundIfLow,
            self.transport
                .request_funding(payer, self.config.funding_amount),
        )
        .await?
        .map_err(|e| failed(balance, format!("{e:#}")))?;

        match self
            .await_confirmation(&funding_sig, SubmissionStage::FundIfLow, cancel)
            .await
        {
            Ok(()) => {}
            Err(ClientError::SubmissionFailed { reason, .. }) => {
                return Err(failed(balance, reason));
            }
            Err(e) => return Err(e),
        }

        let after =
            cancellable(cancel, SubmissionStage::FundIfLow, self.transport.get_balance(payer))
                .await?
                .map_err(|e| failed(balance, format!("{e:#}")))?;
        if after < self.config.min_balance {
            return Err(failed(after, "balance still below threshold".into()));
        }

        log::info!("funded {} to {} lamports", payer, after);
        Ok(true)
    }

    /// Polls until `signature` reaches the configured commitment.
    ///
    /// Transport errors while polling end the wait: the transaction may or may
    /// not have landed, and the caller gets the signature to check by hand.
    async fn await_confirmation(
        &self,
        signature: &Signature,
        stage: SubmissionStage,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let timeout = self.config.confirm_timeout();
        let deadline = Instant::now() + timeout;

        loop {
            let status = cancellable(
                cancel,
                stage,
                self.transport.confirmation_status(signature),
            )
            .await?;

            match status {
                Ok(ConfirmationStatus::Confirmed) => return Ok(()),
                Ok(ConfirmationStatus::Failed(reason)) => {
                    return Err(ClientError::SubmissionFailed {
                        signature: *signature,
                        reason,
                    })
                }
                Ok(ConfirmationStatus::Pending) => {}
                Err(e) => {
                    return Err(ClientError::SubmissionFailed {
                        signature: *signature,
                        reason: format!("status poll failed: {e:#}"),
                    })
                }
            }

            if Instant::now() >= deadline {
                return Err(ClientError::SubmissionFailed {
                    signature: *signature,
                    reason: format!("not confirmed within {timeout:?}"),
                });
            }
            cancellable(cancel, stage, sleep(self.config.poll_interval())).await?;
        }
    }
}

fn check_size(transaction: &Transaction) -> Result<()> {
    let size = bincode::serialized_size(transaction)
        .map_err(|e| anyhow::anyhow!("sizing transaction: {e}"))?;
    if size > PACKET_DATA_SIZE as u64 {
        return Err(ClientError::TransactionTooLarge {
            size,
            limit: PACKET_DATA_SIZE,
        });
    }
    Ok(())
}
