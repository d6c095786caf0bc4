use anyhow::Result;
use campaign_client::{load_signer, CampaignClient, ClientConfig};
use campaign_core::CampaignFields;
use solana_sdk::signature::Keypair;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ClientConfig::from_env()?;
    let signer = match load_signer("CAMPAIGN_KEYPAIR") {
        Ok(keypair) => keypair,
        Err(e) => {
            log::warn!("{e}, using a throwaway keypair");
            Keypair::new()
        }
    };
    let client = CampaignClient::connect(config, signer)?;

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("list") {
        let number = match args.next() {
            Some(raw) => raw.parse()?,
            None => 1,
        };
        let listing = client.page(number).await?;
        println!("{}", serde_json::to_string_pretty(&listing.page.items)?);
        println!(
            "page {} of {} campaigns, {} unreadable",
            listing.page.number,
            listing.page.total,
            listing.failures.len()
        );
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let fields = CampaignFields {
        title: "Anaconda".to_string(),
        rating: 5,
        description: "big snake in the Amazon".to_string(),
        recipient: "ewoakgeokgeaokgeako".to_string(),
        entry_fee: 10,
        funding: 1000,
    };

    println!("Creating campaign `{}` as {}...", fields.title, client.payer());
    let (receipt, record) = client.create_and_fetch(&fields, &cancel).await?;
    println!("Signature: {}", receipt.signature);
    println!("Address: {} (bump {})", receipt.address, receipt.bump);
    match record {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("account not visible yet, try `list`"),
    }

    Ok(())
}
