// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::Address;
use alloy::primitives::utils::format_ether;
use cellula_pro::app::config::GlobalSettings;
use cellula_pro::app::logging::setup_logging;
use cellula_pro::domain::constants::{DEFAULT_MINT_QUANTITY, LEADERBOARD_MAX_HOLDERS, LEADERBOARD_TOP};
use cellula_pro::domain::error::{AppError, PipelineError};
use cellula_pro::domain::types::BatchPlan;
use cellula_pro::infrastructure::network::chain::RpcChainClient;
use cellula_pro::infrastructure::network::explorer::OklinkExplorer;
use cellula_pro::infrastructure::network::factory_api::FactoryApi;
use cellula_pro::infrastructure::network::price_feed::{
    MulticallOracle, PriceStrategy, PriceStrategyKind, QuoteEndpoint, SequentialOracle,
};
use cellula_pro::infrastructure::network::provider::ConnectionFactory;
use cellula_pro::services::catalog::load_priced_catalog;
use cellula_pro::services::leaderboard::energy_leaderboard;
use cellula_pro::services::mint::{MintOrder, mint};
use cellula_pro::services::pipeline::{
    AutoApprove, PipelineEvent, PromptGate, SignatureGate, SubmissionReceipt, TxPipeline,
};
use cellula_pro::services::recharge::{Session, recharge};
use clap::{Args, Parser, Subcommand};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "cellula pro: recycle/charge planner and gene minting")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,json})
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level or full filter directive
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// JSON log lines
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the recycle/charge batch for the account without sending anything
    Plan(PlanArgs),
    /// Recycle low hash-rate assets to charge high hash-rate ones
    Recharge {
        #[command(flatten)]
        plan: PlanArgs,
        /// Sign without the confirmation prompt
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Cheapest mintable genes
    Genes {
        /// sequential | multicall | quote
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Mint a gene at its current oracle price
    Mint {
        gene: u64,
        #[arg(long, default_value_t = DEFAULT_MINT_QUANTITY)]
        quantity: u64,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Top holders by accumulated energy
    Leaderboard {
        #[arg(long, default_value_t = LEADERBOARD_TOP)]
        top: usize,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Assets recycled per charged asset (= days granted), 1..=7
    #[arg(long)]
    ratio: Option<u64>,
    /// Recycle assets strictly below this hash rate
    #[arg(long)]
    ceiling: Option<f64>,
    /// Charge assets strictly above this hash rate
    #[arg(long)]
    floor: Option<f64>,
    /// Plan for this account instead of the configured wallet
    #[arg(long)]
    owner: Option<Address>,
}

impl PlanArgs {
    fn apply(&self, settings: &mut GlobalSettings) -> Result<(), AppError> {
        if let Some(ratio) = self.ratio {
            settings.charge_ratio = ratio;
        }
        if let Some(ceiling) = self.ceiling {
            settings.destroy_ceiling = ceiling;
        }
        if let Some(floor) = self.floor {
            settings.charge_floor = floor;
        }
        settings.validate()
    }
}

fn build_session(settings: &GlobalSettings, owner: Option<Address>) -> Result<Session, AppError> {
    let owner = match owner {
        Some(addr) => addr,
        None => settings.account()?,
    };
    Ok(Session::new(
        owner,
        settings.thresholds()?,
        settings.charge_ratio()?,
        settings.max_batch,
    ))
}

fn build_strategy(
    settings: &GlobalSettings,
    kind: PriceStrategyKind,
    client: reqwest::Client,
) -> Result<Box<dyn PriceStrategy>, AppError> {
    Ok(match kind {
        PriceStrategyKind::Sequential => Box::new(SequentialOracle::new(
            ConnectionFactory::http(&settings.rpc_url)?,
            settings.price_oracle,
        )),
        PriceStrategyKind::Multicall => Box::new(MulticallOracle::new(
            ConnectionFactory::http(&settings.rpc_url)?,
            settings.price_oracle,
            settings.multicall_address,
        )),
        PriceStrategyKind::Quote => {
            let url = settings
                .quote_url
                .as_deref()
                .ok_or_else(|| AppError::Config("QUOTE_URL is missing".to_string()))?;
            Box::new(QuoteEndpoint::new(client, url))
        }
    })
}

/// Pipeline wired to the configured wallet, with progress logged from a
/// caller-side task.
async fn build_pipeline(
    settings: &GlobalSettings,
    yes: bool,
) -> Result<(TxPipeline, Address), AppError> {
    let signer = settings.wallet_signer()?;
    let account = signer.address();
    let chain = RpcChainClient::new(
        ConnectionFactory::http(&settings.rpc_url)?,
        ConnectionFactory::signing(&settings.rpc_url, signer)?,
        settings.chain_id,
        settings.receipt_poll_ms,
        settings.receipt_timeout_ms,
    );
    chain.verify_chain().await?;
    let gate: Arc<dyn SignatureGate> = if yes {
        Arc::new(AutoApprove)
    } else {
        Arc::new(PromptGate)
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                PipelineEvent::Transition { to, .. } if to.is_terminal() => {
                    tracing::info!(target: "pipeline", state = %to, "Pipeline finished")
                }
                PipelineEvent::Transition { to, .. } => {
                    tracing::debug!(target: "pipeline", state = %to, "Pipeline state")
                }
                PipelineEvent::GasQuoted {
                    estimated,
                    gas_limit,
                } => tracing::info!(target: "pipeline", estimated, gas_limit, "Gas quoted"),
                PipelineEvent::Broadcast { hash } => {
                    tracing::info!(target: "pipeline", hash = %format!("{hash:#x}"), "Broadcast")
                }
                PipelineEvent::Failed { kind, message } => {
                    tracing::warn!(target: "pipeline", kind = %kind, "{message}")
                }
            }
        }
    });

    let pipeline = TxPipeline::new(Arc::new(chain), gate, settings.gas_policy()).with_events(tx);
    Ok((pipeline, account))
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "pipeline", "Interrupted; cancelling before broadcast");
            child.cancel();
        }
    });
    token
}

fn print_plan(plan: &BatchPlan) {
    println!("{}", plan.summary());
    for (group, target) in plan.recycle_groups().iter().zip(plan.charge_targets()) {
        let ids: Vec<String> = group.iter().map(u64::to_string).collect();
        println!("  charge {target:>8} <- recycle [{}]", ids.join(", "));
    }
}

fn report(outcome: Result<SubmissionReceipt, PipelineError>) -> Result<(), AppError> {
    match outcome {
        Ok(receipt) => {
            println!(
                "confirmed {:#x} in block {} (gas used {})",
                receipt.hash,
                receipt.block_number.unwrap_or_default(),
                receipt.gas_used
            );
            if let Some(summary) = receipt.summary {
                println!("{summary}");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            Err(err.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.json);

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    let client = ConnectionFactory::rest_client(settings.http_timeout())?;
    let factory = FactoryApi::new(client.clone(), &settings.api_base_url);

    match cli.command {
        Command::Plan(args) => {
            args.apply(&mut settings)?;
            let mut session = build_session(&settings, args.owner)?;
            session.refresh(&factory).await?;
            let classes = session.classification();
            println!(
                "{} assets: {} recyclable (< {}), {} chargeable (> {})",
                session.assets().len(),
                classes.destroyable.len(),
                session.thresholds().destroy_ceiling,
                classes.chargeable.len(),
                session.thresholds().charge_floor
            );
            match session.plan() {
                Ok(plan) => print_plan(&plan),
                Err(err) => println!("{}", err.user_message()),
            }
        }
        Command::Recharge { plan, yes } => {
            plan.apply(&mut settings)?;
            let (pipeline, account) = build_pipeline(&settings, yes).await?;
            if let Some(owner) = plan.owner
                && owner != account
            {
                return Err(AppError::Validation {
                    field: "owner".into(),
                    message: format!("can only recharge the signing account {account:#x}"),
                });
            }
            let mut session = build_session(&settings, Some(account))?;
            let cancel = cancel_on_ctrl_c();
            report(
                recharge(
                    &mut session,
                    &factory,
                    &pipeline,
                    settings.recycle_contract,
                    &cancel,
                )
                .await,
            )?;
        }
        Command::Genes { strategy, limit } => {
            let kind = match strategy {
                Some(raw) => PriceStrategyKind::from_str(&raw)?,
                None => settings.price_strategy_kind()?,
            };
            let resolver = build_strategy(&settings, kind, client.clone())?;
            let preview = limit.unwrap_or(settings.catalog_preview);
            let genes = load_priced_catalog(&factory, resolver.as_ref(), preview).await?;
            for gene in genes {
                println!(
                    "{:>8}  {:<10} living {:>6}  {} BNB",
                    gene.id,
                    gene.label,
                    gene.living_count,
                    format_ether(gene.price)
                );
            }
        }
        Command::Mint {
            gene,
            quantity,
            yes,
        } => {
            let resolver = build_strategy(&settings, settings.price_strategy_kind()?, client.clone())?;
            let prices = resolver.resolve_prices(&[gene]).await?;
            let unit_price = prices.get(&gene).copied().unwrap_or_default();
            if unit_price.is_zero() {
                return Err(AppError::Validation {
                    field: "gene".into(),
                    message: format!("no price available for gene {gene}"),
                });
            }
            let (pipeline, account) = build_pipeline(&settings, yes).await?;
            let cancel = cancel_on_ctrl_c();
            report(
                mint(
                    &pipeline,
                    account,
                    settings.mint_contract,
                    MintOrder::new(gene, unit_price, quantity),
                    settings.mint_value_multiplier_bps,
                    &cancel,
                )
                .await,
            )?;
        }
        Command::Leaderboard { top } => {
            let explorer =
                OklinkExplorer::new(client.clone(), &settings.explorer_api_url, &settings.explorer_api_key()?);
            let energy = FactoryApi::new(client.clone(), &settings.energy_api_url());
            let rows = energy_leaderboard(
                &explorer,
                &energy,
                settings.energy_token,
                LEADERBOARD_MAX_HOLDERS,
                top,
            )
            .await?;
            for (rank, row) in rows.iter().enumerate() {
                println!("{:>3}. {row}", rank + 1);
            }
        }
    }

    Ok(())
}
