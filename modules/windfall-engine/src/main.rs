use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use llm_client::LlmClient;
use ocr_client::OcrClient;
use push_client::PushClient;
use windfall_common::{AccountConfig, Clock, Config, SystemClock};
use windfall_platform::PlatformClient;

use windfall_engine::campaign::Campaign;
use windfall_engine::ledger::EntryLedger;
use windfall_engine::notify_gate::NotifyGate;
use windfall_engine::traits::{AiCommenter, ChallengeSolver, Notifier, TextGenerator};
use windfall_engine::winner::WinnerCheck;

#[derive(Parser)]
#[command(name = "windfall", about = "Repost-giveaway entry automation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the entry campaign for every configured account.
    Start,
    /// Scan feeds for win notices.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("windfall=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    config.log_redacted();
    if config.accounts.is_empty() {
        anyhow::bail!("No accounts configured, set WINDFALL_COOKIES");
    }

    let clock = SystemClock;
    let push = PushClient::new(&config.bark_url, &config.webhook_url);
    let notifier = push.is_configured().then_some(&push as &dyn Notifier);
    let generator = (config.campaign.ai_comments && !config.ai_api_url.is_empty()).then(|| {
        AiCommenter::new(
            LlmClient::new(&config.ai_api_url, &config.ai_api_key, &config.ai_model),
            config.ai_prompt.clone(),
        )
    });
    let solver = (!config.ocr_url.is_empty()).then(|| OcrClient::new(config.ocr_url.clone()));
    let gate = NotifyGate::new(&config.data_dir);

    // Accounts run strictly one at a time; the per-account ledgers rely on
    // having a single writer.
    let total = config.accounts.len();
    for (idx, account) in config.accounts.iter().enumerate() {
        let client = match login(account, &gate, &clock, notifier).await {
            Some(client) => client,
            None => continue,
        };
        match &cli.command {
            Command::Start => {
                run_campaign(
                    &client,
                    account,
                    &config,
                    &clock,
                    generator.as_ref().map(|g| g as &dyn TextGenerator),
                    solver.as_ref().map(|s| s as &dyn ChallengeSolver),
                    notifier,
                )
                .await;
            }
            Command::Check => {
                let check = WinnerCheck::new(
                    &client,
                    notifier,
                    &clock,
                    &config.campaign.notice_keywords,
                    &config.data_dir,
                    account.number,
                );
                match check.run(&note(account)).await {
                    Ok(Some(digest)) => println!("{digest}"),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::error!(account = account.number, %err, "Win check failed");
                    }
                }
            }
        }
        if idx + 1 < total && account.wait_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(account.wait_ms)).await;
        }
    }
    Ok(())
}

/// Build the account's client and verify the credential. Failures notify at
/// most once per window.
async fn login(
    account: &AccountConfig,
    gate: &NotifyGate,
    clock: &dyn Clock,
    notifier: Option<&dyn Notifier>,
) -> Option<PlatformClient> {
    info!(account = account.number, note = %account.note, "Account starting");
    let client = match PlatformClient::new(&account.cookie, &account.user_agent) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(account = account.number, %err, "Cookie unusable");
            notify_login_failure(account, gate, clock, notifier).await;
            return None;
        }
    };
    match client.my_info().await {
        Ok(me) => {
            info!(account = account.number, uid = me.mid, name = %me.name, "Login ok");
            gate.clear(account.number).await;
            Some(client)
        }
        Err(err) => {
            tracing::error!(account = account.number, %err, "Login check failed");
            notify_login_failure(account, gate, clock, notifier).await;
            None
        }
    }
}

async fn notify_login_failure(
    account: &AccountConfig,
    gate: &NotifyGate,
    clock: &dyn Clock,
    notifier: Option<&dyn Notifier>,
) {
    if !gate.allow(account.number, clock).await {
        return;
    }
    if let Some(notifier) = notifier {
        notifier
            .notify("登录失效", &format!("{} 的 cookie 已失效，请更新", note(account)))
            .await;
    }
}

async fn run_campaign(
    client: &PlatformClient,
    account: &AccountConfig,
    config: &Config,
    clock: &dyn Clock,
    generator: Option<&dyn TextGenerator>,
    solver: Option<&dyn ChallengeSolver>,
    notifier: Option<&dyn Notifier>,
) {
    let ledger = EntryLedger::open(
        &config.data_dir,
        account.number,
        clock,
        config.campaign.ledger_write_cutoff_hour,
    );
    let campaign = Campaign {
        api: client,
        ledger: &ledger,
        config: &config.campaign,
        clock,
        generator,
        solver,
        notifier,
        account_note: note(account),
    };
    let (status, stats) = campaign.run().await;
    info!(account = account.number, status, "Account run complete. {stats}");
}

fn note(account: &AccountConfig) -> String {
    if account.note.is_empty() {
        format!("账号{}", account.number)
    } else {
        format!("账号{} ({})", account.number, account.note)
    }
}
