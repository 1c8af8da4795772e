use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use filmpress::{
    app::{
        workflow::{self, DEFAULT_HISTORY_LIMIT},
        AppConfig,
    },
    domain::{
        article::{format_date, ArticlePatch, ArticleRepository, Language, PgArticleRepository},
        fetch_config::{ConfigurationRepository, PgConfigurationRepository},
        history::{HistoryRepository, PgHistoryRepository},
        share::share_links,
    },
    infra::{
        api::ReqwestHttpClient,
        storage::{db::setup_database, MemoryStore},
    },
    task::{ReconciliationResult, Reconciler},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "ドキュメンタリー公式サイトの記事取得・管理ツール", long_about = None)]
struct Cli {
    /// YAML設定ファイル（省略時は環境変数から読み込む）
    #[arg(long, global = true)]
    config: Option<String>,

    /// DBを使わずインメモリで実行する（fetchとaddのみ。保存内容は終了時に破棄される）
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// キーワードで記事を取得する（手動トリガー）
    Fetch {
        keywords: String,
        #[arg(long, default_value = "admin")]
        created_by: String,
    },
    /// 直近の記事取得設定で記事を取得する（定期トリガー）
    Scheduled {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// 記事を掲載元ごとに一覧表示する
    List {
        #[arg(long, value_parser = parse_language)]
        language: Option<Language>,
    },
    /// 記事を手動で追加する
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        summary: String,
        #[arg(long)]
        source: String,
        #[arg(long)]
        url: String,
        #[arg(long, value_parser = parse_language)]
        language: Option<Language>,
    },
    /// 記事を編集する（指定した項目のみ）
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_parser = parse_language)]
        language: Option<Language>,
    },
    /// 記事を削除する
    Delete { id: Uuid },
    /// 記事取得履歴を表示する
    History {
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
    /// 記事取得設定を表示する
    Configs {
        /// 完全一致するキーワードの設定を探す
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// 記事の共有リンクを表示する
    Share { id: Uuid },
}

fn parse_language(value: &str) -> std::result::Result<Language, String> {
    Language::from_code(value).ok_or_else(|| {
        let codes: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
        format!("対応していない言語です: {}（{}）", value, codes.join(", "))
    })
}

impl Commands {
    /// 1回の実行で完結し、インメモリストレージでも意味を持つコマンドか
    fn supports_memory(&self) -> bool {
        matches!(self, Commands::Fetch { .. } | Commands::Add { .. })
    }
}

/// インメモリ指定がコマンドに対して有効か確認する
fn check_memory_flag(cli: &Cli) -> Result<()> {
    if cli.memory && !cli.command.supports_memory() {
        bail!("--memoryはfetchとaddでのみ使用できます（インメモリの内容は実行ごとに破棄されます）");
    }
    Ok(())
}

/// 3種類のストレージ
struct Stores {
    articles: Arc<dyn ArticleRepository>,
    configs: Arc<dyn ConfigurationRepository>,
    history: Arc<dyn HistoryRepository>,
}

impl Stores {
    async fn open(config: &AppConfig, memory: bool) -> Result<Self> {
        if memory {
            info!("インメモリストレージで実行します");
            let store = Arc::new(MemoryStore::new());
            return Ok(Self {
                articles: store.clone(),
                configs: store.clone(),
                history: store,
            });
        }

        let pool = setup_database(config.require_database_url()?)
            .await
            .context("データベースの初期化に失敗")?;
        Ok(Self {
            articles: Arc::new(PgArticleRepository::new(pool.clone())),
            configs: Arc::new(PgConfigurationRepository::new(pool.clone())),
            history: Arc::new(PgHistoryRepository::new(pool)),
        })
    }

    fn reconciler(&self, config: &AppConfig) -> Result<Reconciler> {
        let providers = config.build_providers(Arc::new(ReqwestHttpClient::new()))?;
        Ok(Reconciler::new(
            providers,
            self.articles.clone(),
            self.history.clone(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    check_memory_flag(&cli)?;
    let config = match cli.config {
        Some(ref path) => AppConfig::from_yaml_file(path)?,
        None => AppConfig::from_env()?,
    };
    let stores = Stores::open(&config, cli.memory).await?;

    match cli.command {
        Commands::Fetch {
            keywords,
            created_by,
        } => {
            let reconciler = stores.reconciler(&config)?;
            let result =
                workflow::trigger_manual(stores.configs.as_ref(), &reconciler, &keywords, &created_by)
                    .await?;
            print_result(&result);
        }
        Commands::Scheduled { limit } => {
            let reconciler = stores.reconciler(&config)?;
            let limit = limit.unwrap_or(config.scheduled_batch_size);
            let result =
                workflow::trigger_scheduled(stores.configs.as_ref(), &reconciler, limit).await?;
            print_result(&result);
        }
        Commands::List { language } => {
            let groups = workflow::list_grouped_articles(stores.articles.as_ref(), language).await?;
            if groups.is_empty() {
                println!("記事がありません");
            }
            for group in groups {
                println!("■ {} ({}件)", group.source, group.articles.len());
                for article in group.articles {
                    println!(
                        "  {} [{}] {}\n    {}\n    {}",
                        format_date(&article.date),
                        article.language,
                        article.title,
                        article.summary,
                        article.url
                    );
                }
            }
        }
        Commands::Add {
            title,
            summary,
            source,
            url,
            language,
        } => {
            workflow::add_article(
                stores.articles.as_ref(),
                &title,
                &summary,
                &source,
                &url,
                language,
            )
            .await?;
            println!("記事を追加しました: {}", title);
        }
        Commands::Edit {
            id,
            title,
            summary,
            source,
            url,
            date,
            language,
        } => {
            let patch = ArticlePatch {
                title,
                summary,
                source,
                url,
                date,
                language: language.map(|l| l.code().to_string()),
            };
            let article = workflow::edit_article(stores.articles.as_ref(), id, &patch).await?;
            println!("記事を更新しました: {} ({})", article.title, article.id);
        }
        Commands::Delete { id } => {
            workflow::delete_article(stores.articles.as_ref(), id).await?;
            println!("記事を削除しました: {}", id);
        }
        Commands::History { limit } => {
            let records = workflow::list_history(stores.history.as_ref(), limit).await?;
            for record in records {
                let entry = record.entry;
                println!(
                    "{} {:<7} {:>3}件 '{}'{}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.status.as_str(),
                    entry.articles_count,
                    record.keywords.unwrap_or_default(),
                    entry.error.map(|e| format!(" - {}", e)).unwrap_or_default()
                );
            }
        }
        Commands::Configs { keywords, limit } => {
            let configs = match keywords {
                Some(ref keywords) => stores
                    .configs
                    .find_by_keywords(keywords)
                    .await?
                    .into_iter()
                    .collect(),
                None => stores.configs.list_recent(limit).await?,
            };
            if configs.is_empty() {
                println!("記事取得設定がありません");
            }
            for config in configs {
                println!("{} {}", config.created_at.format("%Y-%m-%d %H:%M"), config);
            }
        }
        Commands::Share { id } => {
            let article = stores
                .articles
                .find_by_id(id)
                .await?
                .with_context(|| format!("記事が見つかりません: {}", id))?;
            println!("{}", article.title);
            for (platform, link) in share_links(&article) {
                println!("  {:<8} {}", platform.to_string(), link);
            }
        }
    }

    Ok(())
}

fn print_result(result: &ReconciliationResult) {
    println!("保存した記事: {}件", result.total_articles);
    for outcome in &result.per_config {
        let source = outcome
            .source
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "-".to_string());
        match outcome.error {
            Some(ref error) => println!("  ❌ {} [{}] {}", outcome.configuration_id, source, error),
            None => println!(
                "  ✅ {} [{}] {}件",
                outcome.configuration_id, source, outcome.count
            ),
        }
        if !outcome.history_recorded {
            println!("    ⚠️ 履歴を保存できませんでした");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("filmpress").chain(args.iter().copied()))
            .expect("引数の解析に失敗")
    }

    #[test]
    fn test_memory_flag_allowed_for_single_run_commands() {
        assert!(check_memory_flag(&parse(&["--memory", "fetch", "documentary"])).is_ok());
        assert!(check_memory_flag(&parse(&[
            "add", "--title", "t", "--summary", "s", "--source", "src", "--url", "https://x",
            "--memory",
        ]))
        .is_ok());
        println!("✅ fetch/addはインメモリで実行できる");
    }

    #[test]
    fn test_memory_flag_rejected_for_read_commands() {
        let id = Uuid::new_v4().to_string();
        let cases: Vec<Vec<&str>> = vec![
            vec!["--memory", "scheduled"],
            vec!["--memory", "list"],
            vec!["--memory", "history"],
            vec!["--memory", "configs"],
            vec!["--memory", "delete", &id],
            vec!["--memory", "share", &id],
        ];
        for args in cases {
            let err = check_memory_flag(&parse(&args)).unwrap_err();
            assert!(err.to_string().contains("--memory"), "{:?}: {}", args, err);
        }

        // 指定が無ければどのコマンドも通る
        assert!(check_memory_flag(&parse(&["list"])).is_ok());
    }
}
