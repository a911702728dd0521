use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    process::ExitCode,
};

use clap::Parser;
use furikesu::{
    core::http::http_client,
    page::{
        is_supported_page,
        Dictionary,
        HideMode,
    },
    process_page,
    wanikani::{
        api::ReqwestTransport,
        credential::{
            ConsolePrompt,
            CredentialStore,
            FileCredentialStore,
        },
    },
    FurikesuError,
    NewsPage,
    Settings,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "furikesu", version, about = "Hide furigana for words you already know on WaniKani")]
struct Cli {
    /// Saved news page (HTML)
    #[arg(required_unless_present = "forget_token")]
    input: Option<PathBuf>,

    /// Where to write the processed page (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Word dictionary JSON that belongs to the page
    #[arg(short, long)]
    dictionary: Option<PathBuf>,

    /// Where to write the processed dictionary (defaults to <dictionary>.furikesu.json)
    #[arg(long, requires = "dictionary")]
    dictionary_output: Option<PathBuf>,

    /// URL the page was saved from; processing is refused unless it matches a page pattern
    #[arg(long)]
    url: Option<String>,

    /// API token to use when none is stored yet
    #[arg(long, env = "WANIKANI_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, value_enum)]
    hide_mode: Option<HideMode>,

    #[arg(long)]
    api_base_url: Option<String>,

    /// Subject ids per subjects request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Persist the effective settings (including the overrides above)
    #[arg(long)]
    save_settings: bool,

    /// Delete the stored API token and exit
    #[arg(long)]
    forget_token: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings::load();
        if let Some(hide_mode) = self.hide_mode {
            settings.hide_mode = hide_mode;
        }
        if let Some(api_base_url) = &self.api_base_url {
            settings.api_base_url = api_base_url.clone();
        }
        if let Some(batch_size) = self.batch_size {
            settings.subject_batch_size = batch_size;
        }
        settings
    }
}

fn dictionary_output_path(dictionary: &Path) -> PathBuf {
    dictionary.with_extension("furikesu.json")
}

async fn run(cli: Cli) -> Result<(), FurikesuError> {
    let store = FileCredentialStore::default();
    if cli.forget_token {
        if store.forget()? {
            info!("Stored API token removed");
        } else {
            info!("No stored API token");
        }
        return Ok(());
    }

    let settings = cli.settings();
    if cli.save_settings {
        settings.save()?;
        info!("Settings saved to {}", Settings::path().display());
    }

    if let Some(url) = &cli.url {
        if !is_supported_page(url, &settings.page_patterns) {
            return Err(FurikesuError::UnsupportedPage(url.clone()));
        }
    }

    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| FurikesuError::Custom("No input page given".to_string()))?;
    let html = fs::read_to_string(input)?;
    let dictionary: Option<Dictionary> = match &cli.dictionary {
        Some(path) => Some(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => None,
    };

    let mut page = NewsPage::parse(&html, dictionary)?;
    let transport = ReqwestTransport::new(http_client(settings.request_timeout_secs)?);
    let prompt = ConsolePrompt::new(cli.token.clone());

    process_page(&transport, &store, &prompt, &settings, &mut page).await?;

    let output = page.document.to_html();
    match &cli.output {
        Some(path) => {
            fs::write(path, output)?;
            info!("Page written to {}", path.display());
        }
        None => println!("{output}"),
    }

    if let (Some(dictionary), Some(source)) = (&page.dictionary, &cli.dictionary) {
        let path = cli.dictionary_output.clone().unwrap_or_else(|| dictionary_output_path(source));
        fs::write(&path, serde_json::to_string(dictionary)?)?;
        info!("Dictionary written to {}", path.display());
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("furikesu=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        // the user was already alerted by the prompt
        Err(FurikesuError::MissingCredential) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("furikesu: {e}");
            ExitCode::FAILURE
        }
    }
}
