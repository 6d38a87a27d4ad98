use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use sdui::config::Config;
use sdui::dispatch::LoggingDispatcher;
use sdui::interpreter::{Environment, Interpreter};
use sdui::resolve::{ScreenContext, ScreenResolver};
use sdui::schema::ScreenDocument;
use sdui::server::ScreenServer;
use sdui::store::{DirectoryTemplateStore, TemplateStore};

/// Server-driven UI screen service and interpreter
#[derive(Parser, Debug)]
#[command(name = "sdui")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP screen service
    Serve {
        /// Config file (defaults to the platform config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overriding [server].bind_addr
        #[arg(short, long)]
        bind: Option<String>,

        /// Template directory, overriding [templates].directory
        #[arg(short, long)]
        templates: Option<PathBuf>,
    },
    /// Resolve and evaluate one screen, printing the render tree as JSON
    Render {
        /// Screen id to render
        screen_id: String,

        /// Template directory
        #[arg(short, long)]
        templates: PathBuf,

        /// JSON object of extra environment bindings
        #[arg(short, long)]
        env: Option<PathBuf>,

        /// Locale used to pick a template variant
        #[arg(short, long)]
        locale: Option<String>,

        /// User id bound as `user.id`
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Decode a template file and report nodes that would render degraded
    Check {
        /// Template file to check
        file: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve {
                config,
                bind,
                templates,
            } => serve(config, bind, templates).await,
            Commands::Render {
                screen_id,
                templates,
                env,
                locale,
                user,
            } => render(&screen_id, templates, env.as_deref(), locale, user).await,
            Commands::Check { file } => check(&file),
        }
    }
}

async fn serve(
    config_path: Option<PathBuf>,
    bind: Option<String>,
    templates: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    if let Some(bind) = bind {
        config.server.bind_addr = bind;
    }
    if let Some(dir) = templates {
        config.templates.directory = Some(dir);
    }
    config.validate()?;
    let Some(directory) = config.templates.directory.clone() else {
        bail!("no template directory: set [templates].directory or pass --templates");
    };

    let resolver = Arc::new(ScreenResolver::new(Arc::new(DirectoryTemplateStore::new(
        directory,
    ))));
    if config.templates.preload {
        resolver.warm().await?;
    }
    let interpreter = Arc::new(Interpreter::new(
        config.interpreter.clone(),
        Arc::new(LoggingDispatcher),
    ));

    let mut server = ScreenServer::new(resolver.clone(), interpreter);
    let addr = server.bind(&config.server.bind_addr).await?;
    println!("sdui listening on http://{addr}");

    #[cfg(unix)]
    invalidate_on_hangup(resolver)?;

    server.run().await?;
    Ok(())
}

/// SIGHUP drops cached templates so edited files are picked up.
#[cfg(unix)]
fn invalidate_on_hangup(resolver: Arc<ScreenResolver>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            let dropped = resolver.cached_len();
            resolver.invalidate();
            tracing::info!(dropped, "Template cache invalidated");
        }
    });
    Ok(())
}

async fn render(
    screen_id: &str,
    templates: PathBuf,
    env_file: Option<&Path>,
    locale: Option<String>,
    user: Option<String>,
) -> Result<()> {
    let store = DirectoryTemplateStore::new(templates);
    store
        .ping()
        .await
        .with_context(|| format!("template directory {}", store.root().display()))?;
    let resolver = ScreenResolver::new(Arc::new(store));

    let context = ScreenContext {
        user_id: user,
        locale,
        ..ScreenContext::default()
    };
    let document = resolver.resolve(screen_id, &context).await?;

    let mut env = Environment::from_context(&context);
    if let Some(path) = env_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading environment file {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing environment file {}", path.display()))?;
        if !value.is_object() {
            bail!("environment file {} must hold a JSON object", path.display());
        }
        env.overlay(&Environment::from_json(value));
    }

    let tree = Interpreter::default().render(&document, &env);
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

fn check(file: &Path) -> Result<()> {
    let raw = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let document = ScreenDocument::from_slice(&raw)
        .with_context(|| format!("{} is not a screen document", file.display()))?;

    let degraded = document.degraded_nodes();
    if degraded.is_empty() {
        println!(
            "{}: ok ({} top-level components)",
            document.id,
            document.components.len()
        );
        return Ok(());
    }

    for node in &degraded {
        println!(
            "{}: {} ({}): {}",
            document.id,
            node.id.as_deref().unwrap_or("<anonymous>"),
            node.type_name.as_deref().unwrap_or("<missing type>"),
            node.reason
        );
    }
    bail!("{} degraded node(s) in {}", degraded.len(), file.display())
}
