use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mobilectl")]
#[command(about = "Phonebook and device control actions", long_about = None)]
#[command(after_help = "Actions: phonebook_list, phonebook_add, phonebook_delete, call, sms, volume, brightness, theme.\n\
Example: mobilectl phonebook_add contact_name=Alice phone_number=13800138000 contact_alias=Al")]
struct Cli {
    /// Config file path (default: MOBILECTL_CONFIG_PATH or ~/.mobilectl/config.json)
    #[arg(long, short, value_name = "PATH", global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory, a default config, and an empty phonebook.
    Init,

    /// Run the HTTP API.
    Serve {
        /// HTTP port (default from config or 5000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Any other subcommand is an action name followed by key=value parameters.
    #[command(external_subcommand)]
    Action(Vec<String>),
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("mobilectl {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init) => {
            if let Err(e) = run_init(cli.config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { port }) => {
            if let Err(e) = run_serve(cli.config, port).await {
                log::error!("server failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Action(argv)) => match run_action(cli.config, &argv) {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(e) => {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(mobilectl::config::default_config_path);
    let dir = mobilectl::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = mobilectl::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!("starting api on {}:{}", config.server.bind, config.server.port);
    mobilectl::api::run_server(config, path).await
}

/// Dispatch one action and print the result. Returns whether the action succeeded.
fn run_action(config_path: Option<std::path::PathBuf>, argv: &[String]) -> anyhow::Result<bool> {
    let (config, path) = mobilectl::config::load_config(config_path)?;
    let dispatcher = mobilectl::Dispatcher::from_config(&config, &path);
    let (action, args) = argv
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("missing action name"))?;
    let result = match mobilectl::dispatch::parse_cli_params(args) {
        Ok(params) => dispatcher.dispatch(action, &params),
        Err(e) => mobilectl::ActionResult::failed(&e),
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.success)
}
