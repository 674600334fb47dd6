use clap::Parser;
use colored::*;
use std::{env, net::SocketAddr, path::Path};
use tracing::{info, Level};
use tracing_subscriber::{
    field::RecordFields,
    fmt::{self, time::ChronoUtc, FormatFields},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use error_common::{log_error, IntakeError, Result};
use intake_server::{create_app, IntakeServer, ServerConfig, StorageBackend};

/// Intake Forms HTTP Server
#[derive(Parser, Debug)]
#[command(name = "intake-server")]
#[command(about = "Multi-step intake form builder HTTP API server")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0", env = "INTAKE_HOST")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8080", env = "INTAKE_PORT")]
    port: u16,

    /// Configuration file path, skipped when missing
    #[arg(short, long, default_value = "intake-server.yaml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Storage backend, overrides the configuration file
    #[arg(long, value_enum, env = "INTAKE_STORAGE")]
    storage: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.verbose);

    if let Err(e) = run(args).await {
        log_error("Intake server stopped", &e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    info!("📝 {}", "Starting Intake Forms HTTP Server".bright_cyan());
    info!("📋 Version: {}", env!("CARGO_PKG_VERSION").bright_white());

    let mut config = ServerConfig::load(Some(Path::new(&args.config)))?;
    if let Some(storage) = args.storage {
        config.storage = storage;
    }

    let server = IntakeServer::from_config(config).await?;
    let app = create_app(server);

    let ip = args
        .host
        .parse()
        .map_err(|e| IntakeError::ConfigError(format!("invalid host {:?}: {}", args.host, e)))?;
    let addr = SocketAddr::new(ip, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| IntakeError::ServerError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("🚀 {}", format!("Intake server running on http://{}", addr).bright_green());
    info!("📋 {}", format!("Health check available at: http://{}/health", addr).bright_blue());
    info!("📋 {}", format!("Intake API available at: http://{}/api/v1/intake", addr).bright_blue());
    info!("📚 {}", format!("API docs available at: http://{}/swagger-ui", addr).bright_blue());

    axum::serve(listener, app)
        .await
        .map_err(|e| IntakeError::ServerError(format!("HTTP server error: {}", e)))
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    // Check if we're in development or production
    let is_development = env::var("INTAKE_ENV").unwrap_or_else(|_| "development".to_string()) == "development";
    let use_colors = env::var("NO_COLOR").is_err() && atty::is(atty::Stream::Stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "intake_server={level},form_engine={level},database_layer={level},tower_http=info,sqlx=warn"
        )
        .into()
    });

    if is_development && use_colors {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .event_format(ColoredFormatter)
                    .fmt_fields(ColoredFieldFormatter),
            )
            .init();

        print_startup_banner();
    } else {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .init();
    }
}

fn print_startup_banner() {
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                     📝 INTAKE FORMS ENGINE                   ║".bright_cyan());
    println!("{}", "║              Multi-step Public Intake Form Builder           ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

// Colored formatter for development
struct ColoredFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ColoredFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        write!(writer, "{} ", chrono::Utc::now().format("%H:%M:%S%.3f").to_string().bright_black())?;

        let level_str = match *metadata.level() {
            Level::TRACE => "TRACE".bright_purple(),
            Level::DEBUG => "DEBUG".bright_blue(),
            Level::INFO => " INFO".bright_green(),
            Level::WARN => " WARN".bright_yellow(),
            Level::ERROR => "ERROR".bright_red(),
        };
        write!(writer, "[{}] ", level_str)?;

        if let Some(target) = metadata.target().split("::").last() {
            write!(writer, "{:<15} ", target.bright_cyan())?;
        }

        ctx.format_fields(writer.by_ref(), event)?;

        // file and line for debug/trace
        if metadata.level() >= &Level::DEBUG {
            if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
                let file_short = file.rsplit('/').next().unwrap_or(file);
                write!(writer, " {}", format!("({}:{})", file_short, line).bright_black())?;
            }
        }

        writeln!(writer)
    }
}

struct ColoredFieldFormatter;

impl<'a> FormatFields<'a> for ColoredFieldFormatter {
    fn format_fields<R: RecordFields>(
        &self,
        writer: tracing_subscriber::fmt::format::Writer<'_>,
        fields: R,
    ) -> std::fmt::Result {
        let mut visitor = ColoredFieldVisitor {
            writer,
            result: Ok(()),
        };
        fields.record(&mut visitor);
        visitor.result
    }
}

struct ColoredFieldVisitor<'a> {
    writer: tracing_subscriber::fmt::format::Writer<'a>,
    result: std::fmt::Result,
}

impl ColoredFieldVisitor<'_> {
    fn write_field(&mut self, name: &str, value: String) {
        if self.result.is_err() {
            return;
        }
        self.result = if name == "message" {
            write!(self.writer, "{}", value.white().bold())
        } else {
            write!(self.writer, " {}={}", name.bright_yellow(), value.bright_white())
        };
    }
}

impl tracing::field::Visit for ColoredFieldVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.write_field(field.name(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.write_field(field.name(), value.to_string());
    }
}
