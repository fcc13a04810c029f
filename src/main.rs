use clap::{Parser as ClapParser, Subcommand};
use logsql_builder::EscapeMode;
use logsql_builder::cli::{
    self, CatalogOptions, CliError, FmtOptions, QueryOptions, RenderOptions, TokensOptions,
    TreeOptions,
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "logsql")]
#[command(about = "logsql - parse, inspect and render LogsQL queries for visual builders")]
#[command(version)]
struct Cli {
    /// Log parser decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct QueryArgs {
    /// The LogsQL query (reads from stdin if not provided)
    query: Option<String>,

    /// Field implied by bare words
    #[arg(long)]
    default_field: Option<String>,

    /// Lift leading exact/regexp filters into labels
    #[arg(long)]
    labels: bool,

    /// How quotes and backslashes are escaped
    #[arg(long, value_enum, default_value_t = EscapeMode::All)]
    escape_mode: EscapeMode,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query into operations
    Parse(QueryArgs),

    /// Show the filter tree of a query
    Tree {
        /// The LogsQL query (reads from stdin if not provided)
        query: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Show the tokens of a query
    Tokens {
        /// The LogsQL query (reads from stdin if not provided)
        query: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Render operations or a visual query given as JSON
    Render {
        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Field implied by bare words
        #[arg(long)]
        default_field: Option<String>,
    },

    /// Print a query in canonical form
    Fmt(QueryArgs),

    /// List known operations
    Catalog {
        /// Only list this category
        #[arg(short, long)]
        category: Option<String>,

        /// Field implied by bare words
        #[arg(long)]
        default_field: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Parse(args) => {
            read_query(args.query.clone()).and_then(|q| cli::execute_parse(&query_options(q, &args)))
        }
        Commands::Tree { query, pretty } => read_query(query)
            .and_then(|query| cli::execute_tree(&TreeOptions { query, pretty })),
        Commands::Tokens { query, pretty } => read_query(query)
            .and_then(|query| cli::execute_tokens(&TokensOptions { query, pretty })),
        Commands::Render {
            input,
            default_field,
        } => read_query(input).and_then(|input| {
            cli::execute_render(&RenderOptions {
                input,
                default_field,
            })
        }),
        Commands::Fmt(args) => read_query(args.query.clone()).and_then(|q| {
            cli::execute_fmt(&FmtOptions {
                query: query_options(q, &args),
                show_errors: cli.verbose,
            })
        }),
        Commands::Catalog {
            category,
            default_field,
            pretty,
        } => cli::execute_catalog(&CatalogOptions {
            category,
            default_field,
            pretty,
        }),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn query_options(query: String, args: &QueryArgs) -> QueryOptions {
    QueryOptions {
        query,
        default_field: args.default_field.clone(),
        parse_labels: args.labels,
        escape_mode: args.escape_mode,
        pretty: args.pretty,
    }
}

/// The argument when given, otherwise piped stdin.
fn read_query(arg: Option<String>) -> Result<String, CliError> {
    match arg {
        Some(s) => Ok(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(buffer.trim_end().to_string())
        }
        None => Err(CliError::NoInput),
    }
}
