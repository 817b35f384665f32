//! sqlsrv-forge CLI
//!
//! Prints the SQL Server statements for DDL, pagination and catalog
//! lookups without connecting to a server.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

use oxide_sqlsrv::SqlsrvDialect;
use oxide_sqlsrv::introspect::{
    field_data_sql, foreign_key_data_sql, index_data_sql, list_columns_sql, list_tables_sql,
};
use oxide_sqlsrv_core::{
    CreateTableOp, DialectForge, DialectPaginator, Escaper, FieldDefinition, ForgeContext,
    ForgeOperation, QuotingMode,
};

/// Generate SQL Server DDL and catalog queries offline.
#[derive(Parser)]
#[command(name = "sqlsrv-forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Identifier quoting mode of the target session.
    #[arg(short, long, value_enum, default_value_t = Quoting::Quoted)]
    quoting: Quoting,

    /// Character set for table attributes.
    #[arg(long, env = "SQLSRV_CHARSET", default_value = "utf8")]
    charset: String,

    /// Collation for databases and table attributes.
    #[arg(long, env = "SQLSRV_COLLATION", default_value = "SQL_Latin1_General_CP1_CI_AS")]
    collation: String,

    /// Prefix applied to table names.
    #[arg(long, env = "SQLSRV_PREFIX", default_value = "")]
    prefix: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Quoting {
    /// Double quotes (`QUOTED_IDENTIFIER ON`).
    Quoted,
    /// Square brackets.
    Bracketed,
}

impl From<Quoting> for QuotingMode {
    fn from(quoting: Quoting) -> Self {
        match quoting {
            Quoting::Quoted => Self::Quoted,
            Quoting::Bracketed => Self::Bracketed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print CREATE TABLE from a JSON table definition.
    CreateTable {
        /// Path to the JSON definition.
        #[arg(short, long)]
        definition: PathBuf,
    },

    /// Print DROP TABLE.
    DropTable {
        /// Table name.
        #[arg(short, long)]
        name: String,

        /// Guard with an existence check.
        #[arg(long)]
        if_exists: bool,
    },

    /// Print ALTER TABLE ... ADD from a JSON field list.
    AddColumn {
        /// Table name.
        #[arg(short, long)]
        table: String,

        /// Path to the JSON field list.
        #[arg(short, long)]
        definition: PathBuf,
    },

    /// Print ALTER TABLE ... MODIFY/CHANGE from a JSON field list.
    ModifyColumn {
        /// Table name.
        #[arg(short, long)]
        table: String,

        /// Path to the JSON field list.
        #[arg(short, long)]
        definition: PathBuf,
    },

    /// Print ALTER TABLE ... DROP COLUMN.
    DropColumn {
        /// Table name.
        #[arg(short, long)]
        table: String,

        /// Column name.
        #[arg(short, long)]
        column: String,
    },

    /// Print CREATE DATABASE.
    CreateDatabase {
        /// Database name.
        #[arg(short, long)]
        name: String,
    },

    /// Append an OFFSET/FETCH clause to a query.
    Paginate {
        /// Base query.
        #[arg(short, long)]
        sql: String,

        /// Rows per page.
        #[arg(short, long)]
        limit: u64,

        /// Rows to skip.
        #[arg(short, long)]
        offset: Option<u64>,
    },

    /// Print a catalog query.
    Introspect {
        /// Which catalog lookup.
        #[arg(value_enum)]
        lookup: Lookup,

        /// Table name (not needed for `tables`).
        table: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Lookup {
    Tables,
    Columns,
    Fields,
    Indexes,
    ForeignKeys,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let escaper = Escaper::new(cli.quoting.into());
    let ctx = ForgeContext::new(escaper)
        .with_charset(cli.charset.as_str())
        .with_collation(cli.collation.as_str());
    let dialect = SqlsrvDialect::new();
    let prefixed = |table: &str| format!("{}{table}", cli.prefix);

    let statements = match cli.command {
        Commands::CreateTable { definition } => {
            let mut op: CreateTableOp = read_json(&definition)?;
            op.name = prefixed(&op.name);
            dialect.generate_sql(&ctx, &ForgeOperation::CreateTable(op))?
        }

        Commands::DropTable { name, if_exists } => dialect.generate_sql(
            &ctx,
            &ForgeOperation::DropTable {
                name: prefixed(&name),
                if_exists,
                cascade: false,
            },
        )?,

        Commands::AddColumn { table, definition } => {
            let fields: Vec<FieldDefinition> = read_json(&definition)?;
            dialect.generate_sql(
                &ctx,
                &ForgeOperation::AddColumn {
                    table: prefixed(&table),
                    fields,
                },
            )?
        }

        Commands::ModifyColumn { table, definition } => {
            let fields: Vec<FieldDefinition> = read_json(&definition)?;
            dialect.generate_sql(
                &ctx,
                &ForgeOperation::ModifyColumn {
                    table: prefixed(&table),
                    fields,
                },
            )?
        }

        Commands::DropColumn { table, column } => dialect.generate_sql(
            &ctx,
            &ForgeOperation::DropColumn {
                table: prefixed(&table),
                column,
            },
        )?,

        Commands::CreateDatabase { name } => {
            dialect.generate_sql(&ctx, &ForgeOperation::CreateDatabase { name })?
        }

        Commands::Paginate { sql, limit, offset } => {
            vec![dialect.paginate(&sql, Some(limit), offset)?]
        }

        Commands::Introspect { lookup, table } => {
            let table = || {
                table
                    .as_deref()
                    .map(&prefixed)
                    .context("a table name is required for this lookup")
            };
            let sql = match lookup {
                Lookup::Tables => list_tables_sql(&escaper, Some(cli.prefix.as_str())),
                Lookup::Columns => list_columns_sql(&escaper, &table()?),
                Lookup::Fields => field_data_sql(&escaper, &table()?),
                Lookup::Indexes => index_data_sql(&escaper, &table()?),
                Lookup::ForeignKeys => foreign_key_data_sql(&escaper, &table()?),
            };
            vec![sql]
        }
    };

    debug!(dialect = DialectForge::name(&dialect), statements = statements.len(), "Generated SQL");
    for sql in statements {
        println!("{sql};");
    }
    Ok(())
}
