use std::ffi::OsString;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

/// Column names and year span the loader and metric calculator agree on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    /// Department code column in the boundary dataset
    pub boundary_key: String,
    /// Department name column in the boundary dataset
    pub boundary_name: String,
    /// Department code column in the case dataset
    pub case_key: String,
    /// Department name column in the case dataset
    pub case_name: String,
    /// Yearly columns are named `<prefix><year>`
    pub year_prefix: String,
    /// Precomputed total column in the case dataset. Only written by the
    /// synthetic generator; range metrics sum the yearly columns instead.
    pub total_column: String,
    pub first_year: u16,
    pub last_year: u16,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            boundary_key: "DPTO_CCDGO".to_string(),
            boundary_name: "name".to_string(),
            case_key: "DANE".to_string(),
            case_name: "DEPARTAMEN".to_string(),
            year_prefix: "Ano".to_string(),
            total_column: "Casos".to_string(),
            first_year: 2009,
            last_year: 2012,
        }
    }
}

impl Schema {
    pub fn years(&self) -> RangeInclusive<u16> {
        self.first_year..=self.last_year
    }

    pub fn year_column(&self, year: u16) -> String {
        format!("{}{}", self.year_prefix, year)
    }

    /// Label of the aggregate selector covering every configured year
    pub fn range_label(&self) -> String {
        format!("{}-{}", self.first_year, self.last_year)
    }

    /// Selector labels in the order they are offered: each year, then the range
    pub fn year_labels(&self) -> Vec<String> {
        self.years()
            .map(|year| year.to_string())
            .chain(std::iter::once(self.range_label()))
            .collect()
    }
}

#[derive(Debug, Parser)]
#[command(name = "vih-map", version, about = "Casos VIH por departamento")]
pub struct Cli {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Parse the command line, running `serve` when no subcommand is given so
    /// its `HOST`/`PORT` env values go through the same validation.
    pub fn parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let cli = Self::try_parse_from(&args)?;
        if cli.command.is_some() {
            return Ok(cli);
        }
        Self::try_parse_from(args.into_iter().chain([OsString::from("serve")]))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the dashboard over HTTP (default)
    Serve(ServeArgs),
    /// Run the dashboard in the terminal
    Tui,
}

#[derive(Debug, Args)]
pub struct DataArgs {
    /// Department boundary GeoJSON
    #[arg(
        long,
        env = "VIH_BOUNDARIES",
        default_value = "data/colombia_simplificado.geojson",
        global = true
    )]
    pub boundaries: PathBuf,

    /// Case count GeoJSON
    #[arg(long, env = "VIH_CASES", default_value = "data/vih.geojson", global = true)]
    pub cases: PathBuf,

    #[arg(long, default_value = "DPTO_CCDGO", global = true)]
    pub boundary_key: String,

    #[arg(long, default_value = "name", global = true)]
    pub boundary_name: String,

    #[arg(long, default_value = "DANE", global = true)]
    pub case_key: String,

    #[arg(long, default_value = "DEPARTAMEN", global = true)]
    pub case_name: String,

    #[arg(long, default_value = "Ano", global = true)]
    pub year_prefix: String,

    /// Total column filled in by the synthetic data; the metric never reads it
    #[arg(long, default_value = "Casos", global = true)]
    pub total_column: String,

    #[arg(long, default_value_t = 2009, global = true)]
    pub first_year: u16,

    #[arg(long, default_value_t = 2012, global = true)]
    pub last_year: u16,
}

impl DataArgs {
    pub fn schema(&self) -> Result<Schema> {
        if self.first_year > self.last_year {
            bail!(
                "--first-year ({}) must not be after --last-year ({})",
                self.first_year,
                self.last_year
            );
        }
        Ok(Schema {
            boundary_key: self.boundary_key.clone(),
            boundary_name: self.boundary_name.clone(),
            case_key: self.case_key.clone(),
            case_name: self.case_name.clone(),
            year_prefix: self.year_prefix.clone(),
            total_column: self.total_column.clone(),
            first_year: self.first_year,
            last_year: self.last_year,
        })
    }
}

#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8050)]
    pub port: u16,
}

impl ServeArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_labels() {
        let schema = Schema::default();
        assert_eq!(
            schema.year_labels(),
            vec!["2009", "2010", "2011", "2012", "2009-2012"]
        );
        assert_eq!(schema.year_column(2010), "Ano2010");
    }

    #[test]
    fn test_cli_defaults_match_schema() {
        let cli = Cli::try_parse_from(["vih-map", "tui"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Tui)));
        assert_eq!(cli.data.schema().unwrap(), Schema::default());
    }

    #[test]
    fn test_cli_serve_port() {
        let cli = Cli::try_parse_from(["vih-map", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, 9000),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_reversed_years_rejected() {
        let cli = Cli::try_parse_from(["vih-map", "--first-year", "2012", "--last-year", "2009"])
            .unwrap();
        assert!(cli.data.schema().is_err());
    }

    #[test]
    fn test_no_subcommand_runs_server_with_env() {
        // Only test touching PORT; parses share the process environment
        std::env::remove_var("PORT");
        let default = Cli::parse_args(["vih-map", "--first-year", "2010"]);
        std::env::set_var("PORT", "80x");
        let explicit = Cli::parse_args(["vih-map", "serve"]);
        let implicit = Cli::parse_args(["vih-map"]);
        std::env::set_var("PORT", "9100");
        let valid = Cli::parse_args(["vih-map"]);
        std::env::remove_var("PORT");

        let default = default.unwrap();
        assert_eq!(default.data.first_year, 2010);
        match default.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, 8050),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(explicit.is_err());
        assert!(implicit.is_err());
        match valid.unwrap().command {
            Some(Command::Serve(args)) => assert_eq!(args.addr(), format!("{}:9100", args.host)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_subcommand_kept() {
        let cli = Cli::parse_args(["vih-map", "tui"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Tui)));
    }
}
